use std::net::SocketAddr;

use crate::net::PlayerId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NetEvent {
    PeerJoined {
        player_id: PlayerId,
        name: String,
        addr: SocketAddr,
    },
    PeerIntroduced {
        player_id: PlayerId,
        name: String,
        addr: SocketAddr,
    },
    Welcomed {
        player_id: PlayerId,
        master_name: String,
        peer_count: usize,
    },
    StartBroadcast {
        peer_count: usize,
    },
    SessionStarted,
    JoinDenied {
        addr: SocketAddr,
        reason: String,
    },
    NotMaster {
        addr: SocketAddr,
    },
}

impl NetEvent {
    pub fn describe(&self) -> String {
        match self {
            NetEvent::PeerJoined {
                player_id,
                name,
                addr,
            } => format!("{} joined from {} as player {}", name, addr, player_id),
            NetEvent::PeerIntroduced {
                player_id,
                name,
                addr,
            } => format!("introduced to {} (player {}) at {}", name, player_id, addr),
            NetEvent::Welcomed {
                player_id,
                master_name,
                peer_count,
            } => format!(
                "welcomed by {} as player {} ({} other peers)",
                master_name, player_id, peer_count
            ),
            NetEvent::StartBroadcast { peer_count } => {
                format!("session started with {} peers", peer_count)
            }
            NetEvent::SessionStarted => "rescued: session started".to_string(),
            NetEvent::JoinDenied { addr, reason } => {
                format!("join denied by {}: {}", addr, reason)
            }
            NetEvent::NotMaster { addr } => format!("{} is not the master peer", addr),
        }
    }
}
