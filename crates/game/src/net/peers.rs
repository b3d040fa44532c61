use std::collections::{BTreeMap, HashMap};
use std::net::SocketAddr;

use super::protocol::{PacketError, PeerInfo};

pub type PlayerId = u32;

/// The master always takes the first id; joiners are numbered after it.
pub const MASTER_PLAYER_ID: PlayerId = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeerRole {
    Master,
    Peer,
}

impl PeerRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            PeerRole::Master => "master",
            PeerRole::Peer => "peer",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeerIdentity {
    pub player_id: PlayerId,
    pub name: String,
    pub addr: SocketAddr,
    pub role: PeerRole,
}

impl PeerIdentity {
    pub fn to_info(&self) -> PeerInfo {
        PeerInfo {
            player_id: self.player_id,
            name: self.name.clone(),
            addr: self.addr.to_string(),
        }
    }

    pub fn from_info(info: &PeerInfo, role: PeerRole) -> Result<Self, PacketError> {
        let addr = info
            .addr
            .parse()
            .map_err(|_| PacketError::InvalidAddress(info.addr.clone()))?;

        Ok(Self {
            player_id: info.player_id,
            name: info.name.clone(),
            addr,
            role,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Registration {
    New(PlayerId),
    Existing(PlayerId),
}

impl Registration {
    pub fn player_id(&self) -> PlayerId {
        match self {
            Registration::New(id) | Registration::Existing(id) => *id,
        }
    }
}

/// Remote members of the session, indexed by player id and by address.
#[derive(Debug)]
pub struct PeerRegistry {
    peers_by_addr: HashMap<SocketAddr, PlayerId>,
    peers: BTreeMap<PlayerId, PeerIdentity>,
    next_player_id: PlayerId,
    max_peers: usize,
}

impl PeerRegistry {
    pub fn new(max_peers: usize) -> Self {
        Self {
            peers_by_addr: HashMap::new(),
            peers: BTreeMap::new(),
            next_player_id: MASTER_PLAYER_ID + 1,
            max_peers,
        }
    }

    /// Master side: look up `addr` or admit it under a freshly allocated id.
    pub fn register(
        &mut self,
        addr: SocketAddr,
        name: &str,
    ) -> Result<Registration, &'static str> {
        if let Some(&player_id) = self.peers_by_addr.get(&addr) {
            return Ok(Registration::Existing(player_id));
        }

        if self.peers.len() >= self.max_peers {
            return Err("Session full");
        }

        let player_id = self.next_player_id;
        self.next_player_id += 1;

        self.insert(PeerIdentity {
            player_id,
            name: name.to_string(),
            addr,
            role: PeerRole::Peer,
        });

        Ok(Registration::New(player_id))
    }

    /// Peer side: record a member whose id was assigned by the master.
    pub fn insert(&mut self, identity: PeerIdentity) {
        if let Some(previous) = self.peers.remove(&identity.player_id) {
            self.peers_by_addr.remove(&previous.addr);
        }
        if identity.player_id >= self.next_player_id {
            self.next_player_id = identity.player_id + 1;
        }
        self.peers_by_addr.insert(identity.addr, identity.player_id);
        self.peers.insert(identity.player_id, identity);
    }

    pub fn get(&self, player_id: PlayerId) -> Option<&PeerIdentity> {
        self.peers.get(&player_id)
    }

    pub fn get_by_addr(&self, addr: &SocketAddr) -> Option<&PeerIdentity> {
        self.peers_by_addr
            .get(addr)
            .and_then(|id| self.peers.get(id))
    }

    pub fn contains_addr(&self, addr: &SocketAddr) -> bool {
        self.peers_by_addr.contains_key(addr)
    }

    /// Members in player id order.
    pub fn iter(&self) -> impl Iterator<Item = &PeerIdentity> {
        self.peers.values()
    }

    pub fn addrs(&self) -> Vec<SocketAddr> {
        self.peers.values().map(|p| p.addr).collect()
    }

    pub fn len(&self) -> usize {
        self.peers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.peers.is_empty()
    }
}
