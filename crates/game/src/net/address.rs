use std::fmt;
use std::net::{SocketAddr, ToSocketAddrs};

use super::peers::PeerRole;
use super::protocol::DEFAULT_PORT;
use crate::error::NetError;

/// Where this node goes at startup: a bare port means "host as master here",
/// `address:port` means "join that master as a peer".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Destination {
    Listen(u16),
    Connect(SocketAddr),
}

impl Destination {
    pub fn parse(input: &str) -> Result<Self, NetError> {
        let input = input.trim();
        if input.is_empty() {
            return Ok(Destination::Listen(DEFAULT_PORT));
        }

        if !input.contains(':') {
            return input
                .parse::<u16>()
                .map(Destination::Listen)
                .map_err(|e| resolution_error(input, e));
        }

        let mut candidates = input
            .to_socket_addrs()
            .map_err(|e| resolution_error(input, e))?
            .collect::<Vec<_>>();
        candidates.sort_by_key(|addr| !addr.is_ipv4());

        candidates
            .into_iter()
            .next()
            .map(Destination::Connect)
            .ok_or_else(|| resolution_error(input, "no addresses"))
    }

    pub fn role(&self) -> PeerRole {
        match self {
            Destination::Listen(_) => PeerRole::Master,
            Destination::Connect(_) => PeerRole::Peer,
        }
    }
}

impl fmt::Display for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Destination::Listen(port) => write!(f, "listen on port {}", port),
            Destination::Connect(addr) => write!(f, "connect to {}", addr),
        }
    }
}

fn resolution_error(input: &str, reason: impl fmt::Display) -> NetError {
    NetError::AddressResolution {
        destination: input.to_string(),
        reason: reason.to_string(),
    }
}
