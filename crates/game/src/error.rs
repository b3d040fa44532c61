use std::io;
use std::net::SocketAddr;

use crate::net::PacketError;
use crate::session::SessionError;

#[derive(Debug, thiserror::Error)]
pub enum NetError {
    /// Fatal to session initialization.
    #[error("unable to resolve destination `{destination}`: {reason}")]
    AddressResolution { destination: String, reason: String },

    /// One inbound datagram was dropped; draining continues.
    #[error("malformed message from {from}: {source}")]
    Malformed {
        from: SocketAddr,
        #[source]
        source: PacketError,
    },

    #[error("failed to encode outbound packet: {0}")]
    Encode(#[from] PacketError),

    /// Send or receive failed; the next tick retries.
    #[error("transport failure: {0}")]
    Transport(#[from] io::Error),

    /// A peer asked to start the session. Ignored by the engine.
    #[error("only the master peer may start the session")]
    IllegalStartRequest,

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error("local actions are frozen until the session is active")]
    NotActive,
}

impl NetError {
    /// Whether the node can keep running after this error.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, NetError::AddressResolution { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_resolution_failures_are_fatal() {
        let resolution = NetError::AddressResolution {
            destination: "nowhere:1".into(),
            reason: "no such host".into(),
        };
        assert!(!resolution.is_recoverable());

        let transport = NetError::Transport(io::Error::from(io::ErrorKind::ConnectionReset));
        assert!(transport.is_recoverable());
        assert!(NetError::NotActive.is_recoverable());
    }
}
