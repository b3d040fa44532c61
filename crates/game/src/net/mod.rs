mod action;
mod address;
mod loopback;
mod peers;
mod protocol;
mod stats;
mod transport;

pub use action::{Action, ActionKind, ActionRecord};
pub use address::Destination;
pub use loopback::{LoopbackNetwork, LoopbackTransport};
pub use peers::{
    MASTER_PLAYER_ID, PeerIdentity, PeerRegistry, PeerRole, PlayerId, Registration,
};
pub use protocol::{
    ActionBatch, DEFAULT_NAME, DEFAULT_PORT, MAX_ACTIONS_PER_PACKET, MAX_PACKET_SIZE, Packet,
    PacketError, PacketHeader, PacketType, PeerInfo, PROTOCOL_MAGIC, PROTOCOL_VERSION,
};
pub use stats::{NetworkStats, ReplicationStats};
pub use transport::{NetworkEndpoint, Transport};
