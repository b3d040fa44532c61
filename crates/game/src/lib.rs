pub mod driver;
pub mod error;
pub mod net;
pub mod replication;
pub mod session;
pub mod sim;

pub use driver::{GameLoop, InputEvent, InputSource, Renderer, SpawnRng};
pub use error::NetError;
pub use net::{
    Action, ActionKind, DEFAULT_NAME, DEFAULT_PORT, Destination, LoopbackNetwork,
    LoopbackTransport, NetworkEndpoint, NetworkStats, PacketError, PeerRole, PlayerId,
    Transport,
};
pub use replication::{NetEvent, ReplicationEngine, SessionConfig, SessionStatus, TickReport};
pub use session::{SessionError, SessionMachine, SessionState};
pub use sim::{Simulation, UnitWorld};
