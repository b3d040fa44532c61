mod config;
mod engine;
mod events;
mod queue;
mod timer;

pub use config::SessionConfig;
pub use engine::{ReplicationEngine, SessionStatus, TickReport};
pub use events::NetEvent;
pub use queue::OutgoingQueue;
pub use timer::IntervalTimer;
