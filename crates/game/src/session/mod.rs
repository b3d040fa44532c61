mod state;

pub use state::{SessionError, SessionEvent, SessionMachine, SessionState, SideEffect, Transition};
