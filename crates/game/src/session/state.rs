use crate::net::PeerRole;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No transport bound yet.
    Uninitialized,
    /// Simulation frozen until the master's rescue signal arrives.
    Delayed,
    Active,
}

impl SessionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionState::Uninitialized => "uninitialized",
            SessionState::Delayed => "delayed",
            SessionState::Active => "active",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    BoundAsMaster,
    BoundAsPeer,
    RescueReceived,
    StartRequested,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SideEffect {
    None,
    BroadcastRescue,
}

/// A validated, not yet applied, state change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub from: SessionState,
    pub event: SessionEvent,
    pub to: SessionState,
    pub side_effect: SideEffect,
}

impl Transition {
    pub fn changes_state(&self) -> bool {
        self.from != self.to
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    #[error("illegal transition: {event:?} while {state:?}")]
    IllegalTransition {
        state: SessionState,
        event: SessionEvent,
    },
    #[error("session already bound as {}", .0.as_str())]
    AlreadyBound(PeerRole),
    #[error("only the master may start the session")]
    NotMaster,
    #[error("session already started")]
    AlreadyStarted,
    #[error("transition planned from {planned:?} but session is {actual:?}")]
    Stale {
        planned: SessionState,
        actual: SessionState,
    },
}

/// Role and connectivity phase of the local node.
///
/// `plan` validates an event without touching anything; `commit` is the only
/// mutator. Callers run the transition's side effect between the two so a
/// failed side effect leaves the machine exactly as it was.
#[derive(Debug, Clone)]
pub struct SessionMachine {
    state: SessionState,
    role: Option<PeerRole>,
    started: bool,
}

impl Default for SessionMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionMachine {
    pub fn new() -> Self {
        Self {
            state: SessionState::Uninitialized,
            role: None,
            started: false,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn role(&self) -> Option<PeerRole> {
        self.role
    }

    pub fn is_master(&self) -> bool {
        self.role == Some(PeerRole::Master)
    }

    /// Master: the rescue has been broadcast. Peer: the rescue has arrived.
    pub fn is_started(&self) -> bool {
        self.started
    }

    pub fn simulation_enabled(&self) -> bool {
        self.state == SessionState::Active
    }

    pub fn can_originate(&self) -> bool {
        self.state == SessionState::Active && self.started
    }

    pub fn plan(&self, event: SessionEvent) -> Result<Transition, SessionError> {
        use SessionEvent::*;
        use SessionState::*;

        let illegal = SessionError::IllegalTransition {
            state: self.state,
            event,
        };

        let (to, side_effect) = match event {
            BoundAsMaster | BoundAsPeer => {
                if let Some(role) = self.role {
                    return Err(SessionError::AlreadyBound(role));
                }
                if self.state != Uninitialized {
                    return Err(illegal);
                }
                let to = if event == BoundAsMaster { Active } else { Delayed };
                (to, SideEffect::None)
            }
            RescueReceived => match self.state {
                _ if self.is_master() => return Err(illegal),
                Delayed | Active => (Active, SideEffect::None),
                Uninitialized => return Err(illegal),
            },
            StartRequested => {
                if !self.is_master() {
                    return Err(SessionError::NotMaster);
                }
                if self.started {
                    return Err(SessionError::AlreadyStarted);
                }
                match self.state {
                    Active => (Active, SideEffect::BroadcastRescue),
                    _ => return Err(illegal),
                }
            }
        };

        Ok(Transition {
            from: self.state,
            event,
            to,
            side_effect,
        })
    }

    pub fn commit(&mut self, transition: Transition) -> Result<SessionState, SessionError> {
        if transition.from != self.state {
            return Err(SessionError::Stale {
                planned: transition.from,
                actual: self.state,
            });
        }

        match transition.event {
            SessionEvent::BoundAsMaster => self.role = Some(PeerRole::Master),
            SessionEvent::BoundAsPeer => self.role = Some(PeerRole::Peer),
            SessionEvent::RescueReceived | SessionEvent::StartRequested => self.started = true,
        }
        self.state = transition.to;

        Ok(self.state)
    }

    /// `plan` then `commit`, for transitions without a side effect.
    pub fn apply(&mut self, event: SessionEvent) -> Result<Transition, SessionError> {
        let transition = self.plan(event)?;
        self.commit(transition)?;
        Ok(transition)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EVENTS: [SessionEvent; 4] = [
        SessionEvent::BoundAsMaster,
        SessionEvent::BoundAsPeer,
        SessionEvent::RescueReceived,
        SessionEvent::StartRequested,
    ];

    fn master() -> SessionMachine {
        let mut machine = SessionMachine::new();
        machine.apply(SessionEvent::BoundAsMaster).unwrap();
        machine
    }

    fn peer() -> SessionMachine {
        let mut machine = SessionMachine::new();
        machine.apply(SessionEvent::BoundAsPeer).unwrap();
        machine
    }

    #[test]
    fn binding_picks_initial_state() {
        let master = master();
        assert_eq!(master.state(), SessionState::Active);
        assert!(master.is_master());
        assert!(!master.can_originate());

        let peer = peer();
        assert_eq!(peer.state(), SessionState::Delayed);
        assert_eq!(peer.role(), Some(PeerRole::Peer));
        assert!(!peer.simulation_enabled());
    }

    #[test]
    fn second_bind_keeps_first_role() {
        let mut machine = master();

        assert_eq!(
            machine.apply(SessionEvent::BoundAsMaster),
            Err(SessionError::AlreadyBound(PeerRole::Master))
        );
        assert_eq!(
            machine.apply(SessionEvent::BoundAsPeer),
            Err(SessionError::AlreadyBound(PeerRole::Master))
        );
        assert_eq!(machine.role(), Some(PeerRole::Master));
        assert_eq!(machine.state(), SessionState::Active);
    }

    #[test]
    fn rescue_activates_delayed_peer() {
        let mut machine = peer();

        let transition = machine.apply(SessionEvent::RescueReceived).unwrap();
        assert!(transition.changes_state());
        assert_eq!(machine.state(), SessionState::Active);
        assert!(machine.can_originate());

        let again = machine.apply(SessionEvent::RescueReceived).unwrap();
        assert!(!again.changes_state());
    }

    #[test]
    fn only_master_starts() {
        let machine = peer();
        assert_eq!(
            machine.plan(SessionEvent::StartRequested),
            Err(SessionError::NotMaster)
        );

        let mut machine = master();
        let transition = machine.plan(SessionEvent::StartRequested).unwrap();
        assert_eq!(transition.side_effect, SideEffect::BroadcastRescue);
        assert_eq!(transition.to, SessionState::Active);

        assert!(machine.plan(SessionEvent::RescueReceived).is_err());

        machine.commit(transition).unwrap();
        assert!(machine.can_originate());
        assert_eq!(
            machine.plan(SessionEvent::StartRequested),
            Err(SessionError::AlreadyStarted)
        );
    }

    #[test]
    fn planning_never_mutates() {
        for machine in [SessionMachine::new(), master(), peer()] {
            for event in EVENTS {
                let before = (machine.state(), machine.role(), machine.is_started());
                let _ = machine.plan(event);
                assert_eq!(before, (machine.state(), machine.role(), machine.is_started()));
            }
        }
    }

    #[test]
    fn uninitialized_accepts_only_binding() {
        let machine = SessionMachine::new();

        assert!(machine.plan(SessionEvent::RescueReceived).is_err());
        assert!(machine.plan(SessionEvent::StartRequested).is_err());
        assert!(machine.plan(SessionEvent::BoundAsMaster).is_ok());
        assert!(machine.plan(SessionEvent::BoundAsPeer).is_ok());
    }

    #[test]
    fn stale_commit_is_refused() {
        let mut fresh = SessionMachine::new();
        let bind = fresh.plan(SessionEvent::BoundAsPeer).unwrap();
        fresh.apply(SessionEvent::BoundAsMaster).unwrap();

        assert_eq!(
            fresh.commit(bind),
            Err(SessionError::Stale {
                planned: SessionState::Uninitialized,
                actual: SessionState::Active,
            })
        );
        assert!(fresh.is_master());
    }
}
