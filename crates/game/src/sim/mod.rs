mod dispatch;
mod unit;
mod world;

use std::time::Duration;

use crate::net::Action;

pub use dispatch::{ActionHandler, handler_for};
pub use unit::{AnimationSlot, Unit, UnitKind, UNIT_SIZE};
pub use world::{PLAYFIELD_HEIGHT, PLAYFIELD_WIDTH, UnitWorld};

/// The boundary every replicated mutation crosses, whether it was typed in
/// locally or arrived from a peer.
pub trait Simulation {
    fn apply_action(&mut self, action: &Action);

    fn advance(&mut self, dt: Duration);
}
