use std::io;

use glam::Vec2;

use crate::net::{Action, ActionKind};
use crate::sim::{PLAYFIELD_HEIGHT, PLAYFIELD_WIDTH, UNIT_SIZE};

/// Local player intents, already translated into playfield coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    Quit,
    StartSession,
    ToggleAll,
    ToggleLast,
    CreateUnit(Vec2),
    DestroyUnits(Vec2),
    CreateMovingUnit(Vec2),
    CreateRandomUnit,
}

pub trait InputSource {
    /// Everything that happened since the last poll. Must not block.
    fn poll(&mut self) -> io::Result<Vec<InputEvent>>;
}

/// Picks spawn points for random units on the node that originates them.
/// The chosen position travels in the action, so peers never roll dice.
#[derive(Debug, Clone)]
pub struct SpawnRng {
    state: u64,
}

impl SpawnRng {
    pub fn new(seed: u64) -> Self {
        // xorshift has a fixed point at zero
        Self {
            state: if seed == 0 { 0x9e37_79b9_7f4a_7c15 } else { seed },
        }
    }

    pub fn from_entropy() -> Self {
        Self::new(rand_u64())
    }

    pub fn next_u64(&mut self) -> u64 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.state = x;
        x
    }

    /// Uniform in `[0, 1)`.
    pub fn next_f32(&mut self) -> f32 {
        (self.next_u64() >> 40) as f32 / (1u64 << 24) as f32
    }

    /// A point where a whole unit fits inside the playfield.
    pub fn spawn_point(&mut self) -> Vec2 {
        let half = UNIT_SIZE / 2.0;
        Vec2::new(
            half + self.next_f32() * (PLAYFIELD_WIDTH - UNIT_SIZE),
            half + self.next_f32() * (PLAYFIELD_HEIGHT - UNIT_SIZE),
        )
    }
}

fn rand_u64() -> u64 {
    use std::collections::hash_map::RandomState;
    use std::hash::{BuildHasher, Hasher};

    let mut hasher = RandomState::new().build_hasher();
    hasher.write_u64(
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map_or(0, |d| d.as_nanos() as u64),
    );
    hasher.finish()
}

impl InputEvent {
    /// The replicated action this input produces, if any.
    pub fn to_action(self, rng: &mut SpawnRng) -> Option<Action> {
        let action = match self {
            InputEvent::Quit | InputEvent::StartSession => return None,
            InputEvent::ToggleAll => Action::new(ActionKind::ToggleAnimAll, Vec2::ZERO),
            InputEvent::ToggleLast => Action::new(ActionKind::ToggleAnimSingle, Vec2::ZERO),
            InputEvent::CreateUnit(at) => Action::new(ActionKind::CreateUnit, at),
            InputEvent::DestroyUnits(at) => Action::new(ActionKind::DestroyUnit, at),
            InputEvent::CreateMovingUnit(at) => {
                Action::new(ActionKind::CreateUnitRandomDirection, at)
            }
            InputEvent::CreateRandomUnit => {
                Action::new(ActionKind::CreateUnitRandomSpawn, rng.spawn_point())
            }
        };
        Some(action)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seeded_rng_is_reproducible() {
        let mut a = SpawnRng::new(42);
        let mut b = SpawnRng::new(42);
        for _ in 0..16 {
            assert_eq!(a.next_u64(), b.next_u64());
        }
    }

    #[test]
    fn spawn_points_keep_units_inside() {
        let mut rng = SpawnRng::new(7);
        let half = UNIT_SIZE / 2.0;
        for _ in 0..1000 {
            let p = rng.spawn_point();
            assert!(p.x >= half && p.x <= PLAYFIELD_WIDTH - half);
            assert!(p.y >= half && p.y <= PLAYFIELD_HEIGHT - half);
        }
    }

    #[test]
    fn zero_seed_still_produces_values() {
        let mut rng = SpawnRng::new(0);
        assert_ne!(rng.next_u64(), 0);
    }

    #[test]
    fn control_inputs_produce_no_action() {
        let mut rng = SpawnRng::new(1);
        assert_eq!(InputEvent::Quit.to_action(&mut rng), None);
        assert_eq!(InputEvent::StartSession.to_action(&mut rng), None);

        let at = Vec2::new(3.0, 4.0);
        assert_eq!(
            InputEvent::DestroyUnits(at).to_action(&mut rng),
            Some(Action::new(ActionKind::DestroyUnit, at))
        );
        let random = InputEvent::CreateRandomUnit.to_action(&mut rng);
        assert_eq!(random.map(|a| a.kind), Some(ActionKind::CreateUnitRandomSpawn));
    }
}
