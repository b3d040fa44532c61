use std::time::Duration;

use glam::Vec2;

/// Sprite cell edge in playfield units.
pub const UNIT_SIZE: f32 = 60.0;

const FRAMES_PER_ANIMATION: u8 = 16;
const TIME_PER_FRAME: Duration = Duration::from_micros(16_700 * 5);
const MOVE_SPEED: f32 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitKind {
    Base,
    RandomSpawn,
    RandomDirection,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnimationSlot {
    Primary,
    Secondary,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Unit {
    pub id: u32,
    pub kind: UnitKind,
    /// Center of the sprite.
    pub position: Vec2,
    pub velocity: Vec2,
    pub animation: AnimationSlot,
    pub paused: bool,
    pub frame: u8,
    frame_elapsed: Duration,
}

impl Unit {
    pub fn new(id: u32, kind: UnitKind, position: Vec2) -> Self {
        let velocity = match kind {
            UnitKind::RandomDirection => heading_from(position) * MOVE_SPEED,
            UnitKind::Base | UnitKind::RandomSpawn => Vec2::ZERO,
        };

        Self {
            id,
            kind,
            position,
            velocity,
            animation: AnimationSlot::Primary,
            paused: false,
            frame: 0,
            frame_elapsed: Duration::ZERO,
        }
    }

    pub fn contains(&self, point: Vec2) -> bool {
        let half = UNIT_SIZE / 2.0;
        let offset = (point - self.position).abs();
        offset.x <= half && offset.y <= half
    }

    pub fn toggle_animation(&mut self) {
        self.animation = match self.animation {
            AnimationSlot::Primary => AnimationSlot::Secondary,
            AnimationSlot::Secondary => AnimationSlot::Primary,
        };
        self.frame = 0;
        self.frame_elapsed = Duration::ZERO;
    }

    pub fn toggle_pause(&mut self) {
        self.paused = !self.paused;
    }

    pub fn update(&mut self, dt: Duration, bounds: Vec2) {
        let ms = dt.as_secs_f32() * 1000.0;
        self.position = wrap(self.position + self.velocity * ms, bounds);

        if self.paused {
            return;
        }
        self.frame_elapsed += dt;
        while self.frame_elapsed >= TIME_PER_FRAME {
            self.frame_elapsed -= TIME_PER_FRAME;
            self.frame = (self.frame + 1) % FRAMES_PER_ANIMATION;
        }
    }
}

fn wrap(position: Vec2, bounds: Vec2) -> Vec2 {
    let wrapped = position.rem_euclid(bounds);
    // rem_euclid can round up to the bound itself for tiny negatives.
    Vec2::new(
        if wrapped.x >= bounds.x { 0.0 } else { wrapped.x },
        if wrapped.y >= bounds.y { 0.0 } else { wrapped.y },
    )
}

/// Unit heading derived only from the spawn point so every peer computes the
/// same one.
fn heading_from(position: Vec2) -> Vec2 {
    let mut bits = (position.x.to_bits() as u64) << 32 | position.y.to_bits() as u64;
    bits ^= bits >> 33;
    bits = bits.wrapping_mul(0xff51_afd7_ed55_8ccd);
    bits ^= bits >> 33;

    let angle = (bits % 3600) as f32 / 3600.0 * std::f32::consts::TAU;
    Vec2::from_angle(angle)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn heading_is_deterministic() {
        let a = Unit::new(1, UnitKind::RandomDirection, Vec2::new(10.0, 20.0));
        let b = Unit::new(7, UnitKind::RandomDirection, Vec2::new(10.0, 20.0));

        assert_eq!(a.velocity, b.velocity);
        assert!((a.velocity.length() - MOVE_SPEED).abs() < 1e-5);
    }

    #[test]
    fn paused_units_hold_their_frame() {
        let mut unit = Unit::new(1, UnitKind::Base, Vec2::new(100.0, 100.0));
        let bounds = Vec2::new(800.0, 600.0);

        unit.update(TIME_PER_FRAME * 2, bounds);
        assert_eq!(unit.frame, 2);

        unit.toggle_pause();
        unit.update(TIME_PER_FRAME * 3, bounds);
        assert_eq!(unit.frame, 2);
    }

    #[test]
    fn movers_wrap_inside_bounds() {
        let mut unit = Unit::new(1, UnitKind::RandomDirection, Vec2::new(799.0, 1.0));
        let bounds = Vec2::new(800.0, 600.0);

        for _ in 0..1000 {
            unit.update(Duration::from_millis(17), bounds);
            assert!(unit.position.x >= 0.0 && unit.position.x < bounds.x);
            assert!(unit.position.y >= 0.0 && unit.position.y < bounds.y);
        }
    }
}
