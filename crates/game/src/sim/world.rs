use std::time::Duration;

use glam::Vec2;

use crate::net::Action;

use super::Simulation;
use super::dispatch::handler_for;
use super::unit::{Unit, UnitKind};

pub const PLAYFIELD_WIDTH: f32 = 800.0;
pub const PLAYFIELD_HEIGHT: f32 = 600.0;

/// The shared unit world every node keeps identical by replaying actions.
#[derive(Debug, Clone, Default)]
pub struct UnitWorld {
    units: Vec<Unit>,
    next_unit_id: u32,
    tick: u32,
    elapsed: Duration,
}

impl UnitWorld {
    pub fn new() -> Self {
        Self {
            next_unit_id: 1,
            ..Default::default()
        }
    }

    pub fn tick(&self) -> u32 {
        self.tick
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    pub fn bounds() -> Vec2 {
        Vec2::new(PLAYFIELD_WIDTH, PLAYFIELD_HEIGHT)
    }

    pub fn units(&self) -> &[Unit] {
        &self.units
    }

    pub fn unit_count(&self) -> usize {
        self.units.len()
    }

    pub fn last_unit(&self) -> Option<&Unit> {
        self.units.last()
    }

    pub fn spawn(&mut self, kind: UnitKind, position: Vec2) -> u32 {
        let id = self.next_unit_id;
        self.next_unit_id += 1;
        self.units.push(Unit::new(id, kind, position));
        id
    }

    /// Removes every unit whose sprite covers `point`.
    pub fn despawn_at(&mut self, point: Vec2) -> usize {
        let before = self.units.len();
        self.units.retain(|unit| !unit.contains(point));
        before - self.units.len()
    }

    pub fn toggle_pause_all(&mut self) {
        for unit in &mut self.units {
            unit.toggle_pause();
        }
    }

    pub fn toggle_last_animation(&mut self) -> bool {
        match self.units.last_mut() {
            Some(unit) => {
                unit.toggle_animation();
                true
            }
            None => false,
        }
    }

    pub fn update(&mut self, dt: Duration) {
        let bounds = Self::bounds();
        for unit in &mut self.units {
            unit.update(dt, bounds);
        }
        self.elapsed += dt;
        self.tick = self.tick.wrapping_add(1);
    }
}

impl Simulation for UnitWorld {
    fn apply_action(&mut self, action: &Action) {
        handler_for(action.kind)(self, action.position);
    }

    fn advance(&mut self, dt: Duration) {
        self.update(dt);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::net::ActionKind;

    #[test]
    fn destroy_hits_all_overlapping_units() {
        let mut world = UnitWorld::new();
        world.spawn(UnitKind::Base, Vec2::new(100.0, 100.0));
        world.spawn(UnitKind::RandomSpawn, Vec2::new(120.0, 110.0));
        world.spawn(UnitKind::Base, Vec2::new(300.0, 300.0));

        assert_eq!(world.despawn_at(Vec2::new(110.0, 105.0)), 2);
        assert_eq!(world.unit_count(), 1);
        assert_eq!(world.despawn_at(Vec2::new(10.0, 10.0)), 0);
    }

    #[test]
    fn replaying_the_same_actions_gives_the_same_world() {
        let actions = [
            Action::new(ActionKind::CreateUnit, Vec2::new(100.0, 200.0)),
            Action::new(ActionKind::CreateUnitRandomDirection, Vec2::new(400.0, 300.0)),
            Action::new(ActionKind::ToggleAnimSingle, Vec2::new(400.0, 300.0)),
            Action::new(ActionKind::ToggleAnimAll, Vec2::ZERO),
            Action::new(ActionKind::CreateUnitRandomSpawn, Vec2::new(12.0, 580.0)),
            Action::new(ActionKind::DestroyUnit, Vec2::new(100.0, 200.0)),
        ];

        let mut a = UnitWorld::new();
        let mut b = UnitWorld::new();
        for action in &actions {
            a.apply_action(action);
            a.advance(Duration::from_micros(16_700));
            b.apply_action(action);
            b.advance(Duration::from_micros(16_700));
        }

        assert_eq!(a.units(), b.units());
        assert_eq!(a.unit_count(), 2);
    }

    #[test]
    fn toggle_single_on_empty_world_is_harmless() {
        let mut world = UnitWorld::new();
        world.apply_action(&Action::new(ActionKind::ToggleAnimSingle, Vec2::ZERO));
        assert_eq!(world.unit_count(), 0);
    }
}
