use glam::Vec2;

use crate::net::ActionKind;

use super::unit::UnitKind;
use super::world::UnitWorld;

pub type ActionHandler = fn(&mut UnitWorld, Vec2);

// Indexed by `ActionKind::index()`; keep in declaration order.
const HANDLERS: [ActionHandler; ActionKind::COUNT] = [
    toggle_anim_all,
    toggle_anim_single,
    create_unit,
    create_unit_random_spawn,
    create_unit_random_direction,
    destroy_unit,
];

pub fn handler_for(kind: ActionKind) -> ActionHandler {
    HANDLERS[kind.index()]
}

fn toggle_anim_all(world: &mut UnitWorld, _: Vec2) {
    world.toggle_pause_all();
}

fn toggle_anim_single(world: &mut UnitWorld, _: Vec2) {
    world.toggle_last_animation();
}

fn create_unit(world: &mut UnitWorld, position: Vec2) {
    world.spawn(UnitKind::Base, position);
}

fn create_unit_random_spawn(world: &mut UnitWorld, position: Vec2) {
    world.spawn(UnitKind::RandomSpawn, position);
}

fn create_unit_random_direction(world: &mut UnitWorld, position: Vec2) {
    world.spawn(UnitKind::RandomDirection, position);
}

fn destroy_unit(world: &mut UnitWorld, position: Vec2) {
    world.despawn_at(position);
}
