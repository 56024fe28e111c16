//! Fixed timestep simulation tick
//!
//! Core game loop that advances the festival deterministically.

use glam::Vec2;

use super::character::CharacterState;
use super::collision;
use super::entity::{Entity, EntityId, EntityKind};
use super::world::World;

/// Input commands for a single tick (deterministic)
#[derive(Debug, Clone, Copy, Default)]
pub struct TickInput {
    pub up: bool,
    pub down: bool,
    pub left: bool,
    pub right: bool,
    /// Smash / piss on a touched tent, free-aim piss otherwise
    pub action: bool,
    /// Big piss
    pub special: bool,
    /// Aim point in world coordinates
    pub pointer: Vec2,
    /// Idle/demo mode - autopilot plays the player
    pub idle_mode: bool,
}

impl TickInput {
    /// Unnormalized movement direction from the held keys
    pub fn direction(&self) -> Vec2 {
        let axis = |neg: bool, pos: bool| (pos as i32 - neg as i32) as f32;
        Vec2::new(axis(self.left, self.right), axis(self.up, self.down))
    }
}

/// Advance the world by one frame
pub fn tick(world: &mut World, input: &TickInput) {
    world.frame += 1;
    world.begin_frame();

    let mut input = *input;
    if input.idle_mode {
        input = autopilot(world, &input);
    }

    if let Some(player) = world.player_id() {
        update_player(world, player, &input);
    }

    world.spawn_arrivals();
    world.update_goers(&input);
    world.update_tents();
    world.update_pickups();
    world.end_actor_updates();

    world.resolve_path_requests();
    collision::detect_and_resolve(world);

    if world.capture_dirty() {
        world.recompute_groups();
    }
    world.update_view();
    world.last_input = input;
}

/// Movement, action edges, then the state update
fn update_player(world: &mut World, player: EntityId, input: &TickInput) {
    let Some(actor) = world.actor(player) else {
        return;
    };
    let state = actor.state;
    let beer = actor.beer;

    if state.allows_player_movement() {
        move_player(world, player, input.direction());
    }

    let action_pressed = input.action && !world.last_input.action;
    let special_pressed = input.special && !world.last_input.special;
    let started = world.frame;

    if state == CharacterState::Idle {
        let next = if special_pressed && beer >= world.tuning.big_piss_cost {
            Some(CharacterState::BigPiss { area: None, started })
        } else if action_pressed {
            match world.tent_touching(player) {
                Some(tent) if beer >= world.tuning.tent_piss_cost => {
                    Some(CharacterState::TentPiss { tent, started })
                }
                Some(tent) => Some(CharacterState::TentSmash { tent, started }),
                None if beer > 0.0 => Some(CharacterState::FreeAimPiss { area: None }),
                None => None,
            }
        } else {
            None
        };
        if let Some(next) = next {
            world.transition_to(player, next);
        }
    }

    world.update_character(player, input);
}

/// Per-axis step; an axis is dropped if it would enter a player-blocked tile
fn move_player(world: &mut World, player: EntityId, direction: Vec2) {
    if direction == Vec2::ZERO {
        return;
    }
    let Some(entity) = world.get(player) else {
        return;
    };
    let speed = entity.actor().map_or(0.0, |a| a.speed);
    let delta = direction.normalize() * speed;
    let origin = entity.centroid();
    let grid = world.grid();

    let mut applied = Vec2::ZERO;
    if delta.x != 0.0 && grid.player_can_enter(origin + Vec2::new(delta.x, 0.0)) {
        applied.x = delta.x;
    }
    if delta.y != 0.0 && grid.player_can_enter(origin + applied + Vec2::new(0.0, delta.y)) {
        applied.y = delta.y;
    }
    if applied != Vec2::ZERO {
        world.move_actor(player, applied);
    }
}

/// Demo driver: fetch beer when dry, otherwise harass the nearest
/// occupied tent (or any usable one)
fn autopilot(world: &World, input: &TickInput) -> TickInput {
    let mut input = *input;
    let Some(player) = world.player_id().and_then(|id| world.get(id)) else {
        return input;
    };
    let Some(actor) = player.actor() else {
        return input;
    };
    let pos = player.centroid();
    let closest = |pred: &dyn Fn(&Entity) -> bool| {
        world
            .entities()
            .map(|(_, e)| e)
            .filter(|e| e.enabled && pred(e))
            .map(Entity::centroid)
            .min_by(|a, b| a.distance(pos).total_cmp(&b.distance(pos)))
    };

    let goal = if actor.beer < world.tuning.tent_piss_cost {
        closest(&|e| matches!(&e.kind, EntityKind::BeerCrate(p) if p.state.is_available()))
    } else {
        None
    }
    .or_else(|| closest(&|e| e.tent().is_some_and(|t| t.occupied && !t.is_ruined())))
    .or_else(|| closest(&|e| e.tent().is_some_and(|t| !t.is_ruined())));

    const DEADZONE: f32 = 2.0;
    if let Some(goal) = goal {
        let to_goal = goal - pos;
        input.left = to_goal.x < -DEADZONE;
        input.right = to_goal.x > DEADZONE;
        input.up = to_goal.y < -DEADZONE;
        input.down = to_goal.y > DEADZONE;
        input.pointer = goal;
    }

    // Alternate frames so every press is a fresh edge
    input.action = world.tent_touching(player.id()).is_some() && world.frame % 2 == 0;
    input
}
