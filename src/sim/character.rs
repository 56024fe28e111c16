//! Character state machine
//!
//! One state per actor. `enter` and `exit` run exactly once per state
//! instance (only [`World::transition_to`] swaps states), `update` runs once
//! per frame and may return the next state.

use glam::Vec2;

use super::entity::{Entity, EntityId};
use super::events::SoundCue;
use super::pathfind::{Path, PathRequest};
use super::tick::TickInput;
use super::world::World;
use crate::{direction_to, step_toward};

/// Behavior states shared by the player and festival-goers
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum CharacterState {
    #[default]
    Idle,
    /// Pathfind to and walk into a tent
    TargetSeeking { destination: EntityId },
    /// Run directly away from `threat`
    Fleeing { threat: Vec2, started: u64 },
    /// Player wind-up; damages the tent on exit
    TentSmash { tent: EntityId, started: u64 },
    /// Player pisses on a touched tent; soaks it on exit
    TentPiss { tent: EntityId, started: u64 },
    /// Player stream aimed at the pointer while action is held
    FreeAimPiss { area: Option<EntityId> },
    /// Timed area attack centered on the player
    BigPiss { area: Option<EntityId>, started: u64 },
}

impl CharacterState {
    pub fn name(&self) -> &'static str {
        match self {
            CharacterState::Idle => "idle",
            CharacterState::TargetSeeking { .. } => "target_seeking",
            CharacterState::Fleeing { .. } => "fleeing",
            CharacterState::TentSmash { .. } => "tent_smash",
            CharacterState::TentPiss { .. } => "tent_piss",
            CharacterState::FreeAimPiss { .. } => "free_aim_piss",
            CharacterState::BigPiss { .. } => "big_piss",
        }
    }

    /// Player may walk while in this state
    pub fn allows_player_movement(&self) -> bool {
        matches!(
            self,
            CharacterState::Idle | CharacterState::FreeAimPiss { .. }
        )
    }

    pub fn enter(&mut self, id: EntityId, world: &mut World) {
        match self {
            CharacterState::Idle => {}
            CharacterState::TargetSeeking { destination } => {
                let destination = *destination;
                if let Some(actor) = world.actor_mut(id) {
                    if actor.target != Some(destination) {
                        actor.clear_target();
                        actor.target = Some(destination);
                    }
                }
            }
            CharacterState::Fleeing { .. } => {
                if let Some(actor) = world.actor_mut(id) {
                    // Keep the target; the old route starts from elsewhere
                    actor.path = None;
                    actor.path_request = None;
                }
                world.cue(SoundCue::Flee);
            }
            CharacterState::TentSmash { .. } => world.cue(SoundCue::Smash),
            CharacterState::TentPiss { .. } => {
                let cost = world.tuning.tent_piss_cost;
                world.spend_beer(id, cost);
                world.cue(SoundCue::Piss);
            }
            CharacterState::FreeAimPiss { area } => {
                let half = world.tuning.piss_area_half;
                let center = world.get(id).map(Entity::centroid).unwrap_or(Vec2::ZERO);
                *area = Some(world.spawn_effect_area(id, center, half));
                world.cue(SoundCue::Piss);
            }
            CharacterState::BigPiss { area, .. } => {
                let cost = world.tuning.big_piss_cost;
                let half = world.tuning.big_piss_area_half;
                world.spend_beer(id, cost);
                let center = world.get(id).map(Entity::centroid).unwrap_or(Vec2::ZERO);
                *area = Some(world.spawn_effect_area(id, center, half));
                world.cue(SoundCue::BigPiss);
            }
        }
    }

    pub fn update(
        &mut self,
        id: EntityId,
        world: &mut World,
        input: &TickInput,
    ) -> Option<CharacterState> {
        let frame = world.frame;
        match *self {
            CharacterState::Idle => {
                let target = world.get(id).filter(|e| e.is_goer()).and_then(|e| e.actor()?.target);
                target.map(|destination| CharacterState::TargetSeeking { destination })
            }
            CharacterState::TargetSeeking { destination } => seek(id, destination, world),
            CharacterState::Fleeing { threat, started } => {
                if frame.saturating_sub(started) >= world.tuning.flee_duration {
                    return Some(CharacterState::Idle);
                }
                flee(id, threat, world);
                None
            }
            CharacterState::TentSmash { tent, started } => {
                let done = frame.saturating_sub(started) >= world.tuning.smash_duration;
                (done || !world.contains(tent)).then_some(CharacterState::Idle)
            }
            CharacterState::TentPiss { tent, started } => {
                let done = frame.saturating_sub(started) >= world.tuning.tent_piss_duration;
                (done || !world.contains(tent)).then_some(CharacterState::Idle)
            }
            CharacterState::FreeAimPiss { area } => {
                if !input.action {
                    return Some(CharacterState::Idle);
                }
                let drain = world.tuning.piss_drain;
                world.spend_beer(id, drain);
                let beer = world.actor(id).map(|a| a.beer).unwrap_or(0.0);
                if beer <= 0.0 {
                    return Some(CharacterState::Idle);
                }
                if let (Some(area), Some(player)) = (area, world.get(id)) {
                    let origin = player.centroid();
                    let reach = world.tuning.piss_reach;
                    let end = origin + step_toward(origin, input.pointer, reach);
                    world.move_effect_area(area, end);
                }
                None
            }
            CharacterState::BigPiss { area, started } => {
                if frame.saturating_sub(started) >= world.tuning.big_piss_duration {
                    return Some(CharacterState::Idle);
                }
                if let (Some(area), Some(player)) = (area, world.get(id)) {
                    let center = player.centroid();
                    world.move_effect_area(area, center);
                }
                None
            }
        }
    }

    pub fn exit(&self, id: EntityId, world: &mut World) {
        match *self {
            CharacterState::Idle
            | CharacterState::TargetSeeking { .. }
            | CharacterState::Fleeing { .. } => {}
            CharacterState::TentSmash { tent, .. } => {
                world.smash_tent(tent);
                world.cue(SoundCue::Impact);
            }
            CharacterState::TentPiss { tent, .. } => {
                world.piss_tent(tent);
            }
            CharacterState::FreeAimPiss { area } | CharacterState::BigPiss { area, .. } => {
                if let Some(area) = area {
                    world.remove(area);
                }
                world.cue(SoundCue::PissStop);
                log::trace!("{id} stopped pissing");
            }
        }
    }
}

/// Pathfinding, waypoint following and final approach toward `destination`
fn seek(id: EntityId, destination: EntityId, world: &mut World) -> Option<CharacterState> {
    if !world.tent_usable(destination) {
        log::debug!("{id} abandons {destination}: no longer usable");
        world.abandon_target(id);
        return Some(CharacterState::Idle);
    }
    let dest_centroid = world.get(destination).map(Entity::centroid)?;
    let epsilon = world.tuning.waypoint_epsilon;

    let entity = world.get_mut(id)?;
    let centroid = entity.centroid();
    let actor = entity.actor_mut()?;

    if actor.path.is_none() {
        match actor.path_request.take() {
            None => {
                actor.path_request = Some(PathRequest::Pending {
                    target: destination,
                    from: centroid,
                    to: dest_centroid,
                });
                return None;
            }
            Some(pending @ PathRequest::Pending { .. }) => {
                actor.path_request = Some(pending);
                return None;
            }
            Some(PathRequest::Resolved { target, result }) => {
                if target != destination {
                    // Stale result for an abandoned target; reissue next frame
                    return None;
                }
                match result {
                    Ok(points) => actor.path = Some(Path::new(points)),
                    Err(err) => {
                        log::warn!("{id} cannot reach {destination}: {err}");
                        world.abandon_target(id);
                        return Some(CharacterState::Idle);
                    }
                }
            }
        }
    }

    let waypoint = actor.path.as_ref().and_then(Path::next_point);
    let goal = waypoint.unwrap_or(dest_centroid);
    let delta = step_toward(centroid, goal, actor.speed);
    actor.record_move(delta);
    let reached = (centroid + delta).distance(goal) <= epsilon;
    if reached && waypoint.is_some() {
        if let Some(path) = actor.path.as_mut() {
            path.advance();
        }
    }
    entity.translate(delta);

    (reached && waypoint.is_none()).then_some(CharacterState::Idle)
}

/// Move directly away from `threat`, refusing steps onto blocked tiles
fn flee(id: EntityId, threat: Vec2, world: &mut World) {
    let speed = world.tuning.flee_speed;
    let Some(centroid) = world.get(id).map(Entity::centroid) else {
        return;
    };
    let mut dir = direction_to(threat, centroid);
    if dir == Vec2::ZERO {
        dir = Vec2::Y;
    }
    let delta = dir * speed;
    let delta = if world.grid().player_can_enter(centroid + delta) {
        delta
    } else {
        Vec2::ZERO
    };
    world.move_actor(id, delta);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::entity::SpawnKind;
    use crate::sim::events::GameEvent;
    use crate::sim::grid::WalkGrid;
    use crate::tuning::Tuning;

    fn world() -> World {
        World::new(WalkGrid::open(60, 60, 8.0), Tuning::default(), 3)
    }

    fn cues(world: &mut World) -> Vec<SoundCue> {
        world
            .drain_events()
            .into_iter()
            .filter_map(|e| match e {
                GameEvent::Cue(c) => Some(c),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_transition_runs_exit_then_enter_once() {
        let mut w = world();
        let player = w.spawn(SpawnKind::Player, Vec2::new(100.0, 100.0));
        if let Some(a) = w.actor_mut(player) {
            a.beer = 50.0;
        }
        w.transition_to(player, CharacterState::FreeAimPiss { area: None });
        let area = match w.actor(player).unwrap().state {
            CharacterState::FreeAimPiss { area } => area.unwrap(),
            other => panic!("unexpected state {other:?}"),
        };
        assert!(w.contains(area));

        w.transition_to(player, CharacterState::Idle);
        assert!(!w.contains(area));
        assert_eq!(cues(&mut w), vec![SoundCue::Piss, SoundCue::PissStop]);
    }

    #[test]
    fn test_free_aim_ends_on_release() {
        let mut w = world();
        let player = w.spawn(SpawnKind::Player, Vec2::new(100.0, 100.0));
        if let Some(a) = w.actor_mut(player) {
            a.beer = 50.0;
        }
        w.transition_to(player, CharacterState::FreeAimPiss { area: None });
        let held = TickInput {
            action: true,
            pointer: Vec2::new(300.0, 112.0),
            ..Default::default()
        };
        w.update_character(player, &held);
        let area = w.effect_areas()[0];
        let end = w.get(area).unwrap().centroid();
        assert!((end.x - (108.0 + w.tuning.piss_reach)).abs() < 0.01);

        w.update_character(player, &TickInput::default());
        assert_eq!(w.actor(player).unwrap().state, CharacterState::Idle);
        assert!(w.effect_areas().is_empty());
    }

    #[test]
    fn test_free_aim_ends_when_beer_runs_out() {
        let mut w = world();
        let player = w.spawn(SpawnKind::Player, Vec2::new(100.0, 100.0));
        let drain = w.tuning.piss_drain;
        if let Some(a) = w.actor_mut(player) {
            a.beer = drain;
        }
        w.transition_to(player, CharacterState::FreeAimPiss { area: None });
        let held = TickInput {
            action: true,
            ..Default::default()
        };
        w.update_character(player, &held);
        assert_eq!(w.actor(player).unwrap().state, CharacterState::Idle);
        assert_eq!(w.actor(player).unwrap().beer, 0.0);
    }

    #[test]
    fn test_free_aim_release_costs_no_beer() {
        let mut w = world();
        let player = w.spawn(SpawnKind::Player, Vec2::new(100.0, 100.0));
        if let Some(a) = w.actor_mut(player) {
            a.beer = 50.0;
        }
        w.transition_to(player, CharacterState::FreeAimPiss { area: None });
        w.update_character(player, &TickInput::default());
        let actor = w.actor(player).unwrap();
        assert_eq!(actor.state, CharacterState::Idle);
        assert_eq!(actor.beer, 50.0);
    }

    #[test]
    fn test_smash_damages_tent_on_exit() {
        let mut w = world();
        let player = w.spawn(SpawnKind::Player, Vec2::new(100.0, 100.0));
        let tent = w.spawn(SpawnKind::Tent, Vec2::new(110.0, 100.0));
        let started = w.frame;
        w.transition_to(player, CharacterState::TentSmash { tent, started });
        assert_eq!(w.get(tent).and_then(Entity::tent).unwrap().damage_taken, 0);

        w.frame += w.tuning.smash_duration;
        w.update_character(player, &TickInput::default());
        assert_eq!(w.get(tent).and_then(Entity::tent).unwrap().damage_taken, 1);
        assert_eq!(cues(&mut w), vec![SoundCue::Smash, SoundCue::Impact]);
    }

    #[test]
    fn test_fleeing_reverts_to_idle_after_duration() {
        let mut w = world();
        let goer = w.spawn(SpawnKind::FestivalGoer, Vec2::new(200.0, 200.0));
        let started = w.frame;
        w.transition_to(
            goer,
            CharacterState::Fleeing {
                threat: Vec2::new(190.0, 212.0),
                started,
            },
        );
        let before = w.get(goer).unwrap().centroid();
        w.update_character(goer, &TickInput::default());
        let after = w.get(goer).unwrap().centroid();
        assert!(after.x > before.x);

        w.frame += w.tuning.flee_duration;
        w.update_character(goer, &TickInput::default());
        assert_eq!(w.actor(goer).unwrap().state, CharacterState::Idle);
    }

    #[test]
    fn test_seek_discards_result_for_old_target() {
        let mut w = world();
        let goer = w.spawn(SpawnKind::FestivalGoer, Vec2::new(40.0, 40.0));
        let old = w.spawn(SpawnKind::Tent, Vec2::new(200.0, 40.0));
        let new = w.spawn(SpawnKind::Tent, Vec2::new(40.0, 200.0));
        w.transition_to(goer, CharacterState::TargetSeeking { destination: new });
        if let Some(a) = w.actor_mut(goer) {
            a.path_request = Some(PathRequest::Resolved {
                target: old,
                result: Ok(vec![Vec2::ZERO]),
            });
        }
        w.update_character(goer, &TickInput::default());
        let actor = w.actor(goer).unwrap();
        assert!(actor.path.is_none());
        assert!(actor.path_request.is_none());
        assert_eq!(actor.target, Some(new));
    }

    #[test]
    fn test_seek_abandons_unusable_target() {
        let mut w = world();
        let goer = w.spawn(SpawnKind::FestivalGoer, Vec2::new(40.0, 40.0));
        let tent = w.spawn(SpawnKind::Tent, Vec2::new(200.0, 40.0));
        w.transition_to(goer, CharacterState::TargetSeeking { destination: tent });
        if let Some(t) = w.get_mut(tent).and_then(Entity::tent_mut) {
            t.occupied = true;
        }
        w.update_character(goer, &TickInput::default());
        let actor = w.actor(goer).unwrap();
        assert_eq!(actor.state, CharacterState::Idle);
        assert!(actor.target.is_none());
        assert!(actor.retry_at > w.frame);
    }
}
