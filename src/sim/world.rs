//! World state
//!
//! Owns the entity arena, the walkability grid and all per-frame bookkeeping.
//! Entities refer to each other only by [`EntityId`]; removal purges every
//! such reference so nothing dangles.

use std::collections::{HashMap, HashSet};

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use slotmap::SlotMap;

use super::capture::{self, TentGroup, TentSnapshot};
use super::character::CharacterState;
use super::entity::{Actor, BoundingBox, EffectArea, Entity, EntityId, EntityKind, SpawnKind, Tent};
use super::events::{EventSink, GameEvent, SoundCue};
use super::grid::{Tile, WalkGrid, Walkability};
use super::pathfind::PathRequest;
use super::tick::TickInput;
use crate::error::SimResult;
use crate::level::Placement;
use crate::tuning::Tuning;

/// Camera rectangle the renderer should draw
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct View {
    pub center: Vec2,
    pub size: Vec2,
}

/// The simulation
#[derive(Debug, Clone)]
pub struct World {
    pub tuning: Tuning,
    /// Frames simulated so far
    pub frame: u64,
    pub score: u64,
    entities: SlotMap<EntityId, Entity>,
    grid: WalkGrid,
    player: Option<EntityId>,
    groups: HashMap<EntityId, TentGroup>,
    capture_dirty: bool,
    capture_trigger: Option<EntityId>,
    events: Vec<GameEvent>,
    rng: Pcg32,
    arrival_points: Vec<Vec2>,
    last_arrival: u64,
    view: View,
    pub(crate) last_input: TickInput,
}

impl World {
    pub fn new(grid: WalkGrid, tuning: Tuning, seed: u64) -> Self {
        let size = Vec2::new(tuning.view_width, tuning.view_height);
        let mut grid = grid;
        if tuning.walkable_search_radius > 0 {
            grid.set_search_radius(tuning.walkable_search_radius);
        }
        let center = grid.world_size() * 0.5;
        Self {
            tuning,
            frame: 0,
            score: 0,
            entities: SlotMap::with_key(),
            grid,
            player: None,
            groups: HashMap::new(),
            capture_dirty: false,
            capture_trigger: None,
            events: Vec::new(),
            rng: Pcg32::seed_from_u64(seed),
            arrival_points: Vec::new(),
            last_arrival: 0,
            view: View { center, size },
            last_input: TickInput::default(),
        }
    }

    // === Lookup ===

    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(id)
    }

    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.get_mut(id)
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.entities.contains_key(id)
    }

    pub fn actor(&self, id: EntityId) -> Option<&Actor> {
        self.get(id).and_then(Entity::actor)
    }

    pub fn actor_mut(&mut self, id: EntityId) -> Option<&mut Actor> {
        self.get_mut(id).and_then(Entity::actor_mut)
    }

    /// Live entities in slot order
    pub fn entities(&self) -> impl Iterator<Item = (EntityId, &Entity)> {
        self.entities.iter()
    }

    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    pub fn player_id(&self) -> Option<EntityId> {
        self.player
    }

    pub fn grid(&self) -> &WalkGrid {
        &self.grid
    }

    /// Ids matching a predicate, in slot order
    fn ids_where(&self, pred: impl Fn(&Entity) -> bool) -> Vec<EntityId> {
        self.entities
            .iter()
            .filter(|(_, e)| pred(e))
            .map(|(id, _)| id)
            .collect()
    }

    pub fn tent_ids(&self) -> Vec<EntityId> {
        self.ids_where(|e| e.tent().is_some())
    }

    pub fn goer_ids(&self) -> Vec<EntityId> {
        self.ids_where(Entity::is_goer)
    }

    pub fn effect_areas(&self) -> Vec<EntityId> {
        self.ids_where(|e| matches!(e.kind, EntityKind::PissArea(_)))
    }

    /// Ownership coloring from the last recompute
    pub fn groups(&self) -> &HashMap<EntityId, TentGroup> {
        &self.groups
    }

    pub fn view(&self) -> View {
        self.view
    }

    /// Enabled entities in draw order: z-layer, then depth, then id
    pub fn render_list(&self) -> Vec<&Entity> {
        let mut list: Vec<&Entity> = self.entities.iter().map(|(_, e)| e).filter(|e| e.enabled).collect();
        list.sort_by(|a, b| {
            a.z.cmp(&b.z)
                .then_with(|| a.centroid().y.total_cmp(&b.centroid().y))
                .then_with(|| a.id().cmp(&b.id()))
        });
        list
    }

    // === Spawning and removal ===

    fn insert(&mut self, pos: Vec2, kind: EntityKind) -> EntityId {
        self.entities.insert_with_key(|id| Entity::new(id, pos, kind))
    }

    /// Spawn a known entity type at `pos`.
    ///
    /// Static obstacles mark their footprint on the grid. Tents added after
    /// load need [`World::rebuild_tent_adjacency`].
    pub fn spawn(&mut self, kind: SpawnKind, pos: Vec2) -> EntityId {
        self.spawn_with(kind, pos, true)
    }

    /// Disabled entities leave the grid untouched
    fn spawn_with(&mut self, kind: SpawnKind, pos: Vec2, enabled: bool) -> EntityId {
        let data = kind.build(&self.tuning);
        let id = self.insert(pos, data);

        if let Some(entity) = self.entities.get_mut(id) {
            entity.enabled = enabled;
        }
        if let Some(entity) = self.entities.get(id) {
            if entity.enabled && entity.is_static_obstacle() {
                self.grid.mark_footprint_unwalkable(entity);
                if self.tuning.walkable_search_radius > 0 {
                    self.grid.set_search_radius(self.tuning.walkable_search_radius);
                }
            }
        }
        match kind {
            SpawnKind::Player => {
                if let Some(previous) = self.player.replace(id) {
                    log::warn!("second player spawned; {previous} is no longer controlled");
                }
            }
            SpawnKind::Tent => self.mark_capture_dirty(id),
            _ => {}
        }
        log::trace!("spawned {kind:?} {id} at {pos:?}");
        id
    }

    /// Spawn from level data; unknown types are an error
    pub fn spawn_placement(&mut self, placement: &Placement) -> SimResult<EntityId> {
        let kind: SpawnKind = placement.kind.parse()?;
        Ok(self.spawn_with(kind, placement.position, placement.enabled))
    }

    /// Spawn a festival-goer with an explicit speed
    pub fn spawn_goer(&mut self, pos: Vec2, speed: f32) -> EntityId {
        let id = self.spawn(SpawnKind::FestivalGoer, pos);
        if let Some(actor) = self.actor_mut(id) {
            actor.speed = speed;
        }
        id
    }

    pub fn spawn_effect_area(&mut self, owner: EntityId, center: Vec2, half: f32) -> EntityId {
        let id = self.insert(center, EntityKind::PissArea(EffectArea { owner }));
        if let Some(entity) = self.get_mut(id) {
            entity.set_bbox(BoundingBox::centered(Vec2::splat(half)));
            entity.set_centroid(center);
        }
        id
    }

    pub fn move_effect_area(&mut self, area: EntityId, center: Vec2) {
        if let Some(entity) = self.get_mut(area) {
            entity.set_centroid(center);
        }
    }

    /// Remove an entity and purge every reference to it.
    ///
    /// Effect areas owned by the removed entity go with it.
    pub fn remove(&mut self, id: EntityId) -> Option<Entity> {
        let removed = self.entities.remove(id)?;
        self.purge_references(id);
        if self.player == Some(id) {
            self.player = None;
        }
        if removed.tent().is_some() {
            self.groups.remove(&id);
            self.mark_capture_dirty(id);
        }
        for area in self.areas_owned_by(id) {
            self.remove(area);
        }
        Some(removed)
    }

    fn areas_owned_by(&self, owner: EntityId) -> Vec<EntityId> {
        self.ids_where(|e| matches!(&e.kind, EntityKind::PissArea(area) if area.owner == owner))
    }

    fn purge_references(&mut self, gone: EntityId) {
        for (_, entity) in self.entities.iter_mut() {
            match &mut entity.kind {
                EntityKind::Player(actor) | EntityKind::FestivalGoer(actor) => {
                    if actor.target == Some(gone) {
                        actor.clear_target();
                    }
                    if actor.path_request.as_ref().is_some_and(|r| r.target() == gone) {
                        actor.path_request = None;
                    }
                    if let CharacterState::FreeAimPiss { area } | CharacterState::BigPiss { area, .. } =
                        &mut actor.state
                    {
                        if *area == Some(gone) {
                            *area = None;
                        }
                    }
                }
                EntityKind::Tent(tent) => {
                    if tent.piss_contact == Some(gone) {
                        tent.piss_contact = None;
                    }
                    if let Some(adjacency) = tent.adjacency.as_mut() {
                        adjacency.retain(|&n| n != gone);
                    }
                }
                _ => {}
            }
        }
    }

    // === Editor entry points ===

    pub fn set_tile(&mut self, tile: Tile, value: Walkability) {
        self.grid.set_tile(tile, value);
    }

    pub fn toggle_tile(&mut self, tile: Tile) {
        self.grid.toggle_tile(tile);
    }

    /// Recompute every tent's neighbour list (after placement edits)
    pub fn rebuild_tent_adjacency(&mut self) {
        for (_, entity) in self.entities.iter_mut() {
            if let Some(tent) = entity.tent_mut() {
                tent.adjacency = None;
            }
        }
        self.ensure_adjacency();
        self.capture_dirty = true;
    }

    /// Build neighbour lists for tents that lack one
    fn ensure_adjacency(&mut self) {
        let centers: Vec<(EntityId, Vec2)> = self
            .entities
            .iter()
            .filter(|(_, e)| e.tent().is_some())
            .map(|(id, e)| (id, e.centroid()))
            .collect();
        let radius = self.tuning.adjacency_radius;
        for (id, entity) in self.entities.iter_mut() {
            let center = entity.centroid();
            if let Some(tent) = entity.tent_mut() {
                if tent.adjacency.is_none() {
                    tent.adjacency = Some(capture::adjacent_within(id, center, &centers, radius));
                }
            }
        }
    }

    pub fn set_arrival_points(&mut self, points: Vec<Vec2>) {
        self.arrival_points = points;
    }

    // === Events ===

    pub fn emit(&mut self, event: GameEvent) {
        self.events.push(event);
    }

    pub fn cue(&mut self, cue: SoundCue) {
        self.emit(GameEvent::Cue(cue));
    }

    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn flush_events(&mut self, sink: &mut impl EventSink) {
        for event in self.events.drain(..) {
            sink.handle(event);
        }
    }

    // === Character state ===

    /// Swap an actor's state: old `exit`, then new `enter`
    pub fn transition_to(&mut self, id: EntityId, next: CharacterState) {
        let Some(actor) = self.actor_mut(id) else {
            log::error!("transition for non-actor {id}");
            return;
        };
        let old = std::mem::take(&mut actor.state);
        log::debug!("{id}: {} -> {}", old.name(), next.name());
        old.exit(id, self);
        let mut next = next;
        next.enter(id, self);
        if let Some(actor) = self.actor_mut(id) {
            actor.state = next;
        }
    }

    /// Run one state update and any transition it asks for
    pub fn update_character(&mut self, id: EntityId, input: &TickInput) {
        let Some(actor) = self.actor_mut(id) else {
            return;
        };
        let mut state = std::mem::take(&mut actor.state);
        let next = state.update(id, self, input);
        let Some(actor) = self.actor_mut(id) else {
            return;
        };
        actor.state = state;
        if let Some(next) = next {
            self.transition_to(id, next);
        }
    }

    pub fn move_actor(&mut self, id: EntityId, delta: Vec2) {
        if let Some(entity) = self.get_mut(id) {
            entity.translate(delta);
            if let Some(actor) = entity.actor_mut() {
                actor.record_move(delta);
            }
        }
    }

    pub fn spend_beer(&mut self, id: EntityId, amount: f32) {
        if let Some(actor) = self.actor_mut(id) {
            actor.beer = (actor.beer - amount).max(0.0);
        }
    }

    /// Drop the target and back off before scanning again
    pub fn abandon_target(&mut self, id: EntityId) {
        let retry_at = self.frame + self.tuning.acquire_retry;
        if let Some(actor) = self.actor_mut(id) {
            actor.clear_target();
            actor.retry_at = retry_at;
        }
    }

    // === Tents ===

    pub fn tent_usable(&self, id: EntityId) -> bool {
        self.get(id)
            .filter(|e| e.enabled)
            .and_then(Entity::tent)
            .is_some_and(Tent::is_usable)
    }

    /// Closest non-ruined tent within touching reach of `actor`
    pub fn tent_touching(&self, actor: EntityId) -> Option<EntityId> {
        let entity = self.get(actor)?;
        let reach = entity.bbox().expanded(self.tuning.touch_reach);
        let rect = (entity.position() + reach.top_left, entity.position() + reach.bottom_right);
        let center = entity.centroid();
        self.entities
            .iter()
            .filter(|(_, e)| e.enabled && e.tent().is_some_and(|t| !t.is_ruined()))
            .filter(|(_, e)| super::collision::rects_overlap(rect, e.world_rect()))
            .min_by(|(a_id, a), (b_id, b)| {
                a.centroid()
                    .distance(center)
                    .total_cmp(&b.centroid().distance(center))
                    .then_with(|| a_id.cmp(b_id))
            })
            .map(|(id, _)| id)
    }

    /// Apply a mutation to a tent and handle ruin/eviction fallout
    fn change_tent(&mut self, id: EntityId, flash: bool, change: impl FnOnce(&mut Tent)) {
        let flash_frames = self.tuning.hit_flash_frames;
        let Some(tent) = self.get_mut(id).and_then(Entity::tent_mut) else {
            log::debug!("tent {id} vanished before change applied");
            return;
        };
        let was_ruined = tent.is_ruined();
        change(tent);
        if flash {
            tent.hit_flash = flash_frames;
        }
        let now_ruined = tent.is_ruined();
        let occupied = tent.occupied;

        self.mark_capture_dirty(id);
        if !was_ruined && now_ruined {
            self.emit(GameEvent::Ruined { tent: id });
            if occupied {
                self.evict(id);
            }
        }
    }

    pub fn smash_tent(&mut self, id: EntityId) {
        self.change_tent(id, true, Tent::smash);
    }

    /// Soak a tent; drying restarts from now
    pub fn piss_tent(&mut self, id: EntityId) {
        let frame = self.frame;
        self.change_tent(id, true, |t| {
            t.piss();
            t.last_healed = frame;
        });
    }

    /// Throw the occupant out of a tent
    fn evict(&mut self, tent: EntityId) {
        let Some(entity) = self.get_mut(tent) else {
            return;
        };
        let center = entity.centroid();
        if let Some(t) = entity.tent_mut() {
            t.occupied = false;
        }
        let speed = self.tuning.goer_speed;
        let goer = self.spawn_goer(center, speed);
        if let Some(e) = self.get_mut(goer) {
            e.set_centroid(center);
        }
        let started = self.frame;
        self.transition_to(goer, CharacterState::Fleeing { threat: center, started });
        self.emit(GameEvent::Evicted { tent, goer });
        self.cue(SoundCue::Evict);
        self.mark_capture_dirty(tent);
        log::info!("goer {goer} evicted from ruined tent {tent}");
    }

    /// Goer walked into its target: occupy if still usable, else give up
    pub fn try_enter_tent(&mut self, goer: EntityId, tent: EntityId) -> bool {
        if !self.contains(goer) {
            return false;
        }
        if self.tent_usable(tent) {
            if let Some(t) = self.get_mut(tent).and_then(Entity::tent_mut) {
                t.occupied = true;
            }
            self.remove(goer);
            self.emit(GameEvent::Occupied { tent });
            self.cue(SoundCue::Occupy);
            self.mark_capture_dirty(tent);
            log::debug!("goer {goer} occupied tent {tent}");
            return true;
        }

        log::debug!("goer {goer} lost the race for tent {tent}");
        self.abandon_target(goer);
        let seeking = self
            .actor(goer)
            .is_some_and(|a| matches!(a.state, CharacterState::TargetSeeking { .. }));
        if seeking {
            self.transition_to(goer, CharacterState::Idle);
        }
        false
    }

    pub fn mark_capture_dirty(&mut self, trigger: EntityId) {
        self.capture_dirty = true;
        self.capture_trigger = Some(trigger);
    }

    pub fn capture_dirty(&self) -> bool {
        self.capture_dirty
    }

    /// Rebuild the whole ownership coloring from current tent state
    pub fn recompute_groups(&mut self) {
        self.ensure_adjacency();
        let trigger = self.capture_trigger.take();
        self.capture_dirty = false;

        let snapshots: Vec<TentSnapshot> = self
            .entities
            .iter()
            .filter_map(|(id, e)| {
                let tent = e.tent()?;
                let adjacency = tent.adjacency.clone().unwrap_or_else(|| {
                    log::error!("tent {id} has no adjacency list");
                    Vec::new()
                });
                Some(TentSnapshot {
                    id,
                    ruined: tent.is_ruined(),
                    occupied: tent.occupied,
                    captured: tent.captured,
                    adjacency,
                })
            })
            .collect();

        let outcome = capture::classify(&snapshots, self.tuning.max_capture_group);

        for &id in &outcome.newly_captured {
            if let Some(tent) = self.get_mut(id).and_then(Entity::tent_mut) {
                tent.captured = true;
            }
            self.score += self.tuning.capture_bonus;
            self.emit(GameEvent::Captured { tent: id });
        }
        if !outcome.newly_captured.is_empty() {
            self.cue(SoundCue::Capture);
            log::info!(
                "captured {} tents (trigger {:?}), score {}",
                outcome.newly_captured.len(),
                trigger,
                self.score
            );
        }
        for &id in &outcome.revoked {
            if let Some(tent) = self.get_mut(id).and_then(Entity::tent_mut) {
                tent.captured = false;
            }
            self.emit(GameEvent::Revoked { tent: id });
        }
        if !outcome.revoked.is_empty() {
            log::info!("revoked {} captured tents", outcome.revoked.len());
        }

        self.groups = outcome.colors;
    }

    // === Per-frame stages (driven by `tick`) ===

    /// Reset per-frame actor flags
    pub(crate) fn begin_frame(&mut self) {
        for (_, entity) in self.entities.iter_mut() {
            if let Some(actor) = entity.actor_mut() {
                actor.last_move = Vec2::ZERO;
                actor.stuck = false;
            }
        }
    }

    /// Actors that did not move this frame stop animating
    pub(crate) fn end_actor_updates(&mut self) {
        for (_, entity) in self.entities.iter_mut() {
            if let Some(actor) = entity.actor_mut() {
                if actor.last_move == Vec2::ZERO {
                    actor.anim_frame = 0;
                }
            }
        }
    }

    /// Closest usable tent nobody else targets, else the closest usable one
    pub fn acquire_target(&self, goer: EntityId) -> Option<EntityId> {
        let center = self.get(goer)?.centroid();
        let targeted: HashSet<EntityId> = self
            .entities
            .iter()
            .filter(|(id, _)| *id != goer)
            .filter_map(|(_, e)| e.actor()?.target)
            .collect();

        let mut candidates: Vec<(EntityId, f32)> = self
            .entities
            .iter()
            .filter(|(id, _)| self.tent_usable(*id))
            .map(|(id, e)| (id, e.centroid().distance(center)))
            .collect();
        candidates.sort_by(|a, b| a.1.total_cmp(&b.1).then_with(|| a.0.cmp(&b.0)));

        candidates
            .iter()
            .find(|(id, _)| !targeted.contains(id))
            .or_else(|| candidates.first())
            .map(|(id, _)| *id)
    }

    pub(crate) fn update_goers(&mut self, input: &TickInput) {
        for id in self.goer_ids() {
            let Some(actor) = self.actor(id) else {
                continue;
            };
            let wants_target = actor.state == CharacterState::Idle
                && actor.target.is_none()
                && self.frame >= actor.retry_at;
            if wants_target {
                let found = self.acquire_target(id);
                let retry_at = self.frame + self.tuning.acquire_retry;
                if let Some(actor) = self.actor_mut(id) {
                    match found {
                        Some(tent) => actor.target = Some(tent),
                        None => actor.retry_at = retry_at,
                    }
                }
            }
            self.update_character(id, input);
        }
    }

    /// Throttled piss accumulation, slow drying, flash decay
    pub(crate) fn update_tents(&mut self) {
        let frame = self.frame;
        let piss_cooldown = self.tuning.piss_cooldown;
        let heal_cooldown = self.tuning.heal_cooldown;

        for id in self.tent_ids() {
            let Some(tent) = self.get_mut(id).and_then(Entity::tent_mut) else {
                continue;
            };
            tent.hit_flash = tent.hit_flash.saturating_sub(1);
            let contact = tent.piss_contact.take();
            let ready = tent
                .last_pissed
                .is_none_or(|at| frame.saturating_sub(at) >= piss_cooldown);
            let can_heal =
                tent.pissiness > 0 && frame.saturating_sub(tent.last_healed) >= heal_cooldown;

            if contact.is_some() {
                if ready {
                    tent.last_pissed = Some(frame);
                    self.piss_tent(id);
                }
            } else if can_heal {
                tent.last_healed = frame;
                self.change_tent(id, false, |t| t.pissiness -= 1);
            }
        }
    }

    pub(crate) fn update_pickups(&mut self) {
        let frame = self.frame;
        let respawn = self.tuning.respawn_time;
        let mut respawned = Vec::new();
        for (id, entity) in self.entities.iter_mut() {
            let EntityKind::BeerCrate(pickup) = &mut entity.kind else {
                continue;
            };
            if let Some(next) = pickup.state.update(frame, respawn) {
                pickup.state = next;
                entity.enabled = true;
                respawned.push(id);
            }
        }
        for item in respawned {
            self.emit(GameEvent::Respawned { item });
        }
    }

    /// Player grabbed a pickup
    pub fn collect_pickup(&mut self, player: EntityId, item: EntityId) {
        let frame = self.frame;
        let Some(entity) = self.get_mut(item) else {
            return;
        };
        let EntityKind::BeerCrate(pickup) = &mut entity.kind else {
            log::error!("collect_pickup on non-pickup {item}");
            return;
        };
        let Some(next) = pickup.state.pick_up(frame) else {
            return;
        };
        pickup.state = next;
        let beer = pickup.beer;
        entity.enabled = false;

        let capacity = self.tuning.beer_capacity;
        if let Some(actor) = self.actor_mut(player) {
            actor.beer = (actor.beer + beer).min(capacity);
        }
        self.emit(GameEvent::PickedUp { item });
        self.cue(SoundCue::Pickup);
    }

    /// Resolve pending path requests; results are read on the next update
    pub(crate) fn resolve_path_requests(&mut self) {
        let pending: Vec<(EntityId, EntityId, Vec2, Vec2)> = self
            .entities
            .iter()
            .filter_map(|(id, e)| match e.actor()?.path_request {
                Some(PathRequest::Pending { target, from, to }) => Some((id, target, from, to)),
                _ => None,
            })
            .collect();

        for (id, target, from, to) in pending {
            let result = self.grid.find_path(from, to);
            match &result {
                Ok(points) => log::trace!("{id} path to {target}: {} waypoints", points.len()),
                Err(err) => log::debug!("{id} path to {target} failed: {err}"),
            }
            if let Some(actor) = self.actor_mut(id) {
                actor.path_request = Some(PathRequest::Resolved { target, result });
            }
        }
    }

    /// Spawn a goer at a random arrival point on the arrival cadence
    pub(crate) fn spawn_arrivals(&mut self) {
        let interval = self.tuning.arrival_interval;
        if self.arrival_points.is_empty() || interval == 0 {
            return;
        }
        if self.frame.saturating_sub(self.last_arrival) < interval {
            return;
        }
        if self.goer_ids().len() >= self.tuning.max_goers {
            return;
        }

        let point = self.arrival_points[self.rng.random_range(0..self.arrival_points.len())];
        let jitter = self.tuning.goer_speed_jitter;
        let offset = if jitter > 0.0 {
            self.rng.random_range(-jitter..=jitter)
        } else {
            0.0
        };
        let speed = (self.tuning.goer_speed + offset).max(0.1);
        let id = self.spawn_goer(point, speed);
        self.last_arrival = self.frame;
        log::debug!("goer {id} arrived at {point:?} (speed {speed:.2})");
    }

    /// Center the view on the player, clamped to the world
    pub(crate) fn update_view(&mut self) {
        let Some(center) = self.player.and_then(|id| self.get(id)).map(Entity::centroid) else {
            return;
        };
        let world = self.grid.world_size();
        let half = self.view.size * 0.5;
        let clamp_axis = |c: f32, h: f32, w: f32| {
            if w <= h * 2.0 {
                w * 0.5
            } else {
                c.clamp(h, w - h)
            }
        };
        self.view.center = Vec2::new(
            clamp_axis(center.x, half.x, world.x),
            clamp_axis(center.y, half.y, world.y),
        );
    }
}
