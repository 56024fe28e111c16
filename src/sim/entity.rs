//! Entity model
//!
//! Every world object shares position, bounding box, flags and z-layer; what
//! it *is* lives in the closed [`EntityKind`] sum type.

use std::cell::Cell;
use std::fmt;
use std::str::FromStr;

use glam::Vec2;
use slotmap::{Key, new_key_type};

use super::character::CharacterState;
use super::pathfind::{Path, PathRequest};
use super::pickup::PickupState;
use crate::consts::*;
use crate::error::SimError;
use crate::tuning::Tuning;

new_key_type! {
    /// Stable entity handle; stale ids resolve to nothing after removal
    pub struct EntityId;
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let raw = self.data().as_ffi();
        write!(f, "#{}v{}", raw & 0xffff_ffff, raw >> 32)
    }
}

/// Local-space bounding box offsets relative to the entity position
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub top_left: Vec2,
    pub bottom_right: Vec2,
}

impl BoundingBox {
    pub const fn new(top_left: Vec2, bottom_right: Vec2) -> Self {
        Self {
            top_left,
            bottom_right,
        }
    }

    /// Box centered on the entity position
    pub fn centered(half: Vec2) -> Self {
        Self::new(-half, half)
    }

    pub fn size(&self) -> Vec2 {
        self.bottom_right - self.top_left
    }

    pub fn center(&self) -> Vec2 {
        (self.top_left + self.bottom_right) * 0.5
    }

    /// Grow every edge outward by `amount`
    pub fn expanded(&self, amount: f32) -> Self {
        Self::new(
            self.top_left - Vec2::splat(amount),
            self.bottom_right + Vec2::splat(amount),
        )
    }
}

/// Facing for walk animations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Facing {
    Up,
    #[default]
    Down,
    Left,
    Right,
}

impl Facing {
    /// Dominant axis of a movement delta; `None` when not moving
    pub fn from_delta(delta: Vec2) -> Option<Self> {
        if delta.length_squared() <= f32::EPSILON {
            return None;
        }
        Some(if delta.x.abs() > delta.y.abs() {
            if delta.x > 0.0 { Facing::Right } else { Facing::Left }
        } else if delta.y > 0.0 {
            Facing::Down
        } else {
            Facing::Up
        })
    }
}

/// Player or festival-goer
#[derive(Debug, Clone)]
pub struct Actor {
    pub state: CharacterState,
    /// Weak reference to the structure being sought
    pub target: Option<EntityId>,
    pub path: Option<Path>,
    pub path_request: Option<PathRequest>,
    pub last_move: Vec2,
    pub facing: Facing,
    /// Advances while moving, resets when still
    pub anim_frame: u32,
    /// Pixels per frame
    pub speed: f32,
    /// Colliding with a structure other than the target (visual only)
    pub stuck: bool,
    /// Player resource for piss attacks
    pub beer: f32,
    /// No target scan before this frame
    pub retry_at: u64,
}

impl Actor {
    pub fn new(speed: f32) -> Self {
        Self {
            state: CharacterState::Idle,
            target: None,
            path: None,
            path_request: None,
            last_move: Vec2::ZERO,
            facing: Facing::Down,
            anim_frame: 0,
            speed,
            stuck: false,
            beer: 0.0,
            retry_at: 0,
        }
    }

    /// Drop the target together with anything derived from it
    pub fn clear_target(&mut self) {
        self.target = None;
        self.path = None;
        self.path_request = None;
    }

    /// Movement bookkeeping after a translate
    pub fn record_move(&mut self, delta: Vec2) {
        self.last_move = delta;
        match Facing::from_delta(delta) {
            Some(facing) => {
                self.facing = facing;
                self.anim_frame = self.anim_frame.wrapping_add(1);
            }
            None => self.anim_frame = 0,
        }
    }
}

/// Capturable structure
#[derive(Debug, Clone)]
pub struct Tent {
    pub pissiness: u32,
    pub damage_taken: u32,
    pub occupied: bool,
    pub captured: bool,
    pub max_pissiness: u32,
    pub max_damage: u32,
    /// Tents within the adjacency radius, built lazily
    pub adjacency: Option<Vec<EntityId>>,
    /// Effect area seen intersecting during the last collision pass
    pub piss_contact: Option<EntityId>,
    pub last_pissed: Option<u64>,
    pub last_healed: u64,
    /// Visual flash after a hit lands
    pub hit_flash: u32,
}

impl Tent {
    pub fn new(max_damage: u32, max_pissiness: u32) -> Self {
        Self {
            pissiness: 0,
            damage_taken: 0,
            occupied: false,
            captured: false,
            max_pissiness,
            max_damage,
            adjacency: None,
            piss_contact: None,
            last_pissed: None,
            last_healed: 0,
            hit_flash: 0,
        }
    }

    pub fn is_ruined_by_player(&self) -> bool {
        self.damage_taken >= self.max_damage
    }

    pub fn is_ruined_by_piss(&self) -> bool {
        self.pissiness >= self.max_pissiness
    }

    pub fn is_ruined(&self) -> bool {
        self.is_ruined_by_player() || self.is_ruined_by_piss()
    }

    /// New visits and targeting allowed
    pub fn is_usable(&self) -> bool {
        !self.is_ruined() && !self.occupied && !self.captured
    }

    /// Add damage, saturating at the maximum
    pub fn smash(&mut self) {
        self.damage_taken = (self.damage_taken + 1).min(self.max_damage);
    }

    /// Add pissiness, saturating at the maximum
    pub fn piss(&mut self) {
        self.pissiness = (self.pissiness + 1).min(self.max_pissiness);
    }
}

/// Static obstacle variants
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObstacleKind {
    Fence,
    Stage,
    Toilet,
}

/// Respawning resource item
#[derive(Debug, Clone)]
pub struct Pickup {
    pub state: PickupState,
    pub beer: f32,
}

/// Transient area-of-effect entity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EffectArea {
    pub owner: EntityId,
}

/// What an entity is
#[derive(Debug, Clone)]
pub enum EntityKind {
    Player(Actor),
    FestivalGoer(Actor),
    Tent(Tent),
    Obstacle(ObstacleKind),
    BeerCrate(Pickup),
    PissArea(EffectArea),
}

/// Placement type names accepted from level data
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpawnKind {
    Player,
    FestivalGoer,
    Tent,
    Fence,
    Stage,
    Toilet,
    BeerCrate,
}

impl FromStr for SpawnKind {
    type Err = SimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "player" => Ok(SpawnKind::Player),
            "festival_goer" | "goer" => Ok(SpawnKind::FestivalGoer),
            "tent" => Ok(SpawnKind::Tent),
            "fence" => Ok(SpawnKind::Fence),
            "stage" => Ok(SpawnKind::Stage),
            "toilet" => Ok(SpawnKind::Toilet),
            "beer_crate" | "beer" => Ok(SpawnKind::BeerCrate),
            other => Err(SimError::UnknownSpawnType(other.to_string())),
        }
    }
}

impl SpawnKind {
    /// Fresh kind data for this placement type
    pub fn build(self, tuning: &Tuning) -> EntityKind {
        match self {
            SpawnKind::Player => EntityKind::Player(Actor::new(tuning.player_speed)),
            SpawnKind::FestivalGoer => EntityKind::FestivalGoer(Actor::new(tuning.goer_speed)),
            SpawnKind::Tent => EntityKind::Tent(Tent::new(tuning.max_damage, tuning.max_pissiness)),
            SpawnKind::Fence => EntityKind::Obstacle(ObstacleKind::Fence),
            SpawnKind::Stage => EntityKind::Obstacle(ObstacleKind::Stage),
            SpawnKind::Toilet => EntityKind::Obstacle(ObstacleKind::Toilet),
            SpawnKind::BeerCrate => EntityKind::BeerCrate(Pickup {
                state: PickupState::Available,
                beer: tuning.beer_per_crate,
            }),
        }
    }
}

impl EntityKind {
    /// Default (bbox, solid, z) for this kind
    fn defaults(&self) -> (BoundingBox, bool, i32) {
        let bbox = |l: f32, t: f32, r: f32, b: f32| BoundingBox::new(Vec2::new(l, t), Vec2::new(r, b));
        match self {
            EntityKind::Player(_) | EntityKind::FestivalGoer(_) => {
                (bbox(3.0, 8.0, 13.0, 16.0), false, Z_ACTOR)
            }
            EntityKind::Tent(_) => (bbox(0.0, 8.0, 32.0, 24.0), true, Z_STRUCTURE),
            EntityKind::Obstacle(ObstacleKind::Fence) => (bbox(0.0, 0.0, 32.0, 8.0), true, Z_STRUCTURE),
            EntityKind::Obstacle(ObstacleKind::Stage) => (bbox(0.0, 0.0, 96.0, 48.0), true, Z_STRUCTURE),
            EntityKind::Obstacle(ObstacleKind::Toilet) => (bbox(0.0, 4.0, 16.0, 24.0), true, Z_STRUCTURE),
            EntityKind::BeerCrate(_) => (bbox(2.0, 2.0, 14.0, 14.0), false, Z_GROUND),
            EntityKind::PissArea(_) => (BoundingBox::centered(Vec2::splat(6.0)), false, Z_EFFECT),
        }
    }
}

/// A world object
#[derive(Debug, Clone)]
pub struct Entity {
    id: EntityId,
    pos: Vec2,
    bbox: BoundingBox,
    /// Visible and collidable
    pub enabled: bool,
    /// Blocks player movement
    pub solid: bool,
    pub z: i32,
    centroid: Cell<Option<Vec2>>,
    pub kind: EntityKind,
}

impl Entity {
    pub fn new(id: EntityId, pos: Vec2, kind: EntityKind) -> Self {
        let (bbox, solid, z) = kind.defaults();
        Self {
            id,
            pos,
            bbox,
            enabled: true,
            solid,
            z,
            centroid: Cell::new(None),
            kind,
        }
    }

    #[inline]
    pub fn id(&self) -> EntityId {
        self.id
    }

    #[inline]
    pub fn position(&self) -> Vec2 {
        self.pos
    }

    pub fn set_position(&mut self, pos: Vec2) {
        self.pos = pos;
        self.centroid.set(None);
    }

    pub fn translate(&mut self, delta: Vec2) {
        self.set_position(self.pos + delta);
    }

    #[inline]
    pub fn bbox(&self) -> BoundingBox {
        self.bbox
    }

    pub fn set_bbox(&mut self, bbox: BoundingBox) {
        self.bbox = bbox;
        self.centroid.set(None);
    }

    /// World-space bbox center, cached until position or bbox changes
    pub fn centroid(&self) -> Vec2 {
        if let Some(c) = self.centroid.get() {
            return c;
        }
        let c = self.pos + self.bbox.center();
        self.centroid.set(Some(c));
        c
    }

    /// Move so that the centroid lands on `centroid`
    pub fn set_centroid(&mut self, centroid: Vec2) {
        self.set_position(centroid - self.bbox.center());
    }

    /// World-space (top-left, bottom-right)
    pub fn world_rect(&self) -> (Vec2, Vec2) {
        (self.pos + self.bbox.top_left, self.pos + self.bbox.bottom_right)
    }

    pub fn actor(&self) -> Option<&Actor> {
        match &self.kind {
            EntityKind::Player(a) | EntityKind::FestivalGoer(a) => Some(a),
            _ => None,
        }
    }

    pub fn actor_mut(&mut self) -> Option<&mut Actor> {
        match &mut self.kind {
            EntityKind::Player(a) | EntityKind::FestivalGoer(a) => Some(a),
            _ => None,
        }
    }

    pub fn tent(&self) -> Option<&Tent> {
        match &self.kind {
            EntityKind::Tent(t) => Some(t),
            _ => None,
        }
    }

    pub fn tent_mut(&mut self) -> Option<&mut Tent> {
        match &mut self.kind {
            EntityKind::Tent(t) => Some(t),
            _ => None,
        }
    }

    pub fn is_player(&self) -> bool {
        matches!(self.kind, EntityKind::Player(_))
    }

    pub fn is_goer(&self) -> bool {
        matches!(self.kind, EntityKind::FestivalGoer(_))
    }

    /// Static geometry that AI pathing must route around
    pub fn is_static_obstacle(&self) -> bool {
        matches!(self.kind, EntityKind::Tent(_) | EntityKind::Obstacle(_))
    }

    /// Renderer key for the current visual state
    pub fn sprite_state(&self) -> &'static str {
        match &self.kind {
            EntityKind::Player(actor) => match actor.state {
                CharacterState::TentSmash { .. } => "player_smash",
                CharacterState::TentPiss { .. }
                | CharacterState::FreeAimPiss { .. }
                | CharacterState::BigPiss { .. } => "player_piss",
                _ if actor.anim_frame > 0 => "player_walk",
                _ => "player_idle",
            },
            EntityKind::FestivalGoer(actor) => match actor.state {
                CharacterState::Fleeing { .. } => "goer_flee",
                _ if actor.stuck => "goer_stuck",
                _ if actor.anim_frame > 0 => "goer_walk",
                _ => "goer_idle",
            },
            EntityKind::Tent(tent) => {
                if tent.is_ruined_by_player() {
                    "tent_smashed"
                } else if tent.is_ruined_by_piss() {
                    "tent_soaked"
                } else if tent.occupied {
                    "tent_occupied"
                } else if tent.captured {
                    "tent_captured"
                } else {
                    "tent"
                }
            }
            EntityKind::Obstacle(ObstacleKind::Fence) => "fence",
            EntityKind::Obstacle(ObstacleKind::Stage) => "stage",
            EntityKind::Obstacle(ObstacleKind::Toilet) => "toilet",
            EntityKind::BeerCrate(_) => "beer_crate",
            EntityKind::PissArea(_) => "piss",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slotmap::SlotMap;

    fn spawn(kind: SpawnKind, pos: Vec2) -> Entity {
        let mut ids: SlotMap<EntityId, ()> = SlotMap::with_key();
        let id = ids.insert(());
        Entity::new(id, pos, kind.build(&Tuning::default()))
    }

    #[test]
    fn test_centroid_cache_invalidated_on_move() {
        let mut tent = spawn(SpawnKind::Tent, Vec2::ZERO);
        assert_eq!(tent.centroid(), Vec2::new(16.0, 16.0));
        tent.translate(Vec2::new(10.0, 0.0));
        assert_eq!(tent.centroid(), Vec2::new(26.0, 16.0));
        tent.set_centroid(Vec2::ZERO);
        assert_eq!(tent.centroid(), Vec2::ZERO);
    }

    #[test]
    fn test_unknown_spawn_type() {
        let err = "ferris_wheel".parse::<SpawnKind>().unwrap_err();
        assert!(matches!(err, SimError::UnknownSpawnType(ref s) if s == "ferris_wheel"));
        assert_eq!("tent".parse::<SpawnKind>().unwrap(), SpawnKind::Tent);
    }

    #[test]
    fn test_tent_usable_and_ruin() {
        let mut tent = Tent::new(3, 5);
        assert!(tent.is_usable());
        tent.damage_taken = 2;
        tent.smash();
        assert!(tent.is_ruined_by_player());
        assert!(!tent.is_usable());
        tent.smash();
        assert_eq!(tent.damage_taken, 3);

        let mut tent = Tent::new(3, 5);
        tent.occupied = true;
        assert!(!tent.is_usable());
    }

    #[test]
    fn test_clear_target_clears_path() {
        let mut actor = Actor::new(1.0);
        actor.target = Some(spawn(SpawnKind::Tent, Vec2::ZERO).id());
        actor.path = Some(Path::new(vec![Vec2::ZERO]));
        actor.clear_target();
        assert!(actor.target.is_none());
        assert!(actor.path.is_none());
        assert!(actor.path_request.is_none());
    }

    #[test]
    fn test_facing_from_delta() {
        assert_eq!(Facing::from_delta(Vec2::new(-2.0, 1.0)), Some(Facing::Left));
        assert_eq!(Facing::from_delta(Vec2::new(0.0, -1.0)), Some(Facing::Up));
        assert_eq!(Facing::from_delta(Vec2::ZERO), None);
    }

    #[test]
    fn test_sprite_state_reflects_tent() {
        let mut tent = spawn(SpawnKind::Tent, Vec2::ZERO);
        assert_eq!(tent.sprite_state(), "tent");
        if let Some(t) = tent.tent_mut() {
            t.pissiness = t.max_pissiness;
        }
        assert_eq!(tent.sprite_state(), "tent_soaked");
    }
}
