//! Broad-phase collision detection and resolution
//!
//! Axis-aligned rectangle overlap over every pair of enabled entities. The
//! scan is read-only and produces [`Contact`]s; resolution applies them one at
//! a time afterwards, re-validating each against the live world since an
//! earlier contact may have removed or changed the entities involved.

use std::collections::HashSet;

use glam::Vec2;

use super::character::CharacterState;
use super::entity::{Entity, EntityId, EntityKind};
use super::world::World;

/// Resolution effect for one ordered overlapping pair
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Contact {
    /// Player walked into something solid
    BlockPlayer { player: EntityId },
    /// Goer touched an effect area
    Scare { goer: EntityId, threat: Vec2 },
    /// Goer reached the tent it was seeking
    ArriveAtTarget { goer: EntityId, tent: EntityId },
    /// Goer pressed against a tent it is not seeking
    Stuck { goer: EntityId },
    /// Effect area over a tent
    PissOnTent { tent: EntityId, area: EntityId },
    /// Player over a pickup
    CollectPickup { player: EntityId, item: EntityId },
}

/// Overlap test for world-space rects given as (top-left, bottom-right).
///
/// Touching edges do not overlap.
#[inline]
pub fn rects_overlap(a: (Vec2, Vec2), b: (Vec2, Vec2)) -> bool {
    let (a_min, a_max) = a;
    let (b_min, b_max) = b;
    !(a_max.x <= b_min.x || b_max.x <= a_min.x || a_max.y <= b_min.y || b_max.y <= a_min.y)
}

/// Overlap test between two entities' world bounding boxes
#[inline]
pub fn overlaps(a: &Entity, b: &Entity) -> bool {
    rects_overlap(a.world_rect(), b.world_rect())
}

/// All overlapping unordered pairs among enabled entities (O(n^2))
pub fn detect(entities: &[&Entity]) -> Vec<(EntityId, EntityId)> {
    let enabled: Vec<&Entity> = entities.iter().copied().filter(|e| e.enabled).collect();
    let mut pairs = Vec::new();
    for (i, a) in enabled.iter().enumerate() {
        for b in &enabled[i + 1..] {
            if overlaps(a, b) {
                pairs.push((a.id(), b.id()));
            }
        }
    }
    pairs
}

/// Resolution policy for the ordered pair (a, b)
pub fn classify(a: &Entity, b: &Entity) -> Option<Contact> {
    match (&a.kind, &b.kind) {
        (EntityKind::Player(_), EntityKind::BeerCrate(pickup)) if pickup.state.is_available() => {
            Some(Contact::CollectPickup {
                player: a.id(),
                item: b.id(),
            })
        }
        (EntityKind::Player(_), _) if b.solid => Some(Contact::BlockPlayer { player: a.id() }),
        (EntityKind::FestivalGoer(_), EntityKind::PissArea(_)) => Some(Contact::Scare {
            goer: a.id(),
            threat: b.centroid(),
        }),
        (EntityKind::FestivalGoer(actor), EntityKind::Tent(_)) => {
            if actor.target == Some(b.id()) {
                Some(Contact::ArriveAtTarget {
                    goer: a.id(),
                    tent: b.id(),
                })
            } else {
                Some(Contact::Stuck { goer: a.id() })
            }
        }
        (EntityKind::Tent(_), EntityKind::PissArea(_)) => Some(Contact::PissOnTent {
            tent: a.id(),
            area: b.id(),
        }),
        _ => None,
    }
}

/// Scan the world and collect contacts for both orders of every overlap
pub fn collect_contacts(world: &World) -> Vec<Contact> {
    let entities: Vec<&Entity> = world.entities().map(|(_, e)| e).collect();
    let mut contacts = Vec::new();
    for (a_id, b_id) in detect(&entities) {
        let (Some(a), Some(b)) = (world.get(a_id), world.get(b_id)) else {
            continue;
        };
        contacts.extend(classify(a, b));
        contacts.extend(classify(b, a));
    }
    contacts
}

/// Apply contacts serially
pub fn resolve(world: &mut World, contacts: &[Contact]) {
    let mut rolled_back: HashSet<EntityId> = HashSet::new();

    for contact in contacts {
        match *contact {
            Contact::BlockPlayer { player } => {
                // One rollback per frame no matter how many solids overlap
                if !rolled_back.insert(player) {
                    continue;
                }
                if let Some(entity) = world.get_mut(player) {
                    let undo = entity.actor().map(|a| a.last_move).unwrap_or(Vec2::ZERO);
                    entity.translate(-undo);
                    if let Some(actor) = entity.actor_mut() {
                        actor.last_move = Vec2::ZERO;
                    }
                }
            }
            Contact::Scare { goer, threat } => {
                let already_fleeing = world
                    .get(goer)
                    .and_then(Entity::actor)
                    .is_none_or(|a| matches!(a.state, CharacterState::Fleeing { .. }));
                if !already_fleeing {
                    log::debug!("goer {goer} scared by piss at {threat:?}");
                    let started = world.frame;
                    world.transition_to(goer, CharacterState::Fleeing { threat, started });
                }
            }
            Contact::ArriveAtTarget { goer, tent } => {
                world.try_enter_tent(goer, tent);
            }
            Contact::Stuck { goer } => {
                if let Some(actor) = world.get_mut(goer).and_then(Entity::actor_mut) {
                    actor.stuck = true;
                }
            }
            Contact::PissOnTent { tent, area } => {
                if let Some(t) = world.get_mut(tent).and_then(Entity::tent_mut) {
                    t.piss_contact = Some(area);
                }
            }
            Contact::CollectPickup { player, item } => {
                world.collect_pickup(player, item);
            }
        }
    }
}

/// Full collision pass: read-only scan, then serial resolution
pub fn detect_and_resolve(world: &mut World) {
    let contacts = collect_contacts(world);
    if !contacts.is_empty() {
        log::trace!("frame {}: {} contacts", world.frame, contacts.len());
    }
    resolve(world, &contacts);
}
