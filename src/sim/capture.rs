//! Ownership classification
//!
//! Tents within the adjacency radius of each other form groups. A group is
//! rebuilt from scratch on every relevant state change: ruined tents are
//! hard boundaries (colored on their own, never propagated through), an
//! occupied member makes the whole group contested, and an unoccupied group
//! small enough to claim is captured.

use std::collections::{HashMap, HashSet};

use glam::Vec2;

use super::entity::EntityId;

/// Group coloring
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TentGroup {
    /// Ruined; ignored for gameplay
    Green,
    /// Claimable and claimed
    Blue,
    /// Contested by an occupant
    Red,
}

/// State of one tent as seen by the classifier
#[derive(Debug, Clone, PartialEq)]
pub struct TentSnapshot {
    pub id: EntityId,
    pub ruined: bool,
    pub occupied: bool,
    pub captured: bool,
    pub adjacency: Vec<EntityId>,
}

/// Result of a full recompute
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CaptureOutcome {
    /// Colored tents; tents in oversized groups are absent
    pub colors: HashMap<EntityId, TentGroup>,
    /// Tents that flip from not captured to captured
    pub newly_captured: Vec<EntityId>,
    /// Tents that lose a previous capture
    pub revoked: Vec<EntityId>,
}

/// Ids of tents whose centroids lie within `radius` of `center` (excluding `own`)
pub fn adjacent_within(
    own: EntityId,
    center: Vec2,
    tents: &[(EntityId, Vec2)],
    radius: f32,
) -> Vec<EntityId> {
    tents
        .iter()
        .filter(|(id, c)| *id != own && c.distance(center) <= radius)
        .map(|(id, _)| *id)
        .collect()
}

/// Flood-fill every tent into groups and classify them.
///
/// Pure function of the snapshots: prior coloring is not consulted.
pub fn classify(tents: &[TentSnapshot], max_group: usize) -> CaptureOutcome {
    let index: HashMap<EntityId, usize> = tents.iter().enumerate().map(|(i, t)| (t.id, i)).collect();
    let mut visited: HashSet<EntityId> = HashSet::with_capacity(tents.len());
    let mut outcome = CaptureOutcome::default();

    for root in tents {
        if visited.contains(&root.id) {
            continue;
        }

        let mut group: Vec<usize> = Vec::new();
        let mut stack = vec![root.id];
        visited.insert(root.id);

        while let Some(id) = stack.pop() {
            let Some(&i) = index.get(&id) else {
                log::error!("adjacency references unknown tent {id}");
                continue;
            };
            group.push(i);
            let tent = &tents[i];
            if tent.ruined {
                // Boundary: colored, but connectivity stops here
                continue;
            }
            for &neighbor in &tent.adjacency {
                if visited.insert(neighbor) {
                    stack.push(neighbor);
                }
            }
        }

        let (ruined, live): (Vec<usize>, Vec<usize>) =
            group.into_iter().partition(|&i| tents[i].ruined);

        for i in ruined {
            outcome.colors.insert(tents[i].id, TentGroup::Green);
        }
        if live.is_empty() {
            continue;
        }

        let color = if live.len() > max_group {
            None
        } else if live.iter().any(|&i| tents[i].occupied) {
            Some(TentGroup::Red)
        } else {
            Some(TentGroup::Blue)
        };

        for i in live {
            let tent = &tents[i];
            match color {
                Some(TentGroup::Blue) => {
                    outcome.colors.insert(tent.id, TentGroup::Blue);
                    if !tent.captured {
                        outcome.newly_captured.push(tent.id);
                    }
                }
                Some(group_color) => {
                    outcome.colors.insert(tent.id, group_color);
                    if tent.captured {
                        outcome.revoked.push(tent.id);
                    }
                }
                None => {
                    if tent.captured {
                        outcome.revoked.push(tent.id);
                    }
                }
            }
        }
    }

    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use slotmap::SlotMap;

    fn ids(n: usize) -> Vec<EntityId> {
        let mut ids: SlotMap<EntityId, ()> = SlotMap::with_key();
        (0..n).map(|_| ids.insert(())).collect()
    }

    /// Tents in a line, each adjacent to its neighbours
    fn chain(ids: &[EntityId]) -> Vec<TentSnapshot> {
        ids.iter()
            .enumerate()
            .map(|(i, &id)| {
                let mut adjacency = Vec::new();
                if i > 0 {
                    adjacency.push(ids[i - 1]);
                }
                if i + 1 < ids.len() {
                    adjacency.push(ids[i + 1]);
                }
                TentSnapshot {
                    id,
                    ruined: false,
                    occupied: false,
                    captured: false,
                    adjacency,
                }
            })
            .collect()
    }

    #[test]
    fn test_free_group_is_blue_and_newly_captured() {
        let ids = ids(3);
        let outcome = classify(&chain(&ids), 5);
        assert!(ids.iter().all(|id| outcome.colors[id] == TentGroup::Blue));
        assert_eq!(outcome.newly_captured.len(), 3);
    }

    #[test]
    fn test_occupied_member_makes_group_red() {
        let ids = ids(3);
        let mut tents = chain(&ids);
        tents[2].occupied = true;
        let outcome = classify(&tents, 5);
        assert!(ids.iter().all(|id| outcome.colors[id] == TentGroup::Red));
        assert!(outcome.newly_captured.is_empty());
    }

    #[test]
    fn test_ruined_tent_blocks_propagation() {
        // 0 - 1(ruined) - 2(occupied): 0 must not turn red through 1
        let ids = ids(3);
        let mut tents = chain(&ids);
        tents[1].ruined = true;
        tents[2].occupied = true;
        let outcome = classify(&tents, 5);
        assert_eq!(outcome.colors[&ids[0]], TentGroup::Blue);
        assert_eq!(outcome.colors[&ids[1]], TentGroup::Green);
        assert_eq!(outcome.colors[&ids[2]], TentGroup::Red);
    }

    #[test]
    fn test_ruined_root_still_colored() {
        let ids = ids(2);
        let mut tents = chain(&ids);
        tents[0].ruined = true;
        let outcome = classify(&tents, 5);
        assert_eq!(outcome.colors[&ids[0]], TentGroup::Green);
        assert_eq!(outcome.colors[&ids[1]], TentGroup::Blue);
    }

    #[test]
    fn test_oversized_group_uncolored_and_revoked() {
        let ids = ids(4);
        let mut tents = chain(&ids);
        tents[0].captured = true;
        let outcome = classify(&tents, 3);
        assert!(outcome.colors.is_empty());
        assert_eq!(outcome.revoked, vec![ids[0]]);
    }

    #[test]
    fn test_already_captured_not_rewarded_twice() {
        let ids = ids(2);
        let mut tents = chain(&ids);
        tents[0].captured = true;
        let outcome = classify(&tents, 5);
        assert_eq!(outcome.newly_captured, vec![ids[1]]);
    }

    #[test]
    fn test_order_independent() {
        let ids = ids(5);
        let mut tents = chain(&ids);
        tents[2].ruined = true;
        tents[4].occupied = true;
        let forward = classify(&tents, 5);
        tents.reverse();
        let backward = classify(&tents, 5);
        assert_eq!(forward.colors, backward.colors);
    }

    #[test]
    fn test_adjacent_within_radius() {
        let ids = ids(3);
        let tents = vec![
            (ids[0], Vec2::ZERO),
            (ids[1], Vec2::new(10.0, 0.0)),
            (ids[2], Vec2::new(100.0, 0.0)),
        ];
        assert_eq!(adjacent_within(ids[0], Vec2::ZERO, &tents, 64.0), vec![ids[1]]);
    }
}
