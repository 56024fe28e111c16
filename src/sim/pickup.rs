//! Pickup state machine: Available <-> PickedUp

/// Pickup availability
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PickupState {
    #[default]
    Available,
    /// Taken on frame `at`; respawns `respawn_time` frames later
    PickedUp { at: u64 },
}

impl PickupState {
    pub fn is_available(self) -> bool {
        self == PickupState::Available
    }

    /// Transition on collection. `None` if already taken.
    pub fn pick_up(self, frame: u64) -> Option<PickupState> {
        match self {
            PickupState::Available => Some(PickupState::PickedUp { at: frame }),
            PickupState::PickedUp { .. } => None,
        }
    }

    /// Per-frame update; returns the next state when the respawn delay has
    /// elapsed. Calling again after the transition yields nothing.
    pub fn update(self, frame: u64, respawn_time: u64) -> Option<PickupState> {
        match self {
            PickupState::PickedUp { at } if frame.saturating_sub(at) >= respawn_time => {
                Some(PickupState::Available)
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pick_up_only_when_available() {
        let state = PickupState::Available;
        let taken = state.pick_up(10).unwrap();
        assert_eq!(taken, PickupState::PickedUp { at: 10 });
        assert!(taken.pick_up(11).is_none());
    }

    #[test]
    fn test_respawn_exactly_at_boundary() {
        let taken = PickupState::PickedUp { at: 100 };
        assert!(taken.update(149, 50).is_none());
        let back = taken.update(150, 50).unwrap();
        assert!(back.is_available());
        assert!(back.update(150, 50).is_none());
    }
}
