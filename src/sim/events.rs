//! Side effects emitted for the audio and presentation layers
//!
//! Fire-and-forget: the simulation buffers events for the frame and the
//! harness drains them. Nothing here feeds back into simulation state.

use super::entity::EntityId;

/// Audio cue requests
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SoundCue {
    /// Smash wind-up starts
    Smash,
    /// Smash lands on a tent
    Impact,
    /// Piss stream starts
    Piss,
    /// Piss stream ends
    PissStop,
    BigPiss,
    Pickup,
    /// Goer settles into a tent
    Occupy,
    /// Occupant thrown out of a ruined tent
    Evict,
    /// Group claimed
    Capture,
    Flee,
}

/// Everything observable that happened during a frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameEvent {
    Cue(SoundCue),
    Occupied { tent: EntityId },
    Evicted { tent: EntityId, goer: EntityId },
    Ruined { tent: EntityId },
    Captured { tent: EntityId },
    Revoked { tent: EntityId },
    PickedUp { item: EntityId },
    Respawned { item: EntityId },
}

/// Harness-owned consumer of simulation events
pub trait EventSink {
    fn handle(&mut self, event: GameEvent);
}

impl EventSink for Vec<GameEvent> {
    fn handle(&mut self, event: GameEvent) {
        self.push(event);
    }
}
