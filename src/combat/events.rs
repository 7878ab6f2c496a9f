//! Encounter events
//!
//! Bevy-side carriers for what directors broadcast to observers. Observers
//! only ever read these; nothing writes back into a director from them.

use bevy::prelude::*;

use crate::director::{DirectorSnapshot, EntityId, Feedback, TelegraphCommand};

/// A telegraph was shown, updated or torn down.
#[derive(Event, Debug, Clone)]
pub struct TelegraphEvent {
    /// Boss that owns the telegraph
    pub boss: EntityId,
    pub command: TelegraphCommand,
}

/// Presentation feedback (shake, shield, buff, explosion).
#[derive(Event, Debug, Clone)]
pub struct FeedbackEvent {
    pub boss: EntityId,
    pub feedback: Feedback,
}

/// A boss entered a new phase. External AI resets its own state on this.
#[derive(Event, Debug, Clone)]
pub struct PhaseChangedEvent {
    pub boss: EntityId,
    pub phase_index: usize,
    pub phase_name: String,
}

/// A boss published a changed replicated snapshot.
#[derive(Event, Debug, Clone)]
pub struct SnapshotEvent {
    pub boss: EntityId,
    pub snapshot: DirectorSnapshot,
}
