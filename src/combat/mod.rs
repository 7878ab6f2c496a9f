//! Combat plumbing
//!
//! Bevy events that carry director output to observers, and the combat log.

use bevy::prelude::*;

pub mod events;
pub mod log;

use events::*;

/// Registers encounter events and the combat log
pub struct CombatPlugin;

impl Plugin for CombatPlugin {
    fn build(&self, app: &mut App) {
        app.add_event::<TelegraphEvent>()
            .add_event::<FeedbackEvent>()
            .add_event::<PhaseChangedEvent>()
            .add_event::<SnapshotEvent>()
            .init_resource::<log::CombatLog>();
    }
}
