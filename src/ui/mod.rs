//! Observer UI
//!
//! Egui HUD for watching an encounter: boss frame, combat log and a top-down
//! arena view with telegraphs. It only consumes replicated output.

use bevy::prelude::*;

pub mod hud;
pub mod telegraphs;

pub use telegraphs::{ScreenShakeState, VisibleTelegraph, VisibleTelegraphs};

/// Plugin for the observer HUD (requires `EguiPlugin`)
pub struct UiPlugin;

impl Plugin for UiPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<VisibleTelegraphs>()
            .init_resource::<ScreenShakeState>()
            .add_systems(
                Update,
                (
                    telegraphs::track_telegraphs,
                    telegraphs::track_screen_shake,
                    // Side and top panels must claim space before the central panel
                    (hud::render_boss_panel, hud::render_combat_log, hud::render_arena).chain(),
                )
                    .chain()
                    .after(crate::encounter::systems::DirectorSystemPhase::Resolution),
            );
    }
}
