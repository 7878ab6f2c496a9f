//! Director Systems API
//!
//! Stable entry point for adding the encounter simulation to an app. Both the
//! graphical observer and headless mode go through here rather than importing
//! individual systems.
//!
//! ## System Phases
//!
//! 1. **Timers** - encounter clock, health monitor, target provider
//! 2. **Decisions** - director ticks and decisions, charge collisions, boss movement
//! 3. **Resolution** - projectiles, player attacks, helper cleanup, snapshots
//!
//! ## Usage
//!
//! ```ignore
//! systems::configure_director_system_ordering(&mut app);
//! systems::add_core_director_systems(&mut app, || true);
//! ```

use bevy::prelude::*;

pub use super::attacks::player_auto_attack;
pub use super::director_systems::{
    acquire_boss_targets, advance_clock, cleanup_defeated_helpers, detect_charge_impacts,
    drive_directors, monitor_phase_thresholds, publish_snapshots,
};
pub use super::movement::chase_target;
pub use super::projectiles::{move_projectiles, process_projectile_hits};

pub use super::components::{
    Boss, BossProjectile, BossTarget, DecisionTimer, DisplayName, EncounterClock, EncounterEntity,
    Health, HelperPrefabs, PhaseMonitor, PlayerAttack, ReplicatedBoss, Unit, UnitIdAllocator,
};

/// System set labels for director system ordering.
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub enum DirectorSystemPhase {
    /// Clock, phase thresholds, target selection
    Timers,
    /// Director ticks, decisions, charge collisions, movement
    Decisions,
    /// Projectiles, player damage, cleanup, replication
    Resolution,
}

/// Configures the ordering between director system phases.
///
/// Call this once during app setup before adding director systems.
pub fn configure_director_system_ordering(app: &mut App) {
    app.configure_sets(
        Update,
        (
            DirectorSystemPhase::Timers,
            DirectorSystemPhase::Decisions,
            DirectorSystemPhase::Resolution,
        )
            .chain(),
    );
}

/// Adds the encounter simulation systems and the resources they need.
///
/// # Example
/// ```ignore
/// // Graphical observer
/// add_core_director_systems(&mut app, resource_exists::<BossProfile>);
///
/// // Headless (always run)
/// add_core_director_systems(&mut app, || true);
/// ```
pub fn add_core_director_systems<M>(app: &mut App, run_condition: impl Condition<M> + Clone)
where
    M: 'static,
{
    app.init_resource::<EncounterClock>()
        .init_resource::<UnitIdAllocator>()
        .init_resource::<HelperPrefabs>();

    // Phase 1: Timers
    app.add_systems(
        Update,
        (advance_clock, monitor_phase_thresholds, acquire_boss_targets)
            .chain()
            .in_set(DirectorSystemPhase::Timers)
            .run_if(run_condition.clone()),
    );

    // Phase 2: Decisions
    app.add_systems(
        Update,
        (drive_directors, detect_charge_impacts, chase_target)
            .chain()
            .in_set(DirectorSystemPhase::Decisions)
            .run_if(run_condition.clone()),
    );

    // Spawned helpers and projectiles must exist before resolution
    app.add_systems(
        Update,
        apply_deferred
            .after(DirectorSystemPhase::Decisions)
            .before(DirectorSystemPhase::Resolution)
            .run_if(run_condition.clone()),
    );

    // Phase 3: Resolution
    app.add_systems(
        Update,
        (
            move_projectiles,
            process_projectile_hits,
            player_auto_attack,
            cleanup_defeated_helpers,
            publish_snapshots,
        )
            .chain()
            .in_set(DirectorSystemPhase::Resolution)
            .run_if(run_condition),
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_phase_ordering() {
        assert_ne!(DirectorSystemPhase::Timers, DirectorSystemPhase::Decisions);
        assert_ne!(DirectorSystemPhase::Decisions, DirectorSystemPhase::Resolution);
    }
}
