//! Headless encounter execution
//!
//! Runs boss encounters without any graphical output, suitable for automated testing.

use bevy::app::ScheduleRunnerPlugin;
use bevy::prelude::*;
use bevy::time::TimeUpdateStrategy;
use std::time::Duration;

use crate::combat::log::{CombatLog, CombatLogEventType, EncounterMetadata, UnitMetadata};
use crate::combat::CombatPlugin;
use crate::director::{BossConfigPlugin, UnitKind};
use crate::encounter::setup_encounter;
// Use the stable systems API instead of importing internal systems directly
use crate::encounter::systems::{
    self, Boss, DisplayName, EncounterClock, Health, PlayerAttack, Unit,
};

use super::config::HeadlessEncounterConfig;

/// Fixed simulation step for headless runs
const HEADLESS_STEP_SECS: f64 = 1.0 / 60.0;

/// How an encounter ended
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EncounterOutcome {
    /// Every boss was defeated
    Victory,
    /// Every player was defeated
    Wipe,
    /// `max_duration_secs` elapsed first
    Timeout,
}

impl EncounterOutcome {
    pub fn label(self) -> &'static str {
        match self {
            EncounterOutcome::Victory => "Victory",
            EncounterOutcome::Wipe => "Wipe",
            EncounterOutcome::Timeout => "Timeout",
        }
    }
}

/// Result of a completed headless encounter
#[derive(Debug, Clone)]
pub struct EncounterResult {
    pub outcome: EncounterOutcome,
    /// Encounter duration in seconds
    pub duration: f32,
    /// Name of the phase the boss was in when the encounter ended
    pub final_phase: Option<String>,
    pub units: Vec<UnitResult>,
    pub random_seed: Option<u64>,
}

/// Statistics for a single unit after the encounter
#[derive(Debug, Clone)]
pub struct UnitResult {
    pub name: String,
    pub kind: UnitKind,
    pub max_health: f32,
    pub final_health: f32,
    pub survived: bool,
    pub damage_dealt: f32,
}

/// Resource to track headless encounter state
#[derive(Resource)]
pub struct HeadlessEncounterState {
    pub max_duration: f32,
    pub output_path: Option<String>,
    /// Skip writing the log to disk (used by tests)
    pub save_log: bool,
    pub complete: bool,
    pub random_seed: Option<u64>,
    pub result: Option<EncounterResult>,
}

/// Plugin for headless encounter execution
pub struct HeadlessPlugin {
    pub config: HeadlessEncounterConfig,
    pub save_log: bool,
}

impl Plugin for HeadlessPlugin {
    fn build(&self, app: &mut App) {
        app.insert_resource(self.config.to_encounter_setup())
            .insert_resource(HeadlessEncounterState {
                max_duration: self.config.max_duration_secs,
                output_path: self.config.output_path.clone(),
                save_log: self.save_log,
                complete: false,
                random_seed: self.config.random_seed,
                result: None,
            });

        systems::configure_director_system_ordering(app);

        // Always run in headless mode
        systems::add_core_director_systems(app, || true);

        app.add_systems(Startup, setup_encounter)
            .add_systems(
                Update,
                headless_check_encounter_end.after(systems::DirectorSystemPhase::Resolution),
            )
            .add_systems(PostUpdate, headless_exit_on_complete);
    }
}

type UnitQuery<'w, 's> = Query<
    'w,
    's,
    (
        &'static Unit,
        &'static Transform,
        Option<&'static Health>,
        Option<&'static DisplayName>,
        Option<&'static PlayerAttack>,
        Option<&'static Boss>,
    ),
>;

/// Check whether the encounter has ended (boss dead, players wiped, or timeout)
fn headless_check_encounter_end(
    units: UnitQuery,
    clock: Res<EncounterClock>,
    mut combat_log: ResMut<CombatLog>,
    mut state: ResMut<HeadlessEncounterState>,
) {
    if state.complete {
        return;
    }

    let alive = |kind: UnitKind| {
        units
            .iter()
            .any(|(unit, _, health, ..)| unit.kind == kind && health.is_some_and(Health::is_alive))
    };

    let outcome = if !alive(UnitKind::Boss) {
        info!("Encounter ended: boss defeated");
        EncounterOutcome::Victory
    } else if !alive(UnitKind::Player) {
        info!("Encounter ended: all players defeated");
        EncounterOutcome::Wipe
    } else if clock.elapsed >= state.max_duration {
        info!("Encounter timed out after {:.1}s", clock.elapsed);
        EncounterOutcome::Timeout
    } else {
        return;
    };

    combat_log.log(
        CombatLogEventType::EncounterEvent,
        format!("Encounter ended: {}", outcome.label()),
    );

    let result = build_encounter_result(&units, outcome, clock.elapsed, state.random_seed);
    if state.save_log {
        save_headless_encounter_log(&units, &combat_log, &result, state.output_path.as_deref());
    }
    state.result = Some(result);
    state.complete = true;
}

fn final_phase(units: &UnitQuery) -> Option<String> {
    units
        .iter()
        .find_map(|(.., boss)| boss.and_then(|b| b.director.phase_name().map(str::to_string)))
}

/// Build the EncounterResult from current unit state
fn build_encounter_result(
    units: &UnitQuery,
    outcome: EncounterOutcome,
    duration: f32,
    random_seed: Option<u64>,
) -> EncounterResult {
    let units_result = units
        .iter()
        .filter(|(unit, ..)| unit.kind != UnitKind::Obstacle)
        .map(|(unit, _, health, name, attack, _)| {
            let (max_health, final_health) = health.map_or((0.0, 0.0), |h| (h.max, h.current));
            UnitResult {
                name: name.map_or_else(|| unit.id.to_string(), |n| n.0.clone()),
                kind: unit.kind,
                max_health,
                final_health,
                survived: final_health > 0.0,
                damage_dealt: attack.map_or(0.0, |a| a.damage_dealt),
            }
        })
        .collect();

    EncounterResult {
        outcome,
        duration,
        final_phase: final_phase(units),
        units: units_result,
        random_seed,
    }
}

/// Save the combat log to a file
fn save_headless_encounter_log(
    units: &UnitQuery,
    combat_log: &CombatLog,
    result: &EncounterResult,
    output_path: Option<&str>,
) {
    let boss_profile = units
        .iter()
        .find_map(|(.., boss)| boss.map(|b| b.director.profile().name.clone()))
        .unwrap_or_default();

    let unit_metadata = units
        .iter()
        .map(|(unit, transform, health, name, attack, _)| UnitMetadata {
            id: unit.id.0,
            name: name.map_or_else(|| unit.id.to_string(), |n| n.0.clone()),
            kind: format!("{:?}", unit.kind),
            max_health: health.map_or(0.0, |h| h.max),
            final_health: health.map_or(0.0, |h| h.current),
            damage_dealt: attack.map_or(0.0, |a| a.damage_dealt),
            final_position: (
                transform.translation.x,
                transform.translation.y,
                transform.translation.z,
            ),
        })
        .collect();

    let metadata = EncounterMetadata {
        boss_profile,
        outcome: result.outcome.label().to_string(),
        duration_secs: result.duration,
        final_phase: result.final_phase.clone(),
        random_seed: result.random_seed,
        units: unit_metadata,
    };

    match combat_log.save_to_file(&metadata, output_path) {
        Ok(filename) => {
            println!("Encounter complete. Log saved to: {}", filename);
        }
        Err(e) => {
            eprintln!("Failed to save combat log: {}", e);
        }
    }
}

/// Exit the app when the encounter is complete
fn headless_exit_on_complete(state: Res<HeadlessEncounterState>, mut exit: EventWriter<AppExit>) {
    if state.complete {
        exit.send(AppExit::Success);
    }
}

/// Build a headless app that advances a fixed step per frame.
///
/// `run()` drives it with the loop runner; tests call `update()` directly.
pub fn build_headless_app(config: HeadlessEncounterConfig, save_log: bool) -> App {
    let step = Duration::from_secs_f64(HEADLESS_STEP_SECS);
    let mut app = App::new();
    // Minimal plugins - no window, no rendering
    app.add_plugins(MinimalPlugins.set(ScheduleRunnerPlugin::run_loop(step)))
        .add_plugins(TransformPlugin)
        .add_plugins(HierarchyPlugin)
        .insert_resource(TimeUpdateStrategy::ManualDuration(step))
        .add_plugins(BossConfigPlugin {
            path: config.boss_profile.clone(),
        })
        .add_plugins(CombatPlugin)
        .add_plugins(HeadlessPlugin { config, save_log });
    app
}

/// Run a headless encounter with the given configuration
pub fn run_headless_encounter(config: HeadlessEncounterConfig) -> Result<(), String> {
    config.validate()?;

    println!("Starting headless encounter simulation...");
    println!("  Boss profile: {}", config.boss_profile);
    println!("  Players: {}", config.players.len());
    println!("  Obstacles: {}", config.obstacles.len());
    println!("  Max duration: {:.0}s", config.max_duration_secs);

    build_headless_app(config, true).run();

    Ok(())
}
