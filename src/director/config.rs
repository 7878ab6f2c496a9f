//! Data-Driven Boss Configuration
//!
//! Abilities and phases are authored in RON (`assets/config/boss.ron`) instead
//! of being hardcoded. The raw [`BossConfig`] is resolved once into an
//! immutable [`BossProfile`] that directors share through an `Arc`.
//!
//! ## Usage
//! ```ignore
//! let profile = load_boss_profile("assets/config/boss.ron")?;
//! let director = BossDirector::new(EntityId(1), Arc::new(profile), Authority::Server);
//! ```

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

use super::arena::UnitKind;
use super::constants::*;
use super::error::ConfigError;

/// Default location of the authored boss profile.
pub const DEFAULT_PROFILE_PATH: &str = "assets/config/boss.ron";

// ============================================================================
// Abilities
// ============================================================================

/// Which units an ability may damage. The caster is always excluded.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DamageFilter {
    #[default]
    Players,
    /// Players and summoned helpers
    PlayersAndHelpers,
    /// Anything with health except obstacles
    All,
}

impl DamageFilter {
    pub fn accepts(self, kind: UnitKind) -> bool {
        match self {
            DamageFilter::Players => kind == UnitKind::Player,
            DamageFilter::PlayersAndHelpers => {
                matches!(kind, UnitKind::Player | UnitKind::Helper)
            }
            DamageFilter::All => kind != UnitKind::Obstacle,
        }
    }
}

/// Resolution shape of an ability, with its shape-specific parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum AbilityShape {
    /// Circle around the caster (ground pound)
    Area {
        radius: f32,
        #[serde(default)]
        knockback_force: f32,
    },
    /// Wedge toward the target direction captured at cast time
    Cone { radius: f32, arc_degrees: f32 },
    /// Repeated fans of projectiles aimed at the target
    ProjectileVolley {
        volley_count: u32,
        /// Seconds from the start of one volley to the start of the next
        volley_interval: f32,
        projectile_count: u32,
        shots_per_volley: u32,
        /// Seconds between synchronized shots within one volley
        #[serde(default)]
        shot_delay: f32,
        spread_angle: f32,
        range: f32,
        #[serde(default = "default_projectile_speed")]
        projectile_speed: f32,
    },
    /// Relocate, then channel a growing explosion (self-destruct)
    Channel {
        duration: f32,
        max_radius: f32,
        #[serde(default)]
        relocate_duration: f32,
        /// Point the caster moves to before channeling (arena origin if unset)
        #[serde(default)]
        anchor: Option<[f32; 3]>,
    },
}

fn default_projectile_speed() -> f32 {
    25.0
}

impl AbilityShape {
    pub fn label(&self) -> &'static str {
        match self {
            AbilityShape::Area { .. } => "Area",
            AbilityShape::Cone { .. } => "Cone",
            AbilityShape::ProjectileVolley { .. } => "ProjectileVolley",
            AbilityShape::Channel { .. } => "Channel",
        }
    }
}

/// Screen shake request attached to an ability's impact.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScreenShake {
    pub intensity: f32,
    pub duration: f32,
}

/// A boss ability as authored. Never mutated at runtime.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AbilityDefinition {
    /// Display name
    pub name: String,
    /// Base damage before the damage-dealt multiplier
    pub damage: f32,
    /// Minimum lockout of the pool this ability was picked from
    #[serde(default)]
    pub cooldown: f32,
    pub shape: AbilityShape,
    /// Telegraph time before the ability resolves
    #[serde(default)]
    pub windup_duration: f32,
    /// Target must be within this distance for the ability to be chosen
    #[serde(default)]
    pub min_activation_range: Option<f32>,
    #[serde(default)]
    pub damage_filter: DamageFilter,
    /// Visual/audio intent handle forwarded to observers
    #[serde(default)]
    pub intent: Option<String>,
    #[serde(default)]
    pub shake: Option<ScreenShake>,
}

// ============================================================================
// Phases
// ============================================================================

/// Policy used to choose the next ability of a phase.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum RotationMode {
    /// Cycle the primary pool in authored order
    #[default]
    Alternate,
    /// Random primary, then random secondary, then primary...
    PriorityRotate,
    /// Uniform over both pools
    Random,
}

/// Parameters of a charge set-piece.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChargeSettings {
    /// Number of charges performed back to back
    pub count: u32,
    /// Pause between consecutive charges
    pub pause_between: f32,
    /// Tracking telegraph duration before the aim point locks
    pub tracking_duration: f32,
    /// How long the locked aim is shown before the dash
    pub lock_duration: f32,
    pub speed: f32,
    pub max_distance: f32,
    pub hit_radius: f32,
    pub stun_duration: f32,
    pub obstacle_debuff_amount: f32,
    pub obstacle_debuff_duration: f32,
    pub miss_buff_amount: f32,
    pub miss_buff_duration: f32,
}

impl Default for ChargeSettings {
    fn default() -> Self {
        Self {
            count: 1,
            pause_between: CHARGE_PAUSE_BETWEEN,
            tracking_duration: CHARGE_TRACKING_DURATION,
            lock_duration: CHARGE_LOCK_DURATION,
            speed: CHARGE_SPEED,
            max_distance: CHARGE_MAX_DISTANCE,
            hit_radius: CHARGE_HIT_RADIUS,
            stun_duration: OBSTACLE_STUN_DURATION,
            obstacle_debuff_amount: OBSTACLE_DEBUFF_AMOUNT,
            obstacle_debuff_duration: OBSTACLE_DEBUFF_DURATION,
            miss_buff_amount: MISS_BUFF_AMOUNT,
            miss_buff_duration: MISS_BUFF_DURATION,
        }
    }
}

/// Parameters of a summon set-piece.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SummonSettings {
    /// Helper prefab name (skipped with a warning when unset or unknown)
    pub prefab: Option<String>,
    pub windup: f32,
    /// Fraction of max health the helper starts with
    pub hp_fraction: f32,
    pub enable_shield_from_add: bool,
    /// Incoming damage reduction while the helper lives (0.0 to 1.0)
    pub shield_reduction_ratio: f32,
    /// Spawn offset from the summoner
    pub spawn_offset: [f32; 3],
}

impl Default for SummonSettings {
    fn default() -> Self {
        Self {
            prefab: None,
            windup: 1.5,
            hp_fraction: 1.0,
            enable_shield_from_add: false,
            shield_reduction_ratio: 0.5,
            spawn_offset: [0.0, 0.0, 4.0],
        }
    }
}

/// One-time effect played when a phase begins.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum TransitionEffect {
    None,
    Charge(ChargeSettings),
    Summon(SummonSettings),
    /// Damage-taken reduction of `amount` for `duration` seconds
    Shield { amount: f32, duration: f32 },
    /// Damage-dealt increase of `amount` for `duration` seconds
    Enrage { amount: f32, duration: f32 },
}

impl TransitionEffect {
    pub fn label(&self) -> &'static str {
        match self {
            TransitionEffect::None => "None",
            TransitionEffect::Charge(_) => "Charge",
            TransitionEffect::Summon(_) => "Summon",
            TransitionEffect::Shield { .. } => "Shield",
            TransitionEffect::Enrage { .. } => "Enrage",
        }
    }
}

fn default_health_threshold() -> f32 {
    1.0
}

/// A phase as authored. Never mutated at runtime.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PhaseConfig {
    pub phase_name: String,
    /// Health fraction at or below which the health monitor enters this phase
    #[serde(default = "default_health_threshold")]
    pub health_threshold: f32,
    /// Played strictly in order when the phase begins
    #[serde(default)]
    pub transitions: Vec<TransitionEffect>,
    #[serde(default)]
    pub primary_ability_pool: Vec<String>,
    #[serde(default)]
    pub secondary_ability_pool: Vec<String>,
    #[serde(default)]
    pub rotation_mode: RotationMode,
    #[serde(default)]
    pub primary_cooldown: f32,
    #[serde(default)]
    pub secondary_cooldown: f32,
}

/// Root structure of a boss profile RON file.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BossConfig {
    pub name: String,
    /// Ability id -> definition
    pub abilities: HashMap<String, AbilityDefinition>,
    pub phases: Vec<PhaseConfig>,
    /// Seed for pool sampling and charge targeting (entropy if unset)
    #[serde(default)]
    pub seed: Option<u64>,
}

// ============================================================================
// Resolved profile
// ============================================================================

/// Handle to an ability inside a [`BossProfile`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AbilityId(pub usize);

/// A phase whose pool entries have been resolved to ability handles.
#[derive(Clone, Debug)]
pub struct ResolvedPhase {
    pub config: PhaseConfig,
    pub primary: Vec<AbilityId>,
    pub secondary: Vec<AbilityId>,
}

/// Immutable, validated boss configuration shared by directors.
#[derive(Resource, Clone, Debug)]
pub struct BossProfile {
    pub name: String,
    abilities: Vec<AbilityDefinition>,
    phases: Vec<ResolvedPhase>,
    pub seed: Option<u64>,
}

impl BossProfile {
    /// Resolve pool names into ability handles.
    ///
    /// Pool entries that name an unknown ability are configuration gaps: they
    /// are logged and dropped, never fatal.
    pub fn resolve(config: BossConfig) -> Self {
        let mut ids: Vec<&String> = config.abilities.keys().collect();
        ids.sort();

        let index: HashMap<&str, AbilityId> = ids
            .iter()
            .enumerate()
            .map(|(i, id)| (id.as_str(), AbilityId(i)))
            .collect();

        let resolve_pool = |phase: &str, pool: &[String]| -> Vec<AbilityId> {
            pool.iter()
                .filter_map(|name| {
                    let found = index.get(name.as_str()).copied();
                    if found.is_none() {
                        warn!(
                            "Boss '{}' phase '{}' references unknown ability '{}' - skipped",
                            config.name, phase, name
                        );
                    }
                    found
                })
                .collect()
        };

        let phases = config
            .phases
            .iter()
            .map(|phase| ResolvedPhase {
                primary: resolve_pool(&phase.phase_name, &phase.primary_ability_pool),
                secondary: resolve_pool(&phase.phase_name, &phase.secondary_ability_pool),
                config: phase.clone(),
            })
            .collect();

        let abilities = ids
            .iter()
            .map(|id| config.abilities[id.as_str()].clone())
            .collect();

        Self {
            name: config.name.clone(),
            abilities,
            phases,
            seed: config.seed,
        }
    }

    pub fn ability(&self, id: AbilityId) -> Option<&AbilityDefinition> {
        self.abilities.get(id.0)
    }

    /// Find an ability by its display name.
    pub fn ability_by_name(&self, name: &str) -> Option<(AbilityId, &AbilityDefinition)> {
        self.abilities
            .iter()
            .enumerate()
            .find(|(_, def)| def.name == name)
            .map(|(i, def)| (AbilityId(i), def))
    }

    pub fn phase(&self, index: usize) -> Option<&ResolvedPhase> {
        self.phases.get(index)
    }

    pub fn phases(&self) -> &[ResolvedPhase] {
        &self.phases
    }

    pub fn phase_count(&self) -> usize {
        self.phases.len()
    }

    pub fn ability_count(&self) -> usize {
        self.abilities.len()
    }
}

/// Structural checks that make a profile unusable when they fail.
///
/// Degenerate values (zero durations, empty pools) are allowed: the director
/// treats them as immediate or no-op at runtime.
pub fn validate_config(config: &BossConfig) -> Result<(), ConfigError> {
    let invalid = |reason: String| ConfigError::InvalidDefinition {
        name: config.name.clone(),
        reason,
    };

    if config.phases.is_empty() {
        return Err(invalid("at least one phase is required".to_string()));
    }

    let mut previous = f32::INFINITY;
    for phase in &config.phases {
        if !(0.0..=1.0).contains(&phase.health_threshold) {
            return Err(invalid(format!(
                "phase '{}' health_threshold {} is outside 0.0..=1.0",
                phase.phase_name, phase.health_threshold
            )));
        }
        if phase.health_threshold > previous {
            return Err(invalid(format!(
                "phase '{}' health_threshold {} must not exceed the previous phase ({})",
                phase.phase_name, phase.health_threshold, previous
            )));
        }
        previous = phase.health_threshold;
    }

    Ok(())
}

/// Parse and resolve a profile from RON text.
pub fn parse_boss_profile(contents: &str, origin: &Path) -> Result<BossProfile, ConfigError> {
    let config: BossConfig = ron::from_str(contents).map_err(|source| ConfigError::ParseRon {
        path: origin.to_path_buf(),
        source,
    })?;
    validate_config(&config)?;
    Ok(BossProfile::resolve(config))
}

/// Load a boss profile from a RON file.
pub fn load_boss_profile(path: impl AsRef<Path>) -> Result<BossProfile, ConfigError> {
    let path = path.as_ref();
    let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadFile {
        path: path.to_path_buf(),
        source,
    })?;

    let profile = parse_boss_profile(&contents, path)?;

    info!(
        "Loaded boss profile '{}' ({} abilities, {} phases) from {}",
        profile.name,
        profile.ability_count(),
        profile.phase_count(),
        path.display()
    );

    Ok(profile)
}

/// Bevy plugin that loads a boss profile at startup and inserts it as a resource.
pub struct BossConfigPlugin {
    pub path: String,
}

impl Default for BossConfigPlugin {
    fn default() -> Self {
        Self {
            path: DEFAULT_PROFILE_PATH.to_string(),
        }
    }
}

impl Plugin for BossConfigPlugin {
    fn build(&self, app: &mut App) {
        match load_boss_profile(&self.path) {
            Ok(profile) => {
                app.insert_resource(profile);
            }
            Err(e) => {
                // Nothing can run without a valid profile
                panic!("Failed to load boss profile: {}", e);
            }
        }
    }
}
