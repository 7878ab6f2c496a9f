//! Encounter Setup
//!
//! Describes the arena layout (boss, players, obstacles, helper prefabs) and
//! spawns it. Headless mode builds this from its JSON config; the graphical
//! observer uses the same path.

use bevy::prelude::*;
use std::collections::HashMap;
use std::sync::Arc;

use crate::combat::log::{CombatLog, CombatLogEventType};
use crate::director::constants::*;
use crate::director::{Authority, BossDirector, BossProfile, GameRng, UnitKind};

use super::components::*;

/// A player to spawn.
#[derive(Clone, Debug, PartialEq)]
pub struct PlayerSpawn {
    pub name: String,
    pub position: Vec3,
    pub health: f32,
    pub dps: f32,
    pub attack_range: f32,
}

/// Everything needed to lay out one encounter.
#[derive(Resource, Clone, Debug)]
pub struct EncounterSetup {
    pub boss_health: f32,
    pub boss_position: Vec3,
    pub players: Vec<PlayerSpawn>,
    pub obstacles: Vec<Vec3>,
    /// Helper prefab name -> max health
    pub helper_prefabs: HashMap<String, f32>,
    pub decision_interval: f32,
    /// Overrides the profile seed when set
    pub random_seed: Option<u64>,
}

impl Default for EncounterSetup {
    fn default() -> Self {
        let player = |name: &str, x: f32, z: f32| PlayerSpawn {
            name: name.to_string(),
            position: Vec3::new(x, 0.0, z),
            health: DEFAULT_PLAYER_HEALTH,
            dps: DEFAULT_PLAYER_DPS,
            attack_range: DEFAULT_PLAYER_ATTACK_RANGE,
        };
        Self {
            boss_health: DEFAULT_BOSS_HEALTH,
            boss_position: Vec3::new(0.0, 0.0, -10.0),
            players: vec![
                player("Vanguard", -6.0, 8.0),
                player("Ranger", 0.0, 12.0),
                player("Mystic", 6.0, 8.0),
            ],
            obstacles: vec![Vec3::new(-12.0, 0.0, 0.0), Vec3::new(12.0, 0.0, 0.0)],
            helper_prefabs: HashMap::from([("Warden Acolyte".to_string(), 2000.0)]),
            decision_interval: DECISION_INTERVAL,
            random_seed: None,
        }
    }
}

/// Spawn the boss, players and obstacles described by [`EncounterSetup`].
pub fn setup_encounter(
    mut commands: Commands,
    setup: Res<EncounterSetup>,
    profile: Res<BossProfile>,
    mut allocator: ResMut<UnitIdAllocator>,
    mut prefabs: ResMut<HelperPrefabs>,
    mut combat_log: ResMut<CombatLog>,
) {
    combat_log.clear();
    prefabs.0 = setup.helper_prefabs.clone();

    let boss_id = allocator.allocate();
    let mut director = BossDirector::new(boss_id, Arc::new(BossProfile::clone(&profile)), Authority::Server);
    if let Some(seed) = setup.random_seed {
        info!("Using deterministic RNG with seed: {}", seed);
        director = director.with_rng(GameRng::from_seed(seed));
    }

    commands.spawn((
        Unit {
            id: boss_id,
            kind: UnitKind::Boss,
        },
        Health::new(setup.boss_health),
        Transform::from_translation(setup.boss_position),
        Boss::new(director),
        PhaseMonitor::default(),
        DecisionTimer::from_interval(setup.decision_interval),
        BossTarget::default(),
        ReplicatedBoss::default(),
        DisplayName(profile.name.clone()),
        EncounterEntity,
    ));

    for player in &setup.players {
        let id = allocator.allocate();
        commands.spawn((
            Unit {
                id,
                kind: UnitKind::Player,
            },
            Health::new(player.health),
            Transform::from_translation(player.position),
            PlayerAttack::from_dps(player.dps, player.attack_range),
            DisplayName(player.name.clone()),
            EncounterEntity,
        ));
    }

    for (i, position) in setup.obstacles.iter().enumerate() {
        let id = allocator.allocate();
        commands.spawn((
            Unit {
                id,
                kind: UnitKind::Obstacle,
            },
            Transform::from_translation(*position),
            DisplayName(format!("Pillar {}", i + 1)),
            EncounterEntity,
        ));
    }

    combat_log.log(
        CombatLogEventType::EncounterEvent,
        format!(
            "Encounter started: {} {} vs {} players",
            profile.name,
            boss_id,
            setup.players.len()
        ),
    );
    info!(
        "Encounter setup complete: {} ({} phases), {} players, {} obstacles",
        profile.name,
        profile.phase_count(),
        setup.players.len(),
        setup.obstacles.len()
    );
}
