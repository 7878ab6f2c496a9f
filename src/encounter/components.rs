//! Encounter Components & Resources

use bevy::prelude::*;
use std::collections::HashMap;

use crate::director::constants::DECISION_INTERVAL;
use crate::director::{BossDirector, DirectorSnapshot, EntityId, ProjectileShot, SnapshotPublisher, UnitKind};

// ============================================================================
// Components
// ============================================================================

/// Identity of every unit taking part in the encounter.
#[derive(Component, Clone, Copy, Debug, PartialEq, Eq)]
pub struct Unit {
    pub id: EntityId,
    pub kind: UnitKind,
}

#[derive(Component, Clone, Copy, Debug, PartialEq)]
pub struct Health {
    pub current: f32,
    pub max: f32,
}

impl Health {
    pub fn new(max: f32) -> Self {
        Self { current: max, max }
    }

    pub fn is_alive(&self) -> bool {
        self.current > 0.0
    }

    /// Health as a fraction of max health (0.0 to 1.0)
    pub fn fraction(&self) -> f32 {
        if self.max > 0.0 {
            (self.current / self.max).clamp(0.0, 1.0)
        } else {
            0.0
        }
    }

    /// Remove up to `amount` health. Returns the amount actually removed.
    pub fn take_damage(&mut self, amount: f32) -> f32 {
        if amount <= 0.0 || !self.is_alive() {
            return 0.0;
        }
        let actual = amount.min(self.current);
        self.current -= actual;
        actual
    }
}

/// A boss and the authority-side director that drives it.
#[derive(Component)]
pub struct Boss {
    pub director: BossDirector,
    pub publisher: SnapshotPublisher,
}

impl Boss {
    pub fn new(director: BossDirector) -> Self {
        Self {
            director,
            publisher: SnapshotPublisher::default(),
        }
    }
}

/// External health monitor state: index of the next phase not yet entered.
#[derive(Component, Clone, Copy, Debug, Default)]
pub struct PhaseMonitor {
    pub next_phase: usize,
}

/// Paces decision ticks (`try_use_ability`) for a boss.
#[derive(Component, Debug)]
pub struct DecisionTimer(pub Timer);

impl Default for DecisionTimer {
    fn default() -> Self {
        Self(Timer::from_seconds(DECISION_INTERVAL, TimerMode::Repeating))
    }
}

impl DecisionTimer {
    pub fn from_interval(interval: f32) -> Self {
        Self(Timer::from_seconds(interval.max(0.01), TimerMode::Repeating))
    }
}

/// Target chosen by the target provider for this decision tick.
#[derive(Component, Clone, Copy, Debug, Default)]
pub struct BossTarget(pub Option<EntityId>);

/// Observer-side, read-only copy of a boss's replicated state.
#[derive(Component, Clone, Debug, Default)]
pub struct ReplicatedBoss {
    pub snapshot: DirectorSnapshot,
    /// Incremented every time a changed snapshot arrives
    pub revision: u64,
}

/// A projectile launched by a volley, travelling in a straight line.
#[derive(Component, Clone, Debug)]
pub struct BossProjectile {
    pub shot: ProjectileShot,
    pub traveled: f32,
}

/// Simple harness attack: players swing at the nearest hostile in range.
#[derive(Component, Clone, Debug)]
pub struct PlayerAttack {
    /// Damage per swing before the target's intake modifiers
    pub damage: f32,
    /// Seconds between swings
    pub interval: f32,
    pub range: f32,
    pub cooldown: f32,
    /// Total damage landed (after modifiers)
    pub damage_dealt: f32,
}

impl PlayerAttack {
    /// One swing per second dealing `dps`.
    pub fn from_dps(dps: f32, range: f32) -> Self {
        Self {
            damage: dps.max(0.0),
            interval: 1.0,
            range,
            cooldown: 0.0,
            damage_dealt: 0.0,
        }
    }
}

/// Display name for logs and the HUD.
#[derive(Component, Clone, Debug)]
pub struct DisplayName(pub String);

/// Marks everything spawned for an encounter.
#[derive(Component, Clone, Copy, Debug, Default)]
pub struct EncounterEntity;

// ============================================================================
// Resources
// ============================================================================

/// Encounter clock; every director call uses `elapsed` as `now`.
#[derive(Resource, Clone, Copy, Debug, Default)]
pub struct EncounterClock {
    pub elapsed: f32,
    pub paused: bool,
}

/// Hands out stable unit ids.
#[derive(Resource, Clone, Copy, Debug)]
pub struct UnitIdAllocator {
    pub next: u64,
}

impl Default for UnitIdAllocator {
    fn default() -> Self {
        Self { next: 1 }
    }
}

impl UnitIdAllocator {
    pub fn allocate(&mut self) -> EntityId {
        let id = EntityId(self.next);
        self.next += 1;
        id
    }
}

/// Helper prefabs a summon may instantiate: name -> max health.
#[derive(Resource, Clone, Debug, Default)]
pub struct HelperPrefabs(pub HashMap<String, f32>);
