//! Arena Boundary
//!
//! The director never looks its collaborators up by itself. Everything it needs
//! from the rest of the simulation (positions, health, damage and knockback
//! sinks, helper spawning, projectile launching) goes through the [`Arena`]
//! trait, which is handed to every call that needs it.
//!
//! [`ArenaState`] is the in-memory implementation: a per-tick snapshot of all
//! units plus the queue of [`ArenaOp`]s the director produced. The ECS layer
//! builds one from its queries, lets the director mutate it, then writes the
//! snapshot and queued ops back (snapshot-then-apply).

use bevy::math::Vec3;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

use super::config::DamageFilter;
use super::geometry::flat_distance;

/// Stable identifier for a unit taking part in an encounter.
///
/// Independent from Bevy's `Entity` so it can be replicated to observers and
/// used in tests without an ECS world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(pub u64);

impl std::fmt::Display for EntityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// What a unit is, as far as the director cares.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnitKind {
    Boss,
    Player,
    /// Summoned add (may hold the summoner's shield gate)
    Helper,
    /// Destructible obstacle that stops a charge
    Obstacle,
}

/// Snapshot of a single unit.
#[derive(Clone, Debug, PartialEq)]
pub struct ArenaUnit {
    pub id: EntityId,
    pub kind: UnitKind,
    pub position: Vec3,
    pub health: f32,
    pub max_health: f32,
}

impl ArenaUnit {
    pub fn is_alive(&self) -> bool {
        self.health > 0.0
    }

    /// Health as a fraction of max health (0.0 to 1.0)
    pub fn health_pct(&self) -> f32 {
        if self.max_health > 0.0 {
            self.health / self.max_health
        } else {
            0.0
        }
    }
}

/// A single projectile launched by a volley.
#[derive(Clone, Debug, PartialEq)]
pub struct ProjectileShot {
    pub attacker: EntityId,
    pub origin: Vec3,
    /// Normalized travel direction
    pub direction: Vec3,
    pub speed: f32,
    pub range: f32,
    /// Damage after the attacker's damage-dealt multiplier
    pub damage: f32,
    /// Which unit kinds the projectile can hit
    pub damage_filter: DamageFilter,
    pub ability_name: String,
}

/// Side effect queued by the director for the owning simulation to apply.
#[derive(Clone, Debug, PartialEq)]
pub enum ArenaOp {
    Damage { victim: EntityId, amount: f32, attacker: EntityId },
    Knockback { victim: EntityId, direction: Vec3, force: f32 },
    Defeat { victim: EntityId },
    DestroyObstacle { id: EntityId },
    Move { id: EntityId, position: Vec3 },
    SpawnHelper { id: EntityId, prefab: String, position: Vec3, max_health: f32 },
    ScaleHealth { id: EntityId, fraction: f32 },
    FireProjectile(ProjectileShot),
}

/// Everything the director consumes from, and produces into, the rest of the
/// simulation.
pub trait Arena {
    /// Look up a unit that is still present in the world.
    fn unit(&self, id: EntityId) -> Option<&ArenaUnit>;

    /// All alive player units.
    fn players(&self) -> Vec<EntityId>;

    /// Alive units matching `filter` whose position is within `radius` of `center`.
    fn damageables_within(&self, center: Vec3, radius: f32, filter: DamageFilter) -> Vec<EntityId>;

    /// Obstacles within `radius` of `center`.
    fn obstacles_within(&self, center: Vec3, radius: f32) -> Vec<EntityId>;

    /// Deal damage, returning the amount actually removed from the victim's health.
    fn apply_damage(&mut self, victim: EntityId, amount: f32, attacker: EntityId) -> f32;

    fn apply_knockback(&mut self, victim: EntityId, direction: Vec3, force: f32);

    /// Instantly defeat a unit regardless of its remaining health.
    fn defeat(&mut self, victim: EntityId);

    fn destroy_obstacle(&mut self, id: EntityId);

    /// Move a unit. The arena may clamp it to its floor; read the result back
    /// with [`Arena::position`].
    fn set_position(&mut self, id: EntityId, position: Vec3);

    /// Spawn a helper from a named prefab. Returns `None` when the prefab is unknown.
    fn spawn_helper(&mut self, prefab: &str, position: Vec3) -> Option<EntityId>;

    /// Set a unit's current health to `fraction` of its max health.
    fn scale_health(&mut self, id: EntityId, fraction: f32);

    fn fire_projectile(&mut self, shot: ProjectileShot);

    fn position(&self, id: EntityId) -> Option<Vec3> {
        self.unit(id).map(|u| u.position)
    }

    fn is_present(&self, id: EntityId) -> bool {
        self.unit(id).is_some()
    }

    /// Present and with non-zero health.
    fn is_alive(&self, id: EntityId) -> bool {
        self.unit(id).is_some_and(ArenaUnit::is_alive)
    }
}

// ============================================================================
// In-memory arena
// ============================================================================

/// Snapshot-backed [`Arena`] implementation.
///
/// Mutations are applied to the snapshot immediately (so the rest of the
/// director's tick sees a consistent world) and recorded in `ops` for the
/// owner to replay onto the real world.
#[derive(Clone, Debug, Default)]
pub struct ArenaState {
    units: BTreeMap<EntityId, ArenaUnit>,
    /// Prefab name -> max health for helpers that can be summoned
    prefabs: HashMap<String, f32>,
    next_id: u64,
    ops: Vec<ArenaOp>,
    fired: Vec<ProjectileShot>,
    /// Half extents (x, z) of the floor; unbounded when `None`
    bounds: Option<(f32, f32)>,
}

impl ArenaState {
    /// Create an empty arena whose newly spawned helpers start at `next_id`.
    pub fn new(next_id: u64) -> Self {
        Self {
            next_id,
            ..Default::default()
        }
    }

    /// Register a helper prefab that `spawn_helper` can instantiate.
    pub fn with_prefab(mut self, name: impl Into<String>, max_health: f32) -> Self {
        self.prefabs.insert(name.into(), max_health);
        self
    }

    /// Keep every move and knockback inside `[-half_x, half_x] x [-half_z, half_z]`.
    pub fn with_bounds(mut self, half_x: f32, half_z: f32) -> Self {
        self.bounds = Some((half_x.abs(), half_z.abs()));
        self
    }

    /// Clamp a position to the floor bounds, if any.
    pub fn clamp(&self, position: Vec3) -> Vec3 {
        match self.bounds {
            Some((half_x, half_z)) => Vec3::new(
                position.x.clamp(-half_x, half_x),
                position.y,
                position.z.clamp(-half_z, half_z),
            ),
            None => position,
        }
    }

    pub fn set_prefabs(&mut self, prefabs: HashMap<String, f32>) {
        self.prefabs = prefabs;
    }

    /// Insert or replace a unit in the snapshot.
    pub fn insert(&mut self, unit: ArenaUnit) {
        self.next_id = self.next_id.max(unit.id.0 + 1);
        self.units.insert(unit.id, unit);
    }

    /// Convenience for tests and setup code: add a unit at full health.
    pub fn spawn(&mut self, kind: UnitKind, position: Vec3, max_health: f32) -> EntityId {
        let id = EntityId(self.next_id);
        self.insert(ArenaUnit {
            id,
            kind,
            position,
            health: max_health,
            max_health,
        });
        id
    }

    /// Remove a unit from the world entirely (despawn).
    pub fn remove(&mut self, id: EntityId) -> Option<ArenaUnit> {
        self.units.remove(&id)
    }

    /// Overwrite a unit's current health directly (external damage sources).
    pub fn set_health(&mut self, id: EntityId, health: f32) {
        if let Some(unit) = self.units.get_mut(&id) {
            unit.health = health.clamp(0.0, unit.max_health);
        }
    }

    pub fn units(&self) -> impl Iterator<Item = &ArenaUnit> {
        self.units.values()
    }

    /// Next identifier that will be handed out to a spawned helper.
    pub fn next_id(&self) -> u64 {
        self.next_id
    }

    /// Ops queued since the last [`ArenaState::take_ops`].
    pub fn ops(&self) -> &[ArenaOp] {
        &self.ops
    }

    pub fn take_ops(&mut self) -> Vec<ArenaOp> {
        std::mem::take(&mut self.ops)
    }

    /// Every projectile fired into this arena (not cleared by `take_ops`).
    pub fn fired_projectiles(&self) -> &[ProjectileShot] {
        &self.fired
    }
}

impl Arena for ArenaState {
    fn unit(&self, id: EntityId) -> Option<&ArenaUnit> {
        self.units.get(&id)
    }

    fn players(&self) -> Vec<EntityId> {
        self.units
            .values()
            .filter(|u| u.kind == UnitKind::Player && u.is_alive())
            .map(|u| u.id)
            .collect()
    }

    fn damageables_within(&self, center: Vec3, radius: f32, filter: DamageFilter) -> Vec<EntityId> {
        if radius <= 0.0 {
            return Vec::new();
        }
        self.units
            .values()
            .filter(|u| u.is_alive() && filter.accepts(u.kind))
            .filter(|u| flat_distance(center, u.position) <= radius)
            .map(|u| u.id)
            .collect()
    }

    fn obstacles_within(&self, center: Vec3, radius: f32) -> Vec<EntityId> {
        self.units
            .values()
            .filter(|u| u.kind == UnitKind::Obstacle)
            .filter(|u| flat_distance(center, u.position) <= radius)
            .map(|u| u.id)
            .collect()
    }

    fn apply_damage(&mut self, victim: EntityId, amount: f32, attacker: EntityId) -> f32 {
        let Some(unit) = self.units.get_mut(&victim) else {
            return 0.0;
        };
        if amount <= 0.0 || !unit.is_alive() {
            return 0.0;
        }
        let actual = amount.min(unit.health);
        unit.health = (unit.health - amount).max(0.0);
        self.ops.push(ArenaOp::Damage {
            victim,
            amount: actual,
            attacker,
        });
        actual
    }

    fn apply_knockback(&mut self, victim: EntityId, direction: Vec3, force: f32) {
        let Some(current) = self.units.get(&victim).map(|u| u.position) else {
            return;
        };
        if force <= 0.0 {
            return;
        }
        let direction = direction.normalize_or_zero();
        let moved = self.clamp(current + direction * force);
        if let Some(unit) = self.units.get_mut(&victim) {
            unit.position = moved;
        }
        self.ops.push(ArenaOp::Knockback {
            victim,
            direction,
            force,
        });
    }

    fn defeat(&mut self, victim: EntityId) {
        let Some(unit) = self.units.get_mut(&victim) else {
            return;
        };
        unit.health = 0.0;
        self.ops.push(ArenaOp::Defeat { victim });
    }

    fn destroy_obstacle(&mut self, id: EntityId) {
        if self
            .units
            .get(&id)
            .is_some_and(|u| u.kind == UnitKind::Obstacle)
        {
            self.units.remove(&id);
            self.ops.push(ArenaOp::DestroyObstacle { id });
        }
    }

    fn set_position(&mut self, id: EntityId, position: Vec3) {
        let position = self.clamp(position);
        if let Some(unit) = self.units.get_mut(&id) {
            unit.position = position;
            self.ops.push(ArenaOp::Move { id, position });
        }
    }

    fn spawn_helper(&mut self, prefab: &str, position: Vec3) -> Option<EntityId> {
        let max_health = *self.prefabs.get(prefab)?;
        let id = EntityId(self.next_id);
        self.insert(ArenaUnit {
            id,
            kind: UnitKind::Helper,
            position,
            health: max_health,
            max_health,
        });
        self.ops.push(ArenaOp::SpawnHelper {
            id,
            prefab: prefab.to_string(),
            position,
            max_health,
        });
        Some(id)
    }

    fn scale_health(&mut self, id: EntityId, fraction: f32) {
        if let Some(unit) = self.units.get_mut(&id) {
            let fraction = fraction.clamp(0.0, 1.0);
            unit.health = unit.max_health * fraction;
            self.ops.push(ArenaOp::ScaleHealth { id, fraction });
        }
    }

    fn fire_projectile(&mut self, shot: ProjectileShot) {
        self.fired.push(shot.clone());
        self.ops.push(ArenaOp::FireProjectile(shot));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_damage_clamps_to_remaining_health() {
        let mut arena = ArenaState::new(1);
        let boss = arena.spawn(UnitKind::Boss, Vec3::ZERO, 500.0);
        let player = arena.spawn(UnitKind::Player, Vec3::X, 100.0);

        let dealt = arena.apply_damage(player, 150.0, boss);
        assert_eq!(dealt, 100.0);
        assert!(!arena.is_alive(player));
        assert!(arena.is_present(player));

        // Dead units take no further damage
        assert_eq!(arena.apply_damage(player, 10.0, boss), 0.0);
    }

    #[test]
    fn test_spawn_helper_requires_known_prefab() {
        let mut arena = ArenaState::new(10).with_prefab("warden", 400.0);

        assert!(arena.spawn_helper("missing", Vec3::ZERO).is_none());

        let helper = arena.spawn_helper("warden", Vec3::ZERO).unwrap();
        assert_eq!(helper, EntityId(10));
        assert_eq!(arena.next_id(), 11);
        assert_eq!(arena.unit(helper).unwrap().kind, UnitKind::Helper);
    }

    #[test]
    fn test_destroy_obstacle_ignores_non_obstacles() {
        let mut arena = ArenaState::new(1);
        let player = arena.spawn(UnitKind::Player, Vec3::ZERO, 100.0);
        let rock = arena.spawn(UnitKind::Obstacle, Vec3::X, 1.0);

        arena.destroy_obstacle(player);
        arena.destroy_obstacle(rock);

        assert!(arena.is_present(player));
        assert!(!arena.is_present(rock));
        assert_eq!(arena.ops(), &[ArenaOp::DestroyObstacle { id: rock }]);
    }

    #[test]
    fn test_bounds_clamp_moves_and_knockback() {
        let mut arena = ArenaState::new(1).with_bounds(30.0, 20.0);
        let boss = arena.spawn(UnitKind::Boss, Vec3::ZERO, 500.0);
        let player = arena.spawn(UnitKind::Player, Vec3::new(0.0, 0.0, 18.0), 100.0);

        arena.set_position(boss, Vec3::new(40.0, 1.0, -25.0));
        assert_eq!(arena.position(boss), Some(Vec3::new(30.0, 1.0, -20.0)));

        arena.apply_knockback(player, Vec3::Z, 5.0);
        assert_eq!(arena.position(player), Some(Vec3::new(0.0, 0.0, 20.0)));

        // Unbounded arenas leave positions alone
        let mut open = ArenaState::new(1);
        let unit = open.spawn(UnitKind::Boss, Vec3::ZERO, 1.0);
        open.set_position(unit, Vec3::new(100.0, 0.0, 0.0));
        assert_eq!(open.position(unit), Some(Vec3::new(100.0, 0.0, 0.0)));
    }
}
