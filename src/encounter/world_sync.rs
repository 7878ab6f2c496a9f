//! Snapshot-then-apply bridge between the ECS world and a director.
//!
//! Before a director runs, the units it may touch are copied into an
//! [`ArenaState`]. Afterwards the [`ArenaOp`]s it queued are replayed onto
//! the real components. Directors never hold ECS references.

use bevy::prelude::*;
use std::collections::HashMap;

use crate::director::constants::{ARENA_HALF_X, ARENA_HALF_Z};
use crate::director::{ArenaOp, ArenaState, ArenaUnit, EntityId, ProjectileShot, UnitKind};

use super::components::*;

/// Build an arena snapshot from the current world.
pub fn collect_arena<'a>(
    units: impl Iterator<Item = (&'a Unit, &'a Transform, Option<&'a Health>)>,
    prefabs: &HelperPrefabs,
    next_id: u64,
) -> ArenaState {
    let mut arena = ArenaState::new(next_id).with_bounds(ARENA_HALF_X, ARENA_HALF_Z);
    arena.set_prefabs(prefabs.0.clone());
    for (unit, transform, health) in units {
        // Obstacles have no health component; they are "alive" until destroyed
        let (current, max) = health.map_or((1.0, 1.0), |h| (h.current, h.max));
        arena.insert(ArenaUnit {
            id: unit.id,
            kind: unit.kind,
            position: transform.translation,
            health: current,
            max_health: max,
        });
    }
    arena
}

/// Keep a position inside the arena floor.
pub fn clamp_to_arena(position: Vec3) -> Vec3 {
    Vec3::new(
        position.x.clamp(-ARENA_HALF_X, ARENA_HALF_X),
        position.y,
        position.z.clamp(-ARENA_HALF_Z, ARENA_HALF_Z),
    )
}

struct PendingHelper {
    prefab: String,
    position: Vec3,
    health: Health,
}

/// Replay queued ops onto the world.
pub fn apply_arena_ops(
    ops: Vec<ArenaOp>,
    commands: &mut Commands,
    units: &mut Query<(Entity, &Unit, &mut Transform, Option<&mut Health>), Without<BossProjectile>>,
) {
    let index: HashMap<EntityId, Entity> = units
        .iter()
        .map(|(entity, unit, _, _)| (unit.id, entity))
        .collect();
    let mut pending: HashMap<EntityId, PendingHelper> = HashMap::new();

    for op in ops {
        match op {
            ArenaOp::Damage { victim, amount, .. } => {
                if let Some(mut health) = index
                    .get(&victim)
                    .and_then(|e| units.get_mut(*e).ok())
                    .and_then(|(_, _, _, health)| health)
                {
                    health.take_damage(amount);
                }
            }
            ArenaOp::Knockback {
                victim,
                direction,
                force,
            } => {
                if let Some((_, _, mut transform, _)) =
                    index.get(&victim).and_then(|e| units.get_mut(*e).ok())
                {
                    transform.translation = clamp_to_arena(transform.translation + direction * force);
                }
            }
            ArenaOp::Defeat { victim } => {
                if let Some(mut health) = index
                    .get(&victim)
                    .and_then(|e| units.get_mut(*e).ok())
                    .and_then(|(_, _, _, health)| health)
                {
                    health.current = 0.0;
                }
            }
            ArenaOp::DestroyObstacle { id } => {
                if let Some(entity) = index.get(&id) {
                    commands.entity(*entity).despawn_recursive();
                }
            }
            ArenaOp::Move { id, position } => {
                if let Some(helper) = pending.get_mut(&id) {
                    helper.position = position;
                } else if let Some((_, _, mut transform, _)) =
                    index.get(&id).and_then(|e| units.get_mut(*e).ok())
                {
                    transform.translation = clamp_to_arena(position);
                }
            }
            ArenaOp::SpawnHelper {
                id,
                prefab,
                position,
                max_health,
            } => {
                pending.insert(
                    id,
                    PendingHelper {
                        prefab,
                        position,
                        health: Health::new(max_health),
                    },
                );
            }
            ArenaOp::ScaleHealth { id, fraction } => {
                if let Some(helper) = pending.get_mut(&id) {
                    helper.health.current = helper.health.max * fraction;
                } else if let Some(mut health) = index
                    .get(&id)
                    .and_then(|e| units.get_mut(*e).ok())
                    .and_then(|(_, _, _, health)| health)
                {
                    health.current = health.max * fraction;
                }
            }
            ArenaOp::FireProjectile(shot) => spawn_projectile(commands, shot),
        }
    }

    for (id, helper) in pending {
        commands.spawn((
            Unit {
                id,
                kind: UnitKind::Helper,
            },
            helper.health,
            Transform::from_translation(clamp_to_arena(helper.position)),
            DisplayName(helper.prefab),
            EncounterEntity,
        ));
    }
}

fn spawn_projectile(commands: &mut Commands, shot: ProjectileShot) {
    commands.spawn((
        Transform::from_translation(shot.origin),
        BossProjectile { shot, traveled: 0.0 },
        EncounterEntity,
    ));
}
