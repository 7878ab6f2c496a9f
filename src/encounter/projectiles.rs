//! Projectile Systems
//!
//! Volley shots fly in a straight line along the direction they were fired
//! with and hit the first unit their ability's damage filter accepts. Damage was already scaled by the
//! boss's damage-dealt multiplier when the shot was fired.

use bevy::prelude::*;

use crate::combat::log::{CombatLog, CombatLogEventType};
use crate::director::constants::PROJECTILE_HIT_RADIUS;
use crate::director::geometry::flat_distance;

use super::components::*;

/// Move projectiles and despawn the ones that ran out of range.
pub fn move_projectiles(
    mut commands: Commands,
    time: Res<Time>,
    clock: Res<EncounterClock>,
    mut projectiles: Query<(Entity, &mut BossProjectile, &mut Transform)>,
) {
    if clock.paused {
        return;
    }
    let dt = time.delta_secs();

    for (entity, mut projectile, mut transform) in projectiles.iter_mut() {
        let step = projectile.shot.speed.max(0.0) * dt;
        transform.translation += projectile.shot.direction * step;
        projectile.traveled += step;

        if projectile.traveled >= projectile.shot.range {
            commands.entity(entity).despawn_recursive();
        }
    }
}

/// Damage the first alive unit each projectile touches, skipping the shooter
/// and anything its damage filter rejects.
pub fn process_projectile_hits(
    mut commands: Commands,
    mut combat_log: ResMut<CombatLog>,
    projectiles: Query<(Entity, &BossProjectile, &Transform)>,
    mut units: Query<(&Unit, &Transform, &mut Health), Without<BossProjectile>>,
) {
    for (projectile_entity, projectile, projectile_transform) in projectiles.iter() {
        let shot = &projectile.shot;
        let hit = units.iter_mut().find(|(unit, transform, health)| {
            unit.id != shot.attacker
                && shot.damage_filter.accepts(unit.kind)
                && health.is_alive()
                && flat_distance(projectile_transform.translation, transform.translation)
                    <= PROJECTILE_HIT_RADIUS
        });
        let Some((unit, _, mut health)) = hit else {
            continue;
        };

        let dealt = health.take_damage(projectile.shot.damage);
        combat_log.log(
            CombatLogEventType::Damage,
            format!(
                "Boss {}'s {} hits {} for {:.0} damage",
                projectile.shot.attacker, projectile.shot.ability_name, unit.id, dealt
            ),
        );
        if !health.is_alive() {
            combat_log.log(
                CombatLogEventType::Death,
                format!(
                    "{} has been defeated by Boss {}'s {}",
                    unit.id, projectile.shot.attacker, projectile.shot.ability_name
                ),
            );
        }
        commands.entity(projectile_entity).despawn_recursive();
    }
}
