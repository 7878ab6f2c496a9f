//! Boss Movement AI
//!
//! Plain chase behaviour that stands down whenever the director says so:
//! during a phase transition, while an ability is executing, and while
//! stunned. The director moves the boss itself in those cases (charge, channel
//! relocation).

use bevy::prelude::*;

use crate::director::constants::{BOSS_CHASE_SPEED, BOSS_STOP_DISTANCE};
use crate::director::geometry::{flat_direction, flat_distance};

use super::components::*;
use super::world_sync::clamp_to_arena;

pub fn chase_target(
    time: Res<Time>,
    clock: Res<EncounterClock>,
    mut bosses: Query<(&Boss, &BossTarget, &Health, &mut Transform)>,
    units: Query<(&Unit, &Transform), Without<Boss>>,
) {
    if clock.paused {
        return;
    }
    let dt = time.delta_secs();

    for (boss, target, health, mut transform) in bosses.iter_mut() {
        let director = &boss.director;
        if !health.is_alive() || director.in_transition() || director.is_busy() || director.is_stunned() {
            continue;
        }
        let Some(target_id) = target.0 else {
            continue;
        };
        let Some((_, target_transform)) = units.iter().find(|(unit, _)| unit.id == target_id) else {
            continue;
        };

        let from = transform.translation;
        let to = target_transform.translation;
        let distance = flat_distance(from, to);
        if distance <= BOSS_STOP_DISTANCE {
            continue;
        }

        let step = (BOSS_CHASE_SPEED * dt).min(distance - BOSS_STOP_DISTANCE);
        transform.translation = clamp_to_arena(from + flat_direction(from, to) * step);
    }
}
