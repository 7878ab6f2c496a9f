//! Player Attacks
//!
//! A deliberately simple harness so encounters progress: each player swings
//! at the nearest hostile in range, preferring summoned helpers over the boss
//! (killing the helper is how the shield gate is broken). Damage to a boss goes
//! through its director's damage intake so buffs and the summon gate apply.

use bevy::prelude::*;

use crate::combat::log::{CombatLog, CombatLogEventType};
use crate::director::geometry::flat_distance;
use crate::director::UnitKind;

use super::components::*;

pub fn player_auto_attack(
    time: Res<Time>,
    clock: Res<EncounterClock>,
    mut combat_log: ResMut<CombatLog>,
    mut players: Query<(&Unit, &Transform, &Health, &mut PlayerAttack)>,
    mut hostiles: Query<(&Unit, &Transform, &mut Health, Option<&Boss>), Without<PlayerAttack>>,
) {
    if clock.paused {
        return;
    }
    let dt = time.delta_secs();

    for (player, player_transform, player_health, mut attack) in players.iter_mut() {
        if !player_health.is_alive() {
            continue;
        }
        attack.cooldown = (attack.cooldown - dt).max(0.0);
        if attack.cooldown > 0.0 {
            continue;
        }

        let position = player_transform.translation;
        let target = hostiles
            .iter()
            .filter(|(unit, transform, health, _)| {
                matches!(unit.kind, UnitKind::Boss | UnitKind::Helper)
                    && health.is_alive()
                    && flat_distance(position, transform.translation) <= attack.range
            })
            .min_by(|(a, ta, _, _), (b, tb, _, _)| {
                // Helpers first, then nearest
                let rank = |u: &Unit| u8::from(u.kind != UnitKind::Helper);
                rank(a).cmp(&rank(b)).then(
                    flat_distance(position, ta.translation)
                        .total_cmp(&flat_distance(position, tb.translation)),
                )
            })
            .map(|(unit, _, _, _)| unit.id);

        let Some(target_id) = target else {
            continue;
        };
        let Some((unit, _, mut health, boss)) = hostiles
            .iter_mut()
            .find(|(unit, _, _, _)| unit.id == target_id)
        else {
            continue;
        };

        let amount = match boss {
            Some(boss) => boss.director.modify_incoming_damage(attack.damage),
            None => attack.damage,
        };
        let dealt = health.take_damage(amount);
        attack.damage_dealt += dealt;
        attack.cooldown = attack.interval;

        combat_log.log(
            CombatLogEventType::Damage,
            format!("{} hits {} for {:.0} damage", player.id, unit.id, dealt),
        );
        if !health.is_alive() && unit.kind == UnitKind::Boss {
            combat_log.log(
                CombatLogEventType::Death,
                format!("Boss {} has been defeated by {}", unit.id, player.id),
            );
        }
    }
}
