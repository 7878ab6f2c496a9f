//! Director Systems
//!
//! The ECS side of the director contract: the clock, the external health
//! monitor, the target provider, the per-tick drive loop, charge collisions
//! and snapshot publishing. Only these systems ever call mutating director methods.

use bevy::prelude::*;

use crate::combat::events::{FeedbackEvent, PhaseChangedEvent, SnapshotEvent, TelegraphEvent};
use crate::combat::log::{CombatLog, CombatLogEventType};
use crate::director::geometry::flat_distance;
use crate::director::{Arena, DirectorEvent, UnitKind};

use super::components::*;
use super::world_sync::{apply_arena_ops, collect_arena};

/// Advance the encounter clock and mirror it into the combat log.
pub fn advance_clock(time: Res<Time>, mut clock: ResMut<EncounterClock>, mut combat_log: ResMut<CombatLog>) {
    if clock.paused {
        return;
    }
    clock.elapsed += time.delta_secs();
    combat_log.match_time = clock.elapsed;
}

/// External health monitor.
///
/// Calls `set_phase` once per threshold crossing and never while a transition
/// is still running. When health drops past several thresholds at once, the
/// deepest phase is entered directly.
pub fn monitor_phase_thresholds(
    clock: Res<EncounterClock>,
    mut bosses: Query<(&mut Boss, &mut PhaseMonitor, &Health)>,
) {
    for (mut boss, mut monitor, health) in bosses.iter_mut() {
        if boss.director.in_transition() || !health.is_alive() {
            continue;
        }

        let fraction = health.fraction();
        let crossed = boss
            .director
            .profile()
            .phases()
            .iter()
            .enumerate()
            .skip(monitor.next_phase)
            .take_while(|(_, phase)| fraction <= phase.config.health_threshold)
            .map(|(index, _)| index)
            .last();

        let Some(index) = crossed else {
            continue;
        };
        monitor.next_phase = index + 1;
        if let Err(e) = boss.director.set_phase(index, clock.elapsed) {
            warn!("Phase monitor: {}", e);
        }
    }
}

/// Target provider: nearest alive player to each boss.
pub fn acquire_boss_targets(
    mut bosses: Query<(&Transform, &mut BossTarget), With<Boss>>,
    units: Query<(&Unit, &Transform, &Health), Without<Boss>>,
) {
    for (boss_transform, mut target) in bosses.iter_mut() {
        let nearest = units
            .iter()
            .filter(|(unit, _, health)| unit.kind == UnitKind::Player && health.is_alive())
            .min_by(|(_, a, _), (_, b, _)| {
                let da = flat_distance(boss_transform.translation, a.translation);
                let db = flat_distance(boss_transform.translation, b.translation);
                da.total_cmp(&db)
            })
            .map(|(unit, _, _)| unit.id);
        if target.0 != nearest {
            target.0 = nearest;
        }
    }
}

/// Tick every director against a fresh arena snapshot and write the results back.
#[allow(clippy::too_many_arguments)]
pub fn drive_directors(
    mut commands: Commands,
    time: Res<Time>,
    clock: Res<EncounterClock>,
    prefabs: Res<HelperPrefabs>,
    mut allocator: ResMut<UnitIdAllocator>,
    mut combat_log: ResMut<CombatLog>,
    mut bosses: Query<(&mut Boss, &mut DecisionTimer, &BossTarget)>,
    mut units: Query<(Entity, &Unit, &mut Transform, Option<&mut Health>), Without<BossProjectile>>,
    mut telegraphs: EventWriter<TelegraphEvent>,
    mut feedback: EventWriter<FeedbackEvent>,
    mut phase_changes: EventWriter<PhaseChangedEvent>,
) {
    if clock.paused {
        return;
    }
    let now = clock.elapsed;

    for (mut boss, mut timer, target) in bosses.iter_mut() {
        let mut arena = collect_arena(
            units.iter().map(|(_, unit, transform, health)| (unit, transform, health)),
            &prefabs,
            allocator.next,
        );
        let director = &mut boss.director;
        let boss_id = director.unit();

        if let Err(e) = director.tick(now, &mut arena) {
            warn!("Director {} tick rejected: {}", boss_id, e);
            continue;
        }

        timer.0.tick(time.delta());
        if timer.0.just_finished() && arena.is_alive(boss_id) {
            if let Err(e) = director.try_use_ability(target.0, now, &mut arena) {
                warn!("Director {} decision rejected: {}", boss_id, e);
            }
        }

        allocator.next = allocator.next.max(arena.next_id());
        apply_arena_ops(arena.take_ops(), &mut commands, &mut units);

        for event in director.drain_events() {
            combat_log.log_director_event(boss_id, &event);
            match event {
                DirectorEvent::Telegraph(command) => {
                    telegraphs.send(TelegraphEvent {
                        boss: boss_id,
                        command,
                    });
                }
                DirectorEvent::Feedback(fb) => {
                    feedback.send(FeedbackEvent {
                        boss: boss_id,
                        feedback: fb,
                    });
                }
                DirectorEvent::PhaseChanged {
                    phase_index,
                    phase_name,
                } => {
                    phase_changes.send(PhaseChangedEvent {
                        boss: boss_id,
                        phase_index,
                        phase_name,
                    });
                }
                _ => {}
            }
        }
    }
}

/// Collision feed for transition charges.
///
/// Reports an obstacle the boss overlaps while its charge is dashing, then
/// replays the impact (obstacle destroyed) onto the world.
pub fn detect_charge_impacts(
    mut commands: Commands,
    clock: Res<EncounterClock>,
    prefabs: Res<HelperPrefabs>,
    mut allocator: ResMut<UnitIdAllocator>,
    mut bosses: Query<&mut Boss>,
    mut units: Query<(Entity, &Unit, &mut Transform, Option<&mut Health>), Without<BossProjectile>>,
) {
    if clock.paused {
        return;
    }

    for mut boss in bosses.iter_mut() {
        let Some(hit_radius) = boss.director.charge_hit_radius() else {
            continue;
        };
        let boss_id = boss.director.unit();
        let Some(boss_position) = units
            .iter()
            .find(|(_, unit, _, _)| unit.id == boss_id)
            .map(|(_, _, transform, _)| transform.translation)
        else {
            continue;
        };
        let Some(obstacle) = units
            .iter()
            .filter(|(_, unit, _, _)| unit.kind == UnitKind::Obstacle)
            .find(|(_, _, transform, _)| flat_distance(boss_position, transform.translation) <= hit_radius)
            .map(|(_, unit, _, _)| unit.id)
        else {
            continue;
        };

        let mut arena = collect_arena(
            units.iter().map(|(_, unit, transform, health)| (unit, transform, health)),
            &prefabs,
            allocator.next,
        );
        match boss.director.notify_hit_by_charge(obstacle, clock.elapsed, &mut arena) {
            Ok(true) => {
                debug!("Director {} charge collided with {}", boss_id, obstacle);
                allocator.next = allocator.next.max(arena.next_id());
                apply_arena_ops(arena.take_ops(), &mut commands, &mut units);
            }
            Ok(false) => {}
            Err(e) => warn!("Director {} collision rejected: {}", boss_id, e),
        }
    }
}

/// Push changed director snapshots into the observer-side component.
pub fn publish_snapshots(
    mut bosses: Query<(&mut Boss, &mut ReplicatedBoss)>,
    mut snapshots: EventWriter<SnapshotEvent>,
) {
    for (mut boss, mut replicated) in bosses.iter_mut() {
        let boss = &mut *boss;
        let Some(snapshot) = boss.publisher.publish(boss.director.snapshot()) else {
            continue;
        };
        snapshots.send(SnapshotEvent {
            boss: boss.director.unit(),
            snapshot: snapshot.clone(),
        });
        replicated.snapshot = snapshot;
        replicated.revision += 1;
    }
}

/// Despawn helpers that have been defeated. Their shield gate has already
/// noticed (zero health), or will on the next tick (no longer present).
pub fn cleanup_defeated_helpers(
    mut commands: Commands,
    units: Query<(Entity, &Unit, &Health, Option<&DisplayName>)>,
    mut combat_log: ResMut<CombatLog>,
) {
    for (entity, unit, health, name) in units.iter() {
        if unit.kind == UnitKind::Helper && !health.is_alive() {
            let name = name.map_or("Helper", |n| n.0.as_str());
            combat_log.log(
                CombatLogEventType::Death,
                format!("{} {} has been defeated", name, unit.id),
            );
            commands.entity(entity).despawn_recursive();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use std::sync::Arc;

    use crate::director::config::parse_boss_profile;
    use crate::director::{ArenaState, Authority, BossDirector, EntityId};

    const BOSS: EntityId = EntityId(1);

    /// A director whose transition charge has just started dashing along +Z.
    fn dashing_director() -> BossDirector {
        let profile = parse_boss_profile(
            r#"(
                name: "Test Boss",
                abilities: {},
                phases: [
                    (phase_name: "One"),
                    (phase_name: "Two", health_threshold: 0.5, transitions: [
                        Charge((count: 1, tracking_duration: 0.0, lock_duration: 0.0, speed: 5.0, max_distance: 10.0)),
                    ]),
                ],
            )"#,
            Path::new("test.ron"),
        )
        .unwrap();

        let mut arena = ArenaState::new(1);
        arena.spawn(UnitKind::Boss, Vec3::ZERO, 5000.0);
        arena.spawn(UnitKind::Player, Vec3::new(0.0, 0.0, 10.0), 1000.0);

        let mut director = BossDirector::new(BOSS, Arc::new(profile), Authority::Server);
        director.set_phase(0, 0.0).unwrap();
        director.set_phase(1, 0.0).unwrap();
        director.tick(0.0, &mut arena).unwrap();
        assert!(director.is_charging());
        director.drain_events();
        director
    }

    fn app_with(director: BossDirector, obstacle_at: Vec3) -> (App, Entity, Entity) {
        let mut app = App::new();
        app.init_resource::<EncounterClock>()
            .init_resource::<UnitIdAllocator>()
            .init_resource::<HelperPrefabs>()
            .add_systems(Update, detect_charge_impacts);

        let boss = app
            .world_mut()
            .spawn((
                Unit {
                    id: BOSS,
                    kind: UnitKind::Boss,
                },
                Transform::default(),
                Health::new(5000.0),
                Boss::new(director),
            ))
            .id();
        let obstacle = app
            .world_mut()
            .spawn((
                Unit {
                    id: EntityId(3),
                    kind: UnitKind::Obstacle,
                },
                Transform::from_translation(obstacle_at),
            ))
            .id();
        (app, boss, obstacle)
    }

    #[test]
    fn test_charge_overlapping_obstacle_is_stopped() {
        let (mut app, boss, obstacle) = app_with(dashing_director(), Vec3::new(0.0, 0.0, 1.0));

        app.update();

        let director = &app.world().get::<Boss>(boss).unwrap().director;
        assert!(director.is_stunned());
        assert!(!director.is_charging());
        assert!(app.world().get::<Unit>(obstacle).is_none());
    }

    #[test]
    fn test_distant_obstacle_is_left_alone() {
        let (mut app, boss, obstacle) = app_with(dashing_director(), Vec3::new(8.0, 0.0, 0.0));

        app.update();

        let director = &app.world().get::<Boss>(boss).unwrap().director;
        assert!(!director.is_stunned());
        assert!(director.is_charging());
        assert!(app.world().get::<Unit>(obstacle).is_some());
    }
}
