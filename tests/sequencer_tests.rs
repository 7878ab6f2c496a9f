//! Integration tests for ability execution sequences
//!
//! Each test steps an `AbilitySequence` against an `ArenaState` with explicit
//! timestamps and checks geometry, timing and abort behaviour.

use bevy::math::Vec3;
use boss_director::director::sequencer::{AbilitySequence, SequenceContext};
use boss_director::director::{
    AbilityDefinition, AbilityShape, Arena, ArenaState, DamageFilter, DirectorEvent, EntityId,
    Feedback, Outbox, SequenceOutcome, TelegraphCommand, TelegraphShape, UnitKind,
};

const BOSS: EntityId = EntityId(1);

fn ability(shape: AbilityShape, windup: f32) -> AbilityDefinition {
    AbilityDefinition {
        name: "Test Ability".to_string(),
        damage: 100.0,
        cooldown: 0.0,
        shape,
        windup_duration: windup,
        min_activation_range: None,
        damage_filter: DamageFilter::Players,
        intent: None,
        shake: None,
    }
}

fn advance(
    sequence: &mut AbilitySequence,
    arena: &mut ArenaState,
    outbox: &mut Outbox,
    now: f32,
) -> Option<SequenceOutcome> {
    let mut ctx = SequenceContext {
        arena,
        outbox,
        outgoing_factor: 1.0,
    };
    sequence.advance(now, &mut ctx)
}

fn damaged(outbox: &Outbox) -> Vec<EntityId> {
    outbox
        .events()
        .iter()
        .filter_map(|e| match e {
            DirectorEvent::DamageDealt { victim, .. } => Some(*victim),
            _ => None,
        })
        .collect()
}

fn arena_with_boss() -> ArenaState {
    let mut arena = ArenaState::new(1);
    assert_eq!(arena.spawn(UnitKind::Boss, Vec3::ZERO, 5000.0), BOSS);
    arena
}

// ============================================================================
// Area
// ============================================================================

#[test]
fn test_area_resolves_after_windup() {
    let mut arena = arena_with_boss();
    let near = arena.spawn(UnitKind::Player, Vec3::new(3.0, 0.0, 0.0), 1000.0);
    let far = arena.spawn(UnitKind::Player, Vec3::new(9.0, 0.0, 0.0), 1000.0);
    let mut outbox = Outbox::default();

    let shape = AbilityShape::Area {
        radius: 5.0,
        knockback_force: 2.0,
    };
    let mut sequence = AbilitySequence::start(ability(shape, 1.5), BOSS, near, 0.0);

    assert_eq!(advance(&mut sequence, &mut arena, &mut outbox, 0.0), None);
    assert_eq!(sequence.live_telegraphs().len(), 1);
    assert!(matches!(
        outbox.events()[0],
        DirectorEvent::Telegraph(TelegraphCommand::Show { .. })
    ));

    assert_eq!(advance(&mut sequence, &mut arena, &mut outbox, 1.4), None);
    assert_eq!(
        advance(&mut sequence, &mut arena, &mut outbox, 1.5),
        Some(SequenceOutcome::Completed)
    );

    assert_eq!(damaged(&outbox), vec![near]);
    assert_eq!(arena.unit(near).unwrap().health, 900.0);
    assert_eq!(arena.unit(far).unwrap().health, 1000.0);
    // Pushed outward from the impact center
    assert_eq!(arena.position(near), Some(Vec3::new(5.0, 0.0, 0.0)));
    assert!(outbox
        .events()
        .iter()
        .any(|e| matches!(e, DirectorEvent::Feedback(Feedback::ScreenShake { .. }))));
}

#[test]
fn test_zero_windup_resolves_in_same_tick() {
    let mut arena = arena_with_boss();
    let player = arena.spawn(UnitKind::Player, Vec3::new(1.0, 0.0, 0.0), 1000.0);
    let mut outbox = Outbox::default();

    let shape = AbilityShape::Area {
        radius: 5.0,
        knockback_force: 0.0,
    };
    let mut sequence = AbilitySequence::start(ability(shape, 0.0), BOSS, player, 2.0);

    assert_eq!(
        advance(&mut sequence, &mut arena, &mut outbox, 2.0),
        Some(SequenceOutcome::Completed)
    );
    assert_eq!(damaged(&outbox), vec![player]);
}

#[test]
fn test_outgoing_factor_scales_damage() {
    let mut arena = arena_with_boss();
    let player = arena.spawn(UnitKind::Player, Vec3::new(1.0, 0.0, 0.0), 1000.0);
    let mut outbox = Outbox::default();

    let shape = AbilityShape::Area {
        radius: 5.0,
        knockback_force: 0.0,
    };
    let mut sequence = AbilitySequence::start(ability(shape, 0.0), BOSS, player, 0.0);
    let mut ctx = SequenceContext {
        arena: &mut arena,
        outbox: &mut outbox,
        outgoing_factor: 1.35,
    };
    sequence.advance(0.0, &mut ctx);

    assert!((arena.unit(player).unwrap().health - 865.0).abs() < 1e-3);
}

#[test]
fn test_caster_death_aborts_and_cancels_telegraph() {
    let mut arena = arena_with_boss();
    let player = arena.spawn(UnitKind::Player, Vec3::new(1.0, 0.0, 0.0), 1000.0);
    let mut outbox = Outbox::default();

    let shape = AbilityShape::Area {
        radius: 5.0,
        knockback_force: 0.0,
    };
    let mut sequence = AbilitySequence::start(ability(shape, 1.0), BOSS, player, 0.0);
    advance(&mut sequence, &mut arena, &mut outbox, 0.0);
    let telegraph = sequence.live_telegraphs()[0];

    arena.set_health(BOSS, 0.0);
    assert_eq!(
        advance(&mut sequence, &mut arena, &mut outbox, 1.0),
        Some(SequenceOutcome::CasterLost)
    );
    assert!(sequence.live_telegraphs().is_empty());
    assert!(outbox.events().contains(&DirectorEvent::Telegraph(
        TelegraphCommand::Cancel { id: telegraph }
    )));
    assert!(damaged(&outbox).is_empty());
}

// ============================================================================
// Cone
// ============================================================================

fn cone_hits(arc_degrees: f32, positions: &[Vec3]) -> Vec<bool> {
    let mut arena = arena_with_boss();
    let target = arena.spawn(UnitKind::Player, Vec3::new(0.0, 0.0, 5.0), 1000.0);
    let others: Vec<EntityId> = positions
        .iter()
        .map(|p| arena.spawn(UnitKind::Player, *p, 1000.0))
        .collect();
    let mut outbox = Outbox::default();

    let shape = AbilityShape::Cone {
        radius: 10.0,
        arc_degrees,
    };
    let mut sequence = AbilitySequence::start(ability(shape, 0.0), BOSS, target, 0.0);
    assert_eq!(
        advance(&mut sequence, &mut arena, &mut outbox, 0.0),
        Some(SequenceOutcome::Completed)
    );

    let hit = damaged(&outbox);
    others.iter().map(|id| hit.contains(id)).collect()
}

#[test]
fn test_cone_boundary_is_inclusive() {
    let half = 45f32.to_radians();
    let on_edge = Vec3::new(half.sin(), 0.0, half.cos()) * 6.0;
    let past_edge = {
        let angle = 46f32.to_radians();
        Vec3::new(angle.sin(), 0.0, angle.cos()) * 6.0
    };

    assert_eq!(cone_hits(90.0, &[on_edge, past_edge]), vec![true, false]);
}

#[test]
fn test_cone_excludes_one_unit_beyond_radius() {
    let at_radius = Vec3::new(0.0, 0.0, 10.0);
    let beyond = Vec3::new(0.0, 0.0, 11.0);

    assert_eq!(cone_hits(60.0, &[at_radius, beyond]), vec![true, false]);
}

#[test]
fn test_cone_never_hits_behind_caster() {
    let behind = Vec3::new(0.0, 0.0, -3.0);
    let beside = Vec3::new(3.0, 0.0, 0.0);

    // Even a full circle only covers the front half-plane
    assert_eq!(cone_hits(360.0, &[behind, beside]), vec![false, false]);
}

#[test]
fn test_cone_direction_captured_at_cast() {
    let mut arena = arena_with_boss();
    let target = arena.spawn(UnitKind::Player, Vec3::new(0.0, 0.0, 5.0), 1000.0);
    let mut outbox = Outbox::default();

    let shape = AbilityShape::Cone {
        radius: 10.0,
        arc_degrees: 60.0,
    };
    let mut sequence = AbilitySequence::start(ability(shape, 1.0), BOSS, target, 0.0);
    advance(&mut sequence, &mut arena, &mut outbox, 0.0);

    // Target sidesteps out of the captured cone during the windup
    arena.set_position(target, Vec3::new(5.0, 0.0, 0.0));
    assert_eq!(
        advance(&mut sequence, &mut arena, &mut outbox, 1.0),
        Some(SequenceOutcome::Completed)
    );
    assert!(damaged(&outbox).is_empty());
}

// ============================================================================
// Projectile volley
// ============================================================================

fn volley(volley_count: u32, projectile_count: u32, spread_angle: f32) -> AbilityShape {
    AbilityShape::ProjectileVolley {
        volley_count,
        volley_interval: 2.0,
        projectile_count,
        shots_per_volley: 2,
        shot_delay: 0.5,
        spread_angle,
        range: 30.0,
        projectile_speed: 25.0,
    }
}

#[test]
fn test_single_projectile_fires_straight_at_target() {
    let mut arena = arena_with_boss();
    let target = arena.spawn(UnitKind::Player, Vec3::new(4.0, 0.0, 4.0), 1000.0);
    let mut outbox = Outbox::default();

    let shape = AbilityShape::ProjectileVolley {
        volley_count: 1,
        volley_interval: 1.0,
        projectile_count: 1,
        shots_per_volley: 1,
        shot_delay: 0.0,
        spread_angle: 90.0,
        range: 30.0,
        projectile_speed: 25.0,
    };
    let mut sequence = AbilitySequence::start(ability(shape, 0.0), BOSS, target, 0.0);
    assert_eq!(
        advance(&mut sequence, &mut arena, &mut outbox, 0.0),
        Some(SequenceOutcome::Completed)
    );

    let shots = arena.fired_projectiles();
    assert_eq!(shots.len(), 1);
    let expected = Vec3::new(1.0, 0.0, 1.0).normalize();
    assert!((shots[0].direction - expected).length() < 1e-5);
    assert_eq!(shots[0].attacker, BOSS);
    assert_eq!(shots[0].damage, 100.0);
}

#[test]
fn test_volley_without_shots_fires_nothing() {
    let mut arena = arena_with_boss();
    let target = arena.spawn(UnitKind::Player, Vec3::new(0.0, 0.0, 10.0), 1000.0);
    let mut outbox = Outbox::default();

    let shape = AbilityShape::ProjectileVolley {
        volley_count: 3,
        volley_interval: 1.0,
        projectile_count: 2,
        shots_per_volley: 0,
        shot_delay: 0.5,
        spread_angle: 30.0,
        range: 30.0,
        projectile_speed: 25.0,
    };
    let mut sequence = AbilitySequence::start(ability(shape, 0.5), BOSS, target, 0.0);

    assert_eq!(
        advance(&mut sequence, &mut arena, &mut outbox, 0.0),
        Some(SequenceOutcome::Completed)
    );
    assert!(arena.fired_projectiles().is_empty());
    assert!(sequence.live_telegraphs().is_empty());
}

#[test]
fn test_projectiles_carry_damage_filter() {
    let mut arena = arena_with_boss();
    let target = arena.spawn(UnitKind::Player, Vec3::new(0.0, 0.0, 10.0), 1000.0);
    let mut outbox = Outbox::default();

    let mut definition = ability(volley(1, 2, 20.0), 0.0);
    definition.damage_filter = DamageFilter::PlayersAndHelpers;
    let mut sequence = AbilitySequence::start(definition, BOSS, target, 0.0);
    advance(&mut sequence, &mut arena, &mut outbox, 0.0);

    let shots = arena.fired_projectiles();
    assert_eq!(shots.len(), 2);
    assert!(shots
        .iter()
        .all(|s| s.damage_filter == DamageFilter::PlayersAndHelpers));
}

#[test]
fn test_volley_timing() {
    let mut arena = arena_with_boss();
    let target = arena.spawn(UnitKind::Player, Vec3::new(0.0, 0.0, 10.0), 1000.0);
    let mut outbox = Outbox::default();

    let mut sequence = AbilitySequence::start(ability(volley(2, 3, 30.0), 0.5), BOSS, target, 0.0);
    let mut fired_at = |now: f32, sequence: &mut AbilitySequence, arena: &mut ArenaState| {
        let outcome = advance(sequence, arena, &mut outbox, now);
        (arena.fired_projectiles().len(), outcome)
    };

    // Aim: one line telegraph per projectile
    assert_eq!(fired_at(0.0, &mut sequence, &mut arena), (0, None));
    assert_eq!(sequence.live_telegraphs().len(), 3);

    assert_eq!(fired_at(0.5, &mut sequence, &mut arena), (3, None));
    assert_eq!(fired_at(0.9, &mut sequence, &mut arena), (3, None));
    assert_eq!(fired_at(1.0, &mut sequence, &mut arena), (6, None));
    // Recover until the volley interval has passed
    assert_eq!(fired_at(1.9, &mut sequence, &mut arena), (6, None));
    assert_eq!(fired_at(2.5, &mut sequence, &mut arena), (9, None));
    assert_eq!(
        fired_at(3.0, &mut sequence, &mut arena),
        (12, Some(SequenceOutcome::Completed))
    );
}

#[test]
fn test_volley_spread_is_symmetric() {
    let mut arena = arena_with_boss();
    let target = arena.spawn(UnitKind::Player, Vec3::new(0.0, 0.0, 10.0), 1000.0);
    let mut outbox = Outbox::default();

    let mut sequence = AbilitySequence::start(ability(volley(1, 3, 90.0), 0.0), BOSS, target, 0.0);
    advance(&mut sequence, &mut arena, &mut outbox, 0.0);

    let directions: Vec<Vec3> = arena.fired_projectiles().iter().map(|s| s.direction).collect();
    assert_eq!(directions.len(), 3);
    assert!((directions[1] - Vec3::Z).length() < 1e-5);
    assert!((directions[0].x + directions[2].x).abs() < 1e-5);
    assert!((directions[0].z - directions[2].z).abs() < 1e-5);
    assert!((directions[0].angle_between(directions[2]).to_degrees() - 90.0).abs() < 1e-3);
}

#[test]
fn test_volley_aborts_when_target_dies() {
    let mut arena = arena_with_boss();
    let target = arena.spawn(UnitKind::Player, Vec3::new(0.0, 0.0, 10.0), 1000.0);
    let mut outbox = Outbox::default();

    let mut sequence = AbilitySequence::start(ability(volley(3, 2, 20.0), 1.0), BOSS, target, 0.0);
    advance(&mut sequence, &mut arena, &mut outbox, 0.0);
    assert_eq!(sequence.live_telegraphs().len(), 2);

    arena.set_health(target, 0.0);
    assert_eq!(
        advance(&mut sequence, &mut arena, &mut outbox, 1.0),
        Some(SequenceOutcome::TargetLost)
    );
    assert!(arena.fired_projectiles().is_empty());
    let cancels = outbox
        .events()
        .iter()
        .filter(|e| matches!(e, DirectorEvent::Telegraph(TelegraphCommand::Cancel { .. })))
        .count();
    assert_eq!(cancels, 2);
}

// ============================================================================
// Channel
// ============================================================================

fn channel(relocate_duration: f32) -> AbilityShape {
    AbilityShape::Channel {
        duration: 2.0,
        max_radius: 20.0,
        relocate_duration,
        anchor: None,
    }
}

#[test]
fn test_channel_relocates_then_explodes() {
    let mut arena = ArenaState::new(1);
    arena.spawn(UnitKind::Boss, Vec3::new(6.0, 0.0, 4.0), 5000.0);
    let tank = arena.spawn(UnitKind::Player, Vec3::new(0.0, 0.0, 5.0), 3000.0);
    let healer = arena.spawn(UnitKind::Player, Vec3::new(-20.0, 0.0, 0.0), 800.0);
    let mut outbox = Outbox::default();

    let mut sequence = AbilitySequence::start(ability(channel(1.0), 0.0), BOSS, tank, 0.0);

    assert_eq!(advance(&mut sequence, &mut arena, &mut outbox, 0.5), None);
    assert_eq!(arena.position(BOSS), Some(Vec3::new(3.0, 0.0, 2.0)));

    assert_eq!(advance(&mut sequence, &mut arena, &mut outbox, 1.0), None);
    assert_eq!(arena.position(BOSS), Some(Vec3::ZERO));
    assert!(outbox.events().iter().any(|e| matches!(
        e,
        DirectorEvent::Telegraph(TelegraphCommand::Show { telegraph, .. })
            if telegraph.shape == TelegraphShape::GrowingCircle { max_radius: 20.0 }
    )));

    assert_eq!(advance(&mut sequence, &mut arena, &mut outbox, 2.9), None);
    assert_eq!(
        advance(&mut sequence, &mut arena, &mut outbox, 3.0),
        Some(SequenceOutcome::Completed)
    );

    // Overwhelming damage: every player dies regardless of distance
    assert!(!arena.is_alive(tank));
    assert!(!arena.is_alive(healer));
    let defeated = outbox
        .events()
        .iter()
        .filter(|e| matches!(e, DirectorEvent::PlayerDefeated { .. }))
        .count();
    assert_eq!(defeated, 2);
    assert!(outbox.events().contains(&DirectorEvent::Feedback(Feedback::Explosion {
        position: Vec3::ZERO,
        radius: 20.0,
    })));
}

#[test]
fn test_channel_broken_when_caster_dies() {
    let mut arena = arena_with_boss();
    let player = arena.spawn(UnitKind::Player, Vec3::new(0.0, 0.0, 5.0), 1000.0);
    let mut outbox = Outbox::default();

    let mut sequence = AbilitySequence::start(ability(channel(0.0), 0.0), BOSS, player, 0.0);
    assert_eq!(advance(&mut sequence, &mut arena, &mut outbox, 0.0), None);
    assert_eq!(sequence.stage_label(), "channel");

    arena.set_health(BOSS, 0.0);
    assert_eq!(
        advance(&mut sequence, &mut arena, &mut outbox, 1.0),
        Some(SequenceOutcome::ChannelBroken)
    );
    assert!(arena.is_alive(player));
    assert!(sequence.live_telegraphs().is_empty());
}

#[test]
fn test_channel_ignores_target_loss() {
    let mut arena = arena_with_boss();
    let target = arena.spawn(UnitKind::Player, Vec3::new(0.0, 0.0, 5.0), 1000.0);
    let other = arena.spawn(UnitKind::Player, Vec3::new(0.0, 0.0, -5.0), 1000.0);
    let mut outbox = Outbox::default();

    let mut sequence = AbilitySequence::start(ability(channel(0.0), 0.0), BOSS, target, 0.0);
    advance(&mut sequence, &mut arena, &mut outbox, 0.0);
    arena.remove(target);

    assert_eq!(
        advance(&mut sequence, &mut arena, &mut outbox, 2.0),
        Some(SequenceOutcome::Completed)
    );
    assert!(!arena.is_alive(other));
}
