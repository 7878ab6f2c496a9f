//! Director Constants
//!
//! Centralized location for magic numbers used by the director and the
//! encounter simulation around it. Authored values in the boss profile
//! override most of these; the rest are engine-side tuning.

// ============================================================================
// Scheduling
// ============================================================================

/// Seconds between decision ticks (calls to `try_use_ability`) for a boss.
pub const DECISION_INTERVAL: f32 = 0.5;

/// Upper bound on stage transitions a single sequence may make in one tick.
/// Zero-duration stages complete immediately, but a misconfigured sequence
/// can never spin inside one tick.
pub const MAX_STAGE_STEPS_PER_TICK: usize = 64;

// ============================================================================
// Geometry
// ============================================================================

/// Tolerance for "exactly on the arc boundary" comparisons, in degrees.
pub const CONE_ANGLE_EPSILON_DEGREES: f32 = 1.0e-3;

/// Largest distance a dash moves between two collision checks.
pub const CHARGE_SUBSTEP_DISTANCE: f32 = 0.25;

/// A dash whose position comes back further than this from where it was
/// sent has been clamped by the arena edge.
pub const POSITION_EPSILON: f32 = 1.0e-3;

/// Distance at which a volley projectile hits a player.
pub const PROJECTILE_HIT_RADIUS: f32 = 0.8;

// ============================================================================
// Feedback
// ============================================================================

/// Screen shake emitted when an area attack lands (if the ability doesn't author one)
pub const AREA_SHAKE_INTENSITY: f32 = 0.6;
pub const AREA_SHAKE_DURATION: f32 = 0.35;

/// Screen shake emitted when a channel completes
pub const EXPLOSION_SHAKE_INTENSITY: f32 = 1.0;
pub const EXPLOSION_SHAKE_DURATION: f32 = 0.8;

// ============================================================================
// Charge defaults
// ============================================================================

pub const CHARGE_TRACKING_DURATION: f32 = 1.5;
pub const CHARGE_LOCK_DURATION: f32 = 0.4;
pub const CHARGE_SPEED: f32 = 30.0;
pub const CHARGE_MAX_DISTANCE: f32 = 20.0;
pub const CHARGE_HIT_RADIUS: f32 = 1.5;
pub const CHARGE_PAUSE_BETWEEN: f32 = 1.0;

/// Stun applied to the boss when its charge slams into an obstacle.
pub const OBSTACLE_STUN_DURATION: f32 = 3.0;
/// Damage-taken debuff applied alongside the obstacle stun.
pub const OBSTACLE_DEBUFF_AMOUNT: f32 = 0.25;
pub const OBSTACLE_DEBUFF_DURATION: f32 = 10.0;

/// Damage-dealt buff granted when a charge connects with nothing.
pub const MISS_BUFF_AMOUNT: f32 = 0.2;
pub const MISS_BUFF_DURATION: f32 = 8.0;

// ============================================================================
// Encounter simulation
// ============================================================================

pub const DEFAULT_BOSS_HEALTH: f32 = 20000.0;
pub const DEFAULT_PLAYER_HEALTH: f32 = 1000.0;
pub const DEFAULT_PLAYER_DPS: f32 = 60.0;
pub const DEFAULT_PLAYER_ATTACK_RANGE: f32 = 25.0;

/// Boss movement speed while chasing its target.
pub const BOSS_CHASE_SPEED: f32 = 4.0;
/// Boss stops chasing when this close to its target.
pub const BOSS_STOP_DISTANCE: f32 = 3.0;

/// Arena half-size on X axis
pub const ARENA_HALF_X: f32 = 30.0;
/// Arena half-size on Z axis
pub const ARENA_HALF_Z: f32 = 20.0;
