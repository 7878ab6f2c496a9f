//! Ability Rotation
//!
//! Chooses the next ability of the active phase. Selection is split in two:
//! [`RotationState::propose`] picks a candidate without touching any state,
//! and [`RotationState::commit`] consumes the cooldown once the director has
//! accepted it. A candidate rejected by range is simply dropped, so a rejected
//! pick never burns a cooldown or moves the cursor.

use super::config::{AbilityId, ResolvedPhase, RotationMode};
use super::rng::GameRng;

/// Which pool's cooldown a pick is charged against.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PoolKind {
    Primary,
    Secondary,
}

/// A proposed ability together with the pool that gates it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Pick {
    pub ability: AbilityId,
    pub pool: PoolKind,
}

/// Cooldown bookkeeping of one pool.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PoolTimer {
    pub last_used: Option<f32>,
    pub lockout: f32,
}

impl PoolTimer {
    pub fn is_ready(&self, now: f32) -> bool {
        self.last_used.map_or(true, |last| now >= last + self.lockout)
    }

    fn consume(&mut self, lockout: f32, now: f32) {
        self.last_used = Some(now);
        self.lockout = lockout.max(0.0);
    }
}

/// Mutable rotation state, reset on every phase switch.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RotationState {
    pub phase_index: Option<usize>,
    /// Round-robin cursor into the primary pool
    pub cursor: usize,
    /// PriorityRotate toggle: true when the secondary pool is up next
    pub secondary_turn: bool,
    pub primary: PoolTimer,
    pub secondary: PoolTimer,
    /// Set while an ability sequence runs
    pub is_busy: bool,
}

impl RotationState {
    pub fn for_phase(phase_index: usize) -> Self {
        Self {
            phase_index: Some(phase_index),
            ..Default::default()
        }
    }

    /// Forget cursor, toggle and cooldowns. `is_busy` belongs to the running
    /// sequence and is left alone.
    pub fn reset(&mut self, phase_index: usize) {
        *self = Self {
            is_busy: self.is_busy,
            ..Self::for_phase(phase_index)
        };
    }

    pub fn timer(&self, pool: PoolKind) -> &PoolTimer {
        match pool {
            PoolKind::Primary => &self.primary,
            PoolKind::Secondary => &self.secondary,
        }
    }

    /// Candidate for the next ability, or `None` when nothing is ready.
    pub fn propose(&self, phase: &ResolvedPhase, now: f32, rng: &mut GameRng) -> Option<Pick> {
        let primary = |ability| Pick {
            ability,
            pool: PoolKind::Primary,
        };

        match phase.config.rotation_mode {
            RotationMode::Alternate => {
                if phase.primary.is_empty() || !self.primary.is_ready(now) {
                    return None;
                }
                Some(primary(phase.primary[self.cursor % phase.primary.len()]))
            }
            RotationMode::PriorityRotate => {
                if self.secondary_turn && !phase.secondary.is_empty() {
                    if !self.secondary.is_ready(now) {
                        return None;
                    }
                    return rng.pick(&phase.secondary).map(|ability| Pick {
                        ability,
                        pool: PoolKind::Secondary,
                    });
                }
                // Primary's turn, or secondary's turn skipped for an empty pool
                if !self.primary.is_ready(now) {
                    return None;
                }
                rng.pick(&phase.primary).map(primary)
            }
            RotationMode::Random => {
                if !self.primary.is_ready(now) {
                    return None;
                }
                let total = phase.primary.len() + phase.secondary.len();
                let index = rng.index(total)?;
                let ability = phase
                    .primary
                    .get(index)
                    .or_else(|| phase.secondary.get(index - phase.primary.len()))
                    .copied()?;
                Some(primary(ability))
            }
        }
    }

    /// Consume the cooldown of an accepted pick.
    ///
    /// The pool is locked for the longer of its phase cooldown and the
    /// ability's own cooldown.
    pub fn commit(&mut self, pick: Pick, phase: &ResolvedPhase, ability_cooldown: f32, now: f32) {
        let pool_cooldown = match pick.pool {
            PoolKind::Primary => phase.config.primary_cooldown,
            PoolKind::Secondary => phase.config.secondary_cooldown,
        };
        let lockout = pool_cooldown.max(ability_cooldown);

        match pick.pool {
            PoolKind::Primary => self.primary.consume(lockout, now),
            PoolKind::Secondary => self.secondary.consume(lockout, now),
        }

        match phase.config.rotation_mode {
            RotationMode::Alternate => self.cursor = self.cursor.wrapping_add(1),
            RotationMode::PriorityRotate => {
                self.secondary_turn =
                    pick.pool == PoolKind::Primary && !phase.secondary.is_empty();
            }
            RotationMode::Random => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::director::config::PhaseConfig;

    fn phase(mode: RotationMode, primary: &[usize], secondary: &[usize], cd: (f32, f32)) -> ResolvedPhase {
        ResolvedPhase {
            config: PhaseConfig {
                phase_name: "Test".to_string(),
                health_threshold: 1.0,
                transitions: vec![],
                primary_ability_pool: vec![],
                secondary_ability_pool: vec![],
                rotation_mode: mode,
                primary_cooldown: cd.0,
                secondary_cooldown: cd.1,
            },
            primary: primary.iter().copied().map(AbilityId).collect(),
            secondary: secondary.iter().copied().map(AbilityId).collect(),
        }
    }

    fn pick_and_commit(state: &mut RotationState, phase: &ResolvedPhase, now: f32, rng: &mut GameRng) -> Option<Pick> {
        let pick = state.propose(phase, now, rng)?;
        state.commit(pick, phase, 0.0, now);
        Some(pick)
    }

    #[test]
    fn test_alternate_cycles_in_authored_order() {
        let phase = phase(RotationMode::Alternate, &[2, 0, 1], &[], (1.0, 0.0));
        let mut state = RotationState::for_phase(0);
        let mut rng = GameRng::from_seed(1);

        let picks: Vec<usize> = (0..6)
            .filter_map(|i| pick_and_commit(&mut state, &phase, i as f32 * 2.0, &mut rng))
            .map(|p| p.ability.0)
            .collect();
        assert_eq!(picks, vec![2, 0, 1, 2, 0, 1]);
    }

    #[test]
    fn test_shared_cooldown_gates_pool() {
        let phase = phase(RotationMode::Alternate, &[0, 1], &[], (3.0, 0.0));
        let mut state = RotationState::for_phase(0);
        let mut rng = GameRng::from_seed(1);

        assert!(pick_and_commit(&mut state, &phase, 0.0, &mut rng).is_some());
        assert!(state.propose(&phase, 2.9, &mut rng).is_none());
        assert!(state.propose(&phase, 3.0, &mut rng).is_some());
    }

    #[test]
    fn test_ability_cooldown_extends_lockout() {
        let phase = phase(RotationMode::Alternate, &[0], &[], (1.0, 0.0));
        let mut state = RotationState::for_phase(0);
        let mut rng = GameRng::from_seed(1);

        let pick = state.propose(&phase, 0.0, &mut rng).unwrap();
        state.commit(pick, &phase, 5.0, 0.0);
        assert!(state.propose(&phase, 4.0, &mut rng).is_none());
        assert!(state.propose(&phase, 5.0, &mut rng).is_some());
    }

    #[test]
    fn test_priority_rotate_alternates_pools() {
        let phase = phase(RotationMode::PriorityRotate, &[0, 1], &[2], (0.0, 0.0));
        let mut state = RotationState::for_phase(0);
        let mut rng = GameRng::from_seed(42);

        for i in 0..10 {
            let pick = pick_and_commit(&mut state, &phase, i as f32, &mut rng).unwrap();
            if i % 2 == 0 {
                assert_eq!(pick.pool, PoolKind::Primary);
                assert!(pick.ability.0 < 2);
            } else {
                assert_eq!(pick.pool, PoolKind::Secondary);
                assert_eq!(pick.ability, AbilityId(2));
            }
        }
    }

    #[test]
    fn test_priority_rotate_waits_for_secondary_cooldown() {
        let phase = phase(RotationMode::PriorityRotate, &[0], &[1], (0.0, 10.0));
        let mut state = RotationState::for_phase(0);
        let mut rng = GameRng::from_seed(3);

        pick_and_commit(&mut state, &phase, 0.0, &mut rng).unwrap();
        let secondary = pick_and_commit(&mut state, &phase, 0.5, &mut rng).unwrap();
        assert_eq!(secondary.pool, PoolKind::Secondary);
        pick_and_commit(&mut state, &phase, 1.0, &mut rng).unwrap();

        // Secondary's turn, but its pool is still locked: no pick, no fallback
        assert!(state.propose(&phase, 2.0, &mut rng).is_none());
        assert!(state.secondary_turn);
        assert_eq!(
            state.propose(&phase, 10.5, &mut rng).map(|p| p.pool),
            Some(PoolKind::Secondary)
        );
    }

    #[test]
    fn test_priority_rotate_with_empty_secondary_stays_primary() {
        let phase = phase(RotationMode::PriorityRotate, &[0, 1], &[], (0.0, 0.0));
        let mut state = RotationState::for_phase(0);
        let mut rng = GameRng::from_seed(9);

        for i in 0..4 {
            let pick = pick_and_commit(&mut state, &phase, i as f32, &mut rng).unwrap();
            assert_eq!(pick.pool, PoolKind::Primary);
        }
    }

    #[test]
    fn test_random_samples_union_of_pools() {
        let phase = phase(RotationMode::Random, &[0], &[1], (0.0, 0.0));
        let mut state = RotationState::for_phase(0);
        let mut rng = GameRng::from_seed(5);

        let mut seen = [false; 2];
        for i in 0..64 {
            let pick = pick_and_commit(&mut state, &phase, i as f32, &mut rng).unwrap();
            seen[pick.ability.0] = true;
        }
        assert_eq!(seen, [true, true]);
    }

    #[test]
    fn test_reset_keeps_busy_flag() {
        let mut state = RotationState::for_phase(0);
        state.cursor = 3;
        state.is_busy = true;
        state.reset(1);
        assert_eq!(state.phase_index, Some(1));
        assert_eq!(state.cursor, 0);
        assert!(state.is_busy);
    }
}
