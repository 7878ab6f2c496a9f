//! Summon & Shield-Transfer
//!
//! While a summoned helper lives, incoming damage to the summoner is reduced
//! by a fixed ratio. The gate watches the helper itself: the first tick the
//! helper is gone or at zero health, the gate clears without any external call.

use super::arena::{Arena, EntityId};

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct SummonState {
    helper: Option<EntityId>,
    shield_active: bool,
    reduction_ratio: f32,
}

impl SummonState {
    pub fn helper(&self) -> Option<EntityId> {
        self.helper
    }

    pub fn is_shield_active(&self) -> bool {
        self.shield_active
    }

    pub fn reduction_ratio(&self) -> f32 {
        self.reduction_ratio
    }

    /// Tie the shield gate to `helper`. The ratio is clamped to 0.0..=1.0.
    pub fn activate(&mut self, helper: EntityId, reduction_ratio: f32) {
        self.helper = Some(helper);
        self.shield_active = true;
        self.reduction_ratio = reduction_ratio.clamp(0.0, 1.0);
    }

    /// Check the helper. Returns the helper id on the tick the gate breaks.
    pub fn tick(&mut self, arena: &dyn Arena) -> Option<EntityId> {
        if !self.shield_active {
            return None;
        }
        let helper = self.helper?;
        if arena.is_alive(helper) {
            return None;
        }
        self.shield_active = false;
        self.reduction_ratio = 0.0;
        Some(helper)
    }

    /// Factor applied to incoming damage on top of the damage-taken multiplier.
    pub fn damage_factor(&self) -> f32 {
        if self.shield_active {
            1.0 - self.reduction_ratio
        } else {
            1.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::director::arena::{ArenaState, UnitKind};
    use bevy::math::Vec3;

    #[test]
    fn test_gate_holds_while_helper_lives() {
        let mut arena = ArenaState::new(1);
        let helper = arena.spawn(UnitKind::Helper, Vec3::ZERO, 100.0);
        let mut summon = SummonState::default();
        summon.activate(helper, 0.5);

        arena.set_health(helper, 0.1);
        assert_eq!(summon.tick(&arena), None);
        assert!(summon.is_shield_active());
        assert_eq!(summon.damage_factor(), 0.5);
    }

    #[test]
    fn test_gate_clears_when_helper_despawns() {
        let mut arena = ArenaState::new(1);
        let helper = arena.spawn(UnitKind::Helper, Vec3::ZERO, 100.0);
        let mut summon = SummonState::default();
        summon.activate(helper, 0.75);

        arena.remove(helper);
        assert_eq!(summon.tick(&arena), Some(helper));
        assert!(!summon.is_shield_active());
        assert_eq!(summon.damage_factor(), 1.0);
        // Breaks only once
        assert_eq!(summon.tick(&arena), None);
    }
}
