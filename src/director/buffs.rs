//! Buff, Debuff & Stun Timers
//!
//! Two independent damage multipliers (dealt and taken) plus the stun state.
//!
//! Applications stack additively: each one adds its amount to the multiplier
//! and pushes the expiry out to `max(current expiry, now + duration)`, so a
//! shorter re-application never cuts a longer one short. When the current
//! time passes the expiry the multiplier snaps back to 1 and the expiry
//! clears. Repeated rapid applications can grow a multiplier without bound;
//! balance is left to authored amounts.

use serde::{Deserialize, Serialize};

/// Which multiplier an application targets.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MultiplierKind {
    DamageDealt,
    DamageTaken,
}

impl MultiplierKind {
    pub fn from_is_buff(is_buff: bool) -> Self {
        if is_buff {
            MultiplierKind::DamageDealt
        } else {
            MultiplierKind::DamageTaken
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            MultiplierKind::DamageDealt => "damage dealt",
            MultiplierKind::DamageTaken => "damage taken",
        }
    }
}

/// An additive multiplier with a single, extend-only expiry.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TimedMultiplier {
    value: f32,
    expires_at: Option<f32>,
}

impl Default for TimedMultiplier {
    fn default() -> Self {
        Self {
            value: 1.0,
            expires_at: None,
        }
    }
}

impl TimedMultiplier {
    /// Current multiplier (1.0 when nothing is active).
    pub fn value(&self) -> f32 {
        self.value
    }

    pub fn expires_at(&self) -> Option<f32> {
        self.expires_at
    }

    pub fn is_active(&self) -> bool {
        self.expires_at.is_some()
    }

    /// Add `amount` and extend the expiry. Non-positive durations are ignored.
    pub fn apply(&mut self, amount: f32, duration: f32, now: f32) -> bool {
        if duration <= 0.0 || !amount.is_finite() {
            return false;
        }
        let expiry = now + duration;
        self.value += amount;
        self.expires_at = Some(match self.expires_at {
            Some(current) => current.max(expiry),
            None => expiry,
        });
        true
    }

    /// Reset once `now` is strictly past the expiry. Returns true when it reset.
    pub fn tick(&mut self, now: f32) -> bool {
        match self.expires_at {
            Some(expiry) if now > expiry => {
                *self = Self::default();
                true
            }
            _ => false,
        }
    }
}

/// Damage-dealt and damage-taken multipliers of one boss.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct BuffState {
    pub damage_dealt: TimedMultiplier,
    pub damage_taken: TimedMultiplier,
}

impl BuffState {
    pub fn get(&self, kind: MultiplierKind) -> &TimedMultiplier {
        match kind {
            MultiplierKind::DamageDealt => &self.damage_dealt,
            MultiplierKind::DamageTaken => &self.damage_taken,
        }
    }

    fn get_mut(&mut self, kind: MultiplierKind) -> &mut TimedMultiplier {
        match kind {
            MultiplierKind::DamageDealt => &mut self.damage_dealt,
            MultiplierKind::DamageTaken => &mut self.damage_taken,
        }
    }

    /// `isBuff` selects damage-dealt, otherwise damage-taken.
    pub fn apply(&mut self, amount: f32, duration: f32, is_buff: bool, now: f32) -> bool {
        self.get_mut(MultiplierKind::from_is_buff(is_buff))
            .apply(amount, duration, now)
    }

    /// Expire both multipliers independently. Returns the ones that reset.
    pub fn tick(&mut self, now: f32) -> Vec<MultiplierKind> {
        [MultiplierKind::DamageDealt, MultiplierKind::DamageTaken]
            .into_iter()
            .filter(|kind| self.get_mut(*kind).tick(now))
            .collect()
    }

    /// Multiplier applied to outgoing damage, never negative.
    pub fn outgoing_factor(&self) -> f32 {
        self.damage_dealt.value().max(0.0)
    }

    /// Multiplier applied to incoming damage, never negative.
    pub fn incoming_factor(&self) -> f32 {
        self.damage_taken.value().max(0.0)
    }
}

/// Crowd-control state. While stunned, ability selection is suppressed.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct StunState {
    stunned: bool,
    expires_at: Option<f32>,
}

impl StunState {
    pub fn is_stunned(&self) -> bool {
        self.stunned
    }

    pub fn expires_at(&self) -> Option<f32> {
        self.expires_at
    }

    /// Stun for `duration`, extending (never shortening) an active stun.
    pub fn apply(&mut self, duration: f32, now: f32) -> bool {
        if duration <= 0.0 {
            return false;
        }
        let expiry = now + duration;
        self.stunned = true;
        self.expires_at = Some(self.expires_at.map_or(expiry, |current| current.max(expiry)));
        true
    }

    /// Clear once `now` is strictly past the expiry. Returns true when it cleared.
    pub fn tick(&mut self, now: f32) -> bool {
        match self.expires_at {
            Some(expiry) if now > expiry => {
                *self = Self::default();
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reapplication_adds_and_keeps_longer_expiry() {
        let mut buffs = BuffState::default();
        buffs.apply(0.25, 10.0, false, 0.0);
        buffs.apply(0.10, 5.0, false, 0.0);

        assert!((buffs.damage_taken.value() - 1.35).abs() < 1e-6);
        assert_eq!(buffs.damage_taken.expires_at(), Some(10.0));
        // The other multiplier is untouched
        assert_eq!(buffs.damage_dealt.value(), 1.0);
    }

    #[test]
    fn test_expiry_is_strict() {
        let mut buffs = BuffState::default();
        buffs.apply(0.5, 2.0, true, 1.0);

        assert!(buffs.tick(3.0).is_empty(), "still active exactly at expiry");
        assert_eq!(buffs.damage_dealt.value(), 1.5);

        assert_eq!(buffs.tick(3.01), vec![MultiplierKind::DamageDealt]);
        assert_eq!(buffs.damage_dealt.value(), 1.0);
        assert_eq!(buffs.damage_dealt.expires_at(), None);

        // Idempotent
        assert!(buffs.tick(10.0).is_empty());
    }

    #[test]
    fn test_non_positive_duration_is_ignored() {
        let mut buffs = BuffState::default();
        assert!(!buffs.apply(0.5, 0.0, true, 0.0));
        assert!(!buffs.apply(0.5, -1.0, false, 0.0));
        assert_eq!(buffs, BuffState::default());
    }

    #[test]
    fn test_negative_multiplier_clamps_factor() {
        let mut buffs = BuffState::default();
        buffs.apply(-1.5, 5.0, false, 0.0);
        assert_eq!(buffs.incoming_factor(), 0.0);
    }

    #[test]
    fn test_stun_extends_and_clears() {
        let mut stun = StunState::default();
        stun.apply(3.0, 0.0);
        stun.apply(1.0, 1.0);
        assert!(stun.is_stunned());
        assert_eq!(stun.expires_at(), Some(3.0));

        assert!(!stun.tick(3.0));
        assert!(stun.tick(3.5));
        assert!(!stun.is_stunned());
    }
}
