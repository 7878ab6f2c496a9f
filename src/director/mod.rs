//! Boss Director
//!
//! Authority-side brain of a multi-phase boss. The director owns all of the
//! boss's combat state (rotation, buffs, stun, summon gate, the running
//! ability sequence and the running phase transition) and advances it once
//! per simulation tick. Collaborators are never looked up: the [`Arena`] is
//! handed to every call that needs the world.
//!
//! The director is driven entirely by explicit timestamps (`now`, seconds
//! since the encounter started), which keeps it deterministic and lets tests
//! step it without an ECS world.
//!
//! ## Call order per tick
//! 1. `tick(now, arena)`: expire buffs and stun, check the summon gate,
//!    advance the phase transition, advance the ability sequence
//! 2. `try_use_ability(target, now, arena)` on decision ticks
//! 3. `drain_events()` and forward them to observers

pub mod arena;
pub mod buffs;
pub mod charge;
pub mod config;
pub mod constants;
pub mod error;
pub mod events;
pub mod geometry;
pub mod replication;
pub mod rng;
pub mod rotation;
pub mod sequencer;
pub mod summon;
pub mod telegraph;
pub mod transition;

use bevy::prelude::*;
use std::sync::Arc;

pub use arena::{Arena, ArenaOp, ArenaState, ArenaUnit, EntityId, ProjectileShot, UnitKind};
pub use buffs::{BuffState, MultiplierKind, StunState};
pub use config::{
    AbilityDefinition, AbilityShape, BossConfig, BossConfigPlugin, BossProfile, ChargeSettings,
    DamageFilter, PhaseConfig, RotationMode, SummonSettings, TransitionEffect,
};
pub use error::{ConfigError, DirectorError};
pub use events::{ChargeOutcome, DirectorEvent, Feedback, Outbox, SequenceOutcome};
pub use replication::{DirectorSnapshot, SnapshotPublisher};
pub use rng::GameRng;
pub use rotation::RotationState;
pub use summon::SummonState;
pub use telegraph::{Telegraph, TelegraphCommand, TelegraphId, TelegraphShape};

use geometry::flat_distance;
use sequencer::{AbilitySequence, SequenceContext};
use transition::{TransitionContext, TransitionRun};

/// Whether this instance may mutate combat state.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Authority {
    /// Canonical simulation; all gameplay mutation happens here
    #[default]
    Server,
    /// Read-only mirror; every mutating call is rejected
    Observer,
}

/// Per-boss director. See the module docs for the tick contract.
#[derive(Clone, Debug)]
pub struct BossDirector {
    unit: EntityId,
    profile: Arc<BossProfile>,
    authority: Authority,
    rotation: RotationState,
    buffs: BuffState,
    stun: StunState,
    summon: SummonState,
    sequence: Option<AbilitySequence>,
    transition: Option<TransitionRun>,
    outbox: Outbox,
    rng: GameRng,
}

impl BossDirector {
    pub fn new(unit: EntityId, profile: Arc<BossProfile>, authority: Authority) -> Self {
        let rng = GameRng::from_optional_seed(profile.seed);
        Self {
            unit,
            profile,
            authority,
            rotation: RotationState::default(),
            buffs: BuffState::default(),
            stun: StunState::default(),
            summon: SummonState::default(),
            sequence: None,
            transition: None,
            outbox: Outbox::default(),
            rng,
        }
    }

    /// Replace the RNG (headless runs seed it from the encounter config).
    pub fn with_rng(mut self, rng: GameRng) -> Self {
        self.rng = rng;
        self
    }

    fn guard(&self, operation: &'static str) -> Result<(), DirectorError> {
        match self.authority {
            Authority::Server => Ok(()),
            Authority::Observer => Err(DirectorError::NotAuthority { operation }),
        }
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn unit(&self) -> EntityId {
        self.unit
    }

    pub fn authority(&self) -> Authority {
        self.authority
    }

    pub fn profile(&self) -> &BossProfile {
        &self.profile
    }

    pub fn phase_index(&self) -> Option<usize> {
        self.rotation.phase_index
    }

    pub fn phase_name(&self) -> Option<&str> {
        self.phase_index()
            .and_then(|i| self.profile.phase(i))
            .map(|p| p.config.phase_name.as_str())
    }

    pub fn is_busy(&self) -> bool {
        self.rotation.is_busy
    }

    pub fn in_transition(&self) -> bool {
        self.transition.is_some()
    }

    pub fn is_stunned(&self) -> bool {
        self.stun.is_stunned()
    }

    pub fn buffs(&self) -> &BuffState {
        &self.buffs
    }

    pub fn stun(&self) -> &StunState {
        &self.stun
    }

    pub fn summon(&self) -> &SummonState {
        &self.summon
    }

    pub fn rotation(&self) -> &RotationState {
        &self.rotation
    }

    /// Name of the ability currently executing.
    pub fn active_ability(&self) -> Option<&str> {
        self.sequence.as_ref().map(|s| s.ability().name.as_str())
    }

    /// Index of the transition effect currently playing.
    pub fn transition_effect(&self) -> Option<&TransitionEffect> {
        self.transition.as_ref().and_then(TransitionRun::current_effect)
    }

    /// True while a transition charge is mid-dash.
    pub fn is_charging(&self) -> bool {
        self.transition.as_ref().is_some_and(TransitionRun::is_charging)
    }

    /// Collision radius of the dashing charge, if one is in flight.
    pub fn charge_hit_radius(&self) -> Option<f32> {
        self.transition
            .as_ref()?
            .dashing_charge()
            .map(|settings| settings.hit_radius)
    }

    /// Events queued so far this tick, without draining them.
    pub fn pending_events(&self) -> &[DirectorEvent] {
        self.outbox.events()
    }

    pub fn drain_events(&mut self) -> Vec<DirectorEvent> {
        self.outbox.drain()
    }

    // ========================================================================
    // Phase transitions
    // ========================================================================

    /// Enter phase `index`.
    ///
    /// Called by the external health monitor once per threshold crossing.
    /// Out-of-range indices, phases not beyond the current one, and calls made
    /// while a transition is still running are ignored (`Ok(false)`).
    pub fn set_phase(&mut self, index: usize, now: f32) -> Result<bool, DirectorError> {
        self.guard("set_phase")?;

        let Some(phase) = self.profile.phase(index) else {
            warn!(
                "{} set_phase({}) ignored: profile '{}' has {} phases",
                self.unit,
                index,
                self.profile.name,
                self.profile.phase_count()
            );
            return Ok(false);
        };
        if self.rotation.phase_index.is_some_and(|current| index <= current) {
            debug!("{} set_phase({}) ignored: not beyond current phase", self.unit, index);
            return Ok(false);
        }
        if self.transition.is_some() {
            debug!("{} set_phase({}) ignored: transition running", self.unit, index);
            return Ok(false);
        }

        let phase_name = phase.config.phase_name.clone();
        let effects = phase.config.transitions.clone();

        self.rotation.reset(index);
        info!("{} entering phase {} '{}'", self.unit, index, phase_name);
        self.outbox.push(DirectorEvent::PhaseChanged {
            phase_index: index,
            phase_name,
        });

        if !effects.is_empty() {
            // No ability overlaps a set-piece
            if let Some(mut sequence) = self.sequence.take() {
                sequence.cancel(&mut self.outbox);
                self.outbox.push(DirectorEvent::AbilityFinished {
                    ability: sequence.ability().name.clone(),
                    outcome: SequenceOutcome::Cancelled,
                });
            }
            self.rotation.is_busy = false;

            self.outbox.push(DirectorEvent::TransitionStarted {
                phase_index: index,
                effects: effects.len(),
            });
            self.transition = Some(TransitionRun::new(index, effects, now));
        }

        Ok(true)
    }

    // ========================================================================
    // Ability selection
    // ========================================================================

    /// Decision tick: pick and start the next ability against `target`.
    ///
    /// A no-op (`Ok(false)`) while busy, stunned or in transition, without a
    /// live target, or when the rotation has nothing ready. A pick rejected by
    /// `min_activation_range` leaves every cooldown untouched.
    pub fn try_use_ability(
        &mut self,
        target: Option<EntityId>,
        now: f32,
        arena: &mut dyn Arena,
    ) -> Result<bool, DirectorError> {
        self.guard("try_use_ability")?;

        if self.rotation.is_busy || self.stun.is_stunned() || self.transition.is_some() {
            return Ok(false);
        }
        let Some(target) = target.filter(|t| arena.is_alive(*t)) else {
            return Ok(false);
        };
        let Some(phase) = self.rotation.phase_index.and_then(|i| self.profile.phase(i)) else {
            return Ok(false);
        };
        let Some(pick) = self.rotation.propose(phase, now, &mut self.rng) else {
            return Ok(false);
        };
        let Some(ability) = self.profile.ability(pick.ability) else {
            warn!("{} rotation picked unknown ability {:?}", self.unit, pick.ability);
            return Ok(false);
        };

        if let Some(range) = ability.min_activation_range {
            let (Some(from), Some(to)) = (arena.position(self.unit), arena.position(target)) else {
                return Ok(false);
            };
            if flat_distance(from, to) > range {
                debug!(
                    "{} {} rejected: target out of range {:.1}",
                    self.unit, ability.name, range
                );
                return Ok(false);
            }
        }

        let ability = ability.clone();
        self.rotation.commit(pick, phase, ability.cooldown, now);
        self.rotation.is_busy = true;

        info!("{} uses {} on {}", self.unit, ability.name, target);
        self.outbox.push(DirectorEvent::AbilityStarted {
            ability: ability.name.clone(),
            target,
        });
        self.sequence = Some(AbilitySequence::start(ability, self.unit, target, now));
        // Zero-duration stages resolve right away
        self.advance_sequence(now, arena);

        Ok(true)
    }

    // ========================================================================
    // Buffs, stun & collisions
    // ========================================================================

    /// Add `amount` to damage-dealt (`is_buff`) or damage-taken, extending its expiry.
    pub fn apply_damage_buff(
        &mut self,
        amount: f32,
        duration: f32,
        is_buff: bool,
        now: f32,
    ) -> Result<bool, DirectorError> {
        self.guard("apply_damage_buff")?;
        let applied = self.buffs.apply(amount, duration, is_buff, now);
        if applied {
            self.outbox.feedback(Feedback::BuffApplied {
                kind: MultiplierKind::from_is_buff(is_buff),
                amount,
                duration,
            });
        }
        Ok(applied)
    }

    pub fn apply_stun(&mut self, duration: f32, now: f32) -> Result<bool, DirectorError> {
        self.guard("apply_stun")?;
        let applied = self.stun.apply(duration, now);
        if applied {
            info!("{} stunned for {:.1}s", self.unit, duration);
            self.outbox.feedback(Feedback::Stunned { duration });
        }
        Ok(applied)
    }

    /// External collision callback: the boss overlapped a destructible obstacle.
    ///
    /// Only has an effect while a transition charge is dashing.
    pub fn notify_hit_by_charge(
        &mut self,
        obstacle: EntityId,
        now: f32,
        arena: &mut dyn Arena,
    ) -> Result<bool, DirectorError> {
        self.guard("notify_hit_by_charge")?;
        let Some(run) = self.transition.as_mut() else {
            return Ok(false);
        };
        let mut ctx = TransitionContext {
            caster: self.unit,
            arena,
            outbox: &mut self.outbox,
            buffs: &mut self.buffs,
            stun: &mut self.stun,
            summon: &mut self.summon,
            rng: &mut self.rng,
        };
        Ok(run.hit_obstacle(obstacle, now, &mut ctx))
    }

    /// Scale raw incoming damage by the damage-taken multiplier and the summon gate.
    pub fn modify_incoming_damage(&self, raw: f32) -> f32 {
        raw * self.buffs.incoming_factor() * self.summon.damage_factor()
    }

    // ========================================================================
    // Tick
    // ========================================================================

    /// Advance timers, the summon gate, the transition and the running ability.
    pub fn tick(&mut self, now: f32, arena: &mut dyn Arena) -> Result<(), DirectorError> {
        self.guard("tick")?;

        for kind in self.buffs.tick(now) {
            debug!("{} {} multiplier expired", self.unit, kind.label());
            self.outbox.feedback(Feedback::BuffExpired { kind });
        }
        if self.stun.tick(now) {
            debug!("{} stun ended", self.unit);
            self.outbox.feedback(Feedback::StunEnded);
        }

        if let Some(helper) = self.summon.tick(&*arena) {
            info!("{} shield broken: helper {} is down", self.unit, helper);
            self.outbox.feedback(Feedback::ShieldBroken {
                helper: Some(helper),
            });
        }

        if let Some(run) = self.transition.as_mut() {
            let phase_index = run.phase_index();
            let finished = if arena.is_alive(self.unit) {
                let mut ctx = TransitionContext {
                    caster: self.unit,
                    arena: &mut *arena,
                    outbox: &mut self.outbox,
                    buffs: &mut self.buffs,
                    stun: &mut self.stun,
                    summon: &mut self.summon,
                    rng: &mut self.rng,
                };
                run.advance(now, &mut ctx)
            } else {
                // Nothing left of the transition may land once the boss is down
                info!("{} is down: transition into phase {} abandoned", self.unit, phase_index);
                run.cancel(&mut self.outbox);
                true
            };
            if finished {
                info!("{} transition into phase {} finished", self.unit, phase_index);
                self.outbox
                    .push(DirectorEvent::TransitionFinished { phase_index });
                self.transition = None;
            }
        }

        self.advance_sequence(now, arena);
        Ok(())
    }

    fn advance_sequence(&mut self, now: f32, arena: &mut dyn Arena) {
        let Some(sequence) = self.sequence.as_mut() else {
            return;
        };
        let mut ctx = SequenceContext {
            arena,
            outbox: &mut self.outbox,
            outgoing_factor: self.buffs.outgoing_factor(),
        };
        if let Some(outcome) = sequence.advance(now, &mut ctx) {
            let ability = sequence.ability().name.clone();
            debug!("{} {} finished: {:?}", self.unit, ability, outcome);
            self.outbox
                .push(DirectorEvent::AbilityFinished { ability, outcome });
            self.sequence = None;
            self.rotation.is_busy = false;
        }
    }

    // ========================================================================
    // Replication
    // ========================================================================

    /// Current replicated view of this director.
    pub fn snapshot(&self) -> DirectorSnapshot {
        DirectorSnapshot {
            phase_index: self.phase_index(),
            phase_name: self.phase_name().map(str::to_string),
            is_busy: self.is_busy(),
            in_transition: self.in_transition(),
            stunned: self.is_stunned(),
            damage_dealt_multiplier: self.buffs.damage_dealt.value(),
            damage_taken_multiplier: self.buffs.damage_taken.value(),
            shield_active: self.summon.is_shield_active(),
            shield_reduction: self.summon.reduction_ratio(),
            active_ability: self.active_ability().map(str::to_string),
        }
    }
}
