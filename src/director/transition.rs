//! Phase Transition Orchestrator
//!
//! Plays the one-time effects of a phase strictly in order. A later effect
//! never starts before the previous one has fully finished, including charge
//! repeats and the pauses between them. While a run exists the director
//! reports `in_transition` and outside AI stands down.

use bevy::prelude::*;

use super::arena::{Arena, EntityId};
use super::buffs::{BuffState, MultiplierKind, StunState};
use super::charge::{ChargeAttack, ChargeContext};
use super::config::{ChargeSettings, SummonSettings, TransitionEffect};
use super::constants::MAX_STAGE_STEPS_PER_TICK;
use super::events::{DirectorEvent, Feedback, Outbox};
use super::rng::GameRng;
use super::summon::SummonState;

/// Director state a transition reads and writes.
pub struct TransitionContext<'a> {
    pub caster: EntityId,
    pub arena: &'a mut dyn Arena,
    pub outbox: &'a mut Outbox,
    pub buffs: &'a mut BuffState,
    pub stun: &'a mut StunState,
    pub summon: &'a mut SummonState,
    pub rng: &'a mut GameRng,
}

impl TransitionContext<'_> {
    fn charge(&mut self) -> ChargeContext<'_> {
        ChargeContext {
            arena: &mut *self.arena,
            outbox: &mut *self.outbox,
            buffs: &mut *self.buffs,
            stun: &mut *self.stun,
            rng: &mut *self.rng,
        }
    }
}

#[derive(Clone, Debug)]
enum EffectStage {
    /// Ready to start `effects[index]` at time `at`
    Pending { at: f32 },
    Charging { attack: ChargeAttack, remaining: u32 },
    /// Between charges; also waits for any stun to wear off
    ChargePause { resume_at: f32, remaining: u32 },
    SummonWindup { spawn_at: f32 },
    Done,
}

/// One in-progress phase transition.
#[derive(Clone, Debug)]
pub struct TransitionRun {
    phase_index: usize,
    effects: Vec<TransitionEffect>,
    index: usize,
    stage: EffectStage,
}

impl TransitionRun {
    pub fn new(phase_index: usize, effects: Vec<TransitionEffect>, now: f32) -> Self {
        Self {
            phase_index,
            effects,
            index: 0,
            stage: EffectStage::Pending { at: now },
        }
    }

    pub fn phase_index(&self) -> usize {
        self.phase_index
    }

    /// Index of the effect currently playing.
    pub fn effect_index(&self) -> usize {
        self.index
    }

    pub fn current_effect(&self) -> Option<&TransitionEffect> {
        self.effects.get(self.index)
    }

    pub fn is_charging(&self) -> bool {
        self.dashing_charge().is_some()
    }

    /// Settings of the charge currently dashing, if any.
    pub fn dashing_charge(&self) -> Option<&ChargeSettings> {
        match &self.stage {
            EffectStage::Charging { attack, .. } if attack.is_dashing() => Some(attack.settings()),
            _ => None,
        }
    }

    /// Advance the run. Returns true once every effect has finished.
    pub fn advance(&mut self, now: f32, ctx: &mut TransitionContext) -> bool {
        for _ in 0..MAX_STAGE_STEPS_PER_TICK {
            let stage = std::mem::replace(&mut self.stage, EffectStage::Done);
            let (next, progressed) = self.step(stage, now, ctx);
            self.stage = next;
            if matches!(self.stage, EffectStage::Done) {
                return true;
            }
            if !progressed {
                return false;
            }
        }
        false
    }

    /// Tear down anything still showing. Used when the caster goes down.
    pub fn cancel(&mut self, outbox: &mut Outbox) {
        if let EffectStage::Charging { attack, .. } = &mut self.stage {
            attack.cancel(outbox);
        }
        self.stage = EffectStage::Done;
    }

    /// Forward an external obstacle collision to a dashing charge.
    pub fn hit_obstacle(&mut self, obstacle: EntityId, now: f32, ctx: &mut TransitionContext) -> bool {
        match &mut self.stage {
            EffectStage::Charging { attack, .. } => attack.hit_obstacle(obstacle, now, &mut ctx.charge()),
            _ => false,
        }
    }

    fn finish_effect(&mut self, at: f32) -> EffectStage {
        self.index += 1;
        if self.index >= self.effects.len() {
            EffectStage::Done
        } else {
            EffectStage::Pending { at }
        }
    }

    /// Returns the next stage and whether anything changed.
    fn step(&mut self, stage: EffectStage, now: f32, ctx: &mut TransitionContext) -> (EffectStage, bool) {
        match stage {
            EffectStage::Done => (EffectStage::Done, false),

            EffectStage::Pending { at } => {
                let Some(effect) = self.effects.get(self.index).cloned() else {
                    return (EffectStage::Done, true);
                };
                ctx.outbox.push(DirectorEvent::TransitionEffectStarted {
                    phase_index: self.phase_index,
                    effect: effect.label(),
                });
                (self.start_effect(effect, at, ctx), true)
            }

            EffectStage::Charging {
                mut attack,
                remaining,
            } => {
                let outcome = attack.advance(now, &mut ctx.charge());
                let Some(outcome) = outcome else {
                    return (EffectStage::Charging { attack, remaining }, false);
                };
                info!("{} charge finished: {:?}", ctx.caster, outcome);
                ctx.outbox.push(DirectorEvent::ChargeFinished { outcome });
                if remaining == 0 {
                    return (self.finish_effect(now), true);
                }
                let pause = attack.settings().pause_between.max(0.0);
                (
                    EffectStage::ChargePause {
                        resume_at: now + pause,
                        remaining,
                    },
                    true,
                )
            }

            EffectStage::ChargePause {
                resume_at,
                remaining,
            } => {
                if now < resume_at || ctx.stun.is_stunned() {
                    return (EffectStage::ChargePause { resume_at, remaining }, false);
                }
                let Some(TransitionEffect::Charge(settings)) = self.effects.get(self.index).cloned()
                else {
                    return (self.finish_effect(now), true);
                };
                (
                    EffectStage::Charging {
                        attack: ChargeAttack::new(settings, ctx.caster, now),
                        remaining: remaining - 1,
                    },
                    true,
                )
            }

            EffectStage::SummonWindup { spawn_at } => {
                if now < spawn_at {
                    return (EffectStage::SummonWindup { spawn_at }, false);
                }
                if let Some(TransitionEffect::Summon(settings)) = self.effects.get(self.index).cloned() {
                    spawn_helper(&settings, ctx);
                }
                (self.finish_effect(spawn_at), true)
            }
        }
    }

    fn start_effect(&mut self, effect: TransitionEffect, at: f32, ctx: &mut TransitionContext) -> EffectStage {
        match effect {
            TransitionEffect::None => self.finish_effect(at),

            TransitionEffect::Charge(settings) => {
                if settings.count == 0 {
                    return self.finish_effect(at);
                }
                info!("{} transition: charge x{}", ctx.caster, settings.count);
                let remaining = settings.count - 1;
                EffectStage::Charging {
                    attack: ChargeAttack::new(settings, ctx.caster, at),
                    remaining,
                }
            }

            TransitionEffect::Summon(settings) => {
                if settings.prefab.is_none() {
                    warn!(
                        "{} transition: summon has no helper prefab configured - skipped",
                        ctx.caster
                    );
                    return self.finish_effect(at);
                }
                let windup = settings.windup.max(0.0);
                ctx.outbox.feedback(Feedback::SummonWindup { duration: windup });
                EffectStage::SummonWindup {
                    spawn_at: at + windup,
                }
            }

            TransitionEffect::Shield { amount, duration } => {
                // Reduction goes through the damage-taken multiplier
                if ctx.buffs.apply(-amount, duration, false, at) {
                    info!("{} transition: shield -{:.2} for {:.1}s", ctx.caster, amount, duration);
                    ctx.outbox.feedback(Feedback::ShieldActivated {
                        helper: None,
                        reduction: amount,
                    });
                    ctx.outbox.feedback(Feedback::BuffApplied {
                        kind: MultiplierKind::DamageTaken,
                        amount: -amount,
                        duration,
                    });
                }
                self.finish_effect(at)
            }

            TransitionEffect::Enrage { amount, duration } => {
                if ctx.buffs.apply(amount, duration, true, at) {
                    info!("{} transition: enrage +{:.2} for {:.1}s", ctx.caster, amount, duration);
                    ctx.outbox.feedback(Feedback::Enraged { amount });
                    ctx.outbox.feedback(Feedback::BuffApplied {
                        kind: MultiplierKind::DamageDealt,
                        amount,
                        duration,
                    });
                }
                self.finish_effect(at)
            }
        }
    }
}

/// Spawn the helper, scale its health and arm the shield gate if configured.
fn spawn_helper(settings: &SummonSettings, ctx: &mut TransitionContext) {
    let Some(prefab) = settings.prefab.as_deref() else {
        return;
    };
    let Some(origin) = ctx.arena.position(ctx.caster) else {
        warn!("{} summon: summoner is gone - skipped", ctx.caster);
        return;
    };
    let position = origin + Vec3::from_array(settings.spawn_offset);

    let Some(helper) = ctx.arena.spawn_helper(prefab, position) else {
        warn!(
            "{} summon: unknown helper prefab '{}' - skipped",
            ctx.caster, prefab
        );
        return;
    };

    ctx.arena.scale_health(helper, settings.hp_fraction);
    ctx.outbox.push(DirectorEvent::HelperSpawned {
        helper,
        prefab: prefab.to_string(),
    });
    info!("{} summoned '{}' as {}", ctx.caster, prefab, helper);

    if settings.enable_shield_from_add {
        ctx.summon.activate(helper, settings.shield_reduction_ratio);
        ctx.outbox.feedback(Feedback::ShieldActivated {
            helper: Some(helper),
            reduction: ctx.summon.reduction_ratio(),
        });
    }
}
