//! Charge Attack
//!
//! A single charge played by a phase transition:
//! 1. pick a random alive player;
//! 2. track them with a telegraph that follows every tick;
//! 3. lock the aim on the target's position at that moment and hold it;
//! 4. dash in a straight line at fixed speed for the full max distance.
//!
//! The locked point only gives the direction: a dash always covers
//! `max_distance` unless something stops it. The arena edge counts: a dash
//! the arena clamps short ends there without the miss reward. Collisions are checked in small
//! sub-steps along the path (obstacles first, then players), so a fast dash
//! cannot skip over anything between two ticks.

use bevy::prelude::*;

use super::arena::{Arena, EntityId};
use super::buffs::{BuffState, MultiplierKind, StunState};
use super::config::{ChargeSettings, DamageFilter};
use super::constants::{CHARGE_SUBSTEP_DISTANCE, POSITION_EPSILON};
use super::events::{ChargeOutcome, DirectorEvent, Feedback, Outbox};
use super::geometry::{flat_direction, flat_distance};
use super::rng::GameRng;
use super::telegraph::{Telegraph, TelegraphId, TelegraphShape};

/// Name recorded as the damage source of a charge.
pub const CHARGE_SOURCE: &str = "Charge";

/// Director state a charge reads and writes.
pub struct ChargeContext<'a> {
    pub arena: &'a mut dyn Arena,
    pub outbox: &'a mut Outbox,
    pub buffs: &'a mut BuffState,
    pub stun: &'a mut StunState,
    pub rng: &'a mut GameRng,
}

#[derive(Clone, Debug, PartialEq)]
enum ChargeStage {
    PickTarget,
    Tracking {
        target: EntityId,
        telegraph: TelegraphId,
        lock_at: f32,
    },
    Locked {
        telegraph: TelegraphId,
        aim: Vec3,
        dash_at: f32,
    },
    Dashing {
        start: Vec3,
        direction: Vec3,
        started: f32,
        traveled: f32,
    },
    Finished(ChargeOutcome),
}

#[derive(Clone, Debug)]
pub struct ChargeAttack {
    settings: ChargeSettings,
    caster: EntityId,
    started_at: f32,
    stage: ChargeStage,
}

impl ChargeAttack {
    pub fn new(settings: ChargeSettings, caster: EntityId, now: f32) -> Self {
        Self {
            settings,
            caster,
            started_at: now,
            stage: ChargeStage::PickTarget,
        }
    }

    pub fn is_dashing(&self) -> bool {
        matches!(self.stage, ChargeStage::Dashing { .. })
    }

    pub fn settings(&self) -> &ChargeSettings {
        &self.settings
    }

    /// Distance covered by the dash so far (0 before it starts).
    pub fn traveled(&self) -> f32 {
        match self.stage {
            ChargeStage::Dashing { traveled, .. } => traveled,
            _ => 0.0,
        }
    }

    /// Advance the charge. Returns the outcome once it is over.
    pub fn advance(&mut self, now: f32, ctx: &mut ChargeContext) -> Option<ChargeOutcome> {
        // Each stage may hand over to the next within the same tick
        for _ in 0..4 {
            let finished = matches!(self.stage, ChargeStage::Finished(_));
            if !finished && !ctx.arena.is_alive(self.caster) {
                self.cancel(ctx.outbox);
                self.stage = ChargeStage::Finished(ChargeOutcome::Aborted);
            }
            match self.stage.clone() {
                ChargeStage::Finished(outcome) => return Some(outcome),
                ChargeStage::PickTarget => self.pick_target(ctx),
                ChargeStage::Tracking {
                    target,
                    telegraph,
                    lock_at,
                } => {
                    if !self.track(target, telegraph, lock_at, now, ctx) {
                        return None;
                    }
                }
                ChargeStage::Locked {
                    telegraph,
                    aim,
                    dash_at,
                } => {
                    if now < dash_at {
                        return None;
                    }
                    self.begin_dash(telegraph, aim, dash_at, ctx);
                }
                ChargeStage::Dashing {
                    start,
                    direction,
                    started,
                    traveled,
                } => {
                    self.dash(start, direction, started, traveled, now, ctx);
                    if !matches!(self.stage, ChargeStage::Finished(_)) {
                        return None;
                    }
                }
            }
        }
        match self.stage {
            ChargeStage::Finished(outcome) => Some(outcome),
            _ => None,
        }
    }

    /// Tear down the telegraph if the charge is interrupted before it dashes.
    pub fn cancel(&mut self, outbox: &mut Outbox) {
        match self.stage {
            ChargeStage::Tracking { telegraph, .. } | ChargeStage::Locked { telegraph, .. } => {
                outbox.cancel(telegraph);
            }
            _ => {}
        }
    }

    /// External collision callback. Only a dashing charge can hit an obstacle.
    pub fn hit_obstacle(&mut self, obstacle: EntityId, now: f32, ctx: &mut ChargeContext) -> bool {
        if !self.is_dashing() {
            return false;
        }
        resolve_obstacle_impact(&self.settings, obstacle, now, ctx);
        self.stage = ChargeStage::Finished(ChargeOutcome::HitObstacle(obstacle));
        true
    }

    fn pick_target(&mut self, ctx: &mut ChargeContext) {
        let players = ctx.arena.players();
        let Some(target) = ctx.rng.pick(&players) else {
            debug!("{} charge: no player to charge", self.caster);
            self.stage = ChargeStage::Finished(ChargeOutcome::NoTarget);
            return;
        };
        let (Some(origin), Some(aim)) = (ctx.arena.position(self.caster), ctx.arena.position(target)) else {
            self.stage = ChargeStage::Finished(ChargeOutcome::NoTarget);
            return;
        };

        let tracking = self.settings.tracking_duration.max(0.0);
        let telegraph = ctx.outbox.show(Telegraph::new(
            TelegraphShape::ChargeTrack {
                target: aim,
                locked: false,
            },
            origin,
            tracking,
        ));
        debug!("{} charge: tracking {}", self.caster, target);
        self.stage = ChargeStage::Tracking {
            target,
            telegraph,
            lock_at: self.started_at + tracking,
        };
    }

    /// Returns true when the stage changed.
    fn track(
        &mut self,
        target: EntityId,
        telegraph: TelegraphId,
        lock_at: f32,
        now: f32,
        ctx: &mut ChargeContext,
    ) -> bool {
        let (Some(origin), Some(aim)) = (ctx.arena.position(self.caster), ctx.arena.position(target))
        else {
            ctx.outbox.cancel(telegraph);
            self.stage = ChargeStage::Finished(ChargeOutcome::NoTarget);
            return true;
        };
        if !ctx.arena.is_alive(target) {
            ctx.outbox.cancel(telegraph);
            self.stage = ChargeStage::Finished(ChargeOutcome::NoTarget);
            return true;
        }

        if now < lock_at {
            ctx.outbox.update(
                telegraph,
                Telegraph::new(
                    TelegraphShape::ChargeTrack {
                        target: aim,
                        locked: false,
                    },
                    origin,
                    lock_at - now,
                ),
            );
            return false;
        }

        // Aim is fixed from here on
        let lock = self.settings.lock_duration.max(0.0);
        ctx.outbox.update(
            telegraph,
            Telegraph::new(
                TelegraphShape::ChargeTrack {
                    target: aim,
                    locked: true,
                },
                origin,
                lock,
            ),
        );
        self.stage = ChargeStage::Locked {
            telegraph,
            aim,
            dash_at: lock_at + lock,
        };
        true
    }

    fn begin_dash(&mut self, telegraph: TelegraphId, aim: Vec3, dash_at: f32, ctx: &mut ChargeContext) {
        let Some(start) = ctx.arena.position(self.caster) else {
            ctx.outbox.cancel(telegraph);
            self.stage = ChargeStage::Finished(ChargeOutcome::Aborted);
            return;
        };
        let direction = flat_direction(start, aim);
        if direction == Vec3::ZERO || self.settings.max_distance <= 0.0 {
            debug!("{} charge: degenerate dash, skipped", self.caster);
            self.stage = ChargeStage::Finished(ChargeOutcome::Aborted);
            return;
        }
        self.stage = ChargeStage::Dashing {
            start,
            direction,
            started: dash_at,
            traveled: 0.0,
        };
    }

    fn dash(
        &mut self,
        start: Vec3,
        direction: Vec3,
        started: f32,
        mut traveled: f32,
        now: f32,
        ctx: &mut ChargeContext,
    ) {
        let max_distance = self.settings.max_distance;
        let reachable = if self.settings.speed <= 0.0 {
            max_distance
        } else {
            ((now - started).max(0.0) * self.settings.speed).min(max_distance)
        };

        while traveled < reachable {
            traveled = (traveled + CHARGE_SUBSTEP_DISTANCE).min(reachable);
            let intended = start + direction * traveled;
            ctx.arena.set_position(self.caster, intended);
            let position = ctx.arena.position(self.caster).unwrap_or(intended);

            if let Some(obstacle) = ctx
                .arena
                .obstacles_within(position, self.settings.hit_radius)
                .first()
                .copied()
            {
                resolve_obstacle_impact(&self.settings, obstacle, now, ctx);
                self.stage = ChargeStage::Finished(ChargeOutcome::HitObstacle(obstacle));
                return;
            }

            if let Some(player) = ctx
                .arena
                .damageables_within(position, self.settings.hit_radius, DamageFilter::Players)
                .first()
                .copied()
            {
                ctx.arena.defeat(player);
                ctx.outbox.push(DirectorEvent::PlayerDefeated {
                    victim: player,
                    source: CHARGE_SOURCE.to_string(),
                });
                self.stage = ChargeStage::Finished(ChargeOutcome::HitPlayer(player));
                return;
            }

            if flat_distance(position, intended) > POSITION_EPSILON {
                debug!("{} charge: stopped by the arena edge after {:.1}", self.caster, traveled);
                self.stage = ChargeStage::Finished(ChargeOutcome::HitWall);
                return;
            }
        }

        if traveled >= max_distance {
            let settings = &self.settings;
            if ctx.buffs.apply(
                settings.miss_buff_amount,
                settings.miss_buff_duration,
                true,
                now,
            ) {
                ctx.outbox.feedback(Feedback::BuffApplied {
                    kind: MultiplierKind::DamageDealt,
                    amount: settings.miss_buff_amount,
                    duration: settings.miss_buff_duration,
                });
            }
            self.stage = ChargeStage::Finished(ChargeOutcome::Missed);
            return;
        }

        self.stage = ChargeStage::Dashing {
            start,
            direction,
            started,
            traveled,
        };
    }
}

/// Stun, debuff and destroy: what slamming into an obstacle does to the caster.
pub fn resolve_obstacle_impact(
    settings: &ChargeSettings,
    obstacle: EntityId,
    now: f32,
    ctx: &mut ChargeContext,
) {
    info!(
        "Charge hit obstacle {}: stunned {:.1}s, damage taken +{:.2}",
        obstacle, settings.stun_duration, settings.obstacle_debuff_amount
    );
    if ctx.stun.apply(settings.stun_duration, now) {
        ctx.outbox.feedback(Feedback::Stunned {
            duration: settings.stun_duration,
        });
    }
    if ctx.buffs.apply(
        settings.obstacle_debuff_amount,
        settings.obstacle_debuff_duration,
        false,
        now,
    ) {
        ctx.outbox.feedback(Feedback::BuffApplied {
            kind: MultiplierKind::DamageTaken,
            amount: settings.obstacle_debuff_amount,
            duration: settings.obstacle_debuff_duration,
        });
    }
    ctx.arena.destroy_obstacle(obstacle);
}
