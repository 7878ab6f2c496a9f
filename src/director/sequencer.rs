//! Ability Execution Sequencer
//!
//! Each running ability is an explicit state machine advanced once per
//! simulation tick. A stage either does its work and moves on immediately, or
//! waits until an absolute resume time. Every resume is a suspension point:
//! the caster (and, except for channels, the target) is re-checked there and
//! the sequence aborts cleanly, tearing down any telegraph it still owns.
//!
//! Next-stage times are computed from the scheduled time of the current stage
//! rather than from `now`, so a coarse tick never stretches a sequence and a
//! zero-duration stage completes in the same tick.
//!
//! | Shape            | Stages                                                |
//! |------------------|-------------------------------------------------------|
//! | Area, Cone       | telegraph -> windup -> resolve                        |
//! | ProjectileVolley | (aim -> windup -> shots -> recover) x volley_count    |
//! | Channel          | relocate -> channel (health polled) -> explosion      |

use bevy::prelude::*;
use smallvec::SmallVec;

use super::arena::{Arena, EntityId, ProjectileShot, UnitKind};
use super::config::{AbilityDefinition, AbilityShape};
use super::constants::*;
use super::events::{DirectorEvent, Feedback, Outbox, SequenceOutcome};
use super::geometry::{danger_radius, flat_direction, in_cone, rotate_flat, spread_angles};
use super::telegraph::{Telegraph, TelegraphId, TelegraphShape};

/// Everything a stage may touch while it advances.
pub struct SequenceContext<'a> {
    pub arena: &'a mut dyn Arena,
    pub outbox: &'a mut Outbox,
    /// Current damage-dealt multiplier of the caster (already clamped)
    pub outgoing_factor: f32,
}

#[derive(Clone, Debug, PartialEq)]
enum Stage {
    Start,
    /// Area and cone windup; `direction` is zero for areas
    Windup {
        origin: Vec3,
        direction: Vec3,
        resolve_at: f32,
    },
    VolleyAim {
        volley: u32,
        at: f32,
    },
    VolleyWindup {
        volley: u32,
        started: f32,
        origin: Vec3,
        directions: SmallVec<[Vec3; 8]>,
        fire_at: f32,
    },
    VolleyFire {
        volley: u32,
        started: f32,
        origin: Vec3,
        directions: SmallVec<[Vec3; 8]>,
        shot: u32,
        at: f32,
    },
    VolleyRecover {
        volley: u32,
        next_at: f32,
    },
    Relocate {
        from: Vec3,
        to: Vec3,
        started: f32,
        arrive_at: f32,
    },
    Channel {
        center: Vec3,
        started: f32,
        ends_at: f32,
    },
}

impl Stage {
    fn label(&self) -> &'static str {
        match self {
            Stage::Start => "start",
            Stage::Windup { .. } => "windup",
            Stage::VolleyAim { .. } => "volley aim",
            Stage::VolleyWindup { .. } => "volley windup",
            Stage::VolleyFire { .. } => "volley fire",
            Stage::VolleyRecover { .. } => "volley recover",
            Stage::Relocate { .. } => "relocate",
            Stage::Channel { .. } => "channel",
        }
    }
}

enum Step {
    Continue(Stage),
    Wait,
    Done(SequenceOutcome),
}

/// One running ability. Owned by the director while `is_busy` is set.
#[derive(Clone, Debug)]
pub struct AbilitySequence {
    ability: AbilityDefinition,
    caster: EntityId,
    target: EntityId,
    started_at: f32,
    stage: Stage,
    /// Telegraphs still showing that this sequence must cancel on abort
    telegraphs: SmallVec<[TelegraphId; 8]>,
}

impl AbilitySequence {
    pub fn start(ability: AbilityDefinition, caster: EntityId, target: EntityId, now: f32) -> Self {
        Self {
            ability,
            caster,
            target,
            started_at: now,
            stage: Stage::Start,
            telegraphs: SmallVec::new(),
        }
    }

    pub fn ability(&self) -> &AbilityDefinition {
        &self.ability
    }

    pub fn target(&self) -> EntityId {
        self.target
    }

    pub fn stage_label(&self) -> &'static str {
        self.stage.label()
    }

    /// Telegraphs this sequence still owns.
    pub fn live_telegraphs(&self) -> &[TelegraphId] {
        &self.telegraphs
    }

    /// Advance as far as `now` allows. Returns the outcome once finished.
    pub fn advance(&mut self, now: f32, ctx: &mut SequenceContext) -> Option<SequenceOutcome> {
        for _ in 0..MAX_STAGE_STEPS_PER_TICK {
            match self.step(now, ctx) {
                Step::Continue(next) => {
                    debug!(
                        "{} {}: {} -> {}",
                        self.caster,
                        self.ability.name,
                        self.stage.label(),
                        next.label()
                    );
                    self.stage = next;
                }
                Step::Wait => return None,
                Step::Done(outcome) => return Some(outcome),
            }
        }
        warn!(
            "{} {}: stage limit reached in one tick, resuming next tick",
            self.caster, self.ability.name
        );
        None
    }

    /// Abort from outside (phase transition). Tears down live telegraphs.
    pub fn cancel(&mut self, outbox: &mut Outbox) {
        self.cancel_telegraphs(outbox);
    }

    fn cancel_telegraphs(&mut self, outbox: &mut Outbox) {
        for id in self.telegraphs.drain(..) {
            outbox.cancel(id);
        }
    }

    fn abort(&mut self, outbox: &mut Outbox, outcome: SequenceOutcome) -> Step {
        debug!(
            "{} {} aborted during {}: {:?}",
            self.caster,
            self.ability.name,
            self.stage.label(),
            outcome
        );
        self.cancel_telegraphs(outbox);
        Step::Done(outcome)
    }

    /// Suspension-point check. Channels hit every player, so they only need the caster.
    fn interruption(&self, arena: &dyn Arena) -> Option<SequenceOutcome> {
        if !arena.is_alive(self.caster) {
            return Some(SequenceOutcome::CasterLost);
        }
        let needs_target = !matches!(self.ability.shape, AbilityShape::Channel { .. });
        if needs_target && !arena.is_alive(self.target) {
            return Some(SequenceOutcome::TargetLost);
        }
        None
    }

    fn telegraph(&self, shape: TelegraphShape, origin: Vec3, duration: f32) -> Telegraph {
        Telegraph::new(shape, origin, duration).with_intent(self.ability.intent.clone())
    }

    fn step(&mut self, now: f32, ctx: &mut SequenceContext) -> Step {
        match self.stage.clone() {
            Stage::Start => self.begin(ctx),

            Stage::Windup {
                origin,
                direction,
                resolve_at,
            } => {
                if now < resolve_at {
                    return Step::Wait;
                }
                if let Some(outcome) = self.interruption(&*ctx.arena) {
                    return self.abort(ctx.outbox, outcome);
                }
                // The windup telegraph has run its course
                self.telegraphs.clear();
                self.resolve_impact(origin, direction, ctx);
                Step::Done(SequenceOutcome::Completed)
            }

            Stage::VolleyAim { volley, at } => {
                if let Some(outcome) = self.interruption(&*ctx.arena) {
                    return self.abort(ctx.outbox, outcome);
                }
                self.aim_volley(volley, at, ctx)
            }

            Stage::VolleyWindup {
                volley,
                started,
                origin,
                directions,
                fire_at,
            } => {
                if now < fire_at {
                    return Step::Wait;
                }
                if let Some(outcome) = self.interruption(&*ctx.arena) {
                    return self.abort(ctx.outbox, outcome);
                }
                self.telegraphs.clear();
                Step::Continue(Stage::VolleyFire {
                    volley,
                    started,
                    origin,
                    directions,
                    shot: 0,
                    at: fire_at,
                })
            }

            Stage::VolleyFire {
                volley,
                started,
                origin,
                directions,
                shot,
                at,
            } => {
                if now < at {
                    return Step::Wait;
                }
                if shot > 0 {
                    if let Some(outcome) = self.interruption(&*ctx.arena) {
                        return self.abort(ctx.outbox, outcome);
                    }
                }
                self.fire_shots(origin, &directions, ctx);
                self.after_shot(volley, started, origin, directions, shot, at)
            }

            Stage::VolleyRecover { volley, next_at } => {
                if now < next_at {
                    return Step::Wait;
                }
                Step::Continue(Stage::VolleyAim {
                    volley: volley + 1,
                    at: next_at,
                })
            }

            Stage::Relocate {
                from,
                to,
                started,
                arrive_at,
            } => {
                if !ctx.arena.is_alive(self.caster) {
                    return self.abort(ctx.outbox, SequenceOutcome::CasterLost);
                }
                if now < arrive_at {
                    let t = ((now - started) / (arrive_at - started)).clamp(0.0, 1.0);
                    ctx.arena.set_position(self.caster, from.lerp(to, t));
                    return Step::Wait;
                }
                ctx.arena.set_position(self.caster, to);
                self.begin_channel(to, arrive_at, ctx)
            }

            Stage::Channel {
                center,
                started,
                ends_at,
            } => {
                // Polled every tick, not only at the end
                match ctx.arena.unit(self.caster) {
                    None => return self.abort(ctx.outbox, SequenceOutcome::CasterLost),
                    Some(unit) if !unit.is_alive() => {
                        return self.abort(ctx.outbox, SequenceOutcome::ChannelBroken)
                    }
                    Some(_) => {}
                }
                if now < ends_at {
                    return Step::Wait;
                }
                self.telegraphs.clear();
                self.explode(center, ends_at - started, ctx);
                Step::Done(SequenceOutcome::Completed)
            }
        }
    }

    fn begin(&mut self, ctx: &mut SequenceContext) -> Step {
        if let Some(outcome) = self.interruption(&*ctx.arena) {
            return self.abort(ctx.outbox, outcome);
        }
        // interruption() guarantees the caster is present
        let Some(origin) = ctx.arena.position(self.caster) else {
            return self.abort(ctx.outbox, SequenceOutcome::CasterLost);
        };
        let windup = self.ability.windup_duration.max(0.0);
        let resolve_at = self.started_at + windup;

        match self.ability.shape.clone() {
            AbilityShape::Area { radius, .. } => {
                let telegraph = self.telegraph(TelegraphShape::Circle { radius }, origin, windup);
                self.telegraphs.push(ctx.outbox.show(telegraph));
                Step::Continue(Stage::Windup {
                    origin,
                    direction: Vec3::ZERO,
                    resolve_at,
                })
            }
            AbilityShape::Cone { radius, arc_degrees } => {
                let target = ctx.arena.position(self.target).unwrap_or(origin);
                let direction = flat_direction(origin, target);
                let telegraph = self
                    .telegraph(TelegraphShape::Cone { radius, arc_degrees }, origin, windup)
                    .facing(direction);
                self.telegraphs.push(ctx.outbox.show(telegraph));
                Step::Continue(Stage::Windup {
                    origin,
                    direction,
                    resolve_at,
                })
            }
            AbilityShape::ProjectileVolley {
                volley_count,
                shots_per_volley,
                ..
            } => {
                if volley_count == 0 || shots_per_volley == 0 {
                    return Step::Done(SequenceOutcome::Completed);
                }
                Step::Continue(Stage::VolleyAim {
                    volley: 0,
                    at: self.started_at,
                })
            }
            AbilityShape::Channel {
                relocate_duration,
                anchor,
                ..
            } => {
                let to = anchor
                    .map(Vec3::from_array)
                    .unwrap_or(Vec3::new(0.0, origin.y, 0.0));
                Step::Continue(Stage::Relocate {
                    from: origin,
                    to,
                    started: self.started_at,
                    arrive_at: self.started_at + relocate_duration.max(0.0),
                })
            }
        }
    }

    // ========================================================================
    // Area & Cone
    // ========================================================================

    fn resolve_impact(&mut self, origin: Vec3, direction: Vec3, ctx: &mut SequenceContext) {
        let damage = self.ability.damage * ctx.outgoing_factor;
        let filter = self.ability.damage_filter;

        match self.ability.shape {
            AbilityShape::Area {
                radius,
                knockback_force,
            } => {
                let victims = ctx.arena.damageables_within(origin, radius, filter);
                for victim in victims.into_iter().filter(|v| *v != self.caster) {
                    let Some(position) = ctx.arena.position(victim) else {
                        continue;
                    };
                    deal_damage(ctx, victim, damage, self.caster, &self.ability.name);
                    if knockback_force > 0.0 {
                        let push = flat_direction(origin, position);
                        ctx.arena.apply_knockback(victim, push, knockback_force);
                    }
                }
                let shake = self.ability.shake.map_or(
                    Feedback::ScreenShake {
                        intensity: AREA_SHAKE_INTENSITY,
                        duration: AREA_SHAKE_DURATION,
                    },
                    |s| Feedback::ScreenShake {
                        intensity: s.intensity,
                        duration: s.duration,
                    },
                );
                ctx.outbox.feedback(shake);
            }
            AbilityShape::Cone { radius, arc_degrees } => {
                let victims = ctx.arena.damageables_within(origin, radius, filter);
                for victim in victims.into_iter().filter(|v| *v != self.caster) {
                    let Some(position) = ctx.arena.position(victim) else {
                        continue;
                    };
                    if in_cone(direction, position - origin, arc_degrees) {
                        deal_damage(ctx, victim, damage, self.caster, &self.ability.name);
                    }
                }
                if let Some(shake) = self.ability.shake {
                    ctx.outbox.feedback(Feedback::ScreenShake {
                        intensity: shake.intensity,
                        duration: shake.duration,
                    });
                }
            }
            AbilityShape::ProjectileVolley { .. } | AbilityShape::Channel { .. } => {}
        }
    }

    // ========================================================================
    // Projectile volley
    // ========================================================================

    fn aim_volley(&mut self, volley: u32, at: f32, ctx: &mut SequenceContext) -> Step {
        let AbilityShape::ProjectileVolley {
            projectile_count,
            spread_angle,
            range,
            ..
        } = self.ability.shape
        else {
            return Step::Done(SequenceOutcome::Completed);
        };

        let Some(origin) = ctx.arena.position(self.caster) else {
            return self.abort(ctx.outbox, SequenceOutcome::CasterLost);
        };
        let Some(target) = ctx.arena.position(self.target) else {
            return self.abort(ctx.outbox, SequenceOutcome::TargetLost);
        };

        let mut center = flat_direction(origin, target);
        if center == Vec3::ZERO {
            center = Vec3::Z;
        }

        let windup = self.ability.windup_duration.max(0.0);
        let directions: SmallVec<[Vec3; 8]> = spread_angles(projectile_count, spread_angle)
            .into_iter()
            .map(|angle| rotate_flat(center, angle))
            .collect();

        for direction in &directions {
            let telegraph = self
                .telegraph(
                    TelegraphShape::Line {
                        end: origin + *direction * range.max(0.0),
                    },
                    origin,
                    windup,
                )
                .facing(*direction);
            self.telegraphs.push(ctx.outbox.show(telegraph));
        }

        Step::Continue(Stage::VolleyWindup {
            volley,
            started: at,
            origin,
            directions,
            fire_at: at + windup,
        })
    }

    fn fire_shots(&self, origin: Vec3, directions: &[Vec3], ctx: &mut SequenceContext) {
        let AbilityShape::ProjectileVolley {
            range,
            projectile_speed,
            ..
        } = self.ability.shape
        else {
            return;
        };
        let damage = self.ability.damage * ctx.outgoing_factor;
        for direction in directions {
            ctx.arena.fire_projectile(ProjectileShot {
                attacker: self.caster,
                origin,
                direction: *direction,
                speed: projectile_speed,
                range,
                damage,
                damage_filter: self.ability.damage_filter,
                ability_name: self.ability.name.clone(),
            });
        }
    }

    fn after_shot(
        &self,
        volley: u32,
        started: f32,
        origin: Vec3,
        directions: SmallVec<[Vec3; 8]>,
        shot: u32,
        at: f32,
    ) -> Step {
        let AbilityShape::ProjectileVolley {
            volley_count,
            volley_interval,
            shots_per_volley,
            shot_delay,
            ..
        } = self.ability.shape
        else {
            return Step::Done(SequenceOutcome::Completed);
        };

        if shot + 1 < shots_per_volley {
            return Step::Continue(Stage::VolleyFire {
                volley,
                started,
                origin,
                directions,
                shot: shot + 1,
                at: at + shot_delay.max(0.0),
            });
        }
        if volley + 1 >= volley_count {
            return Step::Done(SequenceOutcome::Completed);
        }
        // Wait out whatever is left of this volley's interval
        Step::Continue(Stage::VolleyRecover {
            volley,
            next_at: (started + volley_interval).max(at),
        })
    }

    // ========================================================================
    // Channel
    // ========================================================================

    fn begin_channel(&mut self, center: Vec3, started: f32, ctx: &mut SequenceContext) -> Step {
        let AbilityShape::Channel {
            duration,
            max_radius,
            ..
        } = self.ability.shape
        else {
            return Step::Done(SequenceOutcome::Completed);
        };
        let duration = duration.max(0.0);
        let telegraph = self.telegraph(TelegraphShape::GrowingCircle { max_radius }, center, duration);
        self.telegraphs.push(ctx.outbox.show(telegraph));
        Step::Continue(Stage::Channel {
            center,
            started,
            ends_at: started + duration,
        })
    }

    fn explode(&mut self, center: Vec3, channeled: f32, ctx: &mut SequenceContext) {
        let AbilityShape::Channel {
            duration,
            max_radius,
            ..
        } = self.ability.shape
        else {
            return;
        };
        let scaled = self.ability.damage * ctx.outgoing_factor;

        // Overwhelming: never less than what the player has left
        for player in ctx.arena.players() {
            let health = ctx.arena.unit(player).map_or(0.0, |u| u.health);
            deal_damage(ctx, player, scaled.max(health), self.caster, &self.ability.name);
        }

        ctx.outbox.feedback(Feedback::Explosion {
            position: center,
            radius: danger_radius(max_radius, channeled, duration),
        });
        ctx.outbox.feedback(Feedback::ScreenShake {
            intensity: EXPLOSION_SHAKE_INTENSITY,
            duration: EXPLOSION_SHAKE_DURATION,
        });
    }
}

/// Apply damage through the arena and record it.
pub(crate) fn deal_damage(
    ctx: &mut SequenceContext,
    victim: EntityId,
    amount: f32,
    attacker: EntityId,
    source: &str,
) {
    let dealt = ctx.arena.apply_damage(victim, amount, attacker);
    if dealt <= 0.0 {
        return;
    }
    ctx.outbox.push(DirectorEvent::DamageDealt {
        victim,
        amount: dealt,
        source: source.to_string(),
    });
    let defeated = ctx
        .arena
        .unit(victim)
        .is_some_and(|u| u.kind == UnitKind::Player && !u.is_alive());
    if defeated {
        ctx.outbox.push(DirectorEvent::PlayerDefeated {
            victim,
            source: source.to_string(),
        });
    }
}
