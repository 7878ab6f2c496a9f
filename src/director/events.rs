//! Director Output
//!
//! Everything the director produces besides arena side effects is queued in an
//! [`Outbox`] and drained by the owner once per tick: telegraph commands,
//! feedback (shake, shield, buff), phase notifications and a record of the
//! damage it dealt.

use bevy::math::Vec3;

use super::arena::EntityId;
use super::buffs::MultiplierKind;
use super::telegraph::{Telegraph, TelegraphCommand, TelegraphId};

/// Why an ability sequence ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SequenceOutcome {
    Completed,
    /// Target despawned or died before a suspension point
    TargetLost,
    /// The caster despawned or died
    CasterLost,
    /// Caster health reached zero while channeling
    ChannelBroken,
    /// Superseded by a phase transition
    Cancelled,
}

/// How a single charge ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChargeOutcome {
    HitObstacle(EntityId),
    HitPlayer(EntityId),
    /// Travelled the full distance without touching anything
    Missed,
    /// Stopped by the arena edge before covering the full distance
    HitWall,
    /// No player to charge at, or the target vanished while tracking
    NoTarget,
    Aborted,
}

/// Presentation feedback. Observers react; nothing reads it back.
#[derive(Clone, Debug, PartialEq)]
pub enum Feedback {
    ScreenShake { intensity: f32, duration: f32 },
    ShieldActivated { helper: Option<EntityId>, reduction: f32 },
    ShieldBroken { helper: Option<EntityId> },
    BuffApplied { kind: MultiplierKind, amount: f32, duration: f32 },
    BuffExpired { kind: MultiplierKind },
    Stunned { duration: f32 },
    StunEnded,
    SummonWindup { duration: f32 },
    Enraged { amount: f32 },
    Explosion { position: Vec3, radius: f32 },
}

/// Events produced by a director during a tick.
#[derive(Clone, Debug, PartialEq)]
pub enum DirectorEvent {
    PhaseChanged { phase_index: usize, phase_name: String },
    TransitionStarted { phase_index: usize, effects: usize },
    TransitionEffectStarted { phase_index: usize, effect: &'static str },
    TransitionFinished { phase_index: usize },
    AbilityStarted { ability: String, target: EntityId },
    AbilityFinished { ability: String, outcome: SequenceOutcome },
    ChargeFinished { outcome: ChargeOutcome },
    HelperSpawned { helper: EntityId, prefab: String },
    DamageDealt { victim: EntityId, amount: f32, source: String },
    PlayerDefeated { victim: EntityId, source: String },
    Telegraph(TelegraphCommand),
    Feedback(Feedback),
}

/// Queue of events plus the telegraph id allocator.
#[derive(Clone, Debug, Default)]
pub struct Outbox {
    events: Vec<DirectorEvent>,
    next_telegraph: u64,
}

impl Outbox {
    pub fn push(&mut self, event: DirectorEvent) {
        self.events.push(event);
    }

    pub fn feedback(&mut self, feedback: Feedback) {
        self.events.push(DirectorEvent::Feedback(feedback));
    }

    /// Emit a new telegraph and return its handle.
    pub fn show(&mut self, telegraph: Telegraph) -> TelegraphId {
        let id = TelegraphId(self.next_telegraph);
        self.next_telegraph += 1;
        self.events
            .push(DirectorEvent::Telegraph(TelegraphCommand::Show { id, telegraph }));
        id
    }

    pub fn update(&mut self, id: TelegraphId, telegraph: Telegraph) {
        self.events
            .push(DirectorEvent::Telegraph(TelegraphCommand::Update { id, telegraph }));
    }

    pub fn cancel(&mut self, id: TelegraphId) {
        self.events
            .push(DirectorEvent::Telegraph(TelegraphCommand::Cancel { id }));
    }

    pub fn events(&self) -> &[DirectorEvent] {
        &self.events
    }

    pub fn drain(&mut self) -> Vec<DirectorEvent> {
        std::mem::take(&mut self.events)
    }
}
