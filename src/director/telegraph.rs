//! Telegraphs
//!
//! Presentation-only warnings of where and when an effect will resolve.
//! The director emits them as commands; observers draw them and let them
//! expire on their own. Gameplay outcomes are never computed from telegraphs.
//! The only handle the director keeps is the [`TelegraphId`] it needs to
//! cancel or update one it still owns.

use bevy::math::Vec3;

/// Handle used to update or cancel an emitted telegraph.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TelegraphId(pub u64);

/// Geometry of a telegraph.
#[derive(Clone, Debug, PartialEq)]
pub enum TelegraphShape {
    Circle { radius: f32 },
    /// Wedge centered on the telegraph direction
    Cone { radius: f32, arc_degrees: f32 },
    /// Straight line from the origin to `end`
    Line { end: Vec3 },
    /// Circle whose radius grows linearly from 0 to `max_radius` over the duration
    GrowingCircle { max_radius: f32 },
    /// Charge aim: line from the caster to `target` plus a marker on it
    ChargeTrack { target: Vec3, locked: bool },
}

impl TelegraphShape {
    pub fn label(&self) -> &'static str {
        match self {
            TelegraphShape::Circle { .. } => "circle",
            TelegraphShape::Cone { .. } => "cone",
            TelegraphShape::Line { .. } => "line",
            TelegraphShape::GrowingCircle { .. } => "growing circle",
            TelegraphShape::ChargeTrack { .. } => "charge track",
        }
    }
}

/// An ephemeral, replicated warning.
#[derive(Clone, Debug, PartialEq)]
pub struct Telegraph {
    pub shape: TelegraphShape,
    pub origin: Vec3,
    /// Ground-plane facing (cones); zero when irrelevant
    pub direction: Vec3,
    /// Seconds until observers drop it on their own
    pub duration: f32,
    /// Visual/audio intent handle from the ability definition
    pub intent: Option<String>,
}

impl Telegraph {
    pub fn new(shape: TelegraphShape, origin: Vec3, duration: f32) -> Self {
        Self {
            shape,
            origin,
            direction: Vec3::ZERO,
            duration: duration.max(0.0),
            intent: None,
        }
    }

    pub fn facing(mut self, direction: Vec3) -> Self {
        self.direction = direction;
        self
    }

    pub fn with_intent(mut self, intent: Option<String>) -> Self {
        self.intent = intent;
        self
    }
}

/// One-way broadcast from authority to observers.
#[derive(Clone, Debug, PartialEq)]
pub enum TelegraphCommand {
    Show { id: TelegraphId, telegraph: Telegraph },
    /// Replace the geometry of a telegraph that is still showing
    Update { id: TelegraphId, telegraph: Telegraph },
    /// Tear down early (sequence aborted)
    Cancel { id: TelegraphId },
}

impl TelegraphCommand {
    pub fn id(&self) -> TelegraphId {
        match self {
            TelegraphCommand::Show { id, .. }
            | TelegraphCommand::Update { id, .. }
            | TelegraphCommand::Cancel { id } => *id,
        }
    }
}
