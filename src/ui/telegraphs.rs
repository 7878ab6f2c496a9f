//! Observer-side telegraph tracking
//!
//! Telegraph commands arrive one-way from the authority. Observers keep what
//! is showing, replace geometry on updates, and drop entries on cancel or
//! once their duration has passed. Nothing here feeds back into gameplay.

use bevy::prelude::*;
use std::collections::BTreeMap;

use crate::combat::events::{FeedbackEvent, TelegraphEvent};
use crate::director::{EntityId, Feedback, Telegraph, TelegraphCommand, TelegraphId};
use crate::encounter::systems::EncounterClock;

/// A telegraph currently on screen.
#[derive(Clone, Debug, PartialEq)]
pub struct VisibleTelegraph {
    pub boss: EntityId,
    pub telegraph: Telegraph,
    pub shown_at: f32,
}

impl VisibleTelegraph {
    pub fn expires_at(&self) -> f32 {
        self.shown_at + self.telegraph.duration
    }

    /// 0.0 when shown, 1.0 at expiry
    pub fn progress(&self, now: f32) -> f32 {
        if self.telegraph.duration <= 0.0 {
            return 1.0;
        }
        ((now - self.shown_at) / self.telegraph.duration).clamp(0.0, 1.0)
    }
}

#[derive(Resource, Default, Debug)]
pub struct VisibleTelegraphs {
    entries: BTreeMap<(EntityId, TelegraphId), VisibleTelegraph>,
}

impl VisibleTelegraphs {
    pub fn apply(&mut self, boss: EntityId, command: &TelegraphCommand, now: f32) {
        match command {
            TelegraphCommand::Show { id, telegraph } => {
                self.entries.insert(
                    (boss, *id),
                    VisibleTelegraph {
                        boss,
                        telegraph: telegraph.clone(),
                        shown_at: now,
                    },
                );
            }
            TelegraphCommand::Update { id, telegraph } => {
                // Updates restart the countdown with the new duration
                if let Some(entry) = self.entries.get_mut(&(boss, *id)) {
                    entry.telegraph = telegraph.clone();
                    entry.shown_at = now;
                }
            }
            TelegraphCommand::Cancel { id } => {
                self.entries.remove(&(boss, *id));
            }
        }
    }

    /// Drop every telegraph whose duration has passed.
    pub fn expire(&mut self, now: f32) {
        self.entries.retain(|_, entry| now <= entry.expires_at());
    }

    pub fn iter(&self) -> impl Iterator<Item = &VisibleTelegraph> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Screen shake currently playing.
#[derive(Resource, Default, Debug)]
pub struct ScreenShakeState {
    pub intensity: f32,
    pub remaining: f32,
}

impl ScreenShakeState {
    /// The stronger shake wins; durations don't stack.
    pub fn trigger(&mut self, intensity: f32, duration: f32) {
        if self.remaining <= 0.0 || intensity >= self.intensity {
            self.intensity = intensity;
        }
        self.remaining = self.remaining.max(duration);
    }

    pub fn tick(&mut self, dt: f32) {
        self.remaining = (self.remaining - dt).max(0.0);
        if self.remaining <= 0.0 {
            self.intensity = 0.0;
        }
    }
}

pub fn track_telegraphs(
    clock: Res<EncounterClock>,
    mut events: EventReader<TelegraphEvent>,
    mut visible: ResMut<VisibleTelegraphs>,
) {
    for event in events.read() {
        visible.apply(event.boss, &event.command, clock.elapsed);
    }
    visible.expire(clock.elapsed);
}

pub fn track_screen_shake(
    time: Res<Time>,
    mut events: EventReader<FeedbackEvent>,
    mut shake: ResMut<ScreenShakeState>,
) {
    shake.tick(time.delta_secs());
    for event in events.read() {
        if let Feedback::ScreenShake { intensity, duration } = event.feedback {
            shake.trigger(intensity, duration);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::director::TelegraphShape;

    const BOSS: EntityId = EntityId(1);

    fn circle(duration: f32) -> Telegraph {
        Telegraph::new(TelegraphShape::Circle { radius: 5.0 }, Vec3::ZERO, duration)
    }

    #[test]
    fn test_show_then_expire() {
        let mut visible = VisibleTelegraphs::default();
        visible.apply(
            BOSS,
            &TelegraphCommand::Show {
                id: TelegraphId(1),
                telegraph: circle(2.0),
            },
            10.0,
        );
        visible.expire(11.5);
        assert_eq!(visible.len(), 1);
        visible.expire(12.1);
        assert!(visible.is_empty());
    }

    #[test]
    fn test_cancel_removes_early() {
        let mut visible = VisibleTelegraphs::default();
        let id = TelegraphId(3);
        visible.apply(BOSS, &TelegraphCommand::Show { id, telegraph: circle(5.0) }, 0.0);
        visible.apply(BOSS, &TelegraphCommand::Cancel { id }, 1.0);
        assert!(visible.is_empty());
    }

    #[test]
    fn test_update_replaces_geometry() {
        let mut visible = VisibleTelegraphs::default();
        let id = TelegraphId(4);
        visible.apply(BOSS, &TelegraphCommand::Show { id, telegraph: circle(1.0) }, 0.0);
        let moved = Telegraph::new(
            TelegraphShape::ChargeTrack {
                target: Vec3::new(3.0, 0.0, 0.0),
                locked: true,
            },
            Vec3::ZERO,
            1.0,
        );
        visible.apply(BOSS, &TelegraphCommand::Update { id, telegraph: moved.clone() }, 0.5);

        let entry = visible.iter().next().unwrap();
        assert_eq!(entry.telegraph, moved);
        assert_eq!(entry.shown_at, 0.5);
    }

    #[test]
    fn test_update_for_unknown_id_is_ignored() {
        let mut visible = VisibleTelegraphs::default();
        visible.apply(
            BOSS,
            &TelegraphCommand::Update {
                id: TelegraphId(9),
                telegraph: circle(1.0),
            },
            0.0,
        );
        assert!(visible.is_empty());
    }

    #[test]
    fn test_progress() {
        let entry = VisibleTelegraph {
            boss: BOSS,
            telegraph: circle(2.0),
            shown_at: 1.0,
        };
        assert_eq!(entry.progress(2.0), 0.5);
        assert_eq!(entry.progress(5.0), 1.0);
    }

    #[test]
    fn test_screen_shake_stronger_wins() {
        let mut shake = ScreenShakeState::default();
        shake.trigger(0.5, 1.0);
        shake.trigger(0.2, 0.3);
        assert_eq!(shake.intensity, 0.5);
        assert_eq!(shake.remaining, 1.0);
        shake.tick(1.0);
        assert_eq!(shake.intensity, 0.0);
    }
}
