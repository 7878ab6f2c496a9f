//! Replicated Director State
//!
//! Observers never derive combat state themselves. The authority publishes a
//! small snapshot, and only when one of its fields actually changed.

use serde::{Deserialize, Serialize};

/// Read-only view of a director pushed from authority to observers.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DirectorSnapshot {
    pub phase_index: Option<usize>,
    pub phase_name: Option<String>,
    pub is_busy: bool,
    pub in_transition: bool,
    pub stunned: bool,
    pub damage_dealt_multiplier: f32,
    pub damage_taken_multiplier: f32,
    pub shield_active: bool,
    pub shield_reduction: f32,
    /// Name of the ability currently executing
    pub active_ability: Option<String>,
}

/// Tracks the last published snapshot and suppresses unchanged ones.
#[derive(Clone, Debug, Default)]
pub struct SnapshotPublisher {
    last: Option<DirectorSnapshot>,
    published: u64,
}

impl SnapshotPublisher {
    /// Returns the snapshot to push, or `None` when nothing changed.
    pub fn publish(&mut self, snapshot: DirectorSnapshot) -> Option<DirectorSnapshot> {
        if self.last.as_ref() == Some(&snapshot) {
            return None;
        }
        self.last = Some(snapshot.clone());
        self.published += 1;
        Some(snapshot)
    }

    pub fn last(&self) -> Option<&DirectorSnapshot> {
        self.last.as_ref()
    }

    /// Number of snapshots pushed so far.
    pub fn published(&self) -> u64 {
        self.published
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unchanged_snapshot_is_not_republished() {
        let mut publisher = SnapshotPublisher::default();
        let snapshot = DirectorSnapshot {
            phase_index: Some(0),
            damage_dealt_multiplier: 1.0,
            damage_taken_multiplier: 1.0,
            ..Default::default()
        };

        assert!(publisher.publish(snapshot.clone()).is_some());
        assert!(publisher.publish(snapshot.clone()).is_none());

        let busy = DirectorSnapshot {
            is_busy: true,
            ..snapshot
        };
        assert_eq!(publisher.publish(busy.clone()), Some(busy));
        assert_eq!(publisher.published(), 2);
    }
}
