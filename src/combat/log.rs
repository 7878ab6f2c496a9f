//! Combat logging
//!
//! Records gameplay outcomes for display and post-encounter analysis. Director
//! events are turned into human-readable lines here; the headless runner
//! saves the whole log as JSON when an encounter ends.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::director::{ChargeOutcome, DirectorEvent, EntityId, Feedback, SequenceOutcome};

/// A single entry in the combat log
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CombatLogEntry {
    /// Timestamp in encounter time (seconds since the encounter started)
    pub timestamp: f32,
    /// The type of event
    pub event_type: CombatLogEventType,
    /// Human-readable description of the event
    pub message: String,
}

/// Types of combat log events for filtering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CombatLogEventType {
    /// Damage dealt
    Damage,
    /// Ability started or finished
    AbilityUsed,
    /// Buff/debuff applied
    BuffApplied,
    /// Buff/debuff expired
    BuffExpired,
    /// Stun applied or ended
    CrowdControl,
    /// Phase change and transition progress
    PhaseChange,
    /// Helper summoned, shield gate changes
    Summon,
    /// Unit defeated
    Death,
    /// Encounter event (start, end, etc.)
    EncounterEvent,
}

/// Summary of one unit written alongside the log
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnitMetadata {
    pub id: u64,
    pub name: String,
    pub kind: String,
    pub max_health: f32,
    pub final_health: f32,
    pub damage_dealt: f32,
    pub final_position: (f32, f32, f32),
}

/// Encounter-level metadata written alongside the log
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncounterMetadata {
    pub boss_profile: String,
    pub outcome: String,
    pub duration_secs: f32,
    pub final_phase: Option<String>,
    pub random_seed: Option<u64>,
    pub units: Vec<UnitMetadata>,
}

#[derive(Serialize)]
struct EncounterLogFile<'a> {
    metadata: &'a EncounterMetadata,
    entries: &'a [CombatLogEntry],
}

/// The combat log resource storing all events
#[derive(Resource, Default)]
pub struct CombatLog {
    /// All log entries in chronological order
    pub entries: Vec<CombatLogEntry>,
    /// Current encounter time
    pub match_time: f32,
}

impl CombatLog {
    /// Clear the log for a new encounter
    pub fn clear(&mut self) {
        self.entries.clear();
        self.match_time = 0.0;
    }

    /// Add a new entry to the log
    pub fn log(&mut self, event_type: CombatLogEventType, message: String) {
        self.entries.push(CombatLogEntry {
            timestamp: self.match_time,
            event_type,
            message,
        });
    }

    /// Get entries filtered by event type
    pub fn filter_by_type(&self, event_type: CombatLogEventType) -> Vec<&CombatLogEntry> {
        self.entries
            .iter()
            .filter(|e| e.event_type == event_type)
            .collect()
    }

    /// Get the last N entries
    pub fn recent(&self, count: usize) -> Vec<&CombatLogEntry> {
        self.entries.iter().rev().take(count).rev().collect()
    }

    /// Record a director event. Telegraphs and screen shake are presentation
    /// only and are not logged.
    pub fn log_director_event(&mut self, boss: EntityId, event: &DirectorEvent) {
        use CombatLogEventType as T;

        let (event_type, message) = match event {
            DirectorEvent::PhaseChanged {
                phase_index,
                phase_name,
            } => (
                T::PhaseChange,
                format!("Boss {} enters phase {}: {}", boss, phase_index, phase_name),
            ),
            DirectorEvent::TransitionStarted {
                phase_index,
                effects,
            } => (
                T::PhaseChange,
                format!(
                    "Boss {} begins transition into phase {} ({} effects)",
                    boss, phase_index, effects
                ),
            ),
            DirectorEvent::TransitionEffectStarted { effect, .. } => {
                (T::PhaseChange, format!("Boss {} transition effect: {}", boss, effect))
            }
            DirectorEvent::TransitionFinished { phase_index } => (
                T::PhaseChange,
                format!("Boss {} finished transition into phase {}", boss, phase_index),
            ),
            DirectorEvent::AbilityStarted { ability, target } => (
                T::AbilityUsed,
                format!("Boss {} begins {} on {}", boss, ability, target),
            ),
            DirectorEvent::AbilityFinished { ability, outcome } => (
                T::AbilityUsed,
                format!("Boss {} {} {}", boss, ability, describe_sequence(*outcome)),
            ),
            DirectorEvent::ChargeFinished { outcome } => (
                T::AbilityUsed,
                format!("Boss {} charge {}", boss, describe_charge(*outcome)),
            ),
            DirectorEvent::HelperSpawned { helper, prefab } => (
                T::Summon,
                format!("Boss {} summons {} ({})", boss, prefab, helper),
            ),
            DirectorEvent::DamageDealt {
                victim,
                amount,
                source,
            } => (
                T::Damage,
                format!("Boss {}'s {} hits {} for {:.0} damage", boss, source, victim, amount),
            ),
            DirectorEvent::PlayerDefeated { victim, source } => (
                T::Death,
                format!("{} has been defeated by Boss {}'s {}", victim, boss, source),
            ),
            DirectorEvent::Feedback(feedback) => match describe_feedback(boss, feedback) {
                Some(entry) => entry,
                None => return,
            },
            DirectorEvent::Telegraph(_) => return,
        };

        self.log(event_type, message);
    }

    /// Save the log and metadata as pretty JSON.
    ///
    /// Without an explicit path the file goes to `encounter_logs/` with a
    /// timestamped name. Returns the path written.
    pub fn save_to_file(
        &self,
        metadata: &EncounterMetadata,
        output_path: Option<&str>,
    ) -> Result<String, String> {
        let path = match output_path {
            Some(path) => path.to_string(),
            None => {
                let stamp = std::time::SystemTime::now()
                    .duration_since(std::time::UNIX_EPOCH)
                    .map(|d| d.as_secs())
                    .unwrap_or_default();
                format!("encounter_logs/encounter_{}.json", stamp)
            }
        };

        if let Some(parent) = Path::new(&path).parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| format!("Failed to create log directory: {}", e))?;
            }
        }

        let file = EncounterLogFile {
            metadata,
            entries: &self.entries,
        };
        let json = serde_json::to_string_pretty(&file)
            .map_err(|e| format!("Failed to serialize combat log: {}", e))?;
        std::fs::write(&path, json).map_err(|e| format!("Failed to write combat log: {}", e))?;

        Ok(path)
    }
}

fn describe_sequence(outcome: SequenceOutcome) -> &'static str {
    match outcome {
        SequenceOutcome::Completed => "completed",
        SequenceOutcome::TargetLost => "aborted: target lost",
        SequenceOutcome::CasterLost => "aborted: caster lost",
        SequenceOutcome::ChannelBroken => "interrupted: channel broken",
        SequenceOutcome::Cancelled => "cancelled by phase transition",
    }
}

fn describe_charge(outcome: ChargeOutcome) -> String {
    match outcome {
        ChargeOutcome::HitObstacle(id) => format!("slammed into obstacle {}", id),
        ChargeOutcome::HitPlayer(id) => format!("ran over {}", id),
        ChargeOutcome::Missed => "missed".to_string(),
        ChargeOutcome::HitWall => "stopped at the arena edge".to_string(),
        ChargeOutcome::NoTarget => "found no target".to_string(),
        ChargeOutcome::Aborted => "aborted".to_string(),
    }
}

fn describe_feedback(boss: EntityId, feedback: &Feedback) -> Option<(CombatLogEventType, String)> {
    use CombatLogEventType as T;

    let entry = match feedback {
        Feedback::BuffApplied {
            kind,
            amount,
            duration,
        } => (
            T::BuffApplied,
            format!(
                "Boss {} {} multiplier {:+.2} for {:.1}s",
                boss,
                kind.label(),
                amount,
                duration
            ),
        ),
        Feedback::BuffExpired { kind } => (
            T::BuffExpired,
            format!("Boss {} {} multiplier expired", boss, kind.label()),
        ),
        Feedback::Stunned { duration } => (
            T::CrowdControl,
            format!("Boss {} is stunned for {:.1}s", boss, duration),
        ),
        Feedback::StunEnded => (T::CrowdControl, format!("Boss {} is no longer stunned", boss)),
        Feedback::ShieldActivated { reduction, .. } => (
            T::Summon,
            format!("Boss {} shield active ({:.0}% reduction)", boss, reduction * 100.0),
        ),
        Feedback::ShieldBroken { .. } => (T::Summon, format!("Boss {} shield broken", boss)),
        Feedback::SummonWindup { duration } => (
            T::Summon,
            format!("Boss {} begins summoning ({:.1}s)", boss, duration),
        ),
        Feedback::Enraged { amount } => (
            T::BuffApplied,
            format!("Boss {} enrages (+{:.0}% damage)", boss, amount * 100.0),
        ),
        Feedback::Explosion { radius, .. } => (
            T::EncounterEvent,
            format!("Boss {} explodes (radius {:.1})", boss, radius),
        ),
        Feedback::ScreenShake { .. } => return None,
    };
    Some(entry)
}
