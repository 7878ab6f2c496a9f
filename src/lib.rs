//! Boss Director
//!
//! Authority-side boss encounter director: phase-driven ability rotations,
//! telegraphed attack sequences, phase transitions (shields, enrage, charges,
//! summons) and replicated state for observers.
//!
//! This library exposes the core modules for testing and reuse.

pub mod cli;
pub mod combat;
pub mod director;
pub mod encounter;
pub mod headless;
pub mod ui;

// Re-export commonly used types
pub use combat::log::{CombatLog, CombatLogEventType};
pub use director::{Arena, ArenaState, Authority, BossDirector, BossProfile, DirectorEvent, EntityId};
pub use headless::HeadlessEncounterConfig;
