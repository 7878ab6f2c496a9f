//! Headless mode for automated testing
//!
//! Runs a boss encounter without any graphical output and writes the combat
//! log to disk when it ends.
//!
//! ## Usage
//!
//! ```bash
//! cargo run --release -- --headless assets/encounters/demo.json
//! ```
//!
//! ## JSON Configuration
//!
//! ```json
//! {
//!   "boss_profile": "assets/config/boss.ron",
//!   "players": [{ "name": "Vanguard", "position": [-6.0, 0.0, 8.0] }],
//!   "obstacles": [[-12.0, 0.0, 0.0]],
//!   "max_duration_secs": 180,
//!   "random_seed": 7
//! }
//! ```

pub mod config;
pub mod runner;

pub use config::{HeadlessEncounterConfig, PlayerSpawnConfig};
pub use runner::{build_headless_app, run_headless_encounter, EncounterOutcome, EncounterResult};
