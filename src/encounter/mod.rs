//! Encounter simulation
//!
//! Bevy ECS integration around the director: components, the systems that
//! drive directors each frame, and encounter setup.

pub mod attacks;
pub mod components;
pub mod director_systems;
pub mod movement;
pub mod projectiles;
pub mod setup;
pub mod systems;
pub mod world_sync;

pub use setup::{setup_encounter, EncounterSetup, PlayerSpawn};
