//! Survivors Simulation Core
//!
//! Contains the data-oriented building blocks every gameplay stage runs on:
//! - Entity/Component Store with enable bits and random-access lookups
//! - Deferred Mutation Queue with early and late flush lanes
//! - Entity templates ("prefabs")
//! - Access-declaring systems and a wave scheduler
//! - Fixed-tick simulation clock and seeded randomness

pub mod ecs;
pub mod math;
pub mod time;

pub use glam;

/// Engine version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
