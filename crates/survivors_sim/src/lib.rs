//! Survivors Simulation
//!
//! Gameplay layer of the top-down survivors game. Every tick runs three
//! schedules around the physics step:
//!
//! 1. early flush, then the initialization schedule (character and camera
//!    setup) followed by a second early flush
//! 2. simulation schedule: input, enemy targeting, movement, spawning,
//!    projectile motion
//! 3. physics step (external collaborator)
//! 4. after-physics schedule: cooldown expiry, collision dispatch, damage,
//!    player attacks, UI/camera, destruction
//! 5. late flush and identity recycling
//!
//! Structural changes made by systems are always deferred through the
//! [`DeferredQueue`](survivors_core::ecs::DeferredQueue).

pub mod collaborators;
pub mod components;
pub mod physics;
pub mod scene;
pub mod simulation;
pub mod systems;

#[cfg(test)]
pub(crate) mod testing;

#[cfg(test)]
mod scenarios;

pub use collaborators::{
    Aabb, CameraSink, ContactEvent, ContactKind, OverlapHit, PhysicsBackend, TickResources,
    UiNotification, UiSink,
};
pub use physics::KinematicPhysics;
pub use scene::{SceneEntities, SceneTemplates};
pub use simulation::{SimError, Simulation, TickReport};
