// collaborators.rs - Interfaces to the world outside the simulation
//
// Physics, UI and camera are external. The simulation only sees contact
// events, an AABB overlap query and fire-and-forget sinks.

use crate::components::CollisionFilter;
use std::sync::{Mutex, PoisonError};
use survivors_core::ecs::{Entity, StoreError, World};
use survivors_core::math::Vec3;
use survivors_services::InputState;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ContactKind {
    /// Two solid bodies touched.
    Collision,
    /// A trigger volume overlapped another body.
    Trigger,
}

/// One physics contact. Participant order carries no meaning.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ContactEvent {
    pub kind: ContactKind,
    pub a: Entity,
    pub b: Entity,
}

impl ContactEvent {
    pub fn collision(a: Entity, b: Entity) -> Self {
        Self {
            kind: ContactKind::Collision,
            a,
            b,
        }
    }

    pub fn trigger(a: Entity, b: Entity) -> Self {
        Self {
            kind: ContactKind::Trigger,
            a,
            b,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    pub fn from_center_half_extent(center: Vec3, half_extent: Vec3) -> Self {
        Self {
            min: center - half_extent,
            max: center + half_extent,
        }
    }

    /// Planar overlap test against a circle.
    pub fn overlaps_circle(&self, center: Vec3, radius: f32) -> bool {
        let closest = center.truncate().clamp(self.min.truncate(), self.max.truncate());
        closest.distance_squared(center.truncate()) <= radius * radius
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OverlapHit {
    pub entity: Entity,
    pub position: Vec3,
}

/// Physics engine as seen by the simulation.
pub trait PhysicsBackend: Send + Sync {
    /// Integrate one step and report this step's contacts. Called between
    /// schedules, so the backend may write transforms.
    fn step(&mut self, world: &mut World, dt: f32) -> Result<Vec<ContactEvent>, StoreError>;

    /// Bodies overlapping `aabb` that `filter` accepts, as of the last step.
    fn overlap_aabb(&self, aabb: Aabb, filter: CollisionFilter) -> Vec<OverlapHit>;
}

pub trait UiSink: Send + Sync {
    fn notify_game_over(&self);
    fn update_resource_count(&self, count: i32);
}

pub trait CameraSink: Send + Sync {
    fn follow(&self, position: Vec3);
}

/// Deferred UI call, delivered after the tick completes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UiNotification {
    GameOver,
    ResourceCount(i32),
}

/// Everything a system may consult besides the world.
pub struct TickResources {
    pub input: InputState,
    pub events: Vec<ContactEvent>,
    pub physics: Box<dyn PhysicsBackend>,
    pub ui: Option<Box<dyn UiSink>>,
    pub camera: Option<Box<dyn CameraSink>>,
    outbox: Mutex<Vec<UiNotification>>,
}

impl TickResources {
    pub fn new(physics: Box<dyn PhysicsBackend>) -> Self {
        Self {
            input: InputState::default(),
            events: Vec::new(),
            physics,
            ui: None,
            camera: None,
            outbox: Mutex::new(Vec::new()),
        }
    }

    /// Queue a UI call. Repeats of the same notification collapse.
    pub fn notify(&self, notification: UiNotification) {
        let mut outbox = self.outbox.lock().unwrap_or_else(PoisonError::into_inner);
        if let UiNotification::ResourceCount(_) = notification {
            outbox.retain(|queued| !matches!(queued, UiNotification::ResourceCount(_)));
        }
        if !outbox.contains(&notification) {
            outbox.push(notification);
        }
    }

    /// Hand queued notifications to the UI. Without a UI they stay queued.
    pub fn deliver_notifications(&mut self) -> Vec<UiNotification> {
        let Some(ui) = &self.ui else {
            return Vec::new();
        };
        let outbox = self.outbox.get_mut().unwrap_or_else(PoisonError::into_inner);
        let delivered = std::mem::take(outbox);
        for notification in &delivered {
            match notification {
                UiNotification::GameOver => ui.notify_game_over(),
                UiNotification::ResourceCount(count) => ui.update_resource_count(*count),
            }
        }
        delivered
    }

    pub fn pending_notifications(&self) -> Vec<UiNotification> {
        self.outbox
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}
