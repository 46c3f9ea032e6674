//! Test doubles for the external collaborators.

use crate::collaborators::{
    Aabb, CameraSink, ContactEvent, OverlapHit, PhysicsBackend, TickResources, UiNotification,
    UiSink,
};
use crate::components::{Collider, CollisionFilter, Transform};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use survivors_core::ecs::{Entity, StoreError, World};
use survivors_core::math::Vec3;

#[derive(Default)]
struct Script {
    ticks: VecDeque<Vec<ContactEvent>>,
    bodies: Vec<(Entity, Vec3, f32, CollisionFilter)>,
    steps: usize,
}

/// Physics that never moves anything and reports scripted contacts.
///
/// Each `step` pops the next scripted event list (empty once the script
/// runs out) and snapshots collider positions for overlap queries.
#[derive(Clone, Default)]
pub struct ScriptedPhysics {
    script: Arc<Mutex<Script>>,
}

impl ScriptedPhysics {
    /// Events reported by the step `tick` steps from now.
    pub fn script_at(&self, tick: usize, events: Vec<ContactEvent>) {
        let mut script = self.script.lock().unwrap();
        while script.ticks.len() <= tick {
            script.ticks.push_back(Vec::new());
        }
        script.ticks[tick] = events;
    }

    pub fn steps(&self) -> usize {
        self.script.lock().unwrap().steps
    }
}

impl PhysicsBackend for ScriptedPhysics {
    fn step(&mut self, world: &mut World, _dt: f32) -> Result<Vec<ContactEvent>, StoreError> {
        let colliders = world.read::<Collider>()?;
        let transforms = world.read::<Transform>()?;
        let mut script = self.script.lock().unwrap();
        script.bodies = colliders
            .iter()
            .filter_map(|(entity, collider)| {
                transforms
                    .get(entity)
                    .map(|t| (entity, t.position, collider.radius, collider.filter))
            })
            .collect();
        script.steps += 1;
        Ok(script.ticks.pop_front().unwrap_or_default())
    }

    fn overlap_aabb(&self, aabb: Aabb, filter: CollisionFilter) -> Vec<OverlapHit> {
        let script = self.script.lock().unwrap();
        script
            .bodies
            .iter()
            .filter(|(_, position, radius, body)| {
                filter.can_collide(body) && aabb.overlaps_circle(*position, *radius)
            })
            .map(|&(entity, position, _, _)| OverlapHit { entity, position })
            .collect()
    }
}

#[derive(Clone, Default)]
pub struct RecordingUi {
    calls: Arc<Mutex<Vec<UiNotification>>>,
}

impl RecordingUi {
    pub fn calls(&self) -> Vec<UiNotification> {
        self.calls.lock().unwrap().clone()
    }

    pub fn game_overs(&self) -> usize {
        self.calls()
            .iter()
            .filter(|call| **call == UiNotification::GameOver)
            .count()
    }

    pub fn resource_counts(&self) -> Vec<i32> {
        self.calls()
            .iter()
            .filter_map(|call| match call {
                UiNotification::ResourceCount(count) => Some(*count),
                UiNotification::GameOver => None,
            })
            .collect()
    }

    pub fn clear(&self) {
        self.calls.lock().unwrap().clear();
    }
}

impl UiSink for RecordingUi {
    fn notify_game_over(&self) {
        self.calls.lock().unwrap().push(UiNotification::GameOver);
    }

    fn update_resource_count(&self, count: i32) {
        self.calls
            .lock()
            .unwrap()
            .push(UiNotification::ResourceCount(count));
    }
}

#[derive(Clone, Default)]
pub struct RecordingCamera {
    positions: Arc<Mutex<Vec<Vec3>>>,
}

impl RecordingCamera {
    pub fn positions(&self) -> Vec<Vec3> {
        self.positions.lock().unwrap().clone()
    }
}

impl CameraSink for RecordingCamera {
    fn follow(&self, position: Vec3) {
        self.positions.lock().unwrap().push(position);
    }
}

pub fn resources() -> TickResources {
    TickResources::new(Box::new(ScriptedPhysics::default()))
}
