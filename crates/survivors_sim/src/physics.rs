// physics.rs - Minimal kinematic physics backend
//
// Integrates velocities, then finds overlapping circle colliders with a
// uniform spatial hash. Bodies are never pushed apart; contacts are only
// reported. A full physics engine plugs in through `PhysicsBackend`.

use crate::collaborators::{Aabb, ContactEvent, OverlapHit, PhysicsBackend};
use crate::components::{Collider, CollisionFilter, Transform, Velocity};
use rayon::prelude::*;
use smallvec::SmallVec;
use std::collections::HashMap;
use survivors_core::ecs::{Entity, StoreError, World};
use survivors_core::math::{planar_distance, Vec3};
use tracing::trace;

/// Grid cell coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct CellCoord {
    x: i32,
    y: i32,
}

impl CellCoord {
    fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// This cell and its 8 neighbours.
    fn neighbors(self) -> impl Iterator<Item = CellCoord> {
        (-1..=1).flat_map(move |dy| (-1..=1).map(move |dx| CellCoord::new(self.x + dx, self.y + dy)))
    }
}

#[derive(Clone, Copy, Debug)]
struct Body {
    entity: Entity,
    position: Vec3,
    radius: f32,
    filter: CollisionFilter,
    trigger: bool,
}

/// Kinematic circle physics in the xy plane.
#[derive(Debug, Default)]
pub struct KinematicPhysics {
    bodies: Vec<Body>,
    grid: HashMap<CellCoord, SmallVec<[usize; 8]>>,
    cell_size: f32,
}

impl KinematicPhysics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bodies seen by the last step.
    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    fn cell_of(&self, position: Vec3) -> CellCoord {
        CellCoord::new(
            (position.x / self.cell_size).floor() as i32,
            (position.y / self.cell_size).floor() as i32,
        )
    }

    fn rebuild(&mut self, world: &World) -> Result<(), StoreError> {
        let colliders = world.read::<Collider>()?;
        let transforms = world.read::<Transform>()?;
        self.bodies.clear();
        self.bodies.extend(colliders.iter().filter_map(|(entity, collider)| {
            transforms.get(entity).map(|transform| Body {
                entity,
                position: transform.position,
                radius: collider.radius,
                filter: collider.filter,
                trigger: collider.trigger,
            })
        }));

        // One cell spans the largest diameter, so touching bodies are always
        // in neighbouring cells.
        let largest = self.bodies.iter().map(|b| b.radius).fold(0.0_f32, f32::max);
        self.cell_size = (largest * 2.0).max(1.0);

        self.grid.clear();
        for index in 0..self.bodies.len() {
            let cell = self.cell_of(self.bodies[index].position);
            self.grid.entry(cell).or_default().push(index);
        }
        Ok(())
    }

    fn contacts(&self) -> Vec<ContactEvent> {
        let mut pairs: Vec<(usize, usize)> = Vec::new();
        for (i, body) in self.bodies.iter().enumerate() {
            let home = self.cell_of(body.position);
            for cell in home.neighbors() {
                let Some(members) = self.grid.get(&cell) else {
                    continue;
                };
                for &j in members {
                    if j <= i {
                        continue;
                    }
                    let other = &self.bodies[j];
                    if body.filter.can_collide(&other.filter)
                        && planar_distance(body.position, other.position)
                            < body.radius + other.radius
                    {
                        pairs.push((i, j));
                    }
                }
            }
        }
        pairs.sort_unstable();

        pairs
            .into_iter()
            .map(|(i, j)| {
                let (a, b) = (&self.bodies[i], &self.bodies[j]);
                if a.trigger || b.trigger {
                    ContactEvent::trigger(a.entity, b.entity)
                } else {
                    ContactEvent::collision(a.entity, b.entity)
                }
            })
            .collect()
    }
}

impl PhysicsBackend for KinematicPhysics {
    fn step(&mut self, world: &mut World, dt: f32) -> Result<Vec<ContactEvent>, StoreError> {
        {
            let velocities = world.read::<Velocity>()?;
            let mut transforms = world.write::<Transform>()?;
            transforms.par_iter_mut().for_each(|(entity, transform)| {
                if let Some(velocity) = velocities.get(entity) {
                    transform.position += velocity.linear * dt;
                }
            });
        }
        self.rebuild(world)?;
        let contacts = self.contacts();
        trace!(bodies = self.bodies.len(), contacts = contacts.len(), "physics step");
        Ok(contacts)
    }

    fn overlap_aabb(&self, aabb: Aabb, filter: CollisionFilter) -> Vec<OverlapHit> {
        self.bodies
            .iter()
            .filter(|body| {
                filter.can_collide(&body.filter) && aabb.overlaps_circle(body.position, body.radius)
            })
            .map(|body| OverlapHit {
                entity: body.entity,
                position: body.position,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collaborators::ContactKind;
    use crate::components::{layers, register_all};
    use survivors_core::ecs::EntityBuilder;

    fn body(world: &mut World, position: Vec3, filter: CollisionFilter, trigger: bool) -> Entity {
        world.spawn(
            &EntityBuilder::new()
                .with(Transform::from_position(position))
                .with(Velocity::default())
                .with(Collider {
                    radius: 0.5,
                    filter,
                    trigger,
                }),
        )
    }

    const PLAYER: CollisionFilter = CollisionFilter::new(layers::PLAYER, layers::ALL);
    const ENEMY: CollisionFilter = CollisionFilter::new(layers::ENEMY, layers::ALL);
    const GEM: CollisionFilter = CollisionFilter::new(layers::PICKUP, layers::PLAYER);

    #[test]
    fn velocities_are_integrated() {
        let mut world = World::new();
        register_all(&mut world);
        let mover = body(&mut world, Vec3::ZERO, PLAYER, false);
        world.get_mut::<Velocity>(mover).unwrap().linear = Vec3::new(2.0, -1.0, 0.0);

        let mut physics = KinematicPhysics::new();
        physics.step(&mut world, 0.5).unwrap();
        assert_eq!(
            world.get_cloned::<Transform>(mover).unwrap().position,
            Vec3::new(1.0, -0.5, 0.0)
        );
    }

    #[test]
    fn overlapping_bodies_report_one_contact() {
        let mut world = World::new();
        register_all(&mut world);
        let player = body(&mut world, Vec3::ZERO, PLAYER, false);
        let enemy = body(&mut world, Vec3::new(0.8, 0.0, 0.0), ENEMY, false);
        let gem = body(&mut world, Vec3::new(-0.9, 0.0, 0.0), GEM, true);
        body(&mut world, Vec3::new(10.0, 0.0, 0.0), ENEMY, false);

        let mut physics = KinematicPhysics::new();
        let contacts = physics.step(&mut world, 0.0).unwrap();
        assert_eq!(contacts.len(), 2);
        assert!(contacts.contains(&ContactEvent::collision(player, enemy)));
        assert!(contacts.contains(&ContactEvent::trigger(player, gem)));
        assert!(contacts
            .iter()
            .all(|c| c.kind == ContactKind::Collision || c.a == player || c.b == player));
    }

    #[test]
    fn filters_suppress_contacts() {
        let mut world = World::new();
        register_all(&mut world);
        body(&mut world, Vec3::ZERO, GEM, true);
        body(&mut world, Vec3::new(0.1, 0.0, 0.0), ENEMY, false);
        let mut physics = KinematicPhysics::new();
        assert!(physics.step(&mut world, 0.0).unwrap().is_empty());
    }

    #[test]
    fn overlap_query_uses_last_step() {
        let mut world = World::new();
        register_all(&mut world);
        let near = body(&mut world, Vec3::new(2.0, 0.0, 0.0), ENEMY, false);
        body(&mut world, Vec3::new(8.0, 0.0, 0.0), ENEMY, false);
        body(&mut world, Vec3::new(1.0, 0.0, 0.0), GEM, true);

        let mut physics = KinematicPhysics::new();
        physics.step(&mut world, 0.0).unwrap();
        let area = Aabb::from_center_half_extent(Vec3::ZERO, Vec3::splat(3.0));
        let hits = physics.overlap_aabb(area, CollisionFilter::new(layers::ALL, layers::ENEMY));
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].entity, near);
        assert_eq!(physics.body_count(), 3);
    }
}
