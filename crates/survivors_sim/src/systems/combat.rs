// combat.rs - Cooldowns, damage and player attacks

use crate::collaborators::{Aabb, TickResources};
use crate::components::{
    layers, AttackEffect, AttackProfile, CollisionFilter, CooldownExpiry, CurrentHitPoints,
    DamageQueue, DestroyFlag, PlayerTag, Transform,
};
use rayon::prelude::*;
use survivors_core::ecs::{
    Commands, Component, Entity, Lane, System, SystemContext, SystemDescriptor, SystemError,
};
use survivors_core::math::{planar_distance, Vec3};
use tracing::{debug, warn};

/// Disables every cooldown whose timestamp has passed. Runs before anything
/// that may start a new cooldown this tick.
pub struct CooldownClear;

impl System<TickResources> for CooldownClear {
    fn descriptor(&self) -> SystemDescriptor {
        SystemDescriptor::new("cooldown_clear").writes([CooldownExpiry::ID])
    }

    fn run(&self, ctx: &SystemContext<'_, TickResources>, _commands: &mut Commands) -> Result<(), SystemError> {
        let now = ctx.time().elapsed;
        ctx.write::<CooldownExpiry>()?
            .par_rows_mut()
            .for_each(|row| {
                if *row.enabled && row.value.expires_at <= now {
                    *row.enabled = false;
                }
            });
        Ok(())
    }
}

/// Applies this tick's queued damage and flags the dead.
///
/// Every damage queue is empty afterwards. Hit points at or below zero are
/// the only death condition.
pub struct DamageResolution;

impl System<TickResources> for DamageResolution {
    fn descriptor(&self) -> SystemDescriptor {
        SystemDescriptor::new("damage_resolution").writes([
            DamageQueue::ID,
            CurrentHitPoints::ID,
            DestroyFlag::ID,
        ])
    }

    fn run(&self, ctx: &SystemContext<'_, TickResources>, _commands: &mut Commands) -> Result<(), SystemError> {
        let damaged: Vec<(Entity, i32)> = ctx
            .write::<DamageQueue>()?
            .par_iter_mut()
            .filter(|(_, queue)| !queue.is_empty())
            .map(|(entity, queue)| (entity, queue.drain_total()))
            .collect();
        if damaged.is_empty() {
            return Ok(());
        }

        let mut hit_points = ctx.write::<CurrentHitPoints>()?;
        let mut destroy = ctx.write::<DestroyFlag>()?;
        for (entity, total) in damaged {
            let Some(hp) = hit_points.get_mut(entity) else {
                continue;
            };
            hp.0 = hp.0.saturating_sub(total);
            if hp.0 <= 0 && !destroy.set_enabled(entity, true) {
                warn!(%entity, "dead entity has no destroy flag");
            }
        }
        Ok(())
    }
}

/// Fires the player's attack effect at the nearest enemy in range.
///
/// Targets come from the physics overlap query; the first of equally near
/// hits wins. No hits means no attack and no cooldown this tick.
pub struct PlayerAttack;

impl System<TickResources> for PlayerAttack {
    fn descriptor(&self) -> SystemDescriptor {
        SystemDescriptor::new("player_attack")
            .reads([
                PlayerTag::ID,
                Transform::ID,
                AttackProfile::ID,
                AttackEffect::ID,
            ])
            .writes([CooldownExpiry::ID])
            .requires([PlayerTag::ID])
    }

    fn run(&self, ctx: &SystemContext<'_, TickResources>, commands: &mut Commands) -> Result<(), SystemError> {
        let now = ctx.time().elapsed;
        let physics = &ctx.resources().physics;
        let players = ctx.read::<PlayerTag>()?;
        let transforms = ctx.read::<Transform>()?;
        let profiles = ctx.read::<AttackProfile>()?;
        let effects = ctx.read::<AttackEffect>()?;
        let mut cooldowns = ctx.write::<CooldownExpiry>()?;

        for &player in players.entities() {
            if cooldowns.is_enabled(player) {
                continue;
            }
            let (Some(transform), Some(profile), Some(effect)) = (
                transforms.get(player),
                profiles.get(player),
                effects.get(player),
            ) else {
                continue;
            };

            let origin = transform.position;
            let area = Aabb::from_center_half_extent(
                origin,
                Vec3::splat(profile.detection_half_extent),
            );
            let filter = CollisionFilter::new(layers::ALL, profile.collision_mask);
            let mut nearest: Option<(f32, Vec3)> = None;
            for hit in physics.overlap_aabb(area, filter) {
                let distance = planar_distance(origin, hit.position);
                if nearest.map_or(true, |(best, _)| distance < best) {
                    nearest = Some((distance, hit.position));
                }
            }
            let Some((_, target)) = nearest else {
                continue;
            };

            let offset = target - origin;
            let angle = offset.y.atan2(offset.x);
            let attack = commands.instantiate(Lane::Early, effect.0);
            commands.insert(
                Lane::Early,
                attack,
                Transform::from_position_rotation(origin, angle),
            );

            if let Some(cooldown) = cooldowns.get_mut(player) {
                cooldown.expires_at = now + f64::from(profile.cooldown);
                cooldowns.set_enabled(player, true);
            }
            debug!(%player, angle, "player attack");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collaborators::PhysicsBackend;
    use crate::components::{register_all, Collider, EnemyTag};
    use crate::systems::test_support::run_system;
    use crate::testing::ScriptedPhysics;
    use smallvec::smallvec;
    use survivors_core::ecs::{
        CommandKind, DeferredQueue, EntityBuilder, InvariantPolicy, TemplateLibrary, World,
    };

    #[test]
    fn expired_cooldowns_are_cleared() {
        let mut world = World::new();
        register_all(&mut world);
        let expired = world.spawn(&EntityBuilder::new().with(CooldownExpiry { expires_at: 1.0 }));
        let active = world.spawn(&EntityBuilder::new().with(CooldownExpiry { expires_at: 1.5 }));
        let mut queue = DeferredQueue::new();
        run_system(CooldownClear, &world, &crate::testing::resources(), &mut queue, 1.0).unwrap();
        assert!(!world.is_enabled::<CooldownExpiry>(expired));
        assert!(world.is_enabled::<CooldownExpiry>(active));
    }

    #[test]
    fn damage_is_summed_and_queues_drained() {
        let mut world = World::new();
        register_all(&mut world);
        let survivor = world.spawn(
            &EntityBuilder::new()
                .with(CurrentHitPoints(10))
                .with(DamageQueue(smallvec![3, 4]))
                .with_disabled(DestroyFlag),
        );
        let doomed = world.spawn(
            &EntityBuilder::new()
                .with(CurrentHitPoints(10))
                .with(DamageQueue(smallvec![6, 6]))
                .with_disabled(DestroyFlag),
        );
        let untouched = world.spawn(
            &EntityBuilder::new()
                .with(CurrentHitPoints(5))
                .with(DamageQueue::default())
                .with_disabled(DestroyFlag),
        );
        let mut queue = DeferredQueue::new();
        run_system(DamageResolution, &world, &crate::testing::resources(), &mut queue, 0.0).unwrap();

        assert_eq!(world.get_cloned::<CurrentHitPoints>(survivor), Some(CurrentHitPoints(3)));
        assert_eq!(world.get_cloned::<CurrentHitPoints>(doomed), Some(CurrentHitPoints(-2)));
        assert_eq!(world.get_cloned::<CurrentHitPoints>(untouched), Some(CurrentHitPoints(5)));
        assert!(!world.is_enabled::<DestroyFlag>(survivor));
        assert!(world.is_enabled::<DestroyFlag>(doomed));
        for entity in [survivor, doomed, untouched] {
            assert!(world.get_cloned::<DamageQueue>(entity).unwrap().is_empty());
        }
    }

    fn enemy_at(world: &mut World, position: Vec3) -> Entity {
        world.spawn(
            &EntityBuilder::new()
                .with(EnemyTag)
                .with(Transform::from_position(position))
                .with(Collider {
                    radius: 0.5,
                    filter: CollisionFilter::new(layers::ENEMY, layers::ALL),
                    trigger: false,
                }),
        )
    }

    #[test]
    fn attacks_aim_at_the_nearest_enemy() {
        let mut world = World::new();
        register_all(&mut world);
        let mut templates = TemplateLibrary::new();
        let blast = templates.register("blast", EntityBuilder::new().with(Transform::default()));
        let player = world.spawn(
            &EntityBuilder::new()
                .with(PlayerTag)
                .with(Transform::from_position(Vec3::ZERO))
                .with(AttackProfile {
                    damage: 0,
                    cooldown: 0.5,
                    detection_half_extent: 5.0,
                    collision_mask: layers::ENEMY,
                })
                .with(AttackEffect(blast))
                .with_disabled(CooldownExpiry::default()),
        );
        enemy_at(&mut world, Vec3::new(4.0, 0.0, 0.0));
        enemy_at(&mut world, Vec3::new(0.0, 2.0, 0.0));
        enemy_at(&mut world, Vec3::new(30.0, 0.0, 0.0));

        let mut physics = ScriptedPhysics::default();
        physics.step(&mut world, 0.0).unwrap();
        let resources = TickResources::new(Box::new(physics));
        let mut queue = DeferredQueue::new();
        run_system(PlayerAttack, &world, &resources, &mut queue, 2.0).unwrap();

        let kinds: Vec<_> = queue
            .pending(Lane::Early)
            .iter()
            .map(|queued| queued.command.kind())
            .collect();
        assert_eq!(kinds, vec![CommandKind::Instantiate, CommandKind::Insert]);
        assert!(world.is_enabled::<CooldownExpiry>(player));
        assert_eq!(world.get_cloned::<CooldownExpiry>(player).unwrap().expires_at, 2.5);

        queue
            .flush(Lane::Early, &mut world, &templates, InvariantPolicy::Strict)
            .unwrap();
        let transforms = world.read::<Transform>().unwrap();
        let fired = transforms
            .iter()
            .find(|(_, t)| t.rotation != 0.0)
            .map(|(_, t)| *t)
            .unwrap();
        assert!((fired.rotation - std::f32::consts::FRAC_PI_2).abs() < 1e-6);
        assert_eq!(fired.position, Vec3::ZERO);
    }

    #[test]
    fn no_targets_means_no_attack() {
        let mut world = World::new();
        register_all(&mut world);
        let mut templates = TemplateLibrary::new();
        let blast = templates.register("blast", EntityBuilder::new());
        let player = world.spawn(
            &EntityBuilder::new()
                .with(PlayerTag)
                .with(Transform::default())
                .with(AttackProfile {
                    damage: 0,
                    cooldown: 0.5,
                    detection_half_extent: 1.0,
                    collision_mask: layers::ENEMY,
                })
                .with(AttackEffect(blast))
                .with_disabled(CooldownExpiry::default()),
        );
        let mut physics = ScriptedPhysics::default();
        physics.step(&mut world, 0.0).unwrap();
        let resources = TickResources::new(Box::new(physics));
        let mut queue = DeferredQueue::new();
        run_system(PlayerAttack, &world, &resources, &mut queue, 0.0).unwrap();
        assert!(queue.is_empty());
        assert!(!world.is_enabled::<CooldownExpiry>(player));
    }
}
