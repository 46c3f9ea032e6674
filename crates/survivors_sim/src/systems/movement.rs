// movement.rs - Intent to velocity, facing and animation

use super::{single_player, FACING_DEADZONE};
use crate::collaborators::TickResources;
use crate::components::{
    AnimationIndexOverride, EnemyTag, FacingOverride, MoveDirection, MoveSpeed, PlasmaBlast,
    PlayerAnimation, PlayerTag, Transform, Velocity,
};
use rayon::prelude::*;
use survivors_core::ecs::{Commands, Component, System, SystemContext, SystemDescriptor, SystemError};
use survivors_core::math::Vec3;

/// Copies the input collaborator's move vector into every player.
pub struct PlayerInput;

impl System<TickResources> for PlayerInput {
    fn descriptor(&self) -> SystemDescriptor {
        SystemDescriptor::new("player_input")
            .reads([PlayerTag::ID])
            .writes([MoveDirection::ID])
    }

    fn run(&self, ctx: &SystemContext<'_, TickResources>, _commands: &mut Commands) -> Result<(), SystemError> {
        let direction = ctx.resources().input.move_vector();
        let players = ctx.read::<PlayerTag>()?;
        let mut directions = ctx.write::<MoveDirection>()?;
        for &player in players.entities() {
            if let Some(current) = directions.get_mut(player) {
                current.0 = direction;
            }
        }
        Ok(())
    }
}

/// Points every enemy at the player.
pub struct EnemyTargeting;

impl System<TickResources> for EnemyTargeting {
    fn descriptor(&self) -> SystemDescriptor {
        SystemDescriptor::new("enemy_targeting")
            .reads([PlayerTag::ID, EnemyTag::ID, Transform::ID])
            .writes([MoveDirection::ID])
            .requires([PlayerTag::ID])
    }

    fn run(&self, ctx: &SystemContext<'_, TickResources>, _commands: &mut Commands) -> Result<(), SystemError> {
        let players = ctx.read::<PlayerTag>()?;
        let transforms = ctx.read::<Transform>()?;
        let player = single_player(&players)?;
        let Some(target) = transforms.get(player).map(|t| t.position.truncate()) else {
            return Ok(());
        };

        let enemies = ctx.read::<EnemyTag>()?;
        let mut directions = ctx.write::<MoveDirection>()?;
        directions.par_iter_mut().for_each(|(entity, direction)| {
            if !enemies.contains(entity) {
                return;
            }
            if let Some(transform) = transforms.get(entity) {
                direction.0 = (target - transform.position.truncate()).normalize_or_zero();
            }
        });
        Ok(())
    }
}

/// Turns direction and speed into velocity, then derives facing and the
/// player's animation row from it.
pub struct CharacterMove;

impl System<TickResources> for CharacterMove {
    fn descriptor(&self) -> SystemDescriptor {
        SystemDescriptor::new("character_move")
            .reads([MoveDirection::ID, MoveSpeed::ID, PlayerTag::ID])
            .writes([Velocity::ID, FacingOverride::ID, AnimationIndexOverride::ID])
    }

    fn run(&self, ctx: &SystemContext<'_, TickResources>, _commands: &mut Commands) -> Result<(), SystemError> {
        let directions = ctx.read::<MoveDirection>()?;
        let speeds = ctx.read::<MoveSpeed>()?;
        let mut velocities = ctx.write::<Velocity>()?;

        velocities.par_iter_mut().for_each(|(entity, velocity)| {
            if let (Some(direction), Some(speed)) = (directions.get(entity), speeds.get(entity)) {
                velocity.linear = (direction.0 * speed.0).extend(0.0);
            }
        });

        let velocities = &*velocities;
        ctx.write::<FacingOverride>()?
            .par_iter_mut()
            .for_each(|(entity, facing)| {
                let Some(velocity) = velocities.get(entity) else {
                    return;
                };
                if velocity.linear.x.abs() > FACING_DEADZONE {
                    facing.0 = velocity.linear.x.signum();
                }
            });

        let players = ctx.read::<PlayerTag>()?;
        ctx.write::<AnimationIndexOverride>()?
            .par_iter_mut()
            .for_each(|(entity, animation)| {
                if !players.contains(entity) {
                    return;
                }
                let moving = velocities
                    .get(entity)
                    .is_some_and(|v| v.linear.truncate().length_squared() > f32::EPSILON);
                let row = if moving {
                    PlayerAnimation::Movement
                } else {
                    PlayerAnimation::Idle
                };
                *animation = row.into();
            });
        Ok(())
    }
}

/// Moves projectiles along their facing.
pub struct ProjectileMove;

impl System<TickResources> for ProjectileMove {
    fn descriptor(&self) -> SystemDescriptor {
        SystemDescriptor::new("projectile_move")
            .reads([PlasmaBlast::ID])
            .writes([Transform::ID])
    }

    fn run(&self, ctx: &SystemContext<'_, TickResources>, _commands: &mut Commands) -> Result<(), SystemError> {
        let dt = ctx.time().delta;
        let blasts = ctx.read::<PlasmaBlast>()?;
        ctx.write::<Transform>()?
            .par_iter_mut()
            .for_each(|(entity, transform)| {
                if let Some(blast) = blasts.get(entity) {
                    let step: Vec3 = transform.right() * blast.move_speed * dt;
                    transform.position += step;
                }
            });
        Ok(())
    }
}
