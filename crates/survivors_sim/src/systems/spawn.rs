use super::single_player;
use crate::collaborators::TickResources;
use crate::components::{PlayerTag, SpawnProfile, SpawnState, Transform};
use survivors_core::ecs::{
    Commands, Component, Lane, System, SystemContext, SystemDescriptor, SystemError,
};
use survivors_core::math::Vec3;
use tracing::trace;

/// Counts spawner timers down and, when one runs out, queues an enemy on a
/// random point of the circle around the player.
///
/// At most one spawn per spawner per tick: the timer is reset to the full
/// interval rather than carrying the overshoot.
pub struct SpawnDirector;

impl System<TickResources> for SpawnDirector {
    fn descriptor(&self) -> SystemDescriptor {
        SystemDescriptor::new("spawn_director")
            .reads([SpawnProfile::ID, PlayerTag::ID, Transform::ID])
            .writes([SpawnState::ID])
            .requires([PlayerTag::ID])
    }

    fn run(&self, ctx: &SystemContext<'_, TickResources>, commands: &mut Commands) -> Result<(), SystemError> {
        let dt = ctx.time().delta;
        let players = ctx.read::<PlayerTag>()?;
        let player = single_player(&players)?;
        let transforms = ctx.read::<Transform>()?;
        let Some(center) = transforms.get(player).map(|t| t.position) else {
            return Ok(());
        };

        let profiles = ctx.read::<SpawnProfile>()?;
        let mut states = ctx.write::<SpawnState>()?;
        for (spawner, state) in states.iter_mut() {
            let Some(profile) = profiles.get(spawner) else {
                continue;
            };
            state.timer -= dt;
            if state.timer > 0.0 {
                continue;
            }
            state.timer = profile.interval;

            let angle = state.rng.next_angle();
            let position = center + Vec3::new(angle.sin(), angle.cos(), 0.0) * profile.distance;
            let enemy = commands.instantiate(Lane::Early, profile.template);
            commands.insert(Lane::Early, enemy, Transform::from_position(position));
            trace!(%spawner, ?position, "enemy spawn queued");
        }
        Ok(())
    }
}
