// destruction.rs - Removes flagged entities at the end of the tick

use crate::collaborators::{TickResources, UiNotification};
use crate::components::{DestroyFlag, PlayerTag, RewardTemplate, Transform};
use survivors_core::ecs::{
    Commands, Component, Lane, System, SystemContext, SystemDescriptor, SystemError,
};
use tracing::{debug, info};

/// Despawns every entity with an enabled destroy flag.
///
/// Rewards are instantiated at the entity's last position before it goes,
/// and losing the player ends the game. All of it lands in the late lane so
/// this tick's readers still see the entity.
pub struct Destruction;

impl System<TickResources> for Destruction {
    fn descriptor(&self) -> SystemDescriptor {
        SystemDescriptor::new("destruction")
            .reads([
                DestroyFlag::ID,
                PlayerTag::ID,
                RewardTemplate::ID,
                Transform::ID,
            ])
            .requires([DestroyFlag::ID])
    }

    fn run(&self, ctx: &SystemContext<'_, TickResources>, commands: &mut Commands) -> Result<(), SystemError> {
        let flags = ctx.read::<DestroyFlag>()?;
        let players = ctx.read::<PlayerTag>()?;
        let rewards = ctx.read::<RewardTemplate>()?;
        let transforms = ctx.read::<Transform>()?;

        for (entity, _) in flags.iter_enabled() {
            if players.contains(entity) {
                info!(%entity, "player destroyed; game over");
                ctx.resources().notify(UiNotification::GameOver);
            }
            if let (Some(reward), Some(transform)) = (rewards.get(entity), transforms.get(entity)) {
                let drop = commands.instantiate(Lane::Late, reward.0);
                commands.insert(Lane::Late, drop, Transform::from_position(transform.position));
            }
            debug!(%entity, "destroying");
            commands.despawn(Lane::Late, entity);
        }
        Ok(())
    }
}
