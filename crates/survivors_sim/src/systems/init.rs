use crate::collaborators::TickResources;
use crate::components::{
    CameraTarget, InitializeCameraTarget, InitializeCharacterFlag, PhysicsMass, PlayerTag,
};
use survivors_core::ecs::{
    Commands, Component, Lane, QueryFilter, System, SystemContext, SystemDescriptor, SystemError,
};
use survivors_core::math::Vec3;
use tracing::debug;

/// Makes freshly created characters non-tumbling: zeroes their angular
/// inverse inertia once, then disables the init flag.
pub struct CharacterInit;

impl System<TickResources> for CharacterInit {
    fn descriptor(&self) -> SystemDescriptor {
        SystemDescriptor::new("character_init")
            .writes([PhysicsMass::ID, InitializeCharacterFlag::ID])
            .requires([InitializeCharacterFlag::ID])
    }

    fn run(&self, ctx: &SystemContext<'_, TickResources>, _commands: &mut Commands) -> Result<(), SystemError> {
        let mut flags = ctx.write::<InitializeCharacterFlag>()?;
        let mut masses = ctx.write::<PhysicsMass>()?;
        for row in flags.rows_mut() {
            if !*row.enabled {
                continue;
            }
            if let Some(mass) = masses.get_mut(row.entity) {
                mass.inverse_inertia = Vec3::ZERO;
                *row.enabled = false;
            }
        }
        Ok(())
    }
}

/// Binds the player to the camera collaborator once it exists.
///
/// The init tag is removed through the deferred queue; without a camera the
/// tag stays and the binding is retried next tick.
pub struct CameraInit;

impl System<TickResources> for CameraInit {
    fn descriptor(&self) -> SystemDescriptor {
        SystemDescriptor::new("camera_init")
            .reads([InitializeCameraTarget::ID, CameraTarget::ID, PlayerTag::ID])
            .requires([InitializeCameraTarget::ID])
    }

    fn run(&self, ctx: &SystemContext<'_, TickResources>, commands: &mut Commands) -> Result<(), SystemError> {
        if ctx.resources().camera.is_none() {
            return Ok(());
        }
        let filter = QueryFilter::new()
            .with::<CameraTarget>()
            .with::<InitializeCameraTarget>()
            .with::<PlayerTag>();
        for entity in ctx.query(&filter)? {
            debug!(%entity, "camera target bound");
            commands.remove::<InitializeCameraTarget>(Lane::Early, entity);
        }
        Ok(())
    }
}
