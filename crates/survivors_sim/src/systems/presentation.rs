// presentation.rs - Pushes game state to the UI and camera collaborators

use crate::collaborators::{TickResources, UiNotification};
use crate::components::{
    CameraTarget, GemsCollected, InitializeCameraTarget, PlayerTag, Transform, UpdateGemUiFlag,
};
use survivors_core::ecs::{
    Commands, Component, QueryFilter, System, SystemContext, SystemDescriptor, SystemError,
};

/// Reports the gem count of every entity whose UI flag is raised.
///
/// Without a UI the flag stays raised so the count is sent once one is
/// attached.
pub struct UiRefresh;

impl System<TickResources> for UiRefresh {
    fn descriptor(&self) -> SystemDescriptor {
        SystemDescriptor::new("ui_refresh")
            .reads([GemsCollected::ID])
            .writes([UpdateGemUiFlag::ID])
    }

    fn run(&self, ctx: &SystemContext<'_, TickResources>, _commands: &mut Commands) -> Result<(), SystemError> {
        let resources = ctx.resources();
        if resources.ui.is_none() {
            return Ok(());
        }
        let collected = ctx.read::<GemsCollected>()?;
        let mut flags = ctx.write::<UpdateGemUiFlag>()?;
        for row in flags.rows_mut() {
            if !*row.enabled {
                continue;
            }
            if let Some(count) = collected.get(row.entity) {
                resources.notify(UiNotification::ResourceCount(count.0));
            }
            *row.enabled = false;
        }
        Ok(())
    }
}

/// Keeps the camera on the bound player.
pub struct CameraFollow;

impl System<TickResources> for CameraFollow {
    fn descriptor(&self) -> SystemDescriptor {
        SystemDescriptor::new("camera_follow")
            .reads([
                PlayerTag::ID,
                CameraTarget::ID,
                InitializeCameraTarget::ID,
                Transform::ID,
            ])
            .requires([CameraTarget::ID])
    }

    fn run(&self, ctx: &SystemContext<'_, TickResources>, _commands: &mut Commands) -> Result<(), SystemError> {
        let Some(camera) = &ctx.resources().camera else {
            return Ok(());
        };
        let filter = QueryFilter::new()
            .with::<PlayerTag>()
            .with::<CameraTarget>()
            .with::<Transform>()
            .without::<InitializeCameraTarget>();
        let targets = ctx.query(&filter)?;
        let transforms = ctx.read::<Transform>()?;
        for entity in targets {
            if let Some(transform) = transforms.get(entity) {
                camera.follow(transform.position);
            }
        }
        Ok(())
    }
}
