// scene.rs - Authoring the game's templates and initial entities
//
// Settings play the role of authoring components: each template below is
// "baked" from its settings section once, at scene load.

use crate::components::{
    layers, AnimationIndexOverride, AttackEffect, AttackProfile, CameraTarget, Collider,
    CollisionFilter, CooldownExpiry, CurrentHitPoints, DamageQueue, DestroyFlag, EnemyTag,
    FacingOverride, GemTag, GemsCollected, InitializeCameraTarget, InitializeCharacterFlag,
    MaxHitPoints, MoveDirection, MoveSpeed, PhysicsMass, PlasmaBlast, PlayerAnimation, PlayerTag,
    RewardTemplate, SpawnProfile, SpawnState, Transform, UpdateGemUiFlag, Velocity,
};
use survivors_core::ecs::{
    Entity, EntityBuilder, StoreError, TemplateId, TemplateLibrary, TemplateSource, World,
};
use survivors_core::math::SeededRng;
use survivors_services::settings::{
    EnemySettings, GemSettings, PlasmaBlastSettings, PlayerSettings, SceneSettings,
};
use tracing::info;

const PLAYER_FILTER: CollisionFilter =
    CollisionFilter::new(layers::PLAYER, layers::ENEMY | layers::PICKUP);
const ENEMY_FILTER: CollisionFilter = CollisionFilter::new(
    layers::ENEMY,
    layers::PLAYER | layers::ENEMY | layers::PROJECTILE,
);
const GEM_FILTER: CollisionFilter = CollisionFilter::new(layers::PICKUP, layers::PLAYER);
const PLASMA_FILTER: CollisionFilter = CollisionFilter::new(layers::PROJECTILE, layers::ENEMY);

/// Template ids of everything the scene can create.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SceneTemplates {
    pub player: TemplateId,
    pub enemy: TemplateId,
    pub gem: TemplateId,
    pub plasma_blast: TemplateId,
}

/// Entities present when the first tick runs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SceneEntities {
    pub player: Entity,
    pub spawner: Entity,
}

/// Components every moving character carries.
fn character(move_speed: f32, hit_points: i32, radius: f32, filter: CollisionFilter) -> EntityBuilder {
    EntityBuilder::new()
        .with(Transform::default())
        .with(Velocity::default())
        .with(PhysicsMass::default())
        .with(Collider {
            radius,
            filter,
            trigger: false,
        })
        .with(InitializeCharacterFlag)
        .with(MoveDirection::default())
        .with(MoveSpeed(move_speed))
        .with(FacingOverride::default())
        .with(MaxHitPoints(hit_points))
        .with(CurrentHitPoints(hit_points))
        .with(DamageQueue::default())
        .with_disabled(DestroyFlag)
}

fn player_template(settings: &PlayerSettings, attack: TemplateId) -> EntityBuilder {
    character(
        settings.move_speed,
        settings.hit_points,
        settings.collider_radius,
        PLAYER_FILTER,
    )
    .with(PlayerTag)
    .with(InitializeCameraTarget)
    .with(CameraTarget)
    .with(AnimationIndexOverride::from(PlayerAnimation::Idle))
    .with(AttackProfile {
        damage: 0,
        cooldown: settings.attack_cooldown,
        detection_half_extent: settings.detection_size,
        collision_mask: layers::ENEMY,
    })
    .with(AttackEffect(attack))
    .with_disabled(CooldownExpiry::default())
    .with(GemsCollected(0))
    .with(UpdateGemUiFlag)
}

fn enemy_template(settings: &EnemySettings, reward: TemplateId) -> EntityBuilder {
    character(
        settings.move_speed,
        settings.hit_points,
        settings.collider_radius,
        ENEMY_FILTER,
    )
    .with(EnemyTag)
    .with(AttackProfile {
        damage: settings.attack_damage,
        cooldown: settings.attack_cooldown,
        detection_half_extent: 0.0,
        collision_mask: layers::PLAYER,
    })
    .with_disabled(CooldownExpiry::default())
    .with(RewardTemplate(reward))
}

fn gem_template(settings: &GemSettings) -> EntityBuilder {
    EntityBuilder::new()
        .with(GemTag)
        .with(Transform::default())
        .with(Collider {
            radius: settings.collider_radius,
            filter: GEM_FILTER,
            trigger: true,
        })
        .with_disabled(DestroyFlag)
}

fn plasma_blast_template(settings: &PlasmaBlastSettings) -> EntityBuilder {
    EntityBuilder::new()
        .with(PlasmaBlast {
            move_speed: settings.move_speed,
            damage: settings.attack_damage,
        })
        .with(Transform::default())
        .with(Collider {
            radius: settings.collider_radius,
            filter: PLASMA_FILTER,
            trigger: true,
        })
        .with_disabled(DestroyFlag)
}

impl SceneTemplates {
    /// Register every template. Templates referenced by others go first.
    pub fn author(settings: &SceneSettings, library: &mut TemplateLibrary) -> Self {
        let gem = library.register("gem", gem_template(&settings.gem));
        let plasma_blast = library.register("plasma_blast", plasma_blast_template(&settings.plasma_blast));
        let enemy = library.register("enemy", enemy_template(&settings.enemy, gem));
        let player = library.register("player", player_template(&settings.player, plasma_blast));
        Self {
            player,
            enemy,
            gem,
            plasma_blast,
        }
    }

    /// Create the player and the enemy spawner.
    pub fn populate(
        &self,
        settings: &SceneSettings,
        library: &dyn TemplateSource,
        world: &mut World,
    ) -> Result<SceneEntities, StoreError> {
        let player = library.instantiate(self.player, world)?;
        let spawner = world.spawn(
            &EntityBuilder::new()
                .with(SpawnProfile {
                    template: self.enemy,
                    interval: settings.spawner.interval,
                    distance: settings.spawner.distance,
                })
                .with(SpawnState {
                    timer: 0.0,
                    rng: SeededRng::from_seed_index(settings.spawner.seed),
                }),
        );
        info!(%player, %spawner, "scene populated");
        Ok(SceneEntities { player, spawner })
    }
}
