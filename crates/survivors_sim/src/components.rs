// components.rs - Gameplay component types
//
// Ids are stable and unique across the game. Enableable components (flags,
// cooldowns) keep their table row and toggle the enable bit instead of being
// added and removed.

use smallvec::SmallVec;
use survivors_core::define_component;
use survivors_core::ecs::{TemplateId, World};
use survivors_core::math::{SeededRng, Vec2, Vec3};

/// Collision layers.
pub mod layers {
    pub const PLAYER: u32 = 1 << 0;
    pub const ENEMY: u32 = 1 << 1;
    pub const PROJECTILE: u32 = 1 << 2;
    pub const PICKUP: u32 = 1 << 3;
    pub const ALL: u32 = u32::MAX;
}

/// World position plus rotation about the z axis (radians).
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: f32,
}

impl Transform {
    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            rotation: 0.0,
        }
    }

    pub fn from_position_rotation(position: Vec3, rotation: f32) -> Self {
        Self { position, rotation }
    }

    /// Local +x axis in world space.
    pub fn right(&self) -> Vec3 {
        let (sin, cos) = self.rotation.sin_cos();
        Vec3::new(cos, sin, 0.0)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Velocity {
    pub linear: Vec3,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PhysicsMass {
    pub inverse_mass: f32,
    pub inverse_inertia: Vec3,
}

impl Default for PhysicsMass {
    fn default() -> Self {
        Self {
            inverse_mass: 1.0,
            inverse_inertia: Vec3::ONE,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CollisionFilter {
    pub belongs_to: u32,
    pub collides_with: u32,
}

impl CollisionFilter {
    pub const fn new(belongs_to: u32, collides_with: u32) -> Self {
        Self {
            belongs_to,
            collides_with,
        }
    }

    /// Both sides must accept each other.
    pub fn can_collide(&self, other: &CollisionFilter) -> bool {
        self.belongs_to & other.collides_with != 0 && self.collides_with & other.belongs_to != 0
    }
}

/// Circle collider in the xy plane. Triggers report overlaps only.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Collider {
    pub radius: f32,
    pub filter: CollisionFilter,
    pub trigger: bool,
}

/// Enabled until the character's physics setup has run.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct InitializeCharacterFlag;

/// Unit-length or zero.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct MoveDirection(pub Vec2);

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct MoveSpeed(pub f32);

/// Sprite facing: `1.0` right, `-1.0` left.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FacingOverride(pub f32);

impl Default for FacingOverride {
    fn default() -> Self {
        Self(1.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum PlayerAnimation {
    Movement = 0,
    Idle = 1,
}

/// Animation row the renderer should play, as a shader-friendly float.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct AnimationIndexOverride(pub f32);

impl From<PlayerAnimation> for AnimationIndexOverride {
    fn from(animation: PlayerAnimation) -> Self {
        Self(f32::from(animation as u8))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MaxHitPoints(pub i32);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CurrentHitPoints(pub i32);

/// Damage received this tick, drained by damage resolution.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DamageQueue(pub SmallVec<[i32; 4]>);

impl DamageQueue {
    pub fn push(&mut self, amount: i32) {
        self.0.push(amount);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Sum of the queued amounts; leaves the queue empty.
    pub fn drain_total(&mut self) -> i32 {
        self.0.drain(..).fold(0, i32::saturating_add)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PlayerTag;

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct EnemyTag;

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct GemTag;

/// Single-use projectile fired by the player.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlasmaBlast {
    pub move_speed: f32,
    pub damage: i32,
}

/// Attack timing and targeting shared by players and enemies.
///
/// Enemies deal `damage` on contact; players search a square of
/// `detection_half_extent` for targets in `collision_mask`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AttackProfile {
    pub damage: i32,
    pub cooldown: f32,
    pub detection_half_extent: f32,
    pub collision_mask: u32,
}

/// Meaningful only while enabled.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct CooldownExpiry {
    pub expires_at: f64,
}

/// Template the player fires.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AttackEffect(pub TemplateId);

/// Template dropped where the entity is destroyed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RewardTemplate(pub TemplateId);

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct GemsCollected(pub i32);

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct UpdateGemUiFlag;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpawnProfile {
    pub template: TemplateId,
    pub interval: f32,
    pub distance: f32,
}

#[derive(Clone, Debug)]
pub struct SpawnState {
    pub timer: f32,
    pub rng: SeededRng,
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct DestroyFlag;

/// Present until the camera collaborator has been bound to the player.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct InitializeCameraTarget;

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct CameraTarget;

define_component!(Transform, 1, "Transform");
define_component!(Velocity, 2, "Velocity");
define_component!(PhysicsMass, 3, "PhysicsMass");
define_component!(Collider, 4, "Collider");
define_component!(InitializeCharacterFlag, 5, "InitializeCharacterFlag");
define_component!(MoveDirection, 6, "MoveDirection");
define_component!(MoveSpeed, 7, "MoveSpeed");
define_component!(FacingOverride, 8, "FacingOverride");
define_component!(AnimationIndexOverride, 9, "AnimationIndexOverride");
define_component!(MaxHitPoints, 10, "MaxHitPoints");
define_component!(CurrentHitPoints, 11, "CurrentHitPoints");
define_component!(DamageQueue, 12, "DamageQueue");
define_component!(PlayerTag, 13, "PlayerTag");
define_component!(EnemyTag, 14, "EnemyTag");
define_component!(GemTag, 15, "GemTag");
define_component!(PlasmaBlast, 16, "PlasmaBlast");
define_component!(AttackProfile, 17, "AttackProfile");
define_component!(CooldownExpiry, 18, "CooldownExpiry");
define_component!(AttackEffect, 19, "AttackEffect");
define_component!(RewardTemplate, 20, "RewardTemplate");
define_component!(GemsCollected, 21, "GemsCollected");
define_component!(UpdateGemUiFlag, 22, "UpdateGemUiFlag");
define_component!(SpawnProfile, 23, "SpawnProfile");
define_component!(SpawnState, 24, "SpawnState");
define_component!(DestroyFlag, 25, "DestroyFlag");
define_component!(InitializeCameraTarget, 26, "InitializeCameraTarget");
define_component!(CameraTarget, 27, "CameraTarget");

/// Create every gameplay table so systems never see an unregistered one.
pub fn register_all(world: &mut World) {
    world
        .register::<Transform>()
        .register::<Velocity>()
        .register::<PhysicsMass>()
        .register::<Collider>()
        .register::<InitializeCharacterFlag>()
        .register::<MoveDirection>()
        .register::<MoveSpeed>()
        .register::<FacingOverride>()
        .register::<AnimationIndexOverride>()
        .register::<MaxHitPoints>()
        .register::<CurrentHitPoints>()
        .register::<DamageQueue>()
        .register::<PlayerTag>()
        .register::<EnemyTag>()
        .register::<GemTag>()
        .register::<PlasmaBlast>()
        .register::<AttackProfile>()
        .register::<CooldownExpiry>()
        .register::<AttackEffect>()
        .register::<RewardTemplate>()
        .register::<GemsCollected>()
        .register::<UpdateGemUiFlag>()
        .register::<SpawnProfile>()
        .register::<SpawnState>()
        .register::<DestroyFlag>()
        .register::<InitializeCameraTarget>()
        .register::<CameraTarget>();
}
