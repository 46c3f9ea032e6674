//! Gameplay systems and the schedules that order them.
//!
//! Within a schedule, declaration order only matters between systems whose
//! access conflicts; everything else may run in the same wave.

mod collision;
mod combat;
mod destruction;
mod init;
mod movement;
mod presentation;
mod spawn;

pub use collision::CollisionDispatch;
pub use combat::{CooldownClear, DamageResolution, PlayerAttack};
pub use destruction::Destruction;
pub use init::{CameraInit, CharacterInit};
pub use movement::{CharacterMove, EnemyTargeting, PlayerInput, ProjectileMove};
pub use presentation::{CameraFollow, UiRefresh};
pub use spawn::SpawnDirector;

use crate::collaborators::TickResources;
use crate::components::PlayerTag;
use survivors_core::ecs::{Entity, Schedule, ScheduleError, SystemError, Table};

pub type GameSchedule = Schedule<TickResources>;

/// Horizontal speed below which facing is left unchanged.
pub const FACING_DEADZONE: f32 = 0.15;

/// The three per-tick schedules.
pub struct Schedules {
    pub init: GameSchedule,
    pub simulation: GameSchedule,
    pub after_physics: GameSchedule,
}

impl Schedules {
    pub fn build() -> Result<Self, ScheduleError> {
        let mut init = Schedule::new("initialization");
        init.add_system(CharacterInit)?;
        init.add_system(CameraInit)?;

        let mut simulation = Schedule::new("simulation");
        simulation.add_system(PlayerInput)?;
        simulation.add_system(EnemyTargeting)?;
        simulation.add_system(CharacterMove)?;
        simulation.add_system(SpawnDirector)?;
        simulation.add_system(ProjectileMove)?;

        let mut after_physics = Schedule::new("after_physics");
        after_physics.add_system(CooldownClear)?;
        after_physics.add_system(CollisionDispatch)?;
        after_physics.add_system(DamageResolution)?;
        after_physics.add_system(PlayerAttack)?;
        after_physics.add_system(UiRefresh)?;
        after_physics.add_system(CameraFollow)?;
        after_physics.add_system(Destruction)?;

        Ok(Self {
            init,
            simulation,
            after_physics,
        })
    }
}

/// The one live player. Zero or several players violate the game's
/// invariants.
pub(crate) fn single_player(players: &Table<PlayerTag>) -> Result<Entity, SystemError> {
    match players.entities() {
        [player] => Ok(*player),
        others => Err(SystemError::Invariant(format!(
            "expected exactly one player, found {}",
            others.len()
        ))),
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schedules_order_conflicting_stages() {
        let schedules = Schedules::build().unwrap();
        let after = &schedules.after_physics;
        let wave_of = |name: &str| {
            let handle = after.handle(name).unwrap();
            after
                .waves()
                .iter()
                .position(|wave| wave.contains(&handle))
                .unwrap()
        };
        assert!(wave_of("cooldown_clear") < wave_of("collision_dispatch"));
        assert!(wave_of("collision_dispatch") < wave_of("damage_resolution"));
        assert!(wave_of("collision_dispatch") < wave_of("player_attack"));
        assert!(wave_of("damage_resolution") < wave_of("destruction"));
        assert!(wave_of("collision_dispatch") < wave_of("ui_refresh"));

        let sim = &schedules.simulation;
        let wave_of = |name: &str| {
            let handle = sim.handle(name).unwrap();
            sim.waves().iter().position(|wave| wave.contains(&handle)).unwrap()
        };
        assert!(wave_of("player_input") < wave_of("character_move"));
        assert!(wave_of("enemy_targeting") < wave_of("character_move"));
    }
}
