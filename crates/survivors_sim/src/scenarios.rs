//! End-to-end checks that drive the full tick pipeline with scripted
//! physics contacts.

use crate::collaborators::{ContactEvent, UiNotification};
use crate::components::{
    CooldownExpiry, CurrentHitPoints, DamageQueue, DestroyFlag, EnemyTag, GemTag, GemsCollected,
    PlayerTag, Transform, UpdateGemUiFlag,
};
use crate::simulation::{SimError, Simulation};
use crate::testing::{RecordingUi, ScriptedPhysics};
use survivors_core::ecs::{Entity, EntityBuilder, InvariantPolicy, Lane, ScheduleError};
use survivors_core::math::Vec3;
use survivors_services::{InputState, Settings};

struct Harness {
    sim: Simulation,
    physics: ScriptedPhysics,
    ui: RecordingUi,
}

/// 10 Hz, no attack range and a fresh spawner, so only scripted contacts
/// matter.
fn harness(configure: impl FnOnce(&mut Settings)) -> Harness {
    let mut settings = Settings::default();
    settings.simulation.tick_rate_hz = 10;
    settings.scene.player.detection_size = 0.0;
    configure(&mut settings);

    let physics = ScriptedPhysics::default();
    let mut sim = Simulation::from_settings(&settings, Box::new(physics.clone())).unwrap();
    let ui = RecordingUi::default();
    sim.attach_ui(Box::new(ui.clone()));
    Harness { sim, physics, ui }
}

impl Harness {
    fn player(&self) -> Entity {
        self.sim.entities().player
    }

    fn enemy_at(&mut self, position: Vec3) -> Entity {
        let template = self.sim.scene().enemy;
        let enemy = self.sim.instantiate(template).unwrap();
        self.sim
            .world_mut()
            .insert(enemy, Transform::from_position(position))
            .unwrap();
        enemy
    }

    fn tick(&mut self) {
        self.sim.tick(InputState::default()).unwrap();
    }

    fn hit_points(&self, entity: Entity) -> i32 {
        self.sim.world().get_cloned::<CurrentHitPoints>(entity).unwrap().0
    }
}

#[test]
fn enemy_contact_damage_follows_the_cooldown() {
    let mut h = harness(|settings| {
        settings.scene.player.hit_points = 30;
        settings.scene.enemy.attack_damage = 10;
        settings.scene.enemy.attack_cooldown = 1.0;
    });
    let player = h.player();
    let enemy = h.enemy_at(Vec3::new(1.0, 0.0, 0.0));
    for tick in [0, 5, 12] {
        h.physics.script_at(tick, vec![ContactEvent::collision(enemy, player)]);
    }

    let mut hit_points = Vec::new();
    for _ in 0..13 {
        h.tick();
        hit_points.push(h.hit_points(player));
    }
    assert_eq!(hit_points[0], 20);
    assert_eq!(hit_points[5], 20);
    assert_eq!(hit_points[11], 20);
    assert_eq!(hit_points[12], 10);
    assert!(h.sim.world().is_enabled::<CooldownExpiry>(enemy));
    let expiry = h.sim.world().get_cloned::<CooldownExpiry>(enemy).unwrap();
    assert!((expiry.expires_at - 2.2).abs() < 1e-5);
}

/// One tick queues a spawn, then the next one carries an enemy contact, a
/// flagged gem and a second player.
fn two_player_tick(policy: InvariantPolicy) -> (Harness, Entity) {
    let mut h = harness(|settings| {
        settings.simulation.invariant_policy = policy;
        settings.scene.player.hit_points = 100;
        settings.scene.enemy.attack_damage = 10;
    });
    h.tick();
    assert_eq!(h.sim.queue().pending(Lane::Early).len(), 2);

    let player = h.player();
    let enemy = h.enemy_at(Vec3::new(1.0, 0.0, 0.0));
    h.physics.script_at(0, vec![ContactEvent::collision(enemy, player)]);
    let gem_template = h.sim.scene().gem;
    let gem = h.sim.instantiate(gem_template).unwrap();
    let world = h.sim.world_mut();
    world.set_enabled::<DestroyFlag>(gem, true);
    world.spawn(&EntityBuilder::new().with(PlayerTag));
    (h, gem)
}

#[test]
fn a_second_player_only_fails_the_systems_that_need_one() {
    let (mut h, gem) = two_player_tick(InvariantPolicy::BestEffort);
    let player = h.player();

    let report = h.sim.tick(InputState::default()).unwrap();
    assert!(report.failed_systems > 0);
    assert_eq!(report.created, 1);
    assert_eq!(h.hit_points(player), 90);
    assert!(!h.sim.world().contains(gem));
    assert_eq!(h.sim.time().tick_count(), 2);
    assert_eq!(h.sim.world().read::<EnemyTag>().unwrap().len(), 2);
}

#[test]
fn a_second_player_aborts_a_strict_tick() {
    let (mut h, gem) = two_player_tick(InvariantPolicy::Strict);
    let player = h.player();

    let result = h.sim.tick(InputState::default());
    assert!(matches!(
        result,
        Err(SimError::Schedule(ScheduleError::System { .. }))
    ));
    assert_eq!(h.sim.time().tick_count(), 1);
    assert_eq!(h.hit_points(player), 100);
    assert!(h.sim.world().contains(gem));
}

#[test]
fn lethal_damage_ends_the_game_once() {
    let mut h = harness(|settings| {
        settings.scene.player.hit_points = 10;
        settings.scene.enemy.attack_damage = 6;
    });
    let player = h.player();
    let first = h.enemy_at(Vec3::new(0.5, 0.0, 0.0));
    let second = h.enemy_at(Vec3::new(-0.5, 0.0, 0.0));
    h.physics.script_at(
        0,
        vec![
            ContactEvent::collision(player, first),
            ContactEvent::collision(second, player),
        ],
    );

    let report = h.sim.tick(InputState::default()).unwrap();
    assert!(!h.sim.world().contains(player));
    assert!(report.notifications.contains(&UiNotification::GameOver));
    assert!(h.sim.is_game_over());

    for _ in 0..3 {
        let report = h.sim.tick(InputState::default()).unwrap();
        assert!(report.idle_systems > 0);
        assert_eq!(report.failed_systems, 0);
    }
    assert_eq!(h.ui.game_overs(), 1);
    assert!(h.sim.world().read::<PlayerTag>().unwrap().is_empty());
}

#[test]
fn overkill_damage_is_kept_until_despawn() {
    // Queued outside any contact; resolution and destruction share a tick.
    let mut h = harness(|settings| settings.scene.player.hit_points = 10);
    let player = h.player();
    {
        let world = h.sim.world_mut();
        let queue = world.get_mut::<DamageQueue>(player).unwrap();
        queue.push(6);
        queue.push(6);
    }
    let report = h.sim.tick(InputState::default()).unwrap();
    assert_eq!(report.destroyed, 1);
    assert!(!h.sim.world().contains(player));
    assert_eq!(h.ui.game_overs(), 1);
}

#[test]
fn duplicate_pickup_contacts_count_once() {
    let mut h = harness(|_| {});
    let player = h.player();
    h.tick();
    h.ui.clear();

    h.sim.world_mut().get_mut::<GemsCollected>(player).unwrap().0 = 3;
    let gem_template = h.sim.scene().gem;
    let gem = h.sim.instantiate(gem_template).unwrap();
    h.physics.script_at(
        0,
        vec![ContactEvent::trigger(gem, player), ContactEvent::trigger(player, gem)],
    );
    h.tick();

    assert_eq!(
        h.sim.world().get_cloned::<GemsCollected>(player),
        Some(GemsCollected(3 + 1))
    );
    assert_eq!(h.ui.resource_counts(), vec![4]);
    assert!(!h.sim.world().is_enabled::<UpdateGemUiFlag>(player));
    assert!(!h.sim.world().contains(gem));
}

#[test]
fn spawning_is_capped_at_one_per_tick() {
    let mut h = harness(|settings| settings.scene.spawner.interval = 0.05);
    for tick in 0..5 {
        let report = h.sim.tick(InputState::default()).unwrap();
        assert_eq!(h.sim.queue().pending(Lane::Early).len(), 2);
        assert_eq!(report.created, usize::from(tick > 0));
    }
    assert_eq!(h.sim.world().read::<EnemyTag>().unwrap().len(), 4);
}

#[test]
fn killed_enemies_drop_a_gem_where_they_fell() {
    let mut h = harness(|settings| settings.scene.plasma_blast.attack_damage = 10);
    let enemy = h.enemy_at(Vec3::new(2.0, 3.0, 0.0));
    h.sim.world_mut().get_mut::<CurrentHitPoints>(enemy).unwrap().0 = 4;
    let blast_template = h.sim.scene().plasma_blast;
    let blast = h.sim.instantiate(blast_template).unwrap();
    h.physics.script_at(0, vec![ContactEvent::trigger(blast, enemy)]);

    let report = h.sim.tick(InputState::default()).unwrap();
    assert_eq!(report.destroyed, 2);
    assert!(!h.sim.world().contains(enemy));
    assert!(!h.sim.world().contains(blast));

    let world = h.sim.world();
    let gems = world.read::<GemTag>().unwrap();
    assert_eq!(gems.len(), 1);
    let gem = gems.entities()[0];
    assert_eq!(
        world.get_cloned::<Transform>(gem).unwrap().position,
        Vec3::new(2.0, 3.0, 0.0)
    );
    assert!(!world.is_enabled::<DestroyFlag>(gem));
    assert_eq!(h.hit_points(h.player()), 1000);
}
