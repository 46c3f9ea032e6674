// simulation.rs - Fixed-step tick driver
//
// One `tick` is the whole frame: flush, schedules, physics, flush. Nothing
// outside `tick` touches the world while a schedule is running, so the
// schedules only ever need `&World`.

use crate::collaborators::{CameraSink, PhysicsBackend, TickResources, UiNotification, UiSink};
use crate::components::register_all;
use crate::scene::{SceneEntities, SceneTemplates};
use crate::systems::Schedules;
use survivors_core::ecs::{
    DeferredQueue, Entity, FlushReport, InvariantPolicy, Lane, ScheduleError, ScheduleReport,
    StoreError, TemplateId, TemplateLibrary, TemplateSource, World,
};
use survivors_core::time::SimulationTime;
use survivors_metrics::{Counter, TickTimer};
use survivors_services::{InputState, Settings, SettingsError};
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Debug, Error)]
pub enum SimError {
    #[error(transparent)]
    Settings(#[from] SettingsError),

    #[error(transparent)]
    Schedule(#[from] ScheduleError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Summary of one completed tick.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TickReport {
    pub tick: u64,
    pub contacts: usize,
    pub created: usize,
    pub destroyed: usize,
    /// Deferred commands dropped under best-effort policy.
    pub skipped_commands: usize,
    /// Systems skipped because their required components were absent.
    pub idle_systems: usize,
    /// Systems that failed under best-effort policy.
    pub failed_systems: usize,
    pub notifications: Vec<UiNotification>,
}

impl TickReport {
    fn add_flush(&mut self, flush: FlushReport) {
        self.created += flush.created;
        self.destroyed += flush.destroyed;
        self.skipped_commands += flush.skipped;
    }

    fn add_schedule(&mut self, schedule: ScheduleReport) {
        self.idle_systems += schedule.skipped;
        self.failed_systems += schedule.failed;
    }
}

pub struct Simulation {
    world: World,
    templates: TemplateLibrary,
    scene: SceneTemplates,
    entities: SceneEntities,
    queue: DeferredQueue,
    schedules: Schedules,
    resources: TickResources,
    time: SimulationTime,
    delta: f32,
    policy: InvariantPolicy,
    game_over: bool,
    counters: Counter,
    timer: TickTimer,
}

impl Simulation {
    /// Author the scene described by `settings` and get ready for tick 0.
    pub fn from_settings(settings: &Settings, physics: Box<dyn PhysicsBackend>) -> Result<Self, SimError> {
        settings.validate()?;

        let mut world = World::new();
        register_all(&mut world);
        let mut templates = TemplateLibrary::new();
        let scene = SceneTemplates::author(&settings.scene, &mut templates);
        let entities = scene.populate(&settings.scene, &templates, &mut world)?;

        let delta = settings.tick_delta();
        let policy = settings.simulation.invariant_policy;
        info!(
            tick_rate_hz = settings.simulation.tick_rate_hz,
            ?policy,
            "simulation ready"
        );

        Ok(Self {
            world,
            templates,
            scene,
            entities,
            queue: DeferredQueue::new(),
            schedules: Schedules::build()?,
            resources: TickResources::new(physics),
            time: SimulationTime::new(),
            delta,
            policy,
            game_over: false,
            counters: Counter::new(),
            timer: TickTimer::new(120),
        })
    }

    pub fn attach_ui(&mut self, ui: Box<dyn UiSink>) {
        self.resources.ui = Some(ui);
    }

    pub fn attach_camera(&mut self, camera: Box<dyn CameraSink>) {
        self.resources.camera = Some(camera);
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    /// Direct world access between ticks (tests, tooling).
    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    /// Create an entity from a registered template right away, outside the
    /// deferred queue. Only valid between ticks.
    pub fn instantiate(&mut self, template: TemplateId) -> Result<Entity, SimError> {
        Ok(self.templates.instantiate(template, &mut self.world)?)
    }

    pub fn templates(&self) -> &TemplateLibrary {
        &self.templates
    }

    pub fn scene(&self) -> &SceneTemplates {
        &self.scene
    }

    pub fn entities(&self) -> &SceneEntities {
        &self.entities
    }

    pub fn queue(&self) -> &DeferredQueue {
        &self.queue
    }

    pub fn resources(&self) -> &TickResources {
        &self.resources
    }

    pub fn schedules(&self) -> &Schedules {
        &self.schedules
    }

    pub fn time(&self) -> &SimulationTime {
        &self.time
    }

    pub fn delta(&self) -> f32 {
        self.delta
    }

    pub fn counters(&self) -> &Counter {
        &self.counters
    }

    pub fn tick_timer(&self) -> &TickTimer {
        &self.timer
    }

    /// Set once the player has been destroyed.
    pub fn is_game_over(&self) -> bool {
        self.game_over
    }

    fn flush(&mut self, lane: Lane, report: &mut TickReport) -> Result<(), SimError> {
        let flushed = self
            .queue
            .flush(lane, &mut self.world, &self.templates, self.policy)?;
        report.add_flush(flushed);
        Ok(())
    }

    /// Advance the simulation by one fixed step.
    pub fn tick(&mut self, input: InputState) -> Result<TickReport, SimError> {
        self.timer.begin();
        let now = self.time.current(self.delta);
        let mut report = TickReport {
            tick: now.tick,
            ..TickReport::default()
        };
        self.resources.input = input;
        self.resources.events.clear();

        self.flush(Lane::Early, &mut report)?;
        let init = self.schedules.init.run(
            &self.world,
            now,
            &self.resources,
            &mut self.queue,
            self.policy,
        )?;
        report.add_schedule(init);
        self.flush(Lane::Early, &mut report)?;

        let simulation = self.schedules.simulation.run(
            &self.world,
            now,
            &self.resources,
            &mut self.queue,
            self.policy,
        )?;
        report.add_schedule(simulation);

        let events = self.resources.physics.step(&mut self.world, self.delta)?;
        report.contacts = events.len();
        self.resources.events = events;

        let after_physics = self.schedules.after_physics.run(
            &self.world,
            now,
            &self.resources,
            &mut self.queue,
            self.policy,
        )?;
        report.add_schedule(after_physics);
        self.flush(Lane::Late, &mut report)?;

        let recycled = self.world.recycle_retired();
        self.time.advance_tick(self.delta);

        if self
            .resources
            .pending_notifications()
            .contains(&UiNotification::GameOver)
            && !self.game_over
        {
            self.game_over = true;
            warn!(tick = now.tick, "game over");
        }
        report.notifications = self.resources.deliver_notifications();

        self.counters.increment("entities_created", report.created);
        self.counters.increment("entities_destroyed", report.destroyed);
        self.counters.increment("contacts", report.contacts);
        self.timer.end();
        debug!(
            tick = now.tick,
            entities = self.world.entity_count(),
            recycled,
            contacts = report.contacts,
            "tick complete"
        );
        Ok(report)
    }
}
