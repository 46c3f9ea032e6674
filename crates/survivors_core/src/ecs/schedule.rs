// schedule.rs - Access-declaring systems run in conflict-free waves
//
// Systems in one wave share no written component, so they run on the rayon
// pool at the same time. Waves run in order. Each system records structural
// changes into its own `Commands`, and the buffers are appended to the
// deferred queue in declaration order once every wave has finished.

use crate::ecs::{
    component_name, Access, Commands, Component, DeferredQueue, Entity, InvariantPolicy,
    QueryFilter, StoreError, SystemDescriptor, SystemError, SystemHandle,
    SystemRegistrationError, SystemRegistry, TableMut, TableRef, World,
};
use crate::time::TickTime;
use rayon::prelude::*;
use std::time::{Duration, Instant};
use survivors_metrics::SystemProfiler;
use thiserror::Error;
use tracing::{debug, error, trace};

/// A stateless per-tick transformation over the world.
///
/// `R` is the bundle of external collaborators the schedule hands to every
/// system (input, physics events, sinks).
pub trait System<R>: Send + Sync {
    fn descriptor(&self) -> SystemDescriptor;

    fn run(&self, ctx: &SystemContext<'_, R>, commands: &mut Commands) -> Result<(), SystemError>;
}

/// Capability-scoped view of the world for one system run.
///
/// Table borrows are only granted for components the system declared.
pub struct SystemContext<'w, R> {
    world: &'w World,
    descriptor: &'w SystemDescriptor,
    time: TickTime,
    resources: &'w R,
}

impl<'w, R> SystemContext<'w, R> {
    pub fn new(
        world: &'w World,
        descriptor: &'w SystemDescriptor,
        time: TickTime,
        resources: &'w R,
    ) -> Self {
        Self {
            world,
            descriptor,
            time,
            resources,
        }
    }

    fn undeclared(&self, component: &str, access: Access) -> StoreError {
        StoreError::UndeclaredAccess {
            system: self.descriptor.name().to_string(),
            component: component.to_string(),
            access,
        }
    }

    pub fn read<T: Component>(&self) -> Result<TableRef<'w, T>, StoreError> {
        if !self.descriptor.may_read(T::ID) {
            return Err(self.undeclared(T::NAME, Access::Read));
        }
        self.world.read::<T>()
    }

    pub fn write<T: Component>(&self) -> Result<TableMut<'w, T>, StoreError> {
        if !self.descriptor.may_write(T::ID) {
            return Err(self.undeclared(T::NAME, Access::Write));
        }
        self.world.write::<T>()
    }

    /// Entities matching `filter`. Every component the filter names must be
    /// declared.
    pub fn query(&self, filter: &QueryFilter) -> Result<Vec<Entity>, StoreError> {
        if let Some(id) = filter.component_ids().find(|&id| !self.descriptor.may_read(id)) {
            return Err(self.undeclared(&component_name(id), Access::Read));
        }
        self.world.query(filter)
    }

    #[inline]
    pub fn contains(&self, entity: Entity) -> bool {
        self.world.contains(entity)
    }

    #[inline]
    pub fn time(&self) -> TickTime {
        self.time
    }

    #[inline]
    pub fn resources(&self) -> &'w R {
        self.resources
    }

    pub fn name(&self) -> &str {
        self.descriptor.name()
    }
}

#[derive(Debug, Error)]
pub enum ScheduleError {
    #[error(transparent)]
    Registration(#[from] SystemRegistrationError),

    #[error("system '{system}' failed: {source}")]
    System {
        system: String,
        #[source]
        source: SystemError,
    },

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// What happened during one [`Schedule::run`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ScheduleReport {
    pub ran: usize,
    /// Systems whose required components were absent from the world.
    pub skipped: usize,
    /// Systems that failed under [`InvariantPolicy::BestEffort`].
    pub failed: usize,
}

struct SystemOutput {
    handle: SystemHandle,
    result: Result<(), SystemError>,
    commands: Commands,
    elapsed: Duration,
}

pub struct Schedule<R> {
    name: String,
    registry: SystemRegistry,
    systems: Vec<Box<dyn System<R>>>,
    profiler: SystemProfiler,
}

impl<R: Sync> Schedule<R> {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            registry: SystemRegistry::new(),
            systems: Vec::new(),
            profiler: SystemProfiler::new(),
        }
    }

    /// Append a system. Declaration order decides which of two conflicting
    /// systems runs first.
    pub fn add_system<S>(&mut self, system: S) -> Result<SystemHandle, ScheduleError>
    where
        S: System<R> + 'static,
    {
        let handle = self.registry.register(system.descriptor())?;
        self.systems.push(Box::new(system));
        debug!(schedule = %self.name, %handle, "registered system");
        Ok(handle)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.registry.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registry.len() == 0
    }

    pub fn handle(&self, name: &str) -> Option<SystemHandle> {
        self.registry.lookup(name)
    }

    pub fn waves(&self) -> &[Vec<SystemHandle>] {
        self.registry.waves()
    }

    pub fn profiler(&self) -> &SystemProfiler {
        &self.profiler
    }

    /// Run every system once.
    ///
    /// Under `Strict` the first failing system (in handle order) aborts the
    /// run. Systems ordered before it have already queued their commands;
    /// commands from the failing system and every later one are discarded.
    /// A tick that hits this error is left partially applied and the world
    /// should not be ticked again.
    pub fn run(
        &mut self,
        world: &World,
        time: TickTime,
        resources: &R,
        queue: &mut DeferredQueue,
        policy: InvariantPolicy,
    ) -> Result<ScheduleReport, ScheduleError> {
        let mut report = ScheduleReport::default();
        let mut outputs = Vec::with_capacity(self.systems.len());

        for wave in self.registry.waves() {
            let mut runnable = Vec::with_capacity(wave.len());
            for &handle in wave {
                let Some(descriptor) = self.registry.descriptor(handle) else {
                    continue;
                };
                if required_present(world, descriptor)? {
                    runnable.push((handle, descriptor));
                } else {
                    trace!(system = descriptor.name(), "required components absent; skipping");
                    report.skipped += 1;
                }
            }

            let systems = &self.systems;
            let finished: Vec<SystemOutput> = runnable
                .par_iter()
                .map(|&(handle, descriptor)| {
                    let ctx = SystemContext::new(world, descriptor, time, resources);
                    let mut commands = Commands::new();
                    let start = Instant::now();
                    let result = systems[handle.index() as usize].run(&ctx, &mut commands);
                    SystemOutput {
                        handle,
                        result,
                        commands,
                        elapsed: start.elapsed(),
                    }
                })
                .collect();
            outputs.extend(finished);
        }

        outputs.sort_by_key(|output| output.handle.index());
        for output in outputs {
            let name = self
                .registry
                .descriptor(output.handle)
                .map_or("<unknown>", |descriptor| descriptor.name());
            self.profiler.record(name, output.elapsed);
            match output.result {
                Ok(()) => {
                    report.ran += 1;
                    queue.append(output.commands);
                }
                Err(source) if policy.is_strict() => {
                    return Err(ScheduleError::System {
                        system: name.to_string(),
                        source,
                    });
                }
                Err(source) => {
                    error!(schedule = %self.name, system = name, error = %source, "system failed; dropping its commands");
                    report.failed += 1;
                }
            }
        }

        Ok(report)
    }
}

fn required_present(world: &World, descriptor: &SystemDescriptor) -> Result<bool, StoreError> {
    for &component in descriptor.required_components() {
        if !world.has_any(component)? {
            return Ok(false);
        }
    }
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecs::{EntityBuilder, Lane, TemplateLibrary};
    use crate::{define_component, spawn};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[derive(Clone, Debug, PartialEq)]
    struct Counter(u32);
    define_component!(Counter, 230, "Counter");

    #[derive(Clone, Debug, PartialEq)]
    struct Leader;
    define_component!(Leader, 231, "Leader");

    #[derive(Default)]
    struct Log {
        order: Mutex<Vec<&'static str>>,
        runs: AtomicUsize,
    }

    struct Bump(&'static str);

    impl System<Log> for Bump {
        fn descriptor(&self) -> SystemDescriptor {
            SystemDescriptor::new(self.0).writes([Counter::ID])
        }

        fn run(&self, ctx: &SystemContext<'_, Log>, _commands: &mut Commands) -> Result<(), SystemError> {
            for (_, counter) in ctx.write::<Counter>()?.iter_mut() {
                counter.0 += 1;
            }
            ctx.resources().order.lock().unwrap().push(self.0);
            ctx.resources().runs.fetch_add(1, Ordering::Relaxed);
            Ok(())
        }
    }

    struct NeedsLeader;

    impl System<Log> for NeedsLeader {
        fn descriptor(&self) -> SystemDescriptor {
            SystemDescriptor::new("needs_leader")
                .reads([Leader::ID])
                .requires([Leader::ID])
        }

        fn run(&self, ctx: &SystemContext<'_, Log>, _commands: &mut Commands) -> Result<(), SystemError> {
            ctx.resources().runs.fetch_add(1, Ordering::Relaxed);
            Ok(())
        }
    }

    struct Sneaky;

    impl System<Log> for Sneaky {
        fn descriptor(&self) -> SystemDescriptor {
            SystemDescriptor::new("sneaky").reads([Counter::ID])
        }

        fn run(&self, ctx: &SystemContext<'_, Log>, commands: &mut Commands) -> Result<(), SystemError> {
            commands.spawn(Lane::Early, EntityBuilder::new().with(Leader));
            ctx.write::<Counter>()?;
            Ok(())
        }
    }

    fn world() -> World {
        let mut world = World::new();
        world.register::<Counter>().register::<Leader>();
        spawn!(world, Counter(0));
        world
    }

    #[test]
    fn conflicting_systems_run_in_declaration_order() {
        let mut schedule = Schedule::new("test");
        schedule.add_system(Bump("first")).unwrap();
        schedule.add_system(Bump("second")).unwrap();
        assert_eq!(schedule.waves().len(), 2);

        let world = world();
        let log = Log::default();
        let mut queue = DeferredQueue::new();
        let report = schedule
            .run(&world, TickTime::new(0, 0.0, 0.1), &log, &mut queue, InvariantPolicy::Strict)
            .unwrap();

        assert_eq!(report.ran, 2);
        assert_eq!(*log.order.lock().unwrap(), vec!["first", "second"]);
        let filter = QueryFilter::new().with::<Counter>();
        let entity = world.query(&filter).unwrap()[0];
        assert_eq!(world.get_cloned::<Counter>(entity), Some(Counter(2)));
    }

    #[test]
    fn missing_required_components_skip_the_system() {
        let mut schedule = Schedule::new("test");
        schedule.add_system(NeedsLeader).unwrap();
        let mut world = world();
        let log = Log::default();
        let mut queue = DeferredQueue::new();
        let time = TickTime::new(0, 0.0, 0.1);

        let report = schedule
            .run(&world, time, &log, &mut queue, InvariantPolicy::Strict)
            .unwrap();
        assert_eq!(report.skipped, 1);
        assert_eq!(log.runs.load(Ordering::Relaxed), 0);

        spawn!(world, Leader);
        let report = schedule
            .run(&world, time, &log, &mut queue, InvariantPolicy::Strict)
            .unwrap();
        assert_eq!(report.ran, 1);
    }

    #[test]
    fn undeclared_access_fails_the_system() {
        let mut schedule = Schedule::new("test");
        schedule.add_system(Sneaky).unwrap();
        let world = world();
        let log = Log::default();
        let mut queue = DeferredQueue::new();
        let time = TickTime::new(0, 0.0, 0.1);

        let err = schedule
            .run(&world, time, &log, &mut queue, InvariantPolicy::Strict)
            .unwrap_err();
        assert!(matches!(
            err,
            ScheduleError::System {
                source: SystemError::Store(StoreError::UndeclaredAccess { access: Access::Write, .. }),
                ..
            }
        ));

        let report = schedule
            .run(&world, time, &log, &mut queue, InvariantPolicy::BestEffort)
            .unwrap();
        assert_eq!(report.failed, 1);
        assert!(queue.is_empty());
    }

    #[test]
    fn commands_reach_the_queue() {
        struct Spawner;
        impl System<Log> for Spawner {
            fn descriptor(&self) -> SystemDescriptor {
                SystemDescriptor::new("spawner").reads([Counter::ID])
            }
            fn run(&self, _ctx: &SystemContext<'_, Log>, commands: &mut Commands) -> Result<(), SystemError> {
                commands.spawn(Lane::Early, EntityBuilder::new().with(Leader));
                Ok(())
            }
        }

        let mut schedule = Schedule::new("test");
        schedule.add_system(Spawner).unwrap();
        let mut world = world();
        let log = Log::default();
        let mut queue = DeferredQueue::new();
        schedule
            .run(&world, TickTime::new(0, 0.0, 0.1), &log, &mut queue, InvariantPolicy::Strict)
            .unwrap();
        let report = queue
            .flush(Lane::Early, &mut world, &TemplateLibrary::new(), InvariantPolicy::Strict)
            .unwrap();
        assert_eq!(report.created, 1);
        assert!(world.has_any(Leader::ID).unwrap());
    }

    #[test]
    fn parallel_commands_merge_in_handle_order() {
        struct Stamp(&'static str, u32);
        impl System<Log> for Stamp {
            fn descriptor(&self) -> SystemDescriptor {
                SystemDescriptor::new(self.0).reads([Counter::ID])
            }
            fn run(&self, _ctx: &SystemContext<'_, Log>, commands: &mut Commands) -> Result<(), SystemError> {
                commands.spawn(Lane::Early, EntityBuilder::new().with(Counter(self.1)));
                Ok(())
            }
        }

        let mut schedule = Schedule::new("test");
        let handles: Vec<u32> = [Stamp("a", 1), Stamp("b", 2), Stamp("c", 3)]
            .into_iter()
            .map(|system| schedule.add_system(system).unwrap().index())
            .collect();
        assert_eq!(handles, vec![0, 1, 2]);
        assert_eq!(schedule.waves().len(), 1);

        let mut world = world();
        let log = Log::default();
        let mut queue = DeferredQueue::new();
        schedule
            .run(&world, TickTime::new(0, 0.0, 0.1), &log, &mut queue, InvariantPolicy::Strict)
            .unwrap();
        queue
            .flush(Lane::Early, &mut world, &TemplateLibrary::new(), InvariantPolicy::Strict)
            .unwrap();

        let mut spawned = world.query(&QueryFilter::new().with::<Counter>()).unwrap();
        spawned.sort_by_key(|entity| entity.index());
        let values: Vec<u32> = spawned
            .into_iter()
            .filter_map(|entity| world.get_cloned::<Counter>(entity))
            .map(|counter| counter.0)
            .collect();
        assert_eq!(values, vec![0, 1, 2, 3]);
    }
}
