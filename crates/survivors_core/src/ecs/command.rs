// command.rs - Deferred structural mutations
//
// Systems never create, destroy or restructure entities while queries are in
// flight. They record commands into a local `Commands` buffer; the schedule
// appends those buffers to the shared `DeferredQueue` in declaration order,
// and the simulation replays each lane at its synchronization point.

use crate::ecs::builder::boxed_value;
use crate::ecs::{
    component_name, Component, ComponentId, ComponentValue, Entity, EntityBuilder,
    InvariantPolicy, StoreError, TemplateId, TemplateSource, World,
};
use std::collections::HashMap;
use std::fmt;
use tracing::{debug, trace, warn};

/// Synchronization point a command is replayed at.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Lane {
    /// Start of the next tick, before any system reads the world.
    Early,
    /// End of the current tick, after every system has run.
    Late,
}

/// Placeholder for an entity that does not exist until its lane is flushed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PendingEntity(u32);

impl PendingEntity {
    #[inline]
    pub fn index(self) -> u32 {
        self.0
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Target {
    Live(Entity),
    Pending(PendingEntity),
}

impl From<Entity> for Target {
    fn from(entity: Entity) -> Self {
        Target::Live(entity)
    }
}

impl From<PendingEntity> for Target {
    fn from(pending: PendingEntity) -> Self {
        Target::Pending(pending)
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::Live(entity) => write!(f, "{entity}"),
            Target::Pending(pending) => write!(f, "pending#{}", pending.0),
        }
    }
}

pub enum Command {
    Instantiate {
        template: TemplateId,
        slot: PendingEntity,
    },
    Spawn {
        builder: EntityBuilder,
        slot: PendingEntity,
    },
    Insert {
        target: Target,
        value: Box<dyn ComponentValue>,
    },
    Remove {
        target: Target,
        component: ComponentId,
    },
    Despawn {
        target: Target,
    },
}

/// Discriminant of a [`Command`], for logs and assertions.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CommandKind {
    Instantiate,
    Spawn,
    Insert,
    Remove,
    Despawn,
}

impl Command {
    pub fn kind(&self) -> CommandKind {
        match self {
            Command::Instantiate { .. } => CommandKind::Instantiate,
            Command::Spawn { .. } => CommandKind::Spawn,
            Command::Insert { .. } => CommandKind::Insert,
            Command::Remove { .. } => CommandKind::Remove,
            Command::Despawn { .. } => CommandKind::Despawn,
        }
    }

    /// Entity the command acts on, if it acts on an existing one.
    pub fn target(&self) -> Option<Target> {
        match self {
            Command::Instantiate { .. } | Command::Spawn { .. } => None,
            Command::Insert { target, .. }
            | Command::Remove { target, .. }
            | Command::Despawn { target } => Some(*target),
        }
    }

    fn rebase(&mut self, offset: u32) {
        let shift = |pending: &mut PendingEntity| pending.0 += offset;
        match self {
            Command::Instantiate { slot, .. } | Command::Spawn { slot, .. } => shift(slot),
            Command::Insert { target, .. }
            | Command::Remove { target, .. }
            | Command::Despawn { target } => {
                if let Target::Pending(pending) = target {
                    shift(pending);
                }
            }
        }
    }
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::Instantiate { template, slot } => f
                .debug_struct("Instantiate")
                .field("template", template)
                .field("slot", slot)
                .finish(),
            Command::Spawn { builder, slot } => f
                .debug_struct("Spawn")
                .field("builder", builder)
                .field("slot", slot)
                .finish(),
            Command::Insert { target, value } => f
                .debug_struct("Insert")
                .field("target", target)
                .field("component", &value.component_name())
                .finish(),
            Command::Remove { target, component } => f
                .debug_struct("Remove")
                .field("target", target)
                .field("component", &component_name(*component))
                .finish(),
            Command::Despawn { target } => {
                f.debug_struct("Despawn").field("target", target).finish()
            }
        }
    }
}

/// Per-system command buffer.
#[derive(Default, Debug)]
pub struct Commands {
    early: Vec<Command>,
    late: Vec<Command>,
    next_pending: u32,
}

impl Commands {
    pub fn new() -> Self {
        Self::default()
    }

    fn lane_mut(&mut self, lane: Lane) -> &mut Vec<Command> {
        match lane {
            Lane::Early => &mut self.early,
            Lane::Late => &mut self.late,
        }
    }

    fn next_slot(&mut self) -> PendingEntity {
        let slot = PendingEntity(self.next_pending);
        self.next_pending += 1;
        slot
    }

    /// Create an entity from a template when `lane` is flushed.
    pub fn instantiate(&mut self, lane: Lane, template: TemplateId) -> PendingEntity {
        let slot = self.next_slot();
        self.lane_mut(lane).push(Command::Instantiate { template, slot });
        slot
    }

    pub fn spawn(&mut self, lane: Lane, builder: EntityBuilder) -> PendingEntity {
        let slot = self.next_slot();
        self.lane_mut(lane).push(Command::Spawn { builder, slot });
        slot
    }

    /// Set a component value. A pending target must be created earlier in
    /// the same lane.
    pub fn insert<T: Component + Clone>(&mut self, lane: Lane, target: impl Into<Target>, value: T) {
        let target = target.into();
        self.lane_mut(lane).push(Command::Insert {
            target,
            value: boxed_value(value, true),
        });
    }

    pub fn remove<T: Component>(&mut self, lane: Lane, target: impl Into<Target>) {
        T::ensure_registered();
        let target = target.into();
        self.lane_mut(lane).push(Command::Remove {
            target,
            component: T::ID,
        });
    }

    pub fn despawn(&mut self, lane: Lane, target: impl Into<Target>) {
        let target = target.into();
        self.lane_mut(lane).push(Command::Despawn { target });
    }

    pub fn len(&self) -> usize {
        self.early.len() + self.late.len()
    }

    pub fn is_empty(&self) -> bool {
        self.early.is_empty() && self.late.is_empty()
    }

    pub fn pending(&self, lane: Lane) -> &[Command] {
        match lane {
            Lane::Early => &self.early,
            Lane::Late => &self.late,
        }
    }
}

/// A command together with its global enqueue position.
#[derive(Debug)]
pub struct QueuedCommand {
    pub sequence: u64,
    pub command: Command,
}

/// Outcome of replaying one lane.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FlushReport {
    pub applied: usize,
    pub skipped: usize,
    pub created: usize,
    pub destroyed: usize,
}

/// Append-only log of structural mutations, replayed lane by lane.
#[derive(Default, Debug)]
pub struct DeferredQueue {
    early: Vec<QueuedCommand>,
    late: Vec<QueuedCommand>,
    next_sequence: u64,
    next_pending: u32,
}

impl DeferredQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Move a system's buffer into the queue, preserving its order.
    pub fn append(&mut self, commands: Commands) {
        let offset = self.next_pending;
        self.next_pending += commands.next_pending;
        for (lane, list) in [(Lane::Early, commands.early), (Lane::Late, commands.late)] {
            for mut command in list {
                command.rebase(offset);
                let sequence = self.next_sequence;
                self.next_sequence += 1;
                let queued = QueuedCommand { sequence, command };
                match lane {
                    Lane::Early => self.early.push(queued),
                    Lane::Late => self.late.push(queued),
                }
            }
        }
    }

    pub fn pending(&self, lane: Lane) -> &[QueuedCommand] {
        match lane {
            Lane::Early => &self.early,
            Lane::Late => &self.late,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.early.is_empty() && self.late.is_empty()
    }

    /// Replay every command in `lane` in enqueue order.
    ///
    /// Commands naming a destroyed entity, an unknown template or a pending
    /// entity created outside this flush are caller bugs: `Strict` returns
    /// the first one as an error, `BestEffort` logs and skips it.
    ///
    /// On a `Strict` error the commands already applied stay applied, the
    /// failing one is dropped and the rest are put back on the lane untried.
    /// Pending entities created earlier in that flush are not resolved by a
    /// later retry.
    pub fn flush(
        &mut self,
        lane: Lane,
        world: &mut World,
        templates: &dyn TemplateSource,
        policy: InvariantPolicy,
    ) -> Result<FlushReport, StoreError> {
        let commands = match lane {
            Lane::Early => std::mem::take(&mut self.early),
            Lane::Late => std::mem::take(&mut self.late),
        };

        let mut report = FlushReport::default();
        let mut created: HashMap<PendingEntity, Entity> = HashMap::new();
        let mut remaining = commands.into_iter();

        while let Some(QueuedCommand { sequence, command }) = remaining.next() {
            let kind = command.kind();
            match apply(command, world, templates, &mut created, &mut report) {
                Ok(()) => report.applied += 1,
                Err(err) if policy.is_strict() => {
                    let untried: Vec<QueuedCommand> = remaining.collect();
                    debug!(?lane, sequence, untried = untried.len(), "strict flush stopped");
                    match lane {
                        Lane::Early => self.early = untried,
                        Lane::Late => self.late = untried,
                    }
                    return Err(err);
                }
                Err(err) => {
                    warn!(?lane, sequence, ?kind, error = %err, "skipping deferred command");
                    report.skipped += 1;
                }
            }
        }

        if self.is_empty() {
            self.next_pending = 0;
        }
        trace!(?lane, ?report, "flushed deferred commands");
        Ok(report)
    }
}

fn resolve(
    target: Target,
    world: &World,
    created: &HashMap<PendingEntity, Entity>,
) -> Result<Entity, StoreError> {
    let entity = match target {
        Target::Live(entity) => entity,
        Target::Pending(pending) => *created
            .get(&pending)
            .ok_or(StoreError::UnresolvedPending { pending: pending.0 })?,
    };
    if world.contains(entity) {
        Ok(entity)
    } else {
        Err(StoreError::StaleEntity { entity })
    }
}

fn apply(
    command: Command,
    world: &mut World,
    templates: &dyn TemplateSource,
    created: &mut HashMap<PendingEntity, Entity>,
    report: &mut FlushReport,
) -> Result<(), StoreError> {
    match command {
        Command::Instantiate { template, slot } => {
            let entity = templates.instantiate(template, world)?;
            created.insert(slot, entity);
            report.created += 1;
        }
        Command::Spawn { builder, slot } => {
            created.insert(slot, world.spawn(&builder));
            report.created += 1;
        }
        Command::Insert { target, value } => {
            let entity = resolve(target, world, created)?;
            value.insert_into(world, entity);
        }
        Command::Remove { target, component } => {
            let entity = resolve(target, world, created)?;
            world.remove_by_id(entity, component)?;
        }
        Command::Despawn { target } => {
            let entity = resolve(target, world, created)?;
            world.despawn(entity);
            report.destroyed += 1;
        }
    }
    Ok(())
}
