//! Entity Component System core types.
//!
//! Component data lives in one [`Table`] per component type. Each table is
//! guarded by its own reader/writer lock so systems that declared disjoint
//! access can run side by side, while structural changes (spawn, despawn,
//! add/remove component) require `&mut World` and therefore can never
//! interleave with an in-progress query. Mid-tick structural work is recorded
//! into [`Commands`] and replayed by the [`DeferredQueue`] at flush points.

mod builder;
mod command;
mod component;
mod entity;
mod error;
mod query;
mod schedule;
mod system_descriptor;
mod system_handle;
mod system_registration_error;
mod system_registry;
mod table;
mod template;
mod world;

pub use builder::{ComponentValue, EntityBuilder};
pub use command::{
    Command, CommandKind, Commands, DeferredQueue, FlushReport, Lane, PendingEntity,
    QueuedCommand, Target,
};
pub use component::{
    component_name, meta_of, register_component, Component, ComponentId, ComponentMeta,
};
pub use entity::Entity;
pub use error::{Access, InvariantPolicy, StoreError, SystemError};
pub use query::QueryFilter;
pub use schedule::{Schedule, ScheduleError, ScheduleReport, System, SystemContext};
pub use system_descriptor::SystemDescriptor;
pub use system_handle::SystemHandle;
pub use system_registration_error::SystemRegistrationError;
pub(crate) use system_registry::SystemRegistry;
pub use table::{RowMut, Table, TableMut, TableRef};
pub use template::{TemplateId, TemplateLibrary, TemplateSource};
pub use world::World;

/// Spawn an entity into the world using builder-style component construction.
///
/// # Example
/// ```ignore
/// let entity = spawn!(world,
///     MoveSpeed(3.0),
///     CurrentHitPoints(10)
/// );
/// ```
#[macro_export]
macro_rules! spawn {
    ($world:expr $(, $component:expr)+ $(,)?) => {{
        let builder = $crate::ecs::EntityBuilder::new()
            $(.with($component))+;
        $world.spawn(&builder)
    }};
}
