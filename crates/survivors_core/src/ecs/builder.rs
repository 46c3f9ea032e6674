use crate::ecs::{Component, ComponentId, Entity, World};
use std::fmt;

/// A component value that can be attached to an entity later: by
/// [`World::spawn`], by a template instantiation, or by a queued insert.
pub trait ComponentValue: Send + Sync {
    fn component_id(&self) -> ComponentId;
    fn component_name(&self) -> &'static str;
    /// Attach a copy of the value. The entity must be alive.
    fn insert_into(&self, world: &mut World, entity: Entity);
    fn boxed_clone(&self) -> Box<dyn ComponentValue>;
}

struct Slot<T> {
    value: T,
    enabled: bool,
}

impl<T: Component + Clone> ComponentValue for Slot<T> {
    fn component_id(&self) -> ComponentId {
        T::ID
    }

    fn component_name(&self) -> &'static str {
        T::NAME
    }

    fn insert_into(&self, world: &mut World, entity: Entity) {
        world
            .table_mut::<T>()
            .insert(entity, self.value.clone(), self.enabled);
    }

    fn boxed_clone(&self) -> Box<dyn ComponentValue> {
        Box::new(Slot {
            value: self.value.clone(),
            enabled: self.enabled,
        })
    }
}

/// Box a component value for deferred insertion.
pub(crate) fn boxed_value<T: Component + Clone>(value: T, enabled: bool) -> Box<dyn ComponentValue> {
    Box::new(Slot { value, enabled })
}

/// Builder for entity blueprints; doubles as the template ("prefab") format.
#[derive(Default)]
pub struct EntityBuilder {
    components: Vec<Box<dyn ComponentValue>>,
}

impl EntityBuilder {
    /// Create a new empty builder.
    pub fn new() -> Self {
        Self {
            components: Vec::new(),
        }
    }

    /// Add a component with its enable bit set. Adding the same component
    /// twice keeps the last value.
    pub fn with<T: Component + Clone>(self, value: T) -> Self {
        self.with_state(value, true)
    }

    /// Add an enableable component that starts disabled.
    pub fn with_disabled<T: Component + Clone>(self, value: T) -> Self {
        self.with_state(value, false)
    }

    pub fn with_state<T: Component + Clone>(mut self, value: T, enabled: bool) -> Self {
        self.components.retain(|existing| existing.component_id() != T::ID);
        self.components.push(boxed_value(value, enabled));
        self
    }

    pub fn contains(&self, component: ComponentId) -> bool {
        self.components
            .iter()
            .any(|value| value.component_id() == component)
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    pub(crate) fn values(&self) -> &[Box<dyn ComponentValue>] {
        &self.components
    }
}

impl Clone for EntityBuilder {
    fn clone(&self) -> Self {
        Self {
            components: self.components.iter().map(|value| value.boxed_clone()).collect(),
        }
    }
}

impl fmt::Debug for EntityBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.components.iter().map(|value| value.component_name()))
            .finish()
    }
}
