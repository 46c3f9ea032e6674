use crate::ecs::{Component, ComponentId};

/// Component signature for [`World::query`](crate::ecs::World::query):
/// entities must hold every `with` component and none of the `without` ones.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct QueryFilter {
    with: Vec<ComponentId>,
    without: Vec<ComponentId>,
}

impl QueryFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with<T: Component>(mut self) -> Self {
        if !self.with.contains(&T::ID) {
            self.with.push(T::ID);
        }
        self
    }

    pub fn without<T: Component>(mut self) -> Self {
        if !self.without.contains(&T::ID) {
            self.without.push(T::ID);
        }
        self
    }

    pub fn with_ids(&self) -> &[ComponentId] {
        &self.with
    }

    pub fn without_ids(&self) -> &[ComponentId] {
        &self.without
    }

    /// Every component id the filter inspects.
    pub fn component_ids(&self) -> impl Iterator<Item = ComponentId> + '_ {
        self.with.iter().chain(self.without.iter()).copied()
    }
}
