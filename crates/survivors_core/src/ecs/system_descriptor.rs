use crate::ecs::ComponentId;

/// Metadata describing how a system interacts with the ECS world.
///
/// `reads` and `writes` are the access declarations the scheduler uses to
/// place systems in waves. `requires` lists components that must exist on at
/// least one entity for the system to run at all.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SystemDescriptor {
    name: String,
    reads: Vec<ComponentId>,
    writes: Vec<ComponentId>,
    requires: Vec<ComponentId>,
    components: Vec<ComponentId>,
}

impl SystemDescriptor {
    /// Create a new descriptor with the provided name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            reads: Vec::new(),
            writes: Vec::new(),
            requires: Vec::new(),
            components: Vec::new(),
        }
    }

    /// Replace the read-only component set for this system.
    pub fn reads<I>(mut self, components: I) -> Self
    where
        I: IntoIterator<Item = ComponentId>,
    {
        self.reads = Self::sanitize(components);
        self.rebuild_components();
        self
    }

    /// Replace the write component set for this system.
    pub fn writes<I>(mut self, components: I) -> Self
    where
        I: IntoIterator<Item = ComponentId>,
    {
        self.writes = Self::sanitize(components);
        self.rebuild_components();
        self
    }

    /// Components that must be present somewhere in the world.
    pub fn requires<I>(mut self, components: I) -> Self
    where
        I: IntoIterator<Item = ComponentId>,
    {
        self.requires = Self::sanitize(components);
        self
    }

    /// Unique system name.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn read_components(&self) -> &[ComponentId] {
        &self.reads
    }

    pub fn write_components(&self) -> &[ComponentId] {
        &self.writes
    }

    pub fn required_components(&self) -> &[ComponentId] {
        &self.requires
    }

    /// Union of read and write component ids.
    pub fn all_components(&self) -> &[ComponentId] {
        &self.components
    }

    /// Whether the descriptor touches any components at all.
    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    /// Shared access is granted by either a read or a write declaration.
    pub fn may_read(&self, component: ComponentId) -> bool {
        self.components.binary_search(&component).is_ok()
    }

    pub fn may_write(&self, component: ComponentId) -> bool {
        self.writes.binary_search(&component).is_ok()
    }

    /// Two systems conflict when one writes a component the other touches.
    pub fn conflicts_with(&self, other: &SystemDescriptor) -> bool {
        self.writes.iter().any(|&c| other.may_read(c))
            || other.writes.iter().any(|&c| self.may_read(c))
    }

    fn rebuild_components(&mut self) {
        self.reads = Self::sanitize(std::mem::take(&mut self.reads));
        self.writes = Self::sanitize(std::mem::take(&mut self.writes));
        self.components.clear();
        self.components.extend(&self.reads);
        self.components.extend(&self.writes);
        self.components.sort_unstable();
        self.components.dedup();
    }

    fn sanitize<I>(components: I) -> Vec<ComponentId>
    where
        I: IntoIterator<Item = ComponentId>,
    {
        let mut list: Vec<ComponentId> = components.into_iter().collect();
        list.sort_unstable();
        list.dedup();
        list
    }
}
