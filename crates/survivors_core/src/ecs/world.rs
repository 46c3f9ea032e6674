// world.rs - Entity/component store

use crate::ecs::entity::EntityAllocator;
use crate::ecs::table::{ErasedTable, TableCell};
use crate::ecs::{
    Component, ComponentId, Entity, EntityBuilder, QueryFilter, StoreError, Table, TableMut,
    TableRef,
};
use std::collections::HashMap;

/// The main ECS world containing all entities and components.
///
/// Tables are created by [`register`](World::register) (or implicitly on
/// first insert). Component reads and writes during a tick go through
/// [`read`](World::read) / [`write`](World::write), which borrow `&self` and
/// lock one table each. Everything that changes table membership takes
/// `&mut self`, so it cannot run while any such borrow is alive.
pub struct World {
    entities: EntityAllocator,
    tables: HashMap<ComponentId, Box<dyn ErasedTable>>,
}

impl World {
    /// Create a new empty world.
    pub fn new() -> Self {
        Self {
            entities: EntityAllocator::default(),
            tables: HashMap::new(),
        }
    }

    /// Create the table for `T` if it does not exist yet.
    pub fn register<T: Component>(&mut self) -> &mut Self {
        self.table_mut::<T>();
        self
    }

    pub fn is_registered<T: Component>(&self) -> bool {
        self.tables.contains_key(&T::ID)
    }

    fn table_cell<T: Component>(&self) -> Result<&TableCell<T>, StoreError> {
        self.tables
            .get(&T::ID)
            .and_then(|table| table.as_any().downcast_ref::<TableCell<T>>())
            .ok_or(StoreError::Unregistered { component: T::NAME })
    }

    pub(crate) fn table_mut<T: Component>(&mut self) -> &mut Table<T> {
        let erased = self.tables.entry(T::ID).or_insert_with(|| {
            T::ensure_registered();
            Box::new(TableCell::<T>::new())
        });
        assert!(
            erased.as_any().is::<TableCell<T>>(),
            "component id {} is shared by '{}' and '{}'",
            T::ID,
            erased.name(),
            T::NAME
        );
        match erased.as_any_mut().downcast_mut::<TableCell<T>>() {
            Some(cell) => cell.table_mut(),
            None => unreachable!("table type checked above"),
        }
    }

    /// Spawn an entity with no components.
    pub fn spawn_empty(&mut self) -> Entity {
        self.entities.alloc()
    }

    /// Spawn an entity from a builder (the builder is left intact so
    /// templates can be instantiated repeatedly).
    pub fn spawn(&mut self, builder: &EntityBuilder) -> Entity {
        let entity = self.entities.alloc();
        for value in builder.values() {
            value.insert_into(self, entity);
        }
        entity
    }

    /// Destroy an entity and drop all of its components.
    ///
    /// The index is not reused until [`recycle_retired`](World::recycle_retired).
    pub fn despawn(&mut self, entity: Entity) -> bool {
        if !self.entities.free(entity) {
            return false;
        }
        for table in self.tables.values_mut() {
            table.remove_entity(entity);
        }
        true
    }

    #[inline]
    pub fn contains(&self, entity: Entity) -> bool {
        self.entities.is_alive(entity)
    }

    /// Number of live entities.
    pub fn entity_count(&self) -> usize {
        self.entities.live()
    }

    /// Release identities destroyed since the previous call. Called once per
    /// tick boundary by the simulation driver.
    pub fn recycle_retired(&mut self) -> usize {
        self.entities.recycle()
    }

    /// Attach (or overwrite) a component with its enable bit set.
    pub fn insert<T: Component>(&mut self, entity: Entity, value: T) -> Result<Option<T>, StoreError> {
        self.insert_with_state(entity, value, true)
    }

    /// Attach (or overwrite) a component with an explicit enable bit.
    pub fn insert_with_state<T: Component>(
        &mut self,
        entity: Entity,
        value: T,
        enabled: bool,
    ) -> Result<Option<T>, StoreError> {
        if !self.contains(entity) {
            return Err(StoreError::StaleEntity { entity });
        }
        Ok(self.table_mut::<T>().insert(entity, value, enabled))
    }

    pub fn remove<T: Component>(&mut self, entity: Entity) -> Result<Option<T>, StoreError> {
        if !self.contains(entity) {
            return Err(StoreError::StaleEntity { entity });
        }
        Ok(self.table_mut::<T>().remove(entity))
    }

    /// Remove a component by id. Returns whether anything was removed.
    pub fn remove_by_id(&mut self, entity: Entity, component: ComponentId) -> Result<bool, StoreError> {
        if !self.contains(entity) {
            return Err(StoreError::StaleEntity { entity });
        }
        Ok(self
            .tables
            .get_mut(&component)
            .is_some_and(|table| table.remove_entity(entity)))
    }

    /// Mutable random access outside of a tick (setup, tests).
    pub fn get_mut<T: Component>(&mut self, entity: Entity) -> Option<&mut T> {
        let erased = self.tables.get_mut(&T::ID)?;
        erased
            .as_any_mut()
            .downcast_mut::<TableCell<T>>()?
            .table_mut()
            .get_mut(entity)
    }

    /// Copy of an entity's component, if present and the table is not
    /// exclusively borrowed.
    pub fn get_cloned<T: Component + Clone>(&self, entity: Entity) -> Option<T> {
        self.read::<T>().ok()?.get(entity).cloned()
    }

    pub fn has<T: Component>(&self, entity: Entity) -> bool {
        self.read::<T>().is_ok_and(|table| table.contains(entity))
    }

    pub fn is_enabled<T: Component>(&self, entity: Entity) -> bool {
        self.read::<T>().is_ok_and(|table| table.is_enabled(entity))
    }

    pub fn set_enabled<T: Component>(&mut self, entity: Entity, enabled: bool) -> bool {
        self.table_mut::<T>().set_enabled(entity, enabled)
    }

    /// Shared, read-only borrow of a component table.
    pub fn read<T: Component>(&self) -> Result<TableRef<'_, T>, StoreError> {
        self.table_cell::<T>()?.read()
    }

    /// Exclusive, read-write borrow of a component table. Enable bits may be
    /// toggled through it; membership may not.
    pub fn write<T: Component>(&self) -> Result<TableMut<'_, T>, StoreError> {
        self.table_cell::<T>()?.write()
    }

    /// Whether at least one live entity holds the component.
    pub fn has_any(&self, component: ComponentId) -> Result<bool, StoreError> {
        match self.tables.get(&component) {
            Some(table) => Ok(table.row_count()? > 0),
            None => Ok(false),
        }
    }

    /// All entities holding every `with` component and none of the
    /// `without` components.
    pub fn query(&self, filter: &QueryFilter) -> Result<Vec<Entity>, StoreError> {
        let Some((&first, rest)) = filter.with_ids().split_first() else {
            return Ok(Vec::new());
        };
        let Some(seed) = self.tables.get(&first) else {
            return Ok(Vec::new());
        };

        let mut matches = Vec::new();
        'candidates: for entity in seed.entity_snapshot()? {
            for id in rest {
                match self.tables.get(id) {
                    Some(table) if table.contains_entity(entity)? => {}
                    _ => continue 'candidates,
                }
            }
            for id in filter.without_ids() {
                if let Some(table) = self.tables.get(id) {
                    if table.contains_entity(entity)? {
                        continue 'candidates;
                    }
                }
            }
            matches.push(entity);
        }
        Ok(matches)
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}
