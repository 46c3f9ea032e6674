// table.rs - Dense per-component storage with enable bits
//
// Values are packed tightly (one row per entity holding the component) so
// query bodies iterate contiguous memory and rayon can split the rows across
// worker threads. A sparse `rows` index keyed by entity index gives O(1)
// random-access lookups.

use crate::ecs::{Access, Component, Entity, StoreError};
use rayon::prelude::*;
use std::any::Any;
use std::ops::{Deref, DerefMut};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard, TryLockError};

/// Storage for every instance of one component type.
pub struct Table<T> {
    entities: Vec<Entity>,
    values: Vec<T>,
    enabled: Vec<bool>,
    rows: Vec<Option<u32>>,
}

/// Mutable view of one row, including its enable bit.
pub struct RowMut<'a, T> {
    pub entity: Entity,
    pub value: &'a mut T,
    pub enabled: &'a mut bool,
}

impl<T> Table<T> {
    pub fn new() -> Self {
        Self {
            entities: Vec::new(),
            values: Vec::new(),
            enabled: Vec::new(),
            rows: Vec::new(),
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    #[inline]
    fn row(&self, entity: Entity) -> Option<usize> {
        let row = (*self.rows.get(entity.index() as usize)?)? as usize;
        (self.entities[row] == entity).then_some(row)
    }

    /// Whether the entity holds this component (enabled or not).
    #[inline]
    pub fn contains(&self, entity: Entity) -> bool {
        self.row(entity).is_some()
    }

    pub fn get(&self, entity: Entity) -> Option<&T> {
        self.row(entity).map(|row| &self.values[row])
    }

    pub fn get_mut(&mut self, entity: Entity) -> Option<&mut T> {
        self.row(entity).map(move |row| &mut self.values[row])
    }

    /// Enable bit of the entity's component; `false` when absent.
    pub fn is_enabled(&self, entity: Entity) -> bool {
        self.row(entity).is_some_and(|row| self.enabled[row])
    }

    /// Toggle the enable bit in place. Returns `false` if the entity does not
    /// hold the component.
    pub fn set_enabled(&mut self, entity: Entity, enabled: bool) -> bool {
        match self.row(entity) {
            Some(row) => {
                self.enabled[row] = enabled;
                true
            }
            None => false,
        }
    }

    /// Insert or overwrite the entity's value, returning the previous one.
    pub fn insert(&mut self, entity: Entity, value: T, enabled: bool) -> Option<T> {
        if let Some(row) = self.row(entity) {
            self.enabled[row] = enabled;
            return Some(std::mem::replace(&mut self.values[row], value));
        }
        let slot = entity.index() as usize;
        if self.rows.len() <= slot {
            self.rows.resize(slot + 1, None);
        }
        self.rows[slot] = Some(self.values.len() as u32);
        self.entities.push(entity);
        self.values.push(value);
        self.enabled.push(enabled);
        None
    }

    /// Remove via swap-remove, fixing up the index of the row that moved.
    pub fn remove(&mut self, entity: Entity) -> Option<T> {
        let row = self.row(entity)?;
        self.rows[entity.index() as usize] = None;
        self.entities.swap_remove(row);
        self.enabled.swap_remove(row);
        let value = self.values.swap_remove(row);
        if let Some(moved) = self.entities.get(row) {
            self.rows[moved.index() as usize] = Some(row as u32);
        }
        Some(value)
    }

    #[inline]
    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    pub fn iter(&self) -> impl Iterator<Item = (Entity, &T)> {
        self.entities.iter().copied().zip(self.values.iter())
    }

    /// Rows whose enable bit is set.
    pub fn iter_enabled(&self) -> impl Iterator<Item = (Entity, &T)> {
        self.iter()
            .zip(self.enabled.iter())
            .filter_map(|(row, &enabled)| enabled.then_some(row))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (Entity, &mut T)> {
        self.entities.iter().copied().zip(self.values.iter_mut())
    }

    pub fn rows_mut(&mut self) -> impl Iterator<Item = RowMut<'_, T>> {
        self.entities
            .iter()
            .zip(self.values.iter_mut())
            .zip(self.enabled.iter_mut())
            .map(|((entity, value), enabled)| RowMut {
                entity: *entity,
                value,
                enabled,
            })
    }

    pub fn par_iter(&self) -> impl IndexedParallelIterator<Item = (Entity, &T)>
    where
        T: Sync,
    {
        self.entities.par_iter().copied().zip(self.values.par_iter())
    }

    pub fn par_iter_mut(&mut self) -> impl IndexedParallelIterator<Item = (Entity, &mut T)>
    where
        T: Send,
    {
        self.entities.par_iter().copied().zip(self.values.par_iter_mut())
    }

    pub fn par_rows_mut(&mut self) -> impl IndexedParallelIterator<Item = RowMut<'_, T>>
    where
        T: Send,
    {
        self.entities
            .par_iter()
            .zip(self.values.par_iter_mut())
            .zip(self.enabled.par_iter_mut())
            .map(|((entity, value), enabled)| RowMut {
                entity: *entity,
                value,
                enabled,
            })
    }
}

impl<T> Default for Table<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Shared borrow of a component table ("read-only lookup").
pub struct TableRef<'w, T> {
    guard: RwLockReadGuard<'w, Table<T>>,
}

impl<T> Deref for TableRef<'_, T> {
    type Target = Table<T>;

    fn deref(&self) -> &Table<T> {
        &self.guard
    }
}

/// Exclusive borrow of a component table ("read-write lookup").
pub struct TableMut<'w, T> {
    guard: RwLockWriteGuard<'w, Table<T>>,
}

impl<T> Deref for TableMut<'_, T> {
    type Target = Table<T>;

    fn deref(&self) -> &Table<T> {
        &self.guard
    }
}

impl<T> DerefMut for TableMut<'_, T> {
    fn deref_mut(&mut self) -> &mut Table<T> {
        &mut self.guard
    }
}

/// Lock wrapper that lets the world hold tables of different types.
pub(crate) struct TableCell<T> {
    lock: RwLock<Table<T>>,
}

impl<T: Component> TableCell<T> {
    pub fn new() -> Self {
        Self {
            lock: RwLock::new(Table::new()),
        }
    }

    pub fn read(&self) -> Result<TableRef<'_, T>, StoreError> {
        match self.lock.try_read() {
            Ok(guard) => Ok(TableRef { guard }),
            Err(TryLockError::WouldBlock) => Err(StoreError::BorrowConflict {
                component: T::NAME,
                access: Access::Read,
            }),
            Err(TryLockError::Poisoned(_)) => Err(StoreError::Poisoned { component: T::NAME }),
        }
    }

    pub fn write(&self) -> Result<TableMut<'_, T>, StoreError> {
        match self.lock.try_write() {
            Ok(guard) => Ok(TableMut { guard }),
            Err(TryLockError::WouldBlock) => Err(StoreError::BorrowConflict {
                component: T::NAME,
                access: Access::Write,
            }),
            Err(TryLockError::Poisoned(_)) => Err(StoreError::Poisoned { component: T::NAME }),
        }
    }

    /// Unlocked access; `&mut self` already proves exclusivity.
    pub fn table_mut(&mut self) -> &mut Table<T> {
        self.lock.get_mut().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Type-erased operations the world needs without knowing `T`.
pub(crate) trait ErasedTable: Send + Sync {
    fn name(&self) -> &'static str;
    fn remove_entity(&mut self, entity: Entity) -> bool;
    fn contains_entity(&self, entity: Entity) -> Result<bool, StoreError>;
    fn entity_snapshot(&self) -> Result<Vec<Entity>, StoreError>;
    fn row_count(&self) -> Result<usize, StoreError>;
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Component> ErasedTable for TableCell<T> {
    fn name(&self) -> &'static str {
        T::NAME
    }

    fn remove_entity(&mut self, entity: Entity) -> bool {
        self.table_mut().remove(entity).is_some()
    }

    fn contains_entity(&self, entity: Entity) -> Result<bool, StoreError> {
        Ok(self.read()?.contains(entity))
    }

    fn entity_snapshot(&self) -> Result<Vec<Entity>, StoreError> {
        Ok(self.read()?.entities().to_vec())
    }

    fn row_count(&self) -> Result<usize, StoreError> {
        Ok(self.read()?.len())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
