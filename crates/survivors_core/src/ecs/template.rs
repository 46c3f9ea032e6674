// template.rs - Named entity blueprints ("prefabs")
//
// Templates are authored once at scene load and instantiated many times by
// queued commands. Identities stay stable for the lifetime of the library.

use crate::ecs::{Entity, EntityBuilder, StoreError, World};
use std::collections::HashMap;
use std::fmt;

/// Stable handle to a registered template.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TemplateId(u32);

impl TemplateId {
    #[inline]
    pub fn index(self) -> u32 {
        self.0
    }
}

impl fmt::Display for TemplateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "template#{}", self.0)
    }
}

/// Anything that can turn a template id into a live entity.
pub trait TemplateSource: Send + Sync {
    fn instantiate(&self, template: TemplateId, world: &mut World) -> Result<Entity, StoreError>;
}

#[derive(Clone, Debug, Default)]
pub struct TemplateLibrary {
    templates: Vec<(String, EntityBuilder)>,
    by_name: HashMap<String, TemplateId>,
}

impl TemplateLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a blueprint under `name`. Registering a name twice replaces
    /// the blueprint but keeps its id.
    pub fn register(&mut self, name: impl Into<String>, builder: EntityBuilder) -> TemplateId {
        let name = name.into();
        if let Some(&id) = self.by_name.get(&name) {
            self.templates[id.0 as usize].1 = builder;
            return id;
        }
        let id = TemplateId(self.templates.len() as u32);
        self.by_name.insert(name.clone(), id);
        self.templates.push((name, builder));
        id
    }

    pub fn get(&self, template: TemplateId) -> Option<&EntityBuilder> {
        self.templates.get(template.0 as usize).map(|(_, builder)| builder)
    }

    pub fn find(&self, name: &str) -> Option<TemplateId> {
        self.by_name.get(name).copied()
    }

    pub fn name(&self, template: TemplateId) -> Option<&str> {
        self.templates
            .get(template.0 as usize)
            .map(|(name, _)| name.as_str())
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}

impl TemplateSource for TemplateLibrary {
    fn instantiate(&self, template: TemplateId, world: &mut World) -> Result<Entity, StoreError> {
        let builder = self.get(template).ok_or(StoreError::UnknownTemplate {
            template: template.0,
        })?;
        Ok(world.spawn(builder))
    }
}
