use crate::ecs::{SystemDescriptor, SystemHandle, SystemRegistrationError};
use std::collections::HashMap;

/// Descriptors of every system in a schedule, in declaration order, grouped
/// into waves of mutually non-conflicting systems.
///
/// A system lands one wave after the latest earlier system it conflicts
/// with, so two systems that both touch a component with at least one write
/// always run in declaration order.
pub(crate) struct SystemRegistry {
    systems: Vec<RegisteredSystem>,
    name_lookup: HashMap<String, SystemHandle>,
    waves: Vec<Vec<SystemHandle>>,
}

impl SystemRegistry {
    pub fn new() -> Self {
        Self {
            systems: Vec::new(),
            name_lookup: HashMap::new(),
            waves: Vec::new(),
        }
    }

    pub fn register(
        &mut self,
        descriptor: SystemDescriptor,
    ) -> Result<SystemHandle, SystemRegistrationError> {
        if descriptor.is_empty() {
            return Err(SystemRegistrationError::EmptyAccess {
                name: descriptor.name().to_string(),
            });
        }

        let name_key = descriptor.name().to_string();
        if self.name_lookup.contains_key(&name_key) {
            return Err(SystemRegistrationError::DuplicateName { name: name_key });
        }

        let wave = self
            .systems
            .iter()
            .filter(|existing| existing.descriptor.conflicts_with(&descriptor))
            .map(|existing| existing.wave + 1)
            .max()
            .unwrap_or(0);

        let handle = SystemHandle::new(self.systems.len() as u32);
        if self.waves.len() <= wave {
            self.waves.resize_with(wave + 1, Vec::new);
        }
        self.waves[wave].push(handle);

        self.name_lookup.insert(name_key, handle);
        self.systems.push(RegisteredSystem {
            descriptor,
            wave,
        });

        Ok(handle)
    }

    pub fn descriptor(&self, handle: SystemHandle) -> Option<&SystemDescriptor> {
        self.systems
            .get(handle.index() as usize)
            .map(|system| &system.descriptor)
    }

    pub fn lookup(&self, name: &str) -> Option<SystemHandle> {
        self.name_lookup.get(name).copied()
    }

    pub fn waves(&self) -> &[Vec<SystemHandle>] {
        &self.waves
    }

    pub fn len(&self) -> usize {
        self.systems.len()
    }
}

struct RegisteredSystem {
    descriptor: SystemDescriptor,
    wave: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty_and_duplicate_systems() {
        let mut registry = SystemRegistry::new();
        assert_eq!(
            registry.register(SystemDescriptor::new("idle")),
            Err(SystemRegistrationError::EmptyAccess { name: "idle".into() })
        );
        registry
            .register(SystemDescriptor::new("move").writes([1]))
            .unwrap();
        assert_eq!(
            registry.register(SystemDescriptor::new("move").reads([2])),
            Err(SystemRegistrationError::DuplicateName { name: "move".into() })
        );
    }

    #[test]
    fn conflicting_writers_are_ordered_into_later_waves() {
        let mut registry = SystemRegistry::new();
        let a = registry.register(SystemDescriptor::new("a").writes([1])).unwrap();
        let b = registry.register(SystemDescriptor::new("b").reads([2])).unwrap();
        let c = registry.register(SystemDescriptor::new("c").reads([1]).writes([3])).unwrap();
        let d = registry.register(SystemDescriptor::new("d").writes([1])).unwrap();

        assert_eq!(registry.waves(), &[vec![a, b], vec![c], vec![d]]);
        assert_eq!(registry.lookup("c"), Some(c));
        assert_eq!(registry.len(), 4);
    }
}
