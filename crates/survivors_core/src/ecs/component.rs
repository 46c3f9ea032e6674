// component.rs - Runtime component registration
//
// Components are identified by u32 IDs, not Rust TypeIds, so access
// declarations, diagnostics and queued removals can name a component
// without carrying its type.

use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::mem::{align_of, size_of};
use std::sync::{PoisonError, RwLock};

pub type ComponentId = u32;

/// Metadata describing a component type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ComponentMeta {
    pub id: ComponentId,
    pub name: &'static str,
    pub size: usize,
    pub align: usize,
}

/// Global registry of component metadata.
static REGISTRY: Lazy<RwLock<HashMap<ComponentId, ComponentMeta>>> =
    Lazy::new(|| RwLock::new(HashMap::new()));

/// Register a component's metadata.
///
/// Re-registration with the same id must describe the same type.
pub fn register_component(meta: ComponentMeta) {
    let mut map = REGISTRY.write().unwrap_or_else(PoisonError::into_inner);
    if let Some(prev) = map.insert(meta.id, meta.clone()) {
        assert_eq!(
            (prev.name, prev.size, prev.align),
            (meta.name, meta.size, meta.align),
            "component id {} registered twice with different types",
            meta.id
        );
    }
}

/// Look up component metadata by ID.
pub fn meta_of(id: ComponentId) -> Option<ComponentMeta> {
    REGISTRY
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .get(&id)
        .cloned()
}

/// Human-readable name for a component id, falling back to the raw id.
pub fn component_name(id: ComponentId) -> String {
    meta_of(id)
        .map(|meta| meta.name.to_string())
        .unwrap_or_else(|| format!("#{id}"))
}

/// Trait for component types stored in the world.
///
/// Implementors must be `Send + Sync` so tables can be read from parallel
/// query bodies.
pub trait Component: 'static + Sized + Send + Sync {
    /// Globally unique component ID.
    const ID: ComponentId;

    /// Human-readable name for debugging.
    const NAME: &'static str;

    /// Register this component's metadata with the global registry.
    fn ensure_registered() {
        register_component(ComponentMeta {
            id: Self::ID,
            name: Self::NAME,
            size: size_of::<Self>(),
            align: align_of::<Self>(),
        });
    }
}

/// Helper macro to implement Component trait.
///
/// # Example
/// ```ignore
/// #[derive(Clone, Copy)]
/// struct MoveSpeed(f32);
///
/// define_component!(MoveSpeed, 2, "MoveSpeed");
/// ```
#[macro_export]
macro_rules! define_component {
    ($ty:ty, $id:expr, $name:expr) => {
        impl $crate::ecs::Component for $ty {
            const ID: $crate::ecs::ComponentId = $id;
            const NAME: &'static str = $name;
        }
    };
}
