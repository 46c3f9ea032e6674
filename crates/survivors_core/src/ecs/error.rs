use crate::ecs::Entity;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Kind of table access a system requested.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Access {
    Read,
    Write,
}

impl fmt::Display for Access {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Access::Read => f.write_str("read"),
            Access::Write => f.write_str("write"),
        }
    }
}

/// Errors raised by the entity/component store and the deferred queue.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("component '{component}' is not registered with the world")]
    Unregistered { component: &'static str },

    #[error("entity {entity} is not alive")]
    StaleEntity { entity: Entity },

    #[error("component '{component}' is already borrowed; {access} access refused")]
    BorrowConflict {
        component: &'static str,
        access: Access,
    },

    #[error("system '{system}' did not declare {access} access to '{component}'")]
    UndeclaredAccess {
        system: String,
        component: String,
        access: Access,
    },

    #[error("queued command refers to pending entity #{pending} created outside this flush")]
    UnresolvedPending { pending: u32 },

    #[error("template #{template} is not known to the template source")]
    UnknownTemplate { template: u32 },

    #[error("table lock for '{component}' was poisoned by a panicking system")]
    Poisoned { component: &'static str },
}

/// Failure of a single system's tick contribution.
#[derive(Debug, Error)]
pub enum SystemError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("invariant violated: {0}")]
    Invariant(String),
}

/// How invariant violations are treated.
///
/// `Strict` fails fast with a diagnostic; `BestEffort` logs and skips the
/// offending contribution so the rest of the tick still runs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvariantPolicy {
    Strict,
    BestEffort,
}

impl InvariantPolicy {
    #[inline]
    pub fn is_strict(self) -> bool {
        matches!(self, InvariantPolicy::Strict)
    }
}

impl Default for InvariantPolicy {
    fn default() -> Self {
        if cfg!(debug_assertions) {
            InvariantPolicy::Strict
        } else {
            InvariantPolicy::BestEffort
        }
    }
}
