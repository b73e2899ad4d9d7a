//! Capability directory boundary.
//!
//! The host platform owns the real list of capabilities. The engine only
//! asks one question (does this capability exist) before letting a policy
//! statement grant or restrict it.

use std::collections::HashSet;

pub trait CapabilityDirectory: Send + Sync {
    fn exists(&self, capability: &str) -> bool;
}

/// Fixed capability set loaded once; the reference implementation used by
/// tests and the operator CLI.
#[derive(Debug, Clone, Default)]
pub struct StaticCapabilities {
    names: HashSet<String>,
}

impl StaticCapabilities {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(names: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            names: names.into_iter().map(Into::into).collect(),
        }
    }

    /// Seeded with the actions the engine ships object behavior for, so an
    /// empty host directory does not silently drop every statement.
    pub fn with_builtin_actions() -> Self {
        Self::with([
            "read", "list", "edit", "delete", "publish", "comment", "access",
        ])
    }

    pub fn insert(&mut self, name: impl Into<String>) {
        self.names.insert(name.into());
    }
}

impl CapabilityDirectory for StaticCapabilities {
    fn exists(&self, capability: &str) -> bool {
        self.names.contains(capability)
    }
}
