//! Settings store boundary.
//!
//! Explicit per-object settings live in the host platform's key-value
//! storage; its blob format is opaque here. The engine only needs option
//! maps keyed by `(principal, object kind, object id)` plus nested
//! option-path access. [`MemorySettings`] is the in-process reference
//! implementation backing tests and the operator CLI.

pub mod error;

pub use error::{Result, SettingsError};

use options::{delete_path as delete_option_path, get_path, set_path, OptionMap, OptionValue};
use parking_lot::RwLock;
use std::collections::HashMap;
use tracing::debug;

/// Read/write access to explicit option maps, keyed by principal and object.
pub trait SettingsStore: Send + Sync {
    /// The explicit option map one principal holds for one object, if any.
    fn read(&self, principal_key: &str, kind: &str, object_id: &str) -> Option<OptionMap>;

    /// Replace the principal's explicit option map for one object.
    fn write(
        &self,
        principal_key: &str,
        kind: &str,
        object_id: &str,
        map: OptionMap,
    ) -> Result<()>;

    /// Drop the principal's explicit option map for one object. Returns
    /// whether anything was stored.
    fn delete(&self, principal_key: &str, kind: &str, object_id: &str) -> Result<bool>;

    /// Read a single nested option by dotted path.
    fn read_path(
        &self,
        principal_key: &str,
        kind: &str,
        object_id: &str,
        path: &str,
    ) -> Option<OptionValue> {
        self.read(principal_key, kind, object_id)
            .and_then(|map| get_path(&map, path).cloned())
    }

    /// Write a single nested option by dotted path, creating the map when
    /// the principal had none for this object.
    fn write_path(
        &self,
        principal_key: &str,
        kind: &str,
        object_id: &str,
        path: &str,
        value: OptionValue,
    ) -> Result<()> {
        let mut map = self
            .read(principal_key, kind, object_id)
            .unwrap_or_default();
        set_path(&mut map, path, value)?;
        self.write(principal_key, kind, object_id, map)
    }

    /// Delete a single nested option by dotted path. Returns whether
    /// anything was removed.
    fn delete_path(
        &self,
        principal_key: &str,
        kind: &str,
        object_id: &str,
        path: &str,
    ) -> Result<bool> {
        let Some(mut map) = self.read(principal_key, kind, object_id) else {
            return Ok(false);
        };
        let removed = delete_option_path(&mut map, path);
        if removed {
            self.write(principal_key, kind, object_id, map)?;
        }
        Ok(removed)
    }
}

type ObjectKey = (String, String, String);

/// In-memory settings store.
///
/// Reads share the lock; a write holds it only for the one map swap, which
/// keeps concurrent readers from blocking past a single entry update.
#[derive(Debug, Default)]
pub struct MemorySettings {
    maps: RwLock<HashMap<ObjectKey, OptionMap>>,
}

impl MemorySettings {
    pub fn new() -> Self {
        Self::default()
    }

    fn key(principal_key: &str, kind: &str, object_id: &str) -> ObjectKey {
        (
            principal_key.to_string(),
            kind.to_string(),
            object_id.to_string(),
        )
    }

    /// Number of stored option maps, across all principals.
    pub fn len(&self) -> usize {
        self.maps.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.maps.read().is_empty()
    }
}

impl SettingsStore for MemorySettings {
    fn read(&self, principal_key: &str, kind: &str, object_id: &str) -> Option<OptionMap> {
        self.maps
            .read()
            .get(&Self::key(principal_key, kind, object_id))
            .cloned()
    }

    fn write(
        &self,
        principal_key: &str,
        kind: &str,
        object_id: &str,
        map: OptionMap,
    ) -> Result<()> {
        debug!(
            "Storing {} option(s) for {} on {}:{}",
            map.len(),
            principal_key,
            kind,
            object_id
        );
        self.maps
            .write()
            .insert(Self::key(principal_key, kind, object_id), map);
        Ok(())
    }

    fn delete(&self, principal_key: &str, kind: &str, object_id: &str) -> Result<bool> {
        let removed = self
            .maps
            .write()
            .remove(&Self::key(principal_key, kind, object_id))
            .is_some();
        Ok(removed)
    }
}
