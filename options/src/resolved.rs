use crate::value::{OptionMap, OptionValue};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Where a resolved value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EffectSource {
    /// Set directly on the queried principal for this object.
    Explicit,
    /// Pulled from an ancestor's option map during the inheritance walk.
    Inherited,
    /// Derived from a policy statement.
    Policy,
}

/// The resolved output for one `(principal, kind, id, key)`.
///
/// `overwritten` marks that an explicit setting existed before inheritance or
/// policy was applied, so the explicit value holds for this key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedEntry {
    pub value: OptionValue,
    pub source: EffectSource,
    pub overwritten: bool,
}

impl ResolvedEntry {
    pub fn explicit(value: OptionValue) -> Self {
        Self {
            value,
            source: EffectSource::Explicit,
            overwritten: true,
        }
    }

    pub fn inherited(value: OptionValue) -> Self {
        Self {
            value,
            source: EffectSource::Inherited,
            overwritten: false,
        }
    }

    pub fn policy(value: OptionValue) -> Self {
        Self {
            value,
            source: EffectSource::Policy,
            overwritten: false,
        }
    }
}

/// The fully aggregated option map for one `(principal, kind, id)`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResolvedMap {
    entries: HashMap<String, ResolvedEntry>,
}

impl ResolvedMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&ResolvedEntry> {
        self.entries.get(key)
    }

    pub fn value(&self, key: &str) -> Option<&OptionValue> {
        self.entries.get(key).map(|e| &e.value)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Whether the key was set explicitly on the queried principal.
    pub fn is_overwritten(&self, key: &str) -> bool {
        self.entries.get(key).map(|e| e.overwritten).unwrap_or(false)
    }

    pub fn insert(&mut self, key: impl Into<String>, entry: ResolvedEntry) {
        self.entries.insert(key.into(), entry);
    }

    /// Insert only when the key is not yet resolved. Returns whether the
    /// entry was stored.
    pub fn insert_if_absent(&mut self, key: impl Into<String>, entry: ResolvedEntry) -> bool {
        let key = key.into();
        if self.entries.contains_key(&key) {
            return false;
        }
        self.entries.insert(key, entry);
        true
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &ResolvedEntry)> {
        self.entries.iter()
    }

    /// Strip provenance and return the plain option map.
    pub fn to_options(&self) -> OptionMap {
        self.entries
            .iter()
            .map(|(k, e)| (k.clone(), e.value.clone()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_if_absent_keeps_first_entry() {
        let mut map = ResolvedMap::new();
        assert!(map.insert_if_absent("hidden", ResolvedEntry::explicit(OptionValue::Bool(true))));
        assert!(!map.insert_if_absent("hidden", ResolvedEntry::policy(OptionValue::Bool(false))));

        let entry = map.get("hidden").unwrap();
        assert_eq!(entry.source, EffectSource::Explicit);
        assert_eq!(entry.value, OptionValue::Bool(true));
        assert!(map.is_overwritten("hidden"));
    }

    #[test]
    fn test_to_options_strips_provenance() {
        let mut map = ResolvedMap::new();
        map.insert("hidden", ResolvedEntry::inherited(OptionValue::Bool(true)));
        map.insert("limit", ResolvedEntry::policy(OptionValue::Int(3)));

        let plain = map.to_options();
        assert_eq!(plain.get("hidden"), Some(&OptionValue::Bool(true)));
        assert_eq!(plain.get("limit"), Some(&OptionValue::Int(3)));
    }
}
