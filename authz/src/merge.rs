//! Combining option maps from multiple sources.
//!
//! Used when a single query has several effective sources for the same
//! setting key: a user's sibling roles, or several attached policy
//! documents. The preference decides which side of a conflict wins; inputs
//! are consulted in a stable caller-defined order, so the outcome is
//! deterministic in O(sources × keys).

use options::{OptionMap, OptionValue};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// The configurable rule for resolving conflicting values.
///
/// `apply` and `deprive` are the long-standing operator-facing names for
/// the restrictive and permissive rules; they behave like `deny` and
/// `allow`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MergePreference {
    #[default]
    Deny,
    Allow,
    Apply,
    Deprive,
}

impl MergePreference {
    /// Parse an operator-supplied name, case-insensitively.
    pub fn parse(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "deny" => Some(MergePreference::Deny),
            "allow" => Some(MergePreference::Allow),
            "apply" => Some(MergePreference::Apply),
            "deprive" => Some(MergePreference::Deprive),
            _ => None,
        }
    }

    /// Whether the first restrictive value wins (otherwise the first
    /// permissive one does).
    fn restrictive_wins(&self) -> bool {
        matches!(self, MergePreference::Deny | MergePreference::Apply)
    }
}

/// Merge option maps into a single deterministic winner per key.
///
/// For each key in the union: under a restrictive preference the first
/// input with a restrictive value wins immediately; under a permissive
/// preference the first permissive value does. When no input is decisive,
/// the first input defining the key at all supplies the value.
pub fn merge(maps: &[OptionMap], preference: MergePreference) -> OptionMap {
    let restrictive_wins = preference.restrictive_wins();

    let keys: HashSet<&String> = maps.iter().flat_map(|m| m.keys()).collect();
    let mut merged = OptionMap::with_capacity(keys.len());

    for key in keys {
        let decisive = maps
            .iter()
            .find_map(|m| m.get(key).filter(|v| v.is_restrictive() == restrictive_wins));
        let winner = decisive.or_else(|| maps.iter().find_map(|m| m.get(key)));
        if let Some(value) = winner {
            merged.insert(key.clone(), value.clone());
        }
    }

    merged
}
