//! Ordered statement index over one or more policy documents.
//!
//! Multi-resource statements are flattened to one entry per resource pattern.
//! Declaration order is preserved; position in the index carries no priority
//! by itself (the merge rules decide who wins).

use crate::document::{Effect, Param, Statement};
use options::OptionValue;
use regex::Regex;
use resource::matcher;
use std::collections::HashMap;
use tracing::debug;

/// One flattened `(effect, pattern, actions, metadata)` entry.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexedStatement {
    pub effect: Effect,
    pub pattern: String,
    /// Explicitly named actions; empty means the pattern's final segment
    /// carries the action.
    pub actions: Vec<String>,
    pub metadata: HashMap<String, OptionValue>,
}

impl IndexedStatement {
    /// Whether this entry applies to the given concrete address.
    pub fn covers(&self, candidate: &str) -> bool {
        matcher::matches(&self.pattern, candidate)
    }
}

#[derive(Debug, Clone, Default)]
pub struct StatementIndex {
    statements: Vec<IndexedStatement>,
    params: Vec<Param>,
}

impl StatementIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flatten a normalized statement into the index, preserving order.
    pub fn add(&mut self, statement: &Statement) {
        for pattern in &statement.resources {
            self.statements.push(IndexedStatement {
                effect: statement.effect,
                pattern: pattern.clone(),
                actions: statement.actions.clone(),
                metadata: statement.metadata.clone(),
            });
        }
    }

    pub fn add_params(&mut self, params: &[Param]) {
        self.params.extend_from_slice(params);
    }

    /// Append another index's entries and params after this one's.
    pub fn merge_from(&mut self, other: &StatementIndex) {
        self.statements.extend_from_slice(&other.statements);
        self.params.extend_from_slice(&other.params);
    }

    /// All entries whose pattern could address the given object kind, in
    /// declaration order.
    pub fn find(&self, type_name: &str) -> Vec<&IndexedStatement> {
        self.statements
            .iter()
            .filter(|s| matcher::matches_type(&s.pattern, type_name))
            .collect()
    }

    /// Resolve params whose key matches the given regex-style pattern.
    ///
    /// An invalid pattern degrades to exact key comparison. When several
    /// params share a key, the first declaration wins (parents are appended
    /// after their children, so children shadow parent params).
    pub fn find_params(&self, key_pattern: &str) -> HashMap<String, OptionValue> {
        let mut found: HashMap<String, OptionValue> = HashMap::new();

        match Regex::new(key_pattern) {
            Ok(re) => {
                for param in &self.params {
                    if re.is_match(&param.key) {
                        found
                            .entry(param.key.clone())
                            .or_insert_with(|| param.value.clone());
                    }
                }
            }
            Err(_) => {
                debug!(
                    "Param lookup '{}' is not a valid pattern, using exact match",
                    key_pattern
                );
                for param in &self.params {
                    if param.key == key_pattern {
                        found
                            .entry(param.key.clone())
                            .or_insert_with(|| param.value.clone());
                    }
                }
            }
        }

        found
    }

    /// Drop entries the predicate rejects, keeping declaration order.
    pub fn retain<F: FnMut(&IndexedStatement) -> bool>(&mut self, predicate: F) {
        self.statements.retain(predicate);
    }

    pub fn statements(&self) -> &[IndexedStatement] {
        &self.statements
    }

    pub fn params(&self) -> &[Param] {
        &self.params
    }

    pub fn len(&self) -> usize {
        self.statements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }
}
