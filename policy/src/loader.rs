//! Loading policy documents and building statement indexes.
//!
//! Documents come from a [`PolicyProvider`] collaborator (the content layer
//! of the host platform); the loader resolves parent/inclusion chains with a
//! visited set, appends parent statements after their children (lower
//! priority), skips unparseable documents, and reports every degradation
//! without failing the request.

use crate::document::PolicyDocument;
use crate::error::PolicyError;
use crate::index::StatementIndex;
use std::collections::{HashMap, HashSet};
use tracing::{debug, warn};

/// Hands the loader raw policy JSON, by attachment and by document id.
pub trait PolicyProvider: Send + Sync {
    /// Raw JSON for one document.
    fn document(&self, id: &str) -> Option<String>;

    /// Ids of the documents attached to a principal, in attachment order.
    fn attachments(&self, principal_key: &str) -> Vec<String>;
}

/// In-memory provider backing tests and the operator CLI.
#[derive(Debug, Default)]
pub struct MemoryPolicies {
    documents: HashMap<String, String>,
    attachments: HashMap<String, Vec<String>>,
}

impl MemoryPolicies {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_document(&mut self, id: impl Into<String>, raw: impl Into<String>) {
        self.documents.insert(id.into(), raw.into());
    }

    pub fn attach(&mut self, principal_key: impl Into<String>, document_id: impl Into<String>) {
        self.attachments
            .entry(principal_key.into())
            .or_default()
            .push(document_id.into());
    }
}

impl PolicyProvider for MemoryPolicies {
    fn document(&self, id: &str) -> Option<String> {
        self.documents.get(id).cloned()
    }

    fn attachments(&self, principal_key: &str) -> Vec<String> {
        self.attachments
            .get(principal_key)
            .cloned()
            .unwrap_or_default()
    }
}

/// A built index plus every degradation hit while building it.
#[derive(Debug, Default)]
pub struct IndexOutcome {
    pub index: StatementIndex,
    pub diagnostics: Vec<PolicyError>,
}

pub struct PolicyLoader<'a> {
    provider: &'a dyn PolicyProvider,
}

impl<'a> PolicyLoader<'a> {
    pub fn new(provider: &'a dyn PolicyProvider) -> Self {
        Self { provider }
    }

    /// One combined index over every document attached to the principal.
    pub fn index_for(&self, principal_key: &str) -> IndexOutcome {
        let mut outcome = IndexOutcome::default();
        let mut chain = Vec::new();
        let mut merged = HashSet::new();
        for id in self.provider.attachments(principal_key) {
            self.include(&id, &mut chain, &mut merged, &mut outcome);
        }
        debug!(
            "Built statement index for '{}': {} statements",
            principal_key,
            outcome.index.len()
        );
        outcome
    }

    /// One index per attached document chain, in attachment order. The merge
    /// rules treat each chain as a separate source.
    pub fn source_indexes(&self, principal_key: &str) -> Vec<IndexOutcome> {
        self.provider
            .attachments(principal_key)
            .iter()
            .map(|id| {
                let mut outcome = IndexOutcome::default();
                let mut chain = Vec::new();
                let mut merged = HashSet::new();
                self.include(id, &mut chain, &mut merged, &mut outcome);
                outcome
            })
            .collect()
    }

    fn include(
        &self,
        id: &str,
        chain: &mut Vec<String>,
        merged: &mut HashSet<String>,
        outcome: &mut IndexOutcome,
    ) {
        // A repeat on the current parent chain is a cycle; a repeat from a
        // sibling attachment just means the document is already merged.
        if chain.iter().any(|c| c == id) {
            warn!("Policy inheritance cycle detected at '{}', link ignored", id);
            outcome.diagnostics.push(PolicyError::Cycle(id.to_string()));
            return;
        }
        if !merged.insert(id.to_string()) {
            debug!("Policy document '{}' already merged, skipping repeat", id);
            return;
        }

        let Some(raw) = self.provider.document(id) else {
            warn!("Policy document '{}' is not available, skipping", id);
            outcome.diagnostics.push(PolicyError::Parse(format!(
                "Document '{}' is not available",
                id
            )));
            return;
        };

        match PolicyDocument::parse(&raw) {
            Ok(document) => {
                for statement in &document.statements {
                    outcome.index.add(statement);
                }
                outcome.index.add_params(&document.params);

                // Parent statements land after the child's own, as defaults.
                if let Some(parent_id) = &document.parent {
                    chain.push(id.to_string());
                    self.include(parent_id, chain, merged, outcome);
                    chain.pop();
                }
            }
            Err(error) => {
                warn!("Policy document '{}' skipped: {}", id, error);
                outcome.diagnostics.push(error);
            }
        }
    }
}
