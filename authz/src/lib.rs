//! Access-control resolution engine.
//!
//! Given a principal (visitor, authenticated user, or role) and a protected
//! resource/action pair, the engine decides allow/deny by combining three
//! sources and caching the result:
//!
//! 1. **Explicit settings** attached directly to the principal for the
//!    object, read from the settings store.
//! 2. **Inherited settings** walked up the subject hierarchy
//!    (user → role → default), nearest ancestor first.
//! 3. **Policy statements** from JSON documents attached to the principal
//!    and its ancestors, matched through wildcard resource patterns and
//!    translated into option keys.
//!
//! The resolution flow for one query:
//!
//! 1. The host asks [`AccessEngine::is_denied`] for a principal, object,
//!    and action.
//! 2. The decision cache answers repeated queries within the request and,
//!    via generation stamps, across requests.
//! 3. On a miss, the [`aggregator::Aggregator`] merges the three sources in
//!    precedence order.
//! 4. The action is translated to its option key and the resolved value's
//!    restrictiveness is the answer.
//!
//! The query surface is total: parsing failures, deleted roles, and unknown
//! object kinds degrade toward the permissive default and are reported on
//! the diagnostics channel, never to the caller. Nothing here performs I/O
//! beyond the injected settings store and policy provider.

pub mod aggregator;
pub mod context;
pub mod error;
pub mod extension;
pub mod mapping;
pub mod merge;
pub mod types;

pub use aggregator::Aggregator;
pub use context::{EngineConfig, EngineContext};
pub use error::{EngineError, Result};
pub use extension::Extension;
pub use merge::{merge, MergePreference};
pub use types::{RedirectKind, RedirectSpec};

use decision_cache::DecisionCache;
use options::{OptionMap, OptionValue, ResolvedMap};
use resource::ObjectRef;
use std::collections::HashMap;
use std::sync::Arc;
use subject::Principal;

/// The authorization query facade; the only surface surrounding features
/// are expected to call.
pub struct AccessEngine {
    ctx: Arc<EngineContext>,
    cache: DecisionCache,
}

impl AccessEngine {
    /// Build an engine over a context. Each engine carries a fresh
    /// request-scoped cache layer; the shared layer lives in the context.
    pub fn new(ctx: Arc<EngineContext>) -> Self {
        let cache = DecisionCache::new(ctx.shared_cache().clone());
        Self { ctx, cache }
    }

    pub fn context(&self) -> &EngineContext {
        &self.ctx
    }

    /// Whether the resolved settings restrict this action on this object.
    ///
    /// Total: unknown kinds, unknown actions, and missing settings all
    /// answer `false` (nothing restricts).
    pub fn is_denied(&self, principal: &Principal, object: &ObjectRef, action: &str) -> bool {
        let resolved = self.resolve(principal, object);
        let key = mapping::decision_key(&object.kind, action);
        resolved
            .value(key)
            .map(OptionValue::is_restrictive)
            .unwrap_or(false)
    }

    /// The structured redirect attached to a restricted object, if any.
    pub fn get_redirect(&self, principal: &Principal, object: &ObjectRef) -> Option<RedirectSpec> {
        let resolved = self.resolve(principal, object);
        resolved
            .value("redirect")
            .and_then(RedirectSpec::from_value)
    }

    /// Redirect configured through policy params for a host area (`login`,
    /// `logout`, `frontend`), assembled from `redirect.<area>.*` keys.
    pub fn get_param_redirect(&self, principal: &Principal, area: &str) -> Option<RedirectSpec> {
        let index = Aggregator::new(&self.ctx).combined_index(principal);
        let params = index.find_params(&format!("^redirect\\.{}\\.", area));
        if params.is_empty() {
            return None;
        }

        let mut fields: HashMap<String, OptionValue> = params
            .into_iter()
            .filter_map(|(key, value)| {
                key.rsplit('.')
                    .next()
                    .map(|field| (field.to_string(), value))
            })
            .collect();
        fields.insert("enabled".to_string(), OptionValue::Bool(true));

        RedirectSpec::from_value(&OptionValue::Map(fields))
    }

    /// The resolved option map with provenance stripped; for UI and export.
    pub fn get_effective_settings(&self, principal: &Principal, object: &ObjectRef) -> OptionMap {
        self.resolve(principal, object).to_options()
    }

    /// The resolved entries including `effect_source` and `overwritten`
    /// marks.
    pub fn get_resolved(&self, principal: &Principal, object: &ObjectRef) -> ResolvedMap {
        self.resolve(principal, object)
    }

    /// Persist a principal's explicit option map for one object and stale
    /// every cached decision that depends on it.
    pub fn save_settings(
        &self,
        principal: &Principal,
        object: &ObjectRef,
        map: OptionMap,
    ) -> Result<()> {
        self.ctx
            .settings()
            .write(&principal.key(), object.kind.name(), &object.id, map)?;
        self.cache.invalidate(&principal.key());
        Ok(())
    }

    /// Drop a principal's explicit option map for one object.
    pub fn clear_settings(&self, principal: &Principal, object: &ObjectRef) -> Result<bool> {
        let removed = self
            .ctx
            .settings()
            .delete(&principal.key(), object.kind.name(), &object.id)?;
        if removed {
            self.cache.invalidate(&principal.key());
        }
        Ok(removed)
    }

    /// Stale every cached decision depending on this principal (call after
    /// any out-of-band settings or policy mutation).
    pub fn invalidate(&self, principal: &Principal) {
        self.cache.invalidate(&principal.key());
    }

    pub fn invalidate_all(&self) {
        self.cache.invalidate_all();
    }

    fn resolve(&self, principal: &Principal, object: &ObjectRef) -> ResolvedMap {
        let aggregator = Aggregator::new(&self.ctx);
        let dependencies = aggregator.source_keys(principal);
        self.cache
            .get_or_compute(&dependencies, object.kind.name(), &object.id, || {
                aggregator.resolve(principal, object)
            })
    }
}
