//! Engine context: every collaborator a resolution pipeline needs, owned
//! explicitly and passed around, never held in statics.

use crate::extension::Extension;
use crate::merge::MergePreference;
use decision_cache::SharedCache;
use policy::PolicyProvider;
use serde::{Deserialize, Serialize};
use settings::SettingsStore;
use std::sync::Arc;
use subject::{
    CapabilityDirectory, HierarchyConfig, HierarchyResolver, RoleRegistry, StaticCapabilities,
};

/// Engine switches, loaded once from host configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub merge_preference: MergePreference,
    #[serde(flatten)]
    pub hierarchy: HierarchyConfig,
}

/// The collaborators and configuration one engine instance works with.
///
/// Constructed per process (or per request when the host snapshots its
/// stores per request) and shared behind an `Arc`.
pub struct EngineContext {
    settings: Arc<dyn SettingsStore>,
    policies: Arc<dyn PolicyProvider>,
    capabilities: Arc<dyn CapabilityDirectory>,
    hierarchy: HierarchyResolver,
    config: EngineConfig,
    extensions: Vec<Arc<dyn Extension>>,
    shared_cache: Arc<SharedCache>,
}

impl EngineContext {
    pub fn new(
        settings: Arc<dyn SettingsStore>,
        policies: Arc<dyn PolicyProvider>,
        registry: RoleRegistry,
        config: EngineConfig,
    ) -> Self {
        Self {
            settings,
            policies,
            capabilities: Arc::new(StaticCapabilities::with_builtin_actions()),
            hierarchy: HierarchyResolver::new(registry, config.hierarchy),
            config,
            extensions: Vec::new(),
            shared_cache: Arc::new(SharedCache::new()),
        }
    }

    /// Replace the built-in capability directory with the host's.
    pub fn with_capabilities(mut self, capabilities: Arc<dyn CapabilityDirectory>) -> Self {
        self.capabilities = capabilities;
        self
    }

    /// Register an extension; registration order is consultation order.
    pub fn with_extension(mut self, extension: Arc<dyn Extension>) -> Self {
        self.extensions.push(extension);
        self
    }

    pub fn settings(&self) -> &dyn SettingsStore {
        self.settings.as_ref()
    }

    pub fn policies(&self) -> &dyn PolicyProvider {
        self.policies.as_ref()
    }

    pub fn capabilities(&self) -> &dyn CapabilityDirectory {
        self.capabilities.as_ref()
    }

    pub fn hierarchy(&self) -> &HierarchyResolver {
        &self.hierarchy
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn extensions(&self) -> &[Arc<dyn Extension>] {
        &self.extensions
    }

    pub fn shared_cache(&self) -> &Arc<SharedCache> {
        &self.shared_cache
    }
}
