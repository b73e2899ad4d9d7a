//! Scenario files: a YAML description of roles, users, explicit settings,
//! and policy attachments, from which the CLI builds a working engine.

use anyhow::{anyhow, Context, Result};
use authz::{EngineConfig, EngineContext, MergePreference};
use options::OptionMap;
use policy::MemoryPolicies;
use serde::Deserialize;
use settings::{MemorySettings, SettingsStore};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use subject::{Principal, PrincipalInfo, RoleInfo, RoleRegistry, StaticCapabilities};

#[derive(Debug, Deserialize)]
pub struct Scenario {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub config: EngineConfig,
    #[serde(default)]
    pub roles: Vec<RoleInfo>,
    #[serde(default)]
    pub capabilities: Vec<String>,
    #[serde(default)]
    pub users: Vec<UserSpec>,
    #[serde(default)]
    pub settings: Vec<SettingSpec>,
    #[serde(default)]
    pub policies: Vec<PolicySpec>,
}

#[derive(Debug, Deserialize)]
pub struct UserSpec {
    pub id: u64,
    #[serde(default)]
    pub roles: Vec<String>,
    #[serde(default)]
    pub capabilities: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct SettingSpec {
    /// Principal key, e.g. `role:editor`, `user:1`, `visitor`, `default`.
    pub principal: String,
    /// Object shorthand, e.g. `post:42`.
    pub object: String,
    pub options: OptionMap,
}

#[derive(Debug, Deserialize)]
pub struct PolicySpec {
    pub id: String,
    #[serde(default)]
    pub attach_to: Vec<String>,
    /// Path to a policy JSON file, relative to the scenario file.
    #[serde(default)]
    pub file: Option<String>,
    /// Inline policy document.
    #[serde(default)]
    pub document: Option<serde_json::Value>,
}

/// A scenario turned into live engine collaborators.
pub struct LoadedScenario {
    pub name: Option<String>,
    pub context: Arc<EngineContext>,
    /// Load-time identity snapshots, keyed by user id.
    users: HashMap<u64, PrincipalInfo>,
}

impl LoadedScenario {
    /// Resolve a principal spec against the scenario's user snapshots.
    pub fn principal(&self, spec: &str) -> Result<Principal> {
        let parsed = Principal::parse_key(spec)
            .map_err(|e| anyhow!("{} (expected visitor, default, user:<id>, or role:<slug>)", e))?;

        if let Principal::User { id, .. } = parsed {
            let roles = self
                .users
                .get(&id)
                .map(|info| info.roles.clone())
                .unwrap_or_default();
            return Ok(Principal::user(id, roles));
        }
        Ok(parsed)
    }
}

/// Load and assemble a scenario file. A merge preference given on the
/// command line overrides the scenario's own.
pub fn load(path: &Path, preference: Option<MergePreference>) -> Result<LoadedScenario> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read scenario file {:?}", path))?;
    let mut scenario: Scenario =
        serde_yaml::from_str(&raw).with_context(|| format!("Failed to parse {:?}", path))?;
    if let Some(preference) = preference {
        scenario.config.merge_preference = preference;
    }
    let base_dir = path.parent().unwrap_or_else(|| Path::new("."));

    let mut registry = RoleRegistry::new();
    for role in &scenario.roles {
        registry.define(role.slug.clone(), role.level);
    }

    let mut capabilities = StaticCapabilities::with_builtin_actions();
    for name in &scenario.capabilities {
        capabilities.insert(name.clone());
    }

    let store = MemorySettings::new();
    for spec in &scenario.settings {
        let (kind, id) = spec
            .object
            .split_once(':')
            .ok_or_else(|| anyhow!("Invalid object spec '{}' (expected kind:id)", spec.object))?;
        store
            .write(&spec.principal, kind, id, spec.options.clone())
            .with_context(|| format!("Failed to store settings for '{}'", spec.principal))?;
    }

    let mut policies = MemoryPolicies::new();
    for spec in &scenario.policies {
        let raw = match (&spec.file, &spec.document) {
            (Some(file), None) => {
                let policy_path = base_dir.join(file);
                std::fs::read_to_string(&policy_path)
                    .with_context(|| format!("Failed to read policy file {:?}", policy_path))?
            }
            (None, Some(document)) => serde_json::to_string(document)?,
            _ => {
                return Err(anyhow!(
                    "Policy '{}' needs exactly one of 'file' or 'document'",
                    spec.id
                ))
            }
        };
        policies.insert_document(spec.id.clone(), raw);
        for target in &spec.attach_to {
            policies.attach(target.clone(), spec.id.clone());
        }
    }

    let context = EngineContext::new(
        Arc::new(store),
        Arc::new(policies),
        registry,
        scenario.config,
    )
    .with_capabilities(Arc::new(capabilities));

    let users = scenario
        .users
        .iter()
        .map(|u| {
            let principal = Principal::user(u.id, u.roles.clone());
            (u.id, PrincipalInfo::of(&principal, u.capabilities.clone()))
        })
        .collect();

    Ok(LoadedScenario {
        name: scenario.name,
        context: Arc::new(context),
        users,
    })
}
