//! Ancestor chain and sibling-role resolution.
//!
//! Chains are short and fixed in shape: a user inherits from its primary
//! role, roles and visitors inherit from the default principal, and the
//! default principal is terminal. A deleted role degrades to a synthetic
//! orphan that owns nothing, so resolution keeps working.

use crate::Principal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::warn;

/// One known role: slug plus its privilege level (higher is more
/// privileged).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoleInfo {
    pub slug: String,
    #[serde(default)]
    pub level: u32,
}

/// The set of roles the host platform knows about, loaded once.
#[derive(Debug, Clone, Default)]
pub struct RoleRegistry {
    roles: HashMap<String, RoleInfo>,
}

impl RoleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn define(&mut self, slug: impl Into<String>, level: u32) {
        let slug = slug.into();
        self.roles.insert(
            slug.clone(),
            RoleInfo {
                slug,
                level,
            },
        );
    }

    pub fn contains(&self, slug: &str) -> bool {
        self.roles.contains_key(slug)
    }

    pub fn level(&self, slug: &str) -> Option<u32> {
        self.roles.get(slug).map(|r| r.level)
    }

    pub fn len(&self) -> usize {
        self.roles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.roles.is_empty()
    }
}

/// Hierarchy switches, loaded with the engine configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HierarchyConfig {
    /// When set, a multi-role user inherits through its highest-level role
    /// instead of the first assigned one.
    #[serde(default)]
    pub multi_access_levels: bool,
}

/// Resolves ancestor chains and sibling roles for principals.
#[derive(Debug, Clone, Default)]
pub struct HierarchyResolver {
    registry: RoleRegistry,
    config: HierarchyConfig,
}

impl HierarchyResolver {
    pub fn new(registry: RoleRegistry, config: HierarchyConfig) -> Self {
        Self { registry, config }
    }

    pub fn registry(&self) -> &RoleRegistry {
        &self.registry
    }

    /// The ordered chain `[principal, parent, ..., default]`.
    ///
    /// Never fails: a user whose role was deleted gets the synthetic orphan
    /// principal in the role position, and the walk continues to default.
    pub fn ancestors(&self, principal: &Principal) -> Vec<Principal> {
        match principal {
            Principal::Default => vec![Principal::Default],
            Principal::Visitor => vec![Principal::Visitor, Principal::Default],
            Principal::Orphan => vec![Principal::Orphan, Principal::Default],
            // Roles do not chain to other roles.
            Principal::Role { .. } => vec![principal.clone(), Principal::Default],
            Principal::User { roles, .. } => {
                let mut chain = vec![principal.clone()];
                match self.inheritance_role(roles) {
                    Some(slug) => chain.push(Principal::role(slug)),
                    None if !roles.is_empty() => {
                        // Every assigned role is gone.
                        chain.push(Principal::Orphan);
                    }
                    None => {}
                }
                chain.push(Principal::Default);
                chain
            }
        }
    }

    /// Secondary roles of a multi-role user, consulted during merge but
    /// never part of the ancestor chain. Deleted roles are dropped.
    pub fn siblings(&self, principal: &Principal) -> Vec<Principal> {
        let Principal::User { roles, .. } = principal else {
            return vec![];
        };
        let primary = self.inheritance_role(roles);

        roles
            .iter()
            .filter(|slug| Some(slug.as_str()) != primary)
            .filter(|slug| {
                if self.registry.contains(slug) {
                    true
                } else {
                    warn!(
                        "Sibling role '{}' of {} no longer exists, ignoring",
                        slug, principal
                    );
                    false
                }
            })
            .map(Principal::role)
            .collect()
    }

    /// The role slug the user inherits through, if any assigned role still
    /// exists.
    fn inheritance_role<'a>(&self, roles: &'a [String]) -> Option<&'a str> {
        if roles.is_empty() {
            return None;
        }

        if self.config.multi_access_levels {
            let highest = roles
                .iter()
                .filter(|slug| self.registry.contains(slug))
                .max_by_key(|slug| self.registry.level(slug).unwrap_or(0))
                .map(String::as_str);
            if highest.is_none() {
                warn!("No assigned role exists any more, degrading to orphan");
            }
            return highest;
        }

        let primary = &roles[0];
        if self.registry.contains(primary) {
            Some(primary)
        } else {
            warn!("Role '{}' no longer exists, degrading to orphan", primary);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn resolver(multi_access_levels: bool) -> HierarchyResolver {
        let mut registry = RoleRegistry::new();
        registry.define("administrator", 10);
        registry.define("editor", 7);
        registry.define("author", 2);
        HierarchyResolver::new(registry, HierarchyConfig { multi_access_levels })
    }

    fn keys(chain: &[Principal]) -> Vec<String> {
        chain.iter().map(Principal::key).collect()
    }

    #[rstest]
    #[case(Principal::Default, vec!["default"])]
    #[case(Principal::visitor(), vec!["visitor", "default"])]
    #[case(Principal::role("editor"), vec!["role:editor", "default"])]
    #[case(Principal::role("deleted"), vec!["role:deleted", "default"])]
    fn test_simple_chains(#[case] principal: Principal, #[case] expected: Vec<&str>) {
        let resolver = resolver(false);
        assert_eq!(keys(&resolver.ancestors(&principal)), expected);
    }

    #[test]
    fn test_user_chains_through_primary_role() {
        let resolver = resolver(false);
        let user = Principal::user(5, vec!["author".to_string(), "editor".to_string()]);
        assert_eq!(
            keys(&resolver.ancestors(&user)),
            vec!["user:5", "role:author", "default"]
        );
    }

    #[test]
    fn test_multi_access_levels_picks_highest_role() {
        let resolver = resolver(true);
        let user = Principal::user(5, vec!["author".to_string(), "editor".to_string()]);
        assert_eq!(
            keys(&resolver.ancestors(&user)),
            vec!["user:5", "role:editor", "default"]
        );
    }

    #[test]
    fn test_deleted_role_degrades_to_orphan() {
        let resolver = resolver(false);
        let user = Principal::user(5, vec!["deleted".to_string()]);
        assert_eq!(
            keys(&resolver.ancestors(&user)),
            vec!["user:5", "orphan", "default"]
        );
    }

    #[test]
    fn test_roleless_user_skips_role_layer() {
        let resolver = resolver(false);
        let user = Principal::user(5, vec![]);
        assert_eq!(keys(&resolver.ancestors(&user)), vec!["user:5", "default"]);
    }

    #[test]
    fn test_siblings_exclude_primary_and_deleted() {
        let resolver = resolver(false);
        let user = Principal::user(
            5,
            vec![
                "editor".to_string(),
                "author".to_string(),
                "deleted".to_string(),
            ],
        );
        assert_eq!(keys(&resolver.siblings(&user)), vec!["role:author"]);
    }

    #[test]
    fn test_siblings_with_multi_access_levels() {
        let resolver = resolver(true);
        let user = Principal::user(5, vec!["author".to_string(), "editor".to_string()]);
        // editor is the inheritance role, so author becomes the sibling.
        assert_eq!(keys(&resolver.siblings(&user)), vec!["role:author"]);
    }

    #[test]
    fn test_non_users_have_no_siblings() {
        let resolver = resolver(false);
        assert!(resolver.siblings(&Principal::visitor()).is_empty());
        assert!(resolver.siblings(&Principal::role("editor")).is_empty());
    }
}
