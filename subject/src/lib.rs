//! Principals and the subject inheritance hierarchy.
//!
//! A principal is the entity access is evaluated for: the anonymous visitor,
//! an authenticated user (numeric id plus assigned roles), a role, or the
//! implicit default that roots every chain. Principal data is populated once
//! at load time from the host platform; there is no runtime forwarding to
//! platform user objects.

pub mod capability;
pub mod error;
pub mod hierarchy;

pub use capability::{CapabilityDirectory, StaticCapabilities};
pub use error::{Result, SubjectError};
pub use hierarchy::{HierarchyConfig, HierarchyResolver, RoleInfo, RoleRegistry};

use serde::{Deserialize, Serialize};
use std::fmt;

/// The entity an access decision is evaluated for.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Principal {
    /// Anonymous, unauthenticated traffic.
    Visitor,
    /// An authenticated user. The first role is the primary role; the rest
    /// are sibling roles consulted during merge but not inheritance.
    User { id: u64, roles: Vec<String> },
    /// A role addressed directly (policy attachment, admin tooling).
    Role { slug: String },
    /// Stands in for a role that no longer exists; owns no settings.
    Orphan,
    /// The implicit root every chain ends in.
    Default,
}

impl Principal {
    pub fn visitor() -> Self {
        Principal::Visitor
    }

    pub fn user(id: u64, roles: Vec<String>) -> Self {
        Principal::User { id, roles }
    }

    pub fn role(slug: impl Into<String>) -> Self {
        Principal::Role { slug: slug.into() }
    }

    /// Stable identity used for settings lookups, policy attachments, and
    /// cache keys.
    pub fn key(&self) -> String {
        match self {
            Principal::Visitor => "visitor".to_string(),
            Principal::User { id, .. } => format!("user:{}", id),
            Principal::Role { slug } => format!("role:{}", slug),
            Principal::Orphan => "orphan".to_string(),
            Principal::Default => "default".to_string(),
        }
    }

    /// Parse a bare principal key (`visitor`, `default`, `user:42`,
    /// `role:editor`). Users parsed this way carry no role assignments;
    /// those come from the host's load-time snapshot.
    pub fn parse_key(key: &str) -> Result<Self> {
        match key {
            "visitor" => return Ok(Principal::Visitor),
            "default" => return Ok(Principal::Default),
            _ => {}
        }
        if let Some(id) = key.strip_prefix("user:") {
            let id: u64 = id
                .parse()
                .map_err(|_| SubjectError::InvalidPrincipal(key.to_string()))?;
            return Ok(Principal::User { id, roles: vec![] });
        }
        if let Some(slug) = key.strip_prefix("role:") {
            if slug.is_empty() {
                return Err(SubjectError::InvalidPrincipal(key.to_string()));
            }
            return Ok(Principal::role(slug));
        }
        Err(SubjectError::InvalidPrincipal(key.to_string()))
    }

    /// The user's primary role slug, when there is one.
    pub fn primary_role(&self) -> Option<&str> {
        match self {
            Principal::User { roles, .. } => roles.first().map(String::as_str),
            _ => None,
        }
    }

    pub fn is_default(&self) -> bool {
        matches!(self, Principal::Default)
    }
}

impl fmt::Display for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key())
    }
}

/// Load-time snapshot of who a principal is: identity, roles, and the
/// capabilities the host granted. Replaces per-call forwarding into platform
/// user objects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrincipalInfo {
    pub key: String,
    pub roles: Vec<String>,
    pub capabilities: Vec<String>,
}

impl PrincipalInfo {
    pub fn of(principal: &Principal, capabilities: Vec<String>) -> Self {
        let roles = match principal {
            Principal::User { roles, .. } => roles.clone(),
            Principal::Role { slug } => vec![slug.clone()],
            _ => vec![],
        };
        Self {
            key: principal.key(),
            roles,
            capabilities,
        }
    }

    pub fn has_capability(&self, name: &str) -> bool {
        self.capabilities.iter().any(|c| c == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_principal_keys() {
        assert_eq!(Principal::visitor().key(), "visitor");
        assert_eq!(Principal::user(42, vec![]).key(), "user:42");
        assert_eq!(Principal::role("editor").key(), "role:editor");
        assert_eq!(Principal::Default.key(), "default");
    }

    #[test]
    fn test_parse_key_round_trip() {
        for key in ["visitor", "default", "user:42", "role:editor"] {
            assert_eq!(Principal::parse_key(key).unwrap().key(), key);
        }
    }

    #[test]
    fn test_parse_key_rejects_garbage() {
        assert!(Principal::parse_key("user:abc").is_err());
        assert!(Principal::parse_key("role:").is_err());
        assert!(Principal::parse_key("something").is_err());
    }

    #[test]
    fn test_primary_role() {
        let user = Principal::user(1, vec!["editor".to_string(), "author".to_string()]);
        assert_eq!(user.primary_role(), Some("editor"));
        assert_eq!(Principal::visitor().primary_role(), None);
    }

    #[test]
    fn test_principal_info_snapshot() {
        let user = Principal::user(9, vec!["editor".to_string()]);
        let info = PrincipalInfo::of(&user, vec!["edit_posts".to_string()]);
        assert_eq!(info.key, "user:9");
        assert_eq!(info.roles, vec!["editor"]);
        assert!(info.has_capability("edit_posts"));
        assert!(!info.has_capability("manage_options"));
    }
}
