//! Resource addressing for the access engine.
//!
//! A protected resource is a typed, identified unit: `(kind, id)`, e.g.
//! `(post, 42)`, `(menu_item, "tools")`, `(route, "users|GET")`. Policy
//! statements address resources through colon-delimited patterns with
//! segment wildcards and alternation groups; the matcher lives in
//! [`matcher`].

pub mod matcher;

use serde::{Deserialize, Serialize};
use std::fmt;

/// The kind of object access is evaluated for.
///
/// `Custom` carries kinds this engine has never heard of; resolution for
/// them degrades to "no restriction" rather than failing.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectKind {
    Post,
    MenuItem,
    Route,
    Uri,
    Redirect,
    Identity,
    Capability,
    Custom(String),
}

impl ObjectKind {
    /// Canonical lowercase name used in resource patterns and settings keys.
    pub fn name(&self) -> &str {
        match self {
            ObjectKind::Post => "post",
            ObjectKind::MenuItem => "menu_item",
            ObjectKind::Route => "route",
            ObjectKind::Uri => "uri",
            ObjectKind::Redirect => "redirect",
            ObjectKind::Identity => "identity",
            ObjectKind::Capability => "capability",
            ObjectKind::Custom(name) => name,
        }
    }

    /// Parse a kind name, case-insensitively. Unknown names become `Custom`.
    pub fn parse(name: &str) -> Self {
        match name.to_ascii_lowercase().as_str() {
            "post" => ObjectKind::Post,
            "menu_item" => ObjectKind::MenuItem,
            "route" => ObjectKind::Route,
            "uri" => ObjectKind::Uri,
            "redirect" => ObjectKind::Redirect,
            "identity" => ObjectKind::Identity,
            "capability" => ObjectKind::Capability,
            other => ObjectKind::Custom(other.to_string()),
        }
    }

    /// Whether this kind is one the engine ships behavior for.
    pub fn is_builtin(&self) -> bool {
        !matches!(self, ObjectKind::Custom(_))
    }
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A typed, identified unit of access control.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ObjectRef {
    pub kind: ObjectKind,
    pub id: String,
}

impl ObjectRef {
    pub fn new(kind: ObjectKind, id: impl Into<String>) -> Self {
        Self {
            kind,
            id: id.into(),
        }
    }

    /// The candidate address this object presents to pattern matching,
    /// with the action appended as the final segment.
    pub fn address(&self, action: &str) -> String {
        format!("{}:{}:{}", self.kind.name(), self.id, action)
    }

    /// Parse `kind:id` shorthand, e.g. `post:42` or `route:users|GET`.
    pub fn parse(spec: &str) -> Option<Self> {
        let (kind, id) = spec.split_once(':')?;
        if kind.is_empty() || id.is_empty() {
            return None;
        }
        Some(Self::new(ObjectKind::parse(kind), id))
    }
}

impl fmt::Display for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind.name(), self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_parse_case_insensitive() {
        assert_eq!(ObjectKind::parse("Post"), ObjectKind::Post);
        assert_eq!(ObjectKind::parse("MENU_ITEM"), ObjectKind::MenuItem);
        assert_eq!(
            ObjectKind::parse("Widget"),
            ObjectKind::Custom("widget".to_string())
        );
    }

    #[test]
    fn test_object_ref_parse() {
        let object = ObjectRef::parse("post:42").unwrap();
        assert_eq!(object.kind, ObjectKind::Post);
        assert_eq!(object.id, "42");

        // Route ids embed the method after a pipe; only the first colon splits.
        let route = ObjectRef::parse("route:users|GET").unwrap();
        assert_eq!(route.id, "users|GET");

        assert!(ObjectRef::parse("no-colon").is_none());
        assert!(ObjectRef::parse(":42").is_none());
    }

    #[test]
    fn test_address_appends_action() {
        let object = ObjectRef::new(ObjectKind::Post, "page");
        assert_eq!(object.address("read"), "post:page:read");
    }
}
