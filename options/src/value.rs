use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

/// A per-object settings map attached to a single principal.
///
/// Keys are setting names (`hidden`, `restricted`, `redirect`, ...); values
/// are [`OptionValue`]s. Option maps are never shared between principals and
/// are looked up per `(principal, object kind, object id)` triple.
pub type OptionMap = HashMap<String, OptionValue>;

/// A single option value.
///
/// Settings historically accepted a plain scalar, then an array, then a typed
/// object across versions. The variants cover all shapes ever written;
/// [`normalize_map`] migrates the legacy ones into their current structured
/// form once at load, so downstream code never type-sniffs per access.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OptionValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<OptionValue>),
    Map(HashMap<String, OptionValue>),
}

impl OptionValue {
    /// Whether this value signals restriction when read as a decision.
    ///
    /// Structured sub-maps (teaser, password, redirect) carry their decision
    /// in the `enabled` flag.
    pub fn is_restrictive(&self) -> bool {
        match self {
            OptionValue::Bool(b) => *b,
            OptionValue::Int(i) => *i != 0,
            OptionValue::Float(f) => *f != 0.0,
            OptionValue::Str(s) => {
                matches!(s.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on")
            }
            OptionValue::List(l) => !l.is_empty(),
            OptionValue::Map(m) => m
                .get("enabled")
                .map(OptionValue::is_restrictive)
                .unwrap_or(false),
        }
    }

    /// Whether this value signals no restriction.
    pub fn is_permissive(&self) -> bool {
        !self.is_restrictive()
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            OptionValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            OptionValue::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&HashMap<String, OptionValue>> {
        match self {
            OptionValue::Map(m) => Some(m),
            _ => None,
        }
    }

    /// Build a structured sub-map value from key/value pairs.
    pub fn map_of(pairs: Vec<(&str, OptionValue)>) -> Self {
        OptionValue::Map(
            pairs
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect(),
        )
    }
}

impl From<bool> for OptionValue {
    fn from(b: bool) -> Self {
        OptionValue::Bool(b)
    }
}

impl From<i64> for OptionValue {
    fn from(i: i64) -> Self {
        OptionValue::Int(i)
    }
}

impl From<&str> for OptionValue {
    fn from(s: &str) -> Self {
        OptionValue::Str(s.to_string())
    }
}

impl From<String> for OptionValue {
    fn from(s: String) -> Self {
        OptionValue::Str(s)
    }
}

impl From<serde_json::Value> for OptionValue {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => OptionValue::Bool(false),
            serde_json::Value::Bool(b) => OptionValue::Bool(b),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    OptionValue::Int(i)
                } else {
                    OptionValue::Float(n.as_f64().unwrap_or(0.0))
                }
            }
            serde_json::Value::String(s) => OptionValue::Str(s),
            serde_json::Value::Array(items) => {
                OptionValue::List(items.into_iter().map(OptionValue::from).collect())
            }
            serde_json::Value::Object(fields) => OptionValue::Map(
                fields
                    .into_iter()
                    .map(|(k, v)| (k, OptionValue::from(v)))
                    .collect(),
            ),
        }
    }
}

/// Keys whose value is a structured sub-map in the current format.
const STRUCTURED_KEYS: [&str; 3] = ["redirect", "teaser", "password"];

/// Migrate one value into its current shape for the given setting key.
///
/// Only the structured keys have a migration; every other key passes through
/// unchanged (unknown keys must survive for forward compatibility).
pub fn normalize(key: &str, value: OptionValue) -> OptionValue {
    if !STRUCTURED_KEYS.contains(&key) {
        return value;
    }

    match (key, value) {
        // Oldest shape: a bare boolean toggled the feature with no detail.
        (_, OptionValue::Bool(b)) => OptionValue::map_of(vec![("enabled", OptionValue::Bool(b))]),
        // A bare string carried the single interesting field.
        ("redirect", OptionValue::Str(destination)) => OptionValue::map_of(vec![
            ("enabled", OptionValue::Bool(true)),
            ("type", OptionValue::Str("url".to_string())),
            ("destination", OptionValue::Str(destination)),
        ]),
        ("teaser", OptionValue::Str(message)) => OptionValue::map_of(vec![
            ("enabled", OptionValue::Bool(true)),
            ("message", OptionValue::Str(message)),
        ]),
        ("password", OptionValue::Str(value)) => OptionValue::map_of(vec![
            ("enabled", OptionValue::Bool(true)),
            ("value", OptionValue::Str(value)),
        ]),
        // Current shape: ensure the enabled flag is present.
        (_, OptionValue::Map(mut m)) => {
            m.entry("enabled".to_string())
                .or_insert(OptionValue::Bool(true));
            OptionValue::Map(m)
        }
        (key, other) => {
            debug!("Unrecognized legacy shape for '{}', passing through", key);
            other
        }
    }
}

/// Normalize every entry of a freshly loaded option map.
pub fn normalize_map(map: OptionMap) -> OptionMap {
    map.into_iter()
        .map(|(k, v)| {
            let normalized = normalize(&k, v);
            (k, normalized)
        })
        .collect()
}

/// Parse an option-map blob as stored by the host platform, migrating
/// legacy value shapes in the same pass.
pub fn from_json(raw: &str) -> crate::error::Result<OptionMap> {
    let map: OptionMap = serde_json::from_str(raw)?;
    Ok(normalize_map(map))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_restrictive_values() {
        assert!(OptionValue::Bool(true).is_restrictive());
        assert!(!OptionValue::Bool(false).is_restrictive());
        assert!(OptionValue::Int(1).is_restrictive());
        assert!(!OptionValue::Int(0).is_restrictive());
        assert!(OptionValue::Str("true".to_string()).is_restrictive());
        assert!(!OptionValue::Str("false".to_string()).is_restrictive());
    }

    #[test]
    fn test_submap_restriction_follows_enabled() {
        let enabled = OptionValue::map_of(vec![
            ("enabled", OptionValue::Bool(true)),
            ("message", OptionValue::from("members only")),
        ]);
        assert!(enabled.is_restrictive());

        let disabled = OptionValue::map_of(vec![("enabled", OptionValue::Bool(false))]);
        assert!(!disabled.is_restrictive());

        // A sub-map with no enabled flag restricts nothing.
        let bare = OptionValue::map_of(vec![("message", OptionValue::from("x"))]);
        assert!(!bare.is_restrictive());
    }

    #[test]
    fn test_normalize_legacy_redirect_string() {
        let migrated = normalize("redirect", OptionValue::from("https://example.com/goodbye"));
        let map = migrated.as_map().unwrap();
        assert_eq!(map.get("enabled"), Some(&OptionValue::Bool(true)));
        assert_eq!(map.get("type"), Some(&OptionValue::from("url")));
        assert_eq!(
            map.get("destination"),
            Some(&OptionValue::from("https://example.com/goodbye"))
        );
    }

    #[test]
    fn test_normalize_legacy_boolean_password() {
        let migrated = normalize("password", OptionValue::Bool(true));
        let map = migrated.as_map().unwrap();
        assert_eq!(map.get("enabled"), Some(&OptionValue::Bool(true)));
    }

    #[test]
    fn test_normalize_fills_missing_enabled_flag() {
        let mut inner = HashMap::new();
        inner.insert("message".to_string(), OptionValue::from("preview"));
        let migrated = normalize("teaser", OptionValue::Map(inner));
        let map = migrated.as_map().unwrap();
        assert_eq!(map.get("enabled"), Some(&OptionValue::Bool(true)));
        assert_eq!(map.get("message"), Some(&OptionValue::from("preview")));
    }

    #[test]
    fn test_normalize_passes_unknown_keys_through() {
        let value = OptionValue::from("anything");
        assert_eq!(normalize("custom_flag", value.clone()), value);
    }

    #[test]
    fn test_from_json_migrates_legacy_shapes() {
        let map = from_json(r#"{"redirect": "/login", "hidden": true}"#).unwrap();
        let redirect = map.get("redirect").unwrap().as_map().unwrap();
        assert_eq!(redirect.get("destination"), Some(&OptionValue::from("/login")));
        assert!(from_json("{broken").is_err());
    }

    #[test]
    fn test_json_roundtrip() {
        let json = serde_json::json!({
            "hidden": true,
            "limit": 5,
            "redirect": {"enabled": true, "type": "page", "destination": 42}
        });
        let map: OptionMap = serde_json::from_value(json).unwrap();
        assert_eq!(map.get("hidden"), Some(&OptionValue::Bool(true)));
        assert_eq!(map.get("limit"), Some(&OptionValue::Int(5)));
        assert!(map.get("redirect").unwrap().as_map().is_some());
    }
}
