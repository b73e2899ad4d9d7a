//! Translation of policy actions into option keys, per object kind.
//!
//! Policy statements speak in actions (`list`, `read`, `edit`); option maps
//! speak in setting keys (`hidden`, `restricted`, `edit`). Each built-in
//! object kind carries its own table. Structured statement metadata
//! (teaser, password, redirect) turns into the matching sub-map keys on
//! content-reading actions.

use once_cell::sync::Lazy;
use options::{normalize, OptionValue};
use policy::Effect;
use resource::ObjectKind;
use std::collections::HashMap;

/// Action-to-key tables for the kinds the engine ships behavior for.
static ACTION_KEYS: Lazy<HashMap<&'static str, Vec<(&'static str, &'static str)>>> =
    Lazy::new(|| {
        HashMap::from([
            (
                "post",
                vec![
                    ("list", "hidden"),
                    ("read", "restricted"),
                    ("comment", "comment"),
                    ("edit", "edit"),
                    ("delete", "delete"),
                    ("publish", "publish"),
                ],
            ),
            ("menu_item", vec![("list", "restricted")]),
            ("route", vec![("access", "restricted")]),
            ("uri", vec![("access", "restricted")]),
            ("redirect", vec![("access", "restricted")]),
            (
                "identity",
                vec![("list", "hidden"), ("edit", "edit"), ("delete", "delete")],
            ),
            ("capability", vec![("use", "restricted")]),
        ])
    });

/// Metadata entries that expand into structured sub-map keys.
const METADATA_KEYS: [(&str, &str); 3] = [
    ("Teaser", "teaser"),
    ("Password", "password"),
    ("Redirect", "redirect"),
];

/// The option key a statement action writes for the given kind, when the
/// kind defines one. Unknown kinds have no table; their statements are not
/// translated.
pub fn key_for(kind: &ObjectKind, action: &str) -> Option<&'static str> {
    ACTION_KEYS
        .get(kind.name())?
        .iter()
        .find(|(a, _)| a.eq_ignore_ascii_case(action))
        .map(|(_, key)| *key)
}

/// The `(action, key)` table for a kind; empty for unknown kinds.
pub fn actions_for(kind: &ObjectKind) -> &'static [(&'static str, &'static str)] {
    ACTION_KEYS
        .get(kind.name())
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

/// The option key consulted when answering `is_denied(_, kind, _, action)`.
///
/// Kinds without a table fall back to the action name itself, so explicit
/// settings on unknown kinds keep working (forward compatibility).
pub fn decision_key<'a>(kind: &ObjectKind, action: &'a str) -> &'a str {
    key_for(kind, action).unwrap_or(action)
}

/// Expand one applicable statement into `(key, value)` pairs.
///
/// The base action key gets the plain effect boolean. On content-reading
/// actions, recognized metadata entries become their structured sub-maps
/// with the effect carried in the `enabled` flag.
pub fn translate(
    kind: &ObjectKind,
    action: &str,
    effect: Effect,
    metadata: &HashMap<String, OptionValue>,
) -> Vec<(String, OptionValue)> {
    let mut pairs = Vec::new();

    if let Some(base) = key_for(kind, action) {
        pairs.push((base.to_string(), OptionValue::Bool(effect.is_restrictive())));
    }

    if action.eq_ignore_ascii_case("read") || action.eq_ignore_ascii_case("access") {
        for (metadata_key, option_key) in METADATA_KEYS {
            let Some(payload) = lookup(metadata, metadata_key) else {
                continue;
            };
            pairs.push((
                option_key.to_string(),
                structured(option_key, effect, payload),
            ));
        }
    }

    pairs
}

fn lookup<'a>(
    metadata: &'a HashMap<String, OptionValue>,
    name: &str,
) -> Option<&'a OptionValue> {
    metadata
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(name))
        .map(|(_, v)| v)
}

/// Build the structured sub-map for a metadata payload, normalizing legacy
/// scalar shapes and forcing the `enabled` flag to follow the effect.
fn structured(option_key: &str, effect: Effect, payload: &OptionValue) -> OptionValue {
    let base = match payload {
        OptionValue::Map(fields) => OptionValue::Map(
            fields
                .iter()
                .map(|(k, v)| (snake_case(k), v.clone()))
                .collect(),
        ),
        other => normalize(option_key, other.clone()),
    };

    match base {
        OptionValue::Map(mut fields) => {
            fields.insert(
                "enabled".to_string(),
                OptionValue::Bool(effect.is_restrictive()),
            );
            OptionValue::Map(fields)
        }
        other => other,
    }
}

/// `StatusCode` -> `status_code`, `Message` -> `message`.
fn snake_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 2);
    for (i, c) in name.chars().enumerate() {
        if c.is_ascii_uppercase() {
            if i > 0 {
                out.push('_');
            }
            out.push(c.to_ascii_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}
