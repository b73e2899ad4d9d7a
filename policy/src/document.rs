//! Policy document wire format.
//!
//! A document is a JSON object with a top-level `Statement` array and `Param`
//! array, plus optional `Version` and `Parent` fields. `Effect` is
//! case-insensitive; `Resource` and `Action` accept a string or an array of
//! strings. Parsing is strict about mandatory fields and lenient about
//! everything else.

use crate::error::{PolicyError, Result};
use options::OptionValue;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Whether a statement grants or restricts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Effect {
    Allow,
    Deny,
}

impl Effect {
    fn parse(raw: &str) -> Option<Self> {
        match raw.to_ascii_lowercase().as_str() {
            "allow" => Some(Effect::Allow),
            "deny" => Some(Effect::Deny),
            _ => None,
        }
    }

    /// Translate the effect into the boolean a restriction key stores.
    pub fn is_restrictive(&self) -> bool {
        matches!(self, Effect::Deny)
    }
}

/// One normalized allow/deny rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Statement {
    pub effect: Effect,
    /// Resource patterns this rule addresses, in declaration order.
    pub resources: Vec<String>,
    /// Actions the rule names explicitly; empty means the action is carried
    /// by the resource pattern's final segment.
    pub actions: Vec<String>,
    /// Free-form payload interpreted per object kind (teaser text, redirect
    /// destinations, ...).
    pub metadata: HashMap<String, OptionValue>,
}

impl Statement {
    /// Whether the statement names the action explicitly (case-insensitive).
    pub fn names_action(&self, action: &str) -> bool {
        self.actions.iter().any(|a| a.eq_ignore_ascii_case(action))
    }
}

/// An auxiliary key/value pair unrelated to allow/deny.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Param {
    pub key: String,
    pub value: OptionValue,
}

/// A parsed, versioned policy document attached to one principal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyDocument {
    pub version: Option<String>,
    /// Optional id of a document whose statements are included as
    /// lower-priority defaults.
    pub parent: Option<String>,
    pub statements: Vec<Statement>,
    pub params: Vec<Param>,
}

impl PolicyDocument {
    /// Parse a raw JSON document.
    ///
    /// A statement missing `Effect` or `Resource`, or carrying an effect
    /// other than allow/deny, fails the whole document; the caller is
    /// expected to skip it and keep serving.
    pub fn parse(raw: &str) -> Result<Self> {
        let raw_doc: RawDocument =
            serde_json::from_str(raw).map_err(|e| PolicyError::Parse(e.to_string()))?;

        let mut statements = Vec::with_capacity(raw_doc.statement.len());
        for (position, raw_statement) in raw_doc.statement.into_iter().enumerate() {
            statements.push(raw_statement.normalize(position)?);
        }

        let params = raw_doc
            .param
            .into_iter()
            .map(|p| Param {
                key: p.key,
                value: OptionValue::from(p.value),
            })
            .collect();

        Ok(Self {
            version: raw_doc.version,
            parent: raw_doc.parent,
            statements,
            params,
        })
    }
}

/// A string-or-array-of-strings wire field.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

impl OneOrMany {
    fn into_vec(self) -> Vec<String> {
        match self {
            OneOrMany::One(s) => vec![s],
            OneOrMany::Many(v) => v,
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawDocument {
    #[serde(rename = "Version")]
    version: Option<String>,
    #[serde(rename = "Parent")]
    parent: Option<String>,
    #[serde(rename = "Statement", default)]
    statement: Vec<RawStatement>,
    #[serde(rename = "Param", default)]
    param: Vec<RawParam>,
}

#[derive(Debug, Deserialize)]
struct RawStatement {
    #[serde(rename = "Effect")]
    effect: Option<String>,
    #[serde(rename = "Resource")]
    resource: Option<OneOrMany>,
    #[serde(rename = "Action")]
    action: Option<OneOrMany>,
    #[serde(rename = "Metadata", default)]
    metadata: HashMap<String, serde_json::Value>,
}

impl RawStatement {
    fn normalize(self, position: usize) -> Result<Statement> {
        let effect_raw = self
            .effect
            .ok_or_else(|| PolicyError::Parse(format!("Statement {} has no Effect", position)))?;
        let effect = Effect::parse(&effect_raw).ok_or_else(|| {
            PolicyError::Parse(format!(
                "Statement {} has unknown Effect '{}'",
                position, effect_raw
            ))
        })?;

        let resources = self
            .resource
            .map(OneOrMany::into_vec)
            .filter(|r| !r.is_empty())
            .ok_or_else(|| {
                PolicyError::Parse(format!("Statement {} has no Resource", position))
            })?;

        let actions = self.action.map(OneOrMany::into_vec).unwrap_or_default();

        let metadata = self
            .metadata
            .into_iter()
            .map(|(k, v)| (k, OptionValue::from(v)))
            .collect();

        Ok(Statement {
            effect,
            resources,
            actions,
            metadata,
        })
    }
}

#[derive(Debug, Deserialize)]
struct RawParam {
    #[serde(rename = "Key")]
    key: String,
    #[serde(rename = "Value")]
    value: serde_json::Value,
}
