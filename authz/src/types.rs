//! Decision-facing types read out of resolved option maps.

use options::OptionValue;
use serde::{Deserialize, Serialize};

/// What should happen instead of serving restricted content.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RedirectKind {
    /// The host's default handling (404 or access-denied page).
    #[default]
    Default,
    /// Show a plain message.
    Message,
    /// Redirect to another content page.
    Page,
    /// Redirect to an absolute URL.
    Url,
    /// Send the visitor to the login screen.
    Login,
    /// Invoke a host-registered callback.
    Callback,
}

impl RedirectKind {
    fn parse(name: &str) -> Self {
        match name.to_ascii_lowercase().as_str() {
            "message" => RedirectKind::Message,
            "page" => RedirectKind::Page,
            "url" => RedirectKind::Url,
            "login" => RedirectKind::Login,
            "callback" | "trigger_callback" => RedirectKind::Callback,
            _ => RedirectKind::Default,
        }
    }
}

/// The structured redirect attached to a restricted object.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RedirectSpec {
    pub kind: RedirectKind,
    /// Page id, URL, callback name, or message body, depending on `kind`.
    pub destination: Option<String>,
    pub status_code: Option<u16>,
}

impl RedirectSpec {
    /// Decode a resolved `redirect` sub-map. Disabled or shapeless values
    /// yield `None`.
    pub fn from_value(value: &OptionValue) -> Option<Self> {
        let fields = value.as_map()?;
        let enabled = fields
            .get("enabled")
            .map(OptionValue::is_restrictive)
            .unwrap_or(false);
        if !enabled {
            return None;
        }

        let kind = fields
            .get("type")
            .and_then(OptionValue::as_str)
            .map(RedirectKind::parse)
            .unwrap_or_default();

        let destination = fields.get("destination").and_then(|v| match v {
            OptionValue::Str(s) => Some(s.clone()),
            // Page redirects historically store the numeric page id.
            OptionValue::Int(i) => Some(i.to_string()),
            _ => None,
        });

        let message = fields.get("message").and_then(OptionValue::as_str);

        let status_code = fields.get("status_code").and_then(|v| match v {
            OptionValue::Int(i) => u16::try_from(*i).ok(),
            _ => None,
        });

        Some(Self {
            kind,
            destination: destination.or_else(|| message.map(str::to_string)),
            status_code,
        })
    }
}
