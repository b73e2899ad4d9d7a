use crate::scenario;
use anyhow::{anyhow, Result};
use authz::{AccessEngine, MergePreference};
use colored::*;
use resource::ObjectRef;
use std::path::Path;

/// Evaluate `is_denied` for one principal/object/action triple.
pub fn execute(
    scenario_path: &Path,
    principal_spec: &str,
    object_spec: &str,
    action: &str,
    preference: Option<&str>,
    format: &str,
) -> Result<()> {
    let preference = preference
        .map(|name| {
            MergePreference::parse(name)
                .ok_or_else(|| anyhow!("Unknown merge preference '{}'", name))
        })
        .transpose()?;
    let loaded = scenario::load(scenario_path, preference)?;
    let principal = loaded.principal(principal_spec)?;
    let object = ObjectRef::parse(object_spec)
        .ok_or_else(|| anyhow!("Invalid object spec '{}' (expected kind:id)", object_spec))?;

    let engine = AccessEngine::new(loaded.context.clone());
    let denied = engine.is_denied(&principal, &object, action);
    let redirect = engine.get_redirect(&principal, &object);

    match format {
        "json" => {
            let output = serde_json::json!({
                "principal": principal.key(),
                "object": object.to_string(),
                "action": action,
                "denied": denied,
                "redirect": redirect,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        _ => {
            let verdict = if denied {
                "DENY".red().bold()
            } else {
                "ALLOW".green().bold()
            };
            println!(
                "{} {} on {} for {}",
                verdict,
                action.yellow(),
                object.to_string().cyan(),
                principal.key().cyan()
            );
            if let Some(redirect) = redirect {
                println!(
                    "       redirect: {:?} {}",
                    redirect.kind,
                    redirect.destination.as_deref().unwrap_or("-")
                );
            }
        }
    }

    Ok(())
}
