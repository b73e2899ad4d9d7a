use crate::scenario;
use anyhow::{anyhow, Result};
use authz::AccessEngine;
use colored::*;
use options::OptionValue;
use resource::ObjectRef;
use std::path::Path;

/// Dump the effective settings for one principal on one object.
pub fn execute(
    scenario_path: &Path,
    principal_spec: &str,
    object_spec: &str,
    sources: bool,
    format: &str,
) -> Result<()> {
    let loaded = scenario::load(scenario_path, None)?;
    let principal = loaded.principal(principal_spec)?;
    let object = ObjectRef::parse(object_spec)
        .ok_or_else(|| anyhow!("Invalid object spec '{}' (expected kind:id)", object_spec))?;

    let engine = AccessEngine::new(loaded.context.clone());

    if format == "text" {
        if let Some(name) = &loaded.name {
            println!("{} {}", "Scenario:".bold(), name);
        }
    }

    if sources {
        let resolved = engine.get_resolved(&principal, &object);
        match format {
            "json" => println!("{}", serde_json::to_string_pretty(&resolved)?),
            "yaml" => print!("{}", serde_yaml::to_string(&resolved)?),
            _ => {
                println!(
                    "Effective settings for {} on {}:",
                    principal.key().cyan(),
                    object.to_string().cyan()
                );
                let mut entries: Vec<_> = resolved.iter().collect();
                entries.sort_by(|(a, _), (b, _)| a.cmp(b));
                for (key, entry) in entries {
                    let origin = format!("{:?}", entry.source).to_lowercase();
                    let mark = if entry.overwritten { " [overwritten]" } else { "" };
                    println!(
                        "  {} = {}  ({}{})",
                        key.bold(),
                        render(&entry.value),
                        origin,
                        mark
                    );
                }
            }
        }
        return Ok(());
    }

    let settings = engine.get_effective_settings(&principal, &object);
    match format {
        "json" => println!("{}", serde_json::to_string_pretty(&settings)?),
        "yaml" => print!("{}", serde_yaml::to_string(&settings)?),
        _ => {
            println!(
                "Effective settings for {} on {}:",
                principal.key().cyan(),
                object.to_string().cyan()
            );
            if settings.is_empty() {
                println!("  {}", "(no restrictions)".dimmed());
            }
            let mut entries: Vec<_> = settings.iter().collect();
            entries.sort_by(|(a, _), (b, _)| a.cmp(b));
            for (key, value) in entries {
                println!("  {} = {}", key.bold(), render(value));
            }
        }
    }

    Ok(())
}

fn render(value: &OptionValue) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| format!("{:?}", value))
}
