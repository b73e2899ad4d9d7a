use anyhow::{Context, Result};
use colored::*;
use policy::{MemoryPolicies, PolicyDocument, PolicyError, PolicyLoader};
use std::path::{Path, PathBuf};

/// Validate policy files: per-document parsing first, then parent chains
/// across the whole set (document ids are the file stems).
pub fn execute(files: &[PathBuf]) -> Result<()> {
    let mut failures = 0;
    let mut provider = MemoryPolicies::new();
    let mut ids = Vec::new();

    for path in files {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {:?}", path))?;

        match PolicyDocument::parse(&raw) {
            Ok(document) => {
                println!(
                    "{} {} ({} statement(s), {} param(s))",
                    "OK".green().bold(),
                    path.display(),
                    document.statements.len(),
                    document.params.len()
                );
                let id = document_id(path);
                provider.insert_document(id.clone(), raw);
                ids.push(id);
            }
            Err(error) => {
                println!("{} {}: {}", "FAIL".red().bold(), path.display(), error);
                failures += 1;
            }
        }
    }

    // Chain check: walk every parseable document's parent chain against the
    // full set.
    for id in &ids {
        provider.attach(format!("lint:{}", id), id.clone());
    }
    let loader = PolicyLoader::new(&provider);
    for id in &ids {
        let outcome = loader.index_for(&format!("lint:{}", id));
        for diagnostic in outcome.diagnostics {
            match diagnostic {
                PolicyError::Cycle(at) => {
                    println!(
                        "{} {}: inheritance cycle through '{}'",
                        "FAIL".red().bold(),
                        id,
                        at
                    );
                    failures += 1;
                }
                // A parent referenced outside the linted set.
                PolicyError::Parse(reason) => {
                    println!("{} {}: {}", "WARN".yellow().bold(), id, reason);
                }
            }
        }
    }

    if failures > 0 {
        println!(
            "{} {} problem(s) found in {} file(s)",
            "Error:".red().bold(),
            failures,
            files.len()
        );
        std::process::exit(1);
    }

    println!("{} {} file(s) checked", "Done:".green().bold(), files.len());
    Ok(())
}

fn document_id(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}
