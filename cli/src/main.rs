use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;
mod scenario;

use commands::{lint, query, settings};

/// Warden CLI - inspect and exercise access policies from the command line
#[derive(Parser)]
#[command(name = "ward")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate policy document files
    Lint {
        /// Policy JSON files to check
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// Evaluate an access query against a scenario
    Query {
        /// Scenario YAML file
        #[arg(short, long)]
        scenario: PathBuf,

        /// Principal spec (visitor, default, user:<id>, role:<slug>)
        #[arg(short, long)]
        principal: String,

        /// Object spec (kind:id, e.g. post:42)
        #[arg(short, long)]
        object: String,

        /// Action to evaluate (list, read, edit, ...)
        #[arg(short, long)]
        action: String,

        /// Override the scenario's merge preference (deny, allow, apply, deprive)
        #[arg(long)]
        preference: Option<String>,

        /// Output format (json, text)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Show effective settings for a principal on an object
    Settings {
        /// Scenario YAML file
        #[arg(short, long)]
        scenario: PathBuf,

        /// Principal spec (visitor, default, user:<id>, role:<slug>)
        #[arg(short, long)]
        principal: String,

        /// Object spec (kind:id, e.g. post:42)
        #[arg(short, long)]
        object: String,

        /// Include the source and overwrite marks of each value
        #[arg(long)]
        sources: bool,

        /// Output format (json, yaml, text)
        #[arg(short, long, default_value = "text")]
        format: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt().with_env_filter(log_level).init();

    match cli.command {
        Commands::Lint { files } => {
            lint::execute(&files)?;
        }
        Commands::Query {
            scenario,
            principal,
            object,
            action,
            preference,
            format,
        } => {
            query::execute(
                &scenario,
                &principal,
                &object,
                &action,
                preference.as_deref(),
                &format,
            )?;
        }
        Commands::Settings {
            scenario,
            principal,
            object,
            sources,
            format,
        } => {
            settings::execute(&scenario, &principal, &object, sources, &format)?;
        }
    }

    Ok(())
}
