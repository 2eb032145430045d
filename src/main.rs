//! # EBICOS Workbench CLI (`ebw`)
//!
//! Validates interlocking automation scripts and retrieves supporting
//! passages from the configured reference documents.
//!
//! ## Usage
//!
//! ```bash
//! ebw --config ./config/ebw.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `ebw validate <file>` | Check a script against the structural rules |
//! | `ebw search "<query>"` | Retrieve reference passages |
//! | `ebw context --script <file>` | Validate + retrieve, printed as JSON |
//! | `ebw sources` | List reference documents and load them |
//! | `ebw serve` | Start the HTTP server |
//!
//! ## Examples
//!
//! ```bash
//! # Validate a script being edited (exit status 1 on errors)
//! ebw validate ./scripts/LKP12.txt --mode edit
//!
//! # Look up the rules for logic statements
//! ebw search "NAR DAA UTF" --config ./config/ebw.toml
//!
//! # Context bundle for a new automation
//! ebw context --mode create --intent "route locking for track 3"
//! ```
//!
//! Log output goes to stderr and is controlled by `RUST_LOG`
//! (default `info`).

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use ebicos_workbench::{config, knowledge, models::AutomationMode, query, server, sources, validate};

/// EBICOS Workbench: automation script validation and reference retrieval.
#[derive(Parser)]
#[command(
    name = "ebw",
    about = "EBICOS Workbench: validate automation scripts and retrieve reference passages",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    ///
    /// Defaults to `./config/ebw.toml`. `validate` runs without one.
    #[arg(long, global = true, default_value = "./config/ebw.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate an automation script.
    ///
    /// Exits with status 1 if any error-severity issue is found.
    Validate {
        /// Script file, or `-` for stdin.
        path: PathBuf,

        /// Editing mode: `create`, `edit` or `debug`. An empty script is
        /// only accepted in `create` mode.
        #[arg(long, default_value = "edit")]
        mode: AutomationMode,

        /// Accept an empty script regardless of mode.
        #[arg(long)]
        allow_empty: bool,

        /// Print issues as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Retrieve reference passages for a query.
    Search {
        query: String,

        /// Maximum number of passages (defaults to `[retrieval].max_chunks`).
        #[arg(long)]
        limit: Option<usize>,

        /// Show mandatory snippets and per-chunk scores instead of the
        /// assembled passage list (no load-order fallback).
        #[arg(long)]
        explain: bool,
    },

    /// Validate a script and retrieve passages for it, printed as JSON.
    Context {
        #[arg(long, default_value = "create")]
        mode: AutomationMode,

        /// What the operator wants to achieve.
        #[arg(long, default_value = "")]
        intent: String,

        /// Script file to validate and include in the query.
        #[arg(long)]
        script: Option<PathBuf>,

        /// Free-text notes added to the query.
        #[arg(long, default_value = "")]
        notes: String,

        #[arg(long)]
        limit: Option<usize>,
    },

    /// List reference documents and load them.
    Sources,

    /// Start the HTTP server on `[server].bind`.
    Serve,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    // Commands that don't require config
    if let Commands::Validate {
        path,
        mode,
        allow_empty,
        json,
    } = &cli.command
    {
        let ok = validate::run_validate(path, *mode, *allow_empty, *json)?;
        if !ok {
            std::process::exit(1);
        }
        return Ok(());
    }

    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Validate { .. } => unreachable!(),
        Commands::Search {
            query,
            limit,
            explain,
        } => {
            knowledge::run_search(&cfg, &query, limit, explain).await?;
        }
        Commands::Context {
            mode,
            intent,
            script,
            notes,
            limit,
        } => {
            let script = match script {
                Some(path) => {
                    let bytes = std::fs::read(&path)
                        .with_context(|| format!("Failed to read script: {}", path.display()))?;
                    String::from_utf8_lossy(&bytes).into_owned()
                }
                None => String::new(),
            };
            let request = query::ContextRequest {
                mode,
                intent,
                script,
                notes,
            };
            query::run_context(&cfg, &request, limit).await?;
        }
        Commands::Sources => {
            sources::list_sources(&cfg).await?;
        }
        Commands::Serve => {
            server::run_server(&cfg).await?;
        }
    }

    Ok(())
}
