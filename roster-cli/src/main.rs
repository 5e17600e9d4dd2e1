//! Roster - resolve agent, role, context and task assets
//!
//! Main entry point

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use roster_core::asset::Category;

mod resolve_cli;
mod validate_cli;

/// Log levels
#[derive(Debug, Clone, ValueEnum)]
enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    fn to_filter_directive(&self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

#[derive(Parser, Debug)]
#[clap(
    name = "roster",
    about = "Resolve and install agent, role, context and task assets",
    version
)]
struct Cli {
    #[clap(subcommand)]
    command: Command,

    /// Set log level
    #[clap(long, default_value = "warn", global = true)]
    log_level: LogLevel,

    /// Emit logs as JSON
    #[clap(long, global = true)]
    log_json: bool,

    /// Never prompt, fail on ambiguity instead
    #[clap(long, global = true)]
    no_input: bool,

    /// Override settings file path
    #[clap(long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Resolve a query to one asset name, installing it from the catalog if needed
    Resolve {
        /// Asset category (agent, role, context, task)
        category: Category,

        /// Name, short name or search text
        query: String,
    },

    /// Resolve a model alias of an agent
    Model {
        /// Agent name or query
        agent: String,

        /// Model alias or search terms
        query: String,
    },

    /// Resolve a list of context terms
    Contexts {
        /// Context names or search terms
        #[clap(required = true)]
        terms: Vec<String>,
    },

    /// Show scored matches without installing anything
    Search {
        /// Asset category (agent, role, context, task)
        category: Category,

        /// Search text
        query: String,

        /// Output results as JSON
        #[clap(long)]
        json: bool,
    },

    /// Check an asset repository for tag, registry and index consistency
    Validate(validate_cli::ValidateArgs),

    /// Manage the catalog index cache
    Cache {
        #[clap(subcommand)]
        command: CacheCommand,
    },
}

#[derive(Subcommand, Debug)]
enum CacheCommand {
    /// Remove the cached index version record
    Clear,
}

/// Initialize tracing with CLI flags
///
/// Logs always go to stderr so stdout stays usable for results.
fn initialize_tracing(log_level: &LogLevel, json: bool) {
    let filter = EnvFilter::new(log_level.to_filter_directive());

    if json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(true)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    initialize_tracing(&cli.log_level, cli.log_json);

    let env = resolve_cli::Environment::load(cli.config.as_deref())?;

    match cli.command {
        Command::Resolve { category, query } => {
            resolve_cli::resolve_command(&env, cli.no_input, category, &query).await
        }
        Command::Model { agent, query } => {
            resolve_cli::model_command(&env, cli.no_input, &agent, &query).await
        }
        Command::Contexts { terms } => {
            resolve_cli::contexts_command(&env, cli.no_input, &terms).await
        }
        Command::Search {
            category,
            query,
            json,
        } => resolve_cli::search_command(&env, category, &query, json).await,
        Command::Validate(args) => validate_cli::validate_command(&env, args).await,
        Command::Cache { command } => match command {
            CacheCommand::Clear => resolve_cli::cache_clear_command(&env),
        },
    }
}
