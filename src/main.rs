//! netkrow - trace a service or flow back to the transactions that trigger it
//!
//! Loads configuration, opens the configured data source and runs one command.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use netkrow::cli::{self, BacktraceArgs, ConfigSubcommand};
use netkrow::config::ConfigLoader;

/// netkrow - find every transaction that can trigger a service or flow
#[derive(Parser, Debug)]
#[command(name = "netkrow")]
#[command(about = "Backtrace services and flows to the transactions that trigger them", long_about = None)]
struct Args {
    /// Enable debug logging (to stderr)
    #[arg(long, short = 'd', global = true)]
    debug: bool,

    /// Configuration file layered over the root config
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

/// Main commands
#[derive(Subcommand, Debug)]
enum Command {
    /// Find every route from a transaction down to the search text
    Backtrace(BacktraceArgs),
    /// List the sub flows whose configuration contains the text
    Hits {
        /// Text to search for (case-sensitive)
        text: String,
        /// Snapshot file to query, overriding dataSource.snapshot
        #[arg(long)]
        snapshot: Option<String>,
    },
    /// Check the data source is reachable
    Ping {
        /// Snapshot file to query, overriding dataSource.snapshot
        #[arg(long)]
        snapshot: Option<String>,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        subcommand: ConfigSubcommand,
    },
    /// Display version information
    Version,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    cli::init_logging(args.debug);
    tracing::debug!("Debug logging enabled");

    let explicit = args.config.as_deref();

    match args.command {
        Command::Config { subcommand } => cli::handle_config_command(subcommand, explicit).await,
        Command::Version => {
            cli::display_version();
            Ok(())
        }
        Command::Backtrace(backtrace_args) => {
            let config = ConfigLoader::load(explicit).context("Failed to load configuration")?;
            tracing::debug!(
                "Configuration loaded: demo={}, maxDepth={}, maxRoutes={}",
                config.demo,
                config.backtrace.max_depth,
                config.backtrace.max_routes
            );
            cli::handle_backtrace(backtrace_args, config).await
        }
        Command::Hits { text, snapshot } => {
            let config = ConfigLoader::load(explicit).context("Failed to load configuration")?;
            cli::handle_hits(text, snapshot, config).await
        }
        Command::Ping { snapshot } => {
            let config = ConfigLoader::load(explicit).context("Failed to load configuration")?;
            cli::handle_ping(snapshot, config).await
        }
    }
}
