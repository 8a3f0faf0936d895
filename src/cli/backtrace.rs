//! Backtrace, hits and ping command handlers

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};

use crate::backtrace::format_backtrace_result;
use crate::config::Config;
use crate::datasource::SubFlowHit;
use crate::services::{BacktraceRequest, BacktraceService, ErrorResponse, ServiceError};

/// How command results are printed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Json,
    Text,
}

/// Arguments of the `backtrace` command
#[derive(Args, Debug, Clone)]
pub struct BacktraceArgs {
    /// Text to trace back (service name, flow name, any configuration fragment)
    pub search: String,

    /// Flow levels to climb (defaults to backtrace.maxDepth)
    #[arg(long)]
    pub max_depth: Option<usize>,

    /// Snapshot file to query, overriding dataSource.snapshot
    #[arg(long)]
    pub snapshot: Option<String>,

    /// Answer with the demo result instead of querying a data source
    #[arg(long)]
    pub demo: bool,

    /// Output format
    #[arg(long, short = 'o', value_enum, default_value_t = OutputFormat::Json)]
    pub output: OutputFormat,
}

/// Run a backtrace and print the result
pub async fn handle_backtrace(args: BacktraceArgs, mut config: Config) -> Result<()> {
    apply_snapshot(&mut config, args.snapshot);
    if args.demo {
        config.demo = true;
    }

    let service = open_service(&config).await?;
    let request = BacktraceRequest {
        search: args.search,
        max_depth: args.max_depth,
    };

    // Data source queries block; keep them off the async workers
    let result = tokio::task::spawn_blocking(move || service.backtrace(&request))
        .await
        .context("Backtrace task failed")?
        .map_err(report)?;

    match args.output {
        OutputFormat::Json => {
            let json =
                serde_json::to_string_pretty(&result).context("Failed to serialize result")?;
            println!("{}", json);
        }
        OutputFormat::Text => println!("{}", format_backtrace_result(&result)),
    }

    Ok(())
}

/// Print the raw data source hits for `text`
pub async fn handle_hits(text: String, snapshot: Option<String>, mut config: Config) -> Result<()> {
    // Hits always come from a real source
    config.demo = false;
    apply_snapshot(&mut config, snapshot);

    let service = open_service(&config).await?;
    let hits = tokio::task::spawn_blocking(move || service.find_hits(&text))
        .await
        .context("Hits task failed")?
        .map_err(report)?;

    print!("{}", render_hits(&hits));
    Ok(())
}

/// Check the configured data source answers
pub async fn handle_ping(snapshot: Option<String>, mut config: Config) -> Result<()> {
    apply_snapshot(&mut config, snapshot);

    let service = open_service(&config).await?;
    let response = service.ping().map_err(report)?;
    let json = serde_json::to_string_pretty(&response).context("Failed to serialize ping")?;
    println!("{}", json);
    Ok(())
}

/// One line per hit: position, identifiers, then the snippet
pub fn render_hits(hits: &[SubFlowHit]) -> String {
    if hits.is_empty() {
        return "No matches.\n".to_string();
    }

    let mut out = String::new();
    for hit in hits {
        let pos = hit
            .match_pos
            .map(|p| p.to_string())
            .unwrap_or_else(|| "-".to_string());
        let snippet = hit
            .match_snippet
            .as_deref()
            .unwrap_or_default()
            .replace(['\n', '\r'], " ");
        out.push_str(&format!(
            "{}\t{}\t{}\t@{}\t{}\n",
            hit.flow_key, hit.server_key, hit.sub_flow_key, pos, snippet
        ));
    }
    out
}

fn apply_snapshot(config: &mut Config, snapshot: Option<String>) {
    if let Some(path) = snapshot.filter(|p| !p.trim().is_empty()) {
        config.demo = false;
        config.data_source.snapshot = Some(path);
    }
}

async fn open_service(config: &Config) -> Result<BacktraceService> {
    BacktraceService::from_config(config).await.map_err(report)
}

/// Log the serializable error body and turn it into an `anyhow` error
fn report(err: ServiceError) -> anyhow::Error {
    let body = ErrorResponse::from(&err);
    tracing::warn!(status = body.status, "{}", body.message);
    anyhow::Error::new(err).context(format!("Request failed with status {}", body.status))
}
