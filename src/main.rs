//! alx-harvest — batch entrypoint.
//! Loads configuration, runs one harvest pass, and writes the CSV report.

use alx_incident_harvester::auth::AuthProvider;
use alx_incident_harvester::config::Cli;
use alx_incident_harvester::fetch::{RateLimitedFetcher, ReqwestTransport, Transport};
use alx_incident_harvester::relevance::{RelevanceFilter, Vocabulary};
use alx_incident_harvester::{harvest, report};
use clap::Parser;
use std::sync::Arc;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Compact console logging; `--verbose` lowers the pipeline targets to
/// debug, RUST_LOG overrides everything.
fn init_tracing(verbose: bool) {
    let default = if verbose {
        "harvest=debug,fetch=debug,listing=debug,comments=debug,auth=debug,info"
    } else {
        "info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env first so the clap env fallbacks can see it.
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let vocab = match &cli.vocabulary {
        Some(path) => Vocabulary::from_path(path)?,
        None => Vocabulary::builtin(),
    };
    let filter = RelevanceFilter::new(&vocab)?;

    let transport: Arc<dyn Transport> = Arc::new(ReqwestTransport::new());
    let auth = AuthProvider::new(cli.credentials(), cli.user_agent.clone(), transport.clone());
    let fetcher = RateLimitedFetcher::new(transport, auth, cli.fetcher_cfg());

    let rows = harvest::harvest(&fetcher, &filter, &cli.harvest_params()).await;
    report::write_csv(&rows, &cli.out)?;
    tracing::info!(rows = rows.len(), out = %cli.out.display(), "report written");
    Ok(())
}
