//! reaperd — the idlereaper daemon.
//!
//! Stops Vertex AI Workbench notebooks that have sat idle past the
//! threshold recorded in their own metadata.
//!
//! # Usage
//!
//! ```text
//! reaperd serve --port 8080     # run a sweep per request to `/`
//! reaperd sweep                 # run one sweep, print the results
//! ```
//!
//! Configuration comes from `REAPER_CONFIG` (TOML) and the environment;
//! see `reaper_core::ReaperConfig`.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use reaper_core::ReaperConfig;
use reaper_sweep::Reaper;

#[derive(Parser)]
#[command(name = "reaperd", about = "Idle notebook reaper")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Serve the HTTP trigger; every request to `/` runs one sweep.
    Serve {
        /// Port to listen on.
        #[arg(long, env = "PORT", default_value = "8080")]
        port: u16,
    },
    /// Run a single sweep and print the results as JSON.
    Sweep,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let config = ReaperConfig::from_env().context("invalid configuration")?;
    info!(
        scope = ?config.project_scope,
        transport = ?config.transport,
        regions = ?config.regions,
        metadata_key = %config.shutdown_seconds_metadata_key,
        "configuration loaded"
    );

    let reaper = Reaper::from_config(&config).context("failed to set up Google API clients")?;

    match cli.command {
        Command::Serve { port } => serve(Arc::new(reaper), port).await,
        Command::Sweep => sweep_once(&reaper).await,
    }
}

/// Plain text by default, JSON lines with `LOG_FORMAT=json`. Logs go to
/// stderr so `sweep` output stays clean on stdout.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let json = std::env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

async fn serve(reaper: Arc<Reaper>, port: u16) -> anyhow::Result<()> {
    let router = reaper_api::build_router(reaper);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!(%addr, "trigger server listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!(error = %e, "failed to listen for shutdown signal");
                std::future::pending::<()>().await;
            }
            info!("shutdown signal received");
        })
        .await?;

    info!("reaperd stopped");
    Ok(())
}

async fn sweep_once(reaper: &Reaper) -> anyhow::Result<()> {
    let results = reaper.sweep().await?;
    println!("{}", serde_json::to_string_pretty(&results)?);
    Ok(())
}
