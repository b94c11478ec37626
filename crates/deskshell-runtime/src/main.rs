//! deskshell - headless application shell.
//!
//! Reads one JSON trigger per stdin line and answers each with one JSON line
//! on stdout. Messages delivered to surfaces are printed as they arrive.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use deskshell_core::{SurfaceCatalog, SurfaceId};
use deskshell_runtime::{AppConfig, HeadlessHost, Orchestrator, SqliteConnector, Trigger};

/// Headless application shell driven by JSON triggers on stdin.
#[derive(Parser, Debug)]
#[command(name = "deskshell", version, about = "Headless application shell")]
struct Args {
    /// Directory holding provisioned stores
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Bundled template store
    #[arg(long, default_value = "resources/databases/save_0.db")]
    template: PathBuf,

    /// Directory listed by the listing task
    #[arg(long, default_value = ".")]
    listing_root: PathBuf,

    /// Surface opened on launch
    #[arg(long, default_value = SurfaceId::SPLASH)]
    startup_surface: String,

    /// Keep reading triggers after the last surface closes
    #[arg(long)]
    keep_alive: bool,

    /// Capacity of each per-dispatch response channel
    #[arg(long, default_value = "16")]
    channel_capacity: usize,

    /// SQLite connections per store
    #[arg(long, default_value = "1")]
    max_connections: u32,

    /// Log filter, e.g. "info" or "deskshell=debug"
    #[arg(long, env = "LOG_LEVEL")]
    log_level: Option<String>,
}

impl Args {
    fn into_config(self) -> AppConfig {
        let defaults = AppConfig::default();
        AppConfig {
            data_dir: self.data_dir.unwrap_or(defaults.data_dir),
            template_path: self.template,
            listing_root: self.listing_root,
            channel_capacity: self.channel_capacity,
            startup_surface: SurfaceId::new(self.startup_surface),
            quit_when_all_closed: !self.keep_alive,
            max_connections: self.max_connections,
            ..defaults
        }
    }
}

fn init_tracing(log_level: Option<&str>) {
    let filter = match log_level {
        Some(level) => EnvFilter::new(level),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("deskshell=info")),
    };
    // stdout carries the protocol; logs go to stderr.
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn emit(line: &Value) {
    println!("{line}");
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    init_tracing(args.log_level.as_deref());

    let config = args.into_config();
    info!(
        data_dir = %config.data_dir.display(),
        template = %config.template_path.display(),
        "deskshell starting"
    );

    let (host, mut deliveries) = HeadlessHost::new();
    let orchestrator = Orchestrator::new(
        &config,
        SurfaceCatalog::builtin(),
        Arc::new(host),
        SqliteConnector::new(config.max_connections),
    );

    let printer = tokio::spawn(async move {
        while let Some(delivery) = deliveries.recv().await {
            match serde_json::to_value(&delivery) {
                Ok(value) => emit(&value),
                Err(e) => warn!(error = %e, "Failed to encode delivery"),
            }
        }
    });

    if let Err(e) = orchestrator.start().await {
        error!(error = %e, "Failed to open startup surface");
        return Err(e.into());
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let trigger: Trigger = match serde_json::from_str(line) {
            Ok(trigger) => trigger,
            Err(e) => {
                warn!(error = %e, "Rejected malformed trigger");
                emit(&json!({ "error": format!("invalid trigger: {e}") }));
                continue;
            }
        };

        match orchestrator.handle(trigger).await {
            Ok(outcome) => emit(&json!({ "ok": outcome })),
            Err(e) => {
                warn!(error = %e, "Trigger failed");
                emit(&json!({ "error": e.to_string() }));
            }
        }

        if config.quit_when_all_closed && orchestrator.all_closed().await {
            info!("Last surface closed - quitting");
            break;
        }
    }

    let finished = orchestrator.drain().await;
    if !finished.is_empty() {
        info!(count = finished.len(), "Waited for in-flight tasks");
    }
    orchestrator.shutdown().await;

    // The host goes with the orchestrator, which ends the delivery stream.
    drop(orchestrator);
    if let Err(e) = printer.await {
        warn!(error = %e, "Delivery printer ended abnormally");
    }

    Ok(())
}
