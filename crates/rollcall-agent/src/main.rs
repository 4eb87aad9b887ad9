//! # rollcall-agent
//!
//! Rollcall attendance service binary — loads settings, opens the ledger,
//! wires the recorder / reconciliation engine / notification fan-out, and
//! runs the HTTP server alongside the daily cutoff scheduler.

#![deny(unsafe_code)]

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use rollcall_engine::{
    AttendanceRecorder, BroadcastDispatcher, CutoffScheduler, NotificationDispatcher,
    ReconciliationEngine, StaticRoster,
};
use rollcall_ledger::{AttendanceLedger, ConnectionConfig};
use rollcall_server::{RollcallServer, ServerConfig};
use rollcall_settings::{RollcallSettings, load_settings, load_settings_from_path};

/// Rollcall attendance server.
#[derive(Parser, Debug)]
#[command(name = "rollcall-agent", about = "Rollcall attendance server")]
struct Cli {
    /// Host to bind (overrides settings).
    #[arg(long)]
    host: Option<String>,

    /// Port to bind (overrides settings; 0 for auto-assign).
    #[arg(long)]
    port: Option<u16>,

    /// Path to the `SQLite` ledger database (overrides settings).
    #[arg(long)]
    db_path: Option<PathBuf>,

    /// Path to the roster JSON file (overrides settings).
    #[arg(long)]
    roster: Option<PathBuf>,

    /// Path to a settings file (instead of `~/.rollcall/settings.json`).
    #[arg(long)]
    settings: Option<PathBuf>,
}

fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }
    Ok(())
}

fn load_roster(path: Option<&str>) -> Result<StaticRoster> {
    match path {
        Some(path) => {
            let json = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read roster file: {path}"))?;
            let roster = StaticRoster::from_json_str(&json)
                .with_context(|| format!("Failed to parse roster file: {path}"))?;
            info!(path, enrollments = roster.len(), "roster loaded");
            Ok(roster)
        }
        None => {
            warn!("no roster configured; reconciliation sweeps will process an empty roster");
            Ok(StaticRoster::default())
        }
    }
}

fn resolve_settings(cli: &Cli) -> Result<RollcallSettings> {
    let mut settings = match &cli.settings {
        Some(path) => load_settings_from_path(path)
            .with_context(|| format!("Failed to load settings from {}", path.display()))?,
        None => load_settings().context("Failed to load settings")?,
    };

    if let Some(host) = &cli.host {
        settings.server.host.clone_from(host);
    }
    if let Some(port) = cli.port {
        settings.server.port = port;
    }
    if let Some(db_path) = &cli.db_path {
        settings.ledger.db_path = db_path.display().to_string();
    }
    if let Some(roster) = &cli.roster {
        settings.roster_path = Some(roster.display().to_string());
    }
    Ok(settings)
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let settings = resolve_settings(&cli)?;
    let policy = settings
        .policy
        .day_policy()
        .context("Invalid policy settings")?;

    let db_path = PathBuf::from(&settings.ledger.db_path);
    ensure_parent_dir(&db_path)?;
    let ledger = AttendanceLedger::open_file(
        &settings.ledger.db_path,
        &ConnectionConfig {
            pool_size: settings.ledger.pool_size,
            busy_timeout_ms: settings.ledger.busy_timeout_ms,
            cache_size_kib: settings.ledger.cache_size_kib,
        },
    )
    .with_context(|| format!("Failed to open ledger at {}", settings.ledger.db_path))?;
    info!(db_path = %db_path.display(), "attendance ledger ready");

    let roster = Arc::new(load_roster(settings.roster_path.as_deref())?);

    let broadcast = Arc::new(BroadcastDispatcher::new(256));
    let dispatcher: Arc<dyn NotificationDispatcher> = broadcast.clone();

    let recorder = Arc::new(AttendanceRecorder::new(
        ledger.clone(),
        policy,
        dispatcher.clone(),
    ));
    let engine = Arc::new(ReconciliationEngine::new(
        ledger.clone(),
        policy,
        roster,
        dispatcher,
    ));

    let server = RollcallServer::new(
        ServerConfig {
            host: settings.server.host.clone(),
            port: settings.server.port,
            broadcast_capacity: 256,
        },
        recorder,
        engine.clone(),
        ledger,
        broadcast,
    );
    let shutdown = server.shutdown().clone();

    let scheduler = CutoffScheduler::new(engine, policy);
    let scheduler_handle = {
        let token = shutdown.token();
        tokio::spawn(async move { scheduler.run(token).await })
    };

    let signal_handle = {
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            shutdown_signal().await;
            info!("shutdown signal received");
            shutdown.shutdown();
        })
    };

    server
        .serve(shutdown.token())
        .await
        .context("HTTP server failed")?;

    shutdown
        .graceful_shutdown(vec![scheduler_handle, signal_handle], None)
        .await;
    info!("rollcall-agent stopped");
    Ok(())
}

/// Resolve on SIGINT or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if tokio::signal::ctrl_c().await.is_err() {
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                let _ = stream.recv().await;
            }
            Err(_) => std::future::pending().await,
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
