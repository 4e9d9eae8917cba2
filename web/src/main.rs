//! camsrv web interface – browse the recordings written by camsrvd and
//! relay the live stream.
//!
//! This binary:
//! 1. Reads `/etc/camsrv.ini` (or the path given as first argument)
//! 2. Runs an axum HTTP server with the overview heat map, the recording
//!    viewer and the live relay.

mod live;
mod pages;
mod server;

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;

use camsrv_common::config::Config;
use camsrv_common::settings::Settings;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "camsrv_web=info,tower_http=info".into()),
        )
        .init();

    // ── load config ──────────────────────────────────────────────────
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| Config::default_path().to_string());
    let settings =
        Settings::load(&PathBuf::from(&config_path)).context("Config load failed")?;

    let listen_addr =
        std::env::var("CAMSRV_LISTEN_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".into());
    let resource_dir = PathBuf::from(
        std::env::var("CAMSRV_RESOURCE_DIR").unwrap_or_else(|_| "resource".into()),
    );

    info!(
        "camsrv web starting ({} cameras, heatmap={}, stream={})",
        settings.cameras.len(),
        settings.heatmap_enabled,
        settings.stream_enabled
    );

    // ── ctrl-c ───────────────────────────────────────────────────────
    let shutdown = Arc::new(AtomicBool::new(false));
    {
        let shutdown = shutdown.clone();
        ctrlc::set_handler(move || {
            shutdown.store(true, Ordering::Relaxed);
            info!("Shutdown signal received");
        })
        .context("Cannot set Ctrl-C handler")?;
    }

    // ── HTTP server ──────────────────────────────────────────────────
    server::run(Arc::new(settings), resource_dir, &listen_addr, shutdown).await?;

    info!("camsrv web stopped");
    Ok(())
}
