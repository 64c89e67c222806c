// =============================================================================
// Chartflow — Main Entry Point
// =============================================================================
//
// Streaming chart backend: seeds a candle buffer from exchange history, folds
// live trade ticks into it, and keeps a registry of technical indicators
// recomputed on every change. A REST API drives session switching, indicator
// configuration, and point-in-time value resolution.
// =============================================================================

// ── Module declarations ──────────────────────────────────────────────────────
mod api;
mod app_state;
mod error;
mod indicators;
mod market_data;
mod registry;
mod resolver;
mod runtime_config;
mod session;

use std::sync::Arc;

use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::api::rest::spawn_history_fetch;
use crate::app_state::AppState;
use crate::market_data::SessionKey;
use crate::runtime_config::RuntimeConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // ── 1. Environment & config ──────────────────────────────────────────
    let _ = dotenv::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("╔══════════════════════════════════════════════════════════╗");
    info!("║        Chartflow — Starting Up                          ║");
    info!("╚══════════════════════════════════════════════════════════╝");

    let mut config = RuntimeConfig::load("runtime_config.json").unwrap_or_else(|e| {
        warn!(error = %e, "Failed to load config, using defaults");
        RuntimeConfig::default()
    });

    // Env overrides for the startup session.
    if let Ok(symbol) = std::env::var("CHARTFLOW_SYMBOL") {
        let symbol = symbol.trim().to_uppercase();
        if !symbol.is_empty() {
            config.symbol = symbol;
        }
    }
    if let Ok(raw) = std::env::var("CHARTFLOW_INTERVAL") {
        match raw.trim().parse() {
            Ok(interval) => config.interval = interval,
            Err(e) => warn!(error = %e, "ignoring CHARTFLOW_INTERVAL"),
        }
    }

    info!(
        symbol = %config.symbol,
        interval = %config.interval,
        max_candles = config.max_candles,
        "startup session configured"
    );

    // ── 2. Build shared state ────────────────────────────────────────────
    let listen_port = config.listen_port;
    let state = Arc::new(AppState::new(config));

    // ── 3. Seed history for the startup session ──────────────────────────
    {
        let session = state.session.read();
        let key = session.key().clone();
        let epoch = session.epoch();
        drop(session);
        spawn_history_fetch(state.clone(), key, epoch);
    }

    // ── 4. Live tick stream with reconnect ───────────────────────────────
    let stream_state = state.clone();
    tokio::spawn(async move {
        loop {
            if let Err(e) = market_data::stream::run_tick_stream(&stream_state).await {
                error!(error = %e, "tick stream error — reconnecting in 5s");
            }
            tokio::time::sleep(tokio::time::Duration::from_secs(5)).await;

            // After a symbol switch the loop reconnects to the new symbol;
            // re-fetch history in case the seed fetch raced the switch.
            let session = stream_state.session.read();
            let needs_history = session.candle_count() == 0;
            let key = session.key().clone();
            let epoch = session.epoch();
            drop(session);
            if needs_history {
                spawn_history_fetch(stream_state.clone(), key, epoch);
            }
        }
    });

    // ── 5. Start the API server ──────────────────────────────────────────
    let api_state = state.clone();
    let bind_addr = std::env::var("CHARTFLOW_BIND_ADDR")
        .unwrap_or_else(|_| format!("0.0.0.0:{listen_port}"));
    let bind_addr_clone = bind_addr.clone();

    tokio::spawn(async move {
        let app = api::rest::router(api_state);
        let listener = tokio::net::TcpListener::bind(&bind_addr_clone)
            .await
            .expect("Failed to bind API server");
        info!(addr = %bind_addr_clone, "API server listening");
        axum::serve(listener, app).await.expect("API server failed");
    });

    // ── 6. Run until shutdown ────────────────────────────────────────────
    tokio::signal::ctrl_c().await?;
    info!("shutdown signal received");

    // Persist the active session so the next start resumes it.
    let key: SessionKey = state.session.read().key().clone();
    let config = {
        let mut config = state.runtime_config.write();
        config.symbol = key.symbol.clone();
        config.interval = key.interval;
        config.clone()
    };
    if let Err(e) = config.save("runtime_config.json") {
        warn!(error = %e, "failed to save config on shutdown");
    }

    info!("shutdown complete");
    Ok(())
}
