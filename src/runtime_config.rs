// =============================================================================
// Runtime Configuration — persisted chart settings with atomic save
// =============================================================================
//
// The startup session (symbol + interval), buffer sizing, and server binding
// all live here so a restart resumes where the user left off.
//
// Persistence uses an atomic tmp + rename pattern to prevent corruption on
// crash.  All fields carry `#[serde(default)]` so that adding new fields
// never breaks loading an older config file.
//
// =============================================================================

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::market_data::Interval;

// =============================================================================
// Default-value helpers (required by serde `default = "..."` attribute)
// =============================================================================

fn default_symbol() -> String {
    "BTCUSDT".to_string()
}

fn default_interval() -> Interval {
    Interval::M1
}

fn default_max_candles() -> usize {
    500
}

fn default_history_limit() -> usize {
    500
}

fn default_listen_port() -> u16 {
    8000
}

// =============================================================================
// RuntimeConfig
// =============================================================================

/// Top-level runtime configuration.
///
/// Every field has a serde default so that older JSON files missing new fields
/// will still deserialise correctly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuntimeConfig {
    // --- Startup session ----------------------------------------------------

    /// Symbol the chart opens on.
    #[serde(default = "default_symbol")]
    pub symbol: String,

    /// Candle interval the chart opens on.
    #[serde(default = "default_interval")]
    pub interval: Interval,

    // --- Buffer sizing ------------------------------------------------------

    /// Maximum candles retained in memory per session.
    #[serde(default = "default_max_candles")]
    pub max_candles: usize,

    /// Candles requested per history fetch (exchange caps this at 1000).
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,

    // --- Server -------------------------------------------------------------

    /// TCP port the REST API binds to.
    #[serde(default = "default_listen_port")]
    pub listen_port: u16,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            symbol: default_symbol(),
            interval: default_interval(),
            max_candles: default_max_candles(),
            history_limit: default_history_limit(),
            listen_port: default_listen_port(),
        }
    }
}

impl RuntimeConfig {
    /// Load configuration from a JSON file at `path`.
    ///
    /// If the file does not exist, returns an error so the caller can fall
    /// back to defaults with a warning.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read runtime config from {}", path.display()))?;

        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("failed to parse runtime config from {}", path.display()))?;

        info!(
            path = %path.display(),
            symbol = %config.symbol,
            interval = %config.interval,
            "runtime config loaded"
        );

        Ok(config)
    }

    /// Persist the current configuration to `path` using an atomic write
    /// (write to `.tmp`, then rename).
    ///
    /// This prevents corruption if the process crashes mid-write.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();

        let content = serde_json::to_string_pretty(self)
            .context("failed to serialise runtime config to JSON")?;

        // Atomic write: write to a temporary sibling file, then rename.
        let tmp_path = path.with_extension("json.tmp");

        std::fs::write(&tmp_path, &content)
            .with_context(|| format!("failed to write tmp config to {}", tmp_path.display()))?;

        std::fs::rename(&tmp_path, path)
            .with_context(|| format!("failed to rename tmp config to {}", path.display()))?;

        info!(path = %path.display(), "runtime config saved (atomic)");
        Ok(())
    }
}
