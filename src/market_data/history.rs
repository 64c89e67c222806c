// =============================================================================
// Historical candle fetch — Binance klines REST endpoint
// =============================================================================
//
// One fetch per session start/switch seeds the candle buffer. The engine
// performs no retries here; a failed fetch is surfaced to the caller and the
// session keeps whatever buffer it already has.

use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::market_data::{Candle, Interval};

const BINANCE_API_BASE: &str = "https://api.binance.com/api/v3";

/// Hard cap imposed by the klines endpoint.
const MAX_KLINES_LIMIT: usize = 1000;

/// Build a reqwest client suitable for the public klines endpoint.
pub fn build_client() -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(10))
        .build()
        .expect("failed to build reqwest client")
}

/// Fetch up to `limit` historical candles for `(symbol, interval)`,
/// oldest first, open times converted to seconds.
pub async fn fetch_klines(
    client: &reqwest::Client,
    symbol: &str,
    interval: Interval,
    limit: usize,
) -> Result<Vec<Candle>> {
    let url = format!(
        "{BINANCE_API_BASE}/klines?symbol={}&interval={}&limit={}",
        symbol.to_uppercase(),
        interval,
        limit.min(MAX_KLINES_LIMIT)
    );
    debug!(url = %url, "fetching historical klines");

    let resp = client
        .get(&url)
        .send()
        .await
        .context("klines request failed")?;

    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        anyhow::bail!("klines request returned {status}: {body}");
    }

    let raw: serde_json::Value = resp
        .json()
        .await
        .context("failed to decode klines response body")?;

    let candles = parse_klines(&raw)?;
    info!(symbol = %symbol, interval = %interval, count = candles.len(), "historical candles fetched");
    Ok(candles)
}

/// Parse the positional kline array format:
///
/// ```json
/// [[ 1499040000000, "0.01634790", "0.80000000", "0.01575800", "0.01577100",
///    "148976.11427815", 1499644799999, ... ], ...]
/// ```
///
/// Open time arrives in milliseconds and is stored in seconds.
pub fn parse_klines(raw: &serde_json::Value) -> Result<Vec<Candle>> {
    let rows = raw.as_array().context("klines response is not an array")?;

    let mut candles = Vec::with_capacity(rows.len());
    for row in rows {
        let fields = row.as_array().context("kline row is not an array")?;
        if fields.len() < 6 {
            anyhow::bail!("kline row has {} fields, expected at least 6", fields.len());
        }

        let open_time_ms = fields[0]
            .as_i64()
            .context("kline open time is not an integer")?;

        candles.push(Candle {
            open_time: open_time_ms / 1000,
            open: parse_string_f64(&fields[1], "open")?,
            high: parse_string_f64(&fields[2], "high")?,
            low: parse_string_f64(&fields[3], "low")?,
            close: parse_string_f64(&fields[4], "close")?,
            volume: parse_string_f64(&fields[5], "volume")?,
        });
    }

    Ok(candles)
}

/// Binance sends numeric values as JSON strings inside kline rows.
fn parse_string_f64(val: &serde_json::Value, name: &str) -> Result<f64> {
    match val {
        serde_json::Value::String(s) => s
            .parse::<f64>()
            .with_context(|| format!("failed to parse {name} as f64: {s}")),
        serde_json::Value::Number(n) => n
            .as_f64()
            .with_context(|| format!("field {name} is not a valid f64")),
        _ => anyhow::bail!("field {name} has unexpected JSON type"),
    }
}
