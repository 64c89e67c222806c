// =============================================================================
// Live tick feed — Binance aggTrade WebSocket
// =============================================================================
//
// A persistent push channel delivering trade ticks for the active session's
// symbol. Runs until the stream disconnects, errors, or the session switches
// to a different symbol, then returns so the caller (main.rs) can handle
// reconnection. Gaps in the feed are harmless: a missed candle boundary is
// detected on the next tick that arrives.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use futures_util::StreamExt;
use tokio_tungstenite::connect_async;
use tracing::{debug, error, info, warn};

use crate::app_state::AppState;
use crate::market_data::Tick;

/// How often the read loop wakes to re-check the active symbol when no
/// trades arrive. Keeps cancel-and-replace prompt on illiquid feeds.
const SWITCH_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Connect to the aggTrade stream for the session's current symbol and feed
/// ticks into the session until disconnect or symbol switch.
pub async fn run_tick_stream(state: &Arc<AppState>) -> Result<()> {
    let symbol = state.session.read().key().symbol.clone();
    let lower = symbol.to_lowercase();
    let url = format!("wss://stream.binance.com:9443/ws/{lower}@aggTrade");
    info!(url = %url, symbol = %symbol, "connecting to tick WebSocket");

    let (ws_stream, _response) = connect_async(&url)
        .await
        .context("failed to connect to tick WebSocket")?;

    info!(symbol = %symbol, "tick WebSocket connected");
    let (_write, mut read) = ws_stream.split();

    loop {
        // Cancel-and-replace: a symbol switch invalidates this connection.
        if symbol_changed(state, &symbol) {
            info!(old = %symbol, "session symbol changed — dropping tick stream");
            return Ok(());
        }

        // Wake periodically so the switch check above runs even when the
        // feed is silent.
        let msg = tokio::select! {
            msg = read.next() => msg,
            _ = tokio::time::sleep(SWITCH_POLL_INTERVAL) => continue,
        };

        match msg {
            Some(Ok(msg)) => {
                if let tokio_tungstenite::tungstenite::Message::Text(text) = msg {
                    match parse_agg_trade(&text) {
                        Ok(tick) => {
                            debug!(symbol = %tick.symbol, price = tick.price, "tick");
                            state.apply_tick(&tick);
                        }
                        Err(e) => {
                            warn!(error = %e, "failed to parse aggTrade message");
                        }
                    }
                }
                // Ping / Pong / Binary / Close frames are ignored —
                // tungstenite handles pong replies automatically.
            }
            Some(Err(e)) => {
                error!(symbol = %symbol, error = %e, "tick WebSocket read error");
                return Err(e.into());
            }
            None => {
                warn!(symbol = %symbol, "tick WebSocket stream ended");
                return Ok(());
            }
        }
    }
}

/// Whether the active session has moved off the symbol this stream is
/// connected to.
fn symbol_changed(state: &Arc<AppState>, connected: &str) -> bool {
    state.session.read().key().symbol != connected
}

/// Parse a Binance aggTrade message into a [`Tick`].
///
/// Expected shape:
/// ```json
/// { "e": "aggTrade", "s": "BTCUSDT", "p": "37000.00", "q": "0.123", "T": 1700000000123 }
/// ```
///
/// The trade time `T` arrives in milliseconds and is stored in seconds.
fn parse_agg_trade(text: &str) -> Result<Tick> {
    let root: serde_json::Value =
        serde_json::from_str(text).context("failed to parse aggTrade JSON")?;

    let symbol = root["s"]
        .as_str()
        .context("missing field s")?
        .to_uppercase();

    let price: f64 = root["p"]
        .as_str()
        .context("missing field p")?
        .parse()
        .context("failed to parse price")?;

    let quantity: f64 = root["q"]
        .as_str()
        .context("missing field q")?
        .parse()
        .context("failed to parse quantity")?;

    let trade_time_ms = root["T"].as_i64().context("missing field T")?;

    Ok(Tick {
        symbol,
        price,
        quantity,
        timestamp: trade_time_ms / 1000,
    })
}

// =============================================================================
// Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;
    use crate::market_data::{Interval, SessionKey};
    use crate::runtime_config::RuntimeConfig;

    #[test]
    fn switch_detection_reflects_active_session() {
        let state = Arc::new(AppState::new(RuntimeConfig::default()));
        assert!(!symbol_changed(&state, "BTCUSDT"));

        state
            .session
            .write()
            .switch(SessionKey::new("ETHUSDT", Interval::M1));
        assert!(symbol_changed(&state, "BTCUSDT"));
        assert!(!symbol_changed(&state, "ETHUSDT"));
    }

    #[test]
    fn parse_agg_trade_ok() {
        let json = r#"{
            "e": "aggTrade",
            "E": 1700000000200,
            "s": "BTCUSDT",
            "a": 12345,
            "p": "37000.50",
            "q": "0.123",
            "f": 100,
            "l": 105,
            "T": 1700000000123,
            "m": true
        }"#;
        let tick = parse_agg_trade(json).expect("should parse");
        assert_eq!(tick.symbol, "BTCUSDT");
        assert!((tick.price - 37000.5).abs() < f64::EPSILON);
        assert!((tick.quantity - 0.123).abs() < f64::EPSILON);
        assert_eq!(tick.timestamp, 1_700_000_000); // ms -> s
    }

    #[test]
    fn parse_agg_trade_missing_price() {
        let json = r#"{ "e": "aggTrade", "s": "BTCUSDT", "T": 1700000000123 }"#;
        assert!(parse_agg_trade(json).is_err());
    }

    #[test]
    fn parse_agg_trade_rejects_non_json() {
        assert!(parse_agg_trade("not json").is_err());
    }
}
