// =============================================================================
// Central Application State
// =============================================================================
//
// The single source of truth shared across the REST API, the tick stream, and
// the history fetch tasks. One `ChartSession` is active at a time; every
// subsystem reaches it through `Arc<AppState>`.
//
// Thread safety:
//   - Atomic counter for lock-free version tracking.
//   - parking_lot::RwLock around the session so tick application, recompute,
//     and session switches never interleave.
// =============================================================================

use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;
use tracing::debug;

use crate::market_data::{history, SessionKey, Tick, TickApplied};
use crate::runtime_config::RuntimeConfig;
use crate::session::ChartSession;

/// Central application state shared across all async tasks via `Arc<AppState>`.
pub struct AppState {
    /// Monotonically increasing version counter. Incremented on every
    /// meaningful state mutation; pollers use it to detect changes cheaply.
    pub state_version: AtomicU64,

    pub runtime_config: RwLock<RuntimeConfig>,

    /// The active chart session. Write lock for ticks, switches, and
    /// indicator config changes; read lock for snapshots and resolution.
    pub session: RwLock<ChartSession>,

    /// Shared HTTP client for history fetches.
    pub http: reqwest::Client,

    /// Instant when the server was started. Used for uptime reporting.
    pub start_time: std::time::Instant,
}

impl AppState {
    /// Construct a new `AppState` from the given runtime configuration. The
    /// returned value is typically wrapped in `Arc` immediately.
    pub fn new(config: RuntimeConfig) -> Self {
        let key = SessionKey::new(config.symbol.clone(), config.interval);
        let session = ChartSession::new(key, config.max_candles);

        Self {
            state_version: AtomicU64::new(1),
            runtime_config: RwLock::new(config),
            session: RwLock::new(session),
            http: history::build_client(),
            start_time: std::time::Instant::now(),
        }
    }

    /// Atomically increment the state version. Call this after every
    /// meaningful mutation.
    pub fn increment_version(&self) -> u64 {
        self.state_version.fetch_add(1, Ordering::SeqCst)
    }

    /// Read the current state version without modifying it.
    pub fn current_state_version(&self) -> u64 {
        self.state_version.load(Ordering::SeqCst)
    }

    /// Fold one live tick into the active session. Rejections are expected
    /// around reconnects and switches and are only logged at debug level.
    pub fn apply_tick(&self, tick: &Tick) -> Option<TickApplied> {
        let applied = self.session.write().apply_tick(tick);
        match applied {
            Ok(applied) => {
                self.increment_version();
                Some(applied)
            }
            Err(rejection) => {
                debug!(reason = %rejection, "tick dropped");
                None
            }
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;

    fn tick(ts: i64, price: f64) -> Tick {
        Tick {
            symbol: "BTCUSDT".to_string(),
            price,
            quantity: 1.0,
            timestamp: ts,
        }
    }

    #[test]
    fn new_state_uses_configured_session() {
        let state = AppState::new(RuntimeConfig::default());
        let session = state.session.read();
        assert_eq!(session.key().symbol, "BTCUSDT");
        assert_eq!(session.candle_count(), 0);
    }

    #[test]
    fn applied_tick_bumps_version() {
        let state = AppState::new(RuntimeConfig::default());
        let before = state.current_state_version();

        assert!(state.apply_tick(&tick(60, 100.0)).is_some());
        assert!(state.current_state_version() > before);
    }

    #[test]
    fn rejected_tick_leaves_version_unchanged() {
        let state = AppState::new(RuntimeConfig::default());
        state.apply_tick(&tick(120, 100.0));
        let version = state.current_state_version();

        // Stale tick for an earlier window.
        let mut t = tick(10, 90.0);
        t.symbol = "BTCUSDT".to_string();
        assert!(state.apply_tick(&t).is_none());
        assert_eq!(state.current_state_version(), version);
    }
}
