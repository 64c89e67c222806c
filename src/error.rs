// =============================================================================
// Engine error taxonomy
// =============================================================================
//
// Two tiers:
//   - `EngineError`   — real failures surfaced to the caller (capacity limits,
//                       transport faults). The engine performs no retries and
//                       keeps its last good state.
//   - `TickRejection` — non-fatal drop outcomes from the tick path. Stale and
//                       mismatched ticks are expected during reconnects and
//                       session switches and are only logged at debug level.
//
// Insufficient history is deliberately *not* an error: a window larger than
// the available candles yields an empty series.

use thiserror::Error;
use uuid::Uuid;

use crate::registry::IndicatorKind;

#[derive(Debug, Error)]
pub enum EngineError {
    /// Adding an instance would exceed its kind's cardinality limit. The
    /// instance is not created and existing instances are untouched.
    #[error("capacity exceeded for {kind}: at most {limit} instance(s) allowed")]
    CapacityExceeded { kind: IndicatorKind, limit: usize },

    /// Operation referenced an instance id the registry does not hold.
    #[error("unknown indicator instance {0}")]
    UnknownInstance(Uuid),

    /// Historical fetch or live feed failure. Surfaced for the caller/UI to
    /// retry; the buffer keeps its last good contents.
    #[error("transport failure: {0}")]
    Transport(#[from] anyhow::Error),
}

/// Why a tick was dropped without touching the buffer.
#[derive(Debug, Clone, Error)]
pub enum TickRejection {
    /// Tick bucketed strictly before the in-progress candle window.
    #[error("stale tick: candle_time {candle_time} < last open {last_open}")]
    StaleTick { candle_time: i64, last_open: i64 },

    /// Tick belongs to a symbol this session is not tracking.
    #[error("symbol mismatch: expected {expected}, got {got}")]
    SymbolMismatch { expected: String, got: String },
}
