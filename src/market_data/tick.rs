// =============================================================================
// TickAggregator — folds live trade ticks into the candle buffer
// =============================================================================
//
// Bucketing rule: candle_time = floor(timestamp / interval) * interval.
//
//   candle_time > last open time  => roll over: append a fresh candle
//   candle_time == last open time => extend the in-progress candle in place
//   candle_time < last open time  => stale tick, silently dropped
//
// O(1) per tick; runs synchronously on tick arrival under the session's
// write lock, so it never overlaps a symbol/interval switch.

use serde::Deserialize;

use crate::error::TickRejection;
use crate::market_data::{Candle, CandleBuffer, Interval};

/// A single trade event from the live feed.
#[derive(Debug, Clone, Deserialize)]
pub struct Tick {
    pub symbol: String,
    pub price: f64,
    /// Traded base quantity. Zero when the transport does not report one.
    #[serde(default)]
    pub quantity: f64,
    /// UNIX timestamp in seconds.
    pub timestamp: i64,
}

/// What a successfully applied tick did to the buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickApplied {
    /// A new candle was opened (previous one rolled into history).
    Opened,
    /// The in-progress candle was extended in place.
    Updated,
}

/// Folds ticks for one symbol into a session's candle buffer.
#[derive(Debug)]
pub struct TickAggregator {
    symbol: String,
    interval: Interval,
}

impl TickAggregator {
    pub fn new(symbol: impl Into<String>, interval: Interval) -> Self {
        Self {
            symbol: symbol.into().to_uppercase(),
            interval,
        }
    }

    /// Apply one tick to `buffer`.
    ///
    /// Rejections are outcomes, not failures: ticks for another symbol and
    /// ticks older than the in-progress candle window are dropped without
    /// touching the buffer, and the caller just logs them at debug level.
    pub fn apply(
        &self,
        buffer: &mut CandleBuffer,
        tick: &Tick,
    ) -> Result<TickApplied, TickRejection> {
        if !tick.symbol.eq_ignore_ascii_case(&self.symbol) {
            return Err(TickRejection::SymbolMismatch {
                expected: self.symbol.clone(),
                got: tick.symbol.clone(),
            });
        }

        let width = self.interval.seconds();
        let candle_time = tick.timestamp.div_euclid(width) * width;

        match buffer.last_open_time() {
            None => {
                let mut candle = Candle::open_at(candle_time, tick.price);
                candle.volume = tick.quantity;
                buffer.push(candle);
                Ok(TickApplied::Opened)
            }
            Some(last_open) if candle_time > last_open => {
                let mut candle = Candle::open_at(candle_time, tick.price);
                candle.volume = tick.quantity;
                buffer.push(candle);
                Ok(TickApplied::Opened)
            }
            Some(last_open) if candle_time == last_open => {
                // The open never changes after the first tick of the window.
                let last = buffer.last_mut().expect("buffer has a last candle");
                last.high = last.high.max(tick.price);
                last.low = last.low.min(tick.price);
                last.close = tick.price;
                last.volume += tick.quantity;
                Ok(TickApplied::Updated)
            }
            Some(last_open) => Err(TickRejection::StaleTick {
                candle_time,
                last_open,
            }),
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

    fn setup() -> (TickAggregator, CandleBuffer) {
        (
            TickAggregator::new("BTCUSDT", Interval::M1),
            CandleBuffer::new(100),
        )
    }

    #[test]
    fn first_tick_opens_candle() {
        let (agg, mut buf) = setup();
        let applied = agg.apply(&mut buf, &tick(65, 100.0)).unwrap();
        assert_eq!(applied, TickApplied::Opened);

        let c = buf.last().unwrap();
        assert_eq!(c.open_time, 60); // floored to the minute boundary
        assert_eq!(c.open, 100.0);
        assert_eq!(c.high, 100.0);
        assert_eq!(c.low, 100.0);
        assert_eq!(c.close, 100.0);
    }

    #[test]
    fn same_window_updates_high_low_close_never_open() {
        let (agg, mut buf) = setup();
        agg.apply(&mut buf, &tick(60, 100.0)).unwrap();
        agg.apply(&mut buf, &tick(61, 105.0)).unwrap();
        agg.apply(&mut buf, &tick(62, 95.0)).unwrap();
        let applied = agg.apply(&mut buf, &tick(119, 98.0)).unwrap();

        assert_eq!(applied, TickApplied::Updated);
        assert_eq!(buf.len(), 1);
        let c = buf.last().unwrap();
        assert_eq!(c.open, 100.0);
        assert_eq!(c.high, 105.0);
        assert_eq!(c.low, 95.0);
        assert_eq!(c.close, 98.0);
        assert_eq!(c.volume, 4.0);
    }

    #[test]
    fn boundary_tick_rolls_over() {
        let (agg, mut buf) = setup();
        agg.apply(&mut buf, &tick(60, 100.0)).unwrap();
        let applied = agg.apply(&mut buf, &tick(120, 101.0)).unwrap();

        assert_eq!(applied, TickApplied::Opened);
        assert_eq!(buf.len(), 2);
        assert_eq!(buf.last().unwrap().open_time, 120);
        assert_eq!(buf.last().unwrap().open, 101.0);
    }

    #[test]
    fn gap_in_ticks_is_tolerated() {
        // A missed boundary is simply detected on the next tick.
        let (agg, mut buf) = setup();
        agg.apply(&mut buf, &tick(60, 100.0)).unwrap();
        agg.apply(&mut buf, &tick(400, 103.0)).unwrap();

        assert_eq!(buf.len(), 2);
        assert_eq!(buf.last().unwrap().open_time, 360);
    }

    #[test]
    fn stale_tick_is_rejected() {
        let (agg, mut buf) = setup();
        agg.apply(&mut buf, &tick(120, 100.0)).unwrap();
        let err = agg.apply(&mut buf, &tick(59, 90.0)).unwrap_err();

        assert!(matches!(err, TickRejection::StaleTick { .. }));
        assert_eq!(buf.len(), 1);
        assert_eq!(buf.last().unwrap().close, 100.0);
    }

    #[test]
    fn foreign_symbol_is_rejected() {
        let (agg, mut buf) = setup();
        let mut t = tick(60, 100.0);
        t.symbol = "ETHUSDT".to_string();

        let err = agg.apply(&mut buf, &t).unwrap_err();
        assert!(matches!(err, TickRejection::SymbolMismatch { .. }));
        assert!(buf.is_empty());
    }

    #[test]
    fn tick_roundtrip_matches_direct_construction() {
        // Feeding a known tick sequence must produce the same buffer as
        // building the candles from their OHLCV definition directly.
        let (agg, mut buf) = setup();
        let ticks = [
            tick(0, 10.0),
            tick(10, 12.0),
            tick(50, 9.0),
            tick(60, 11.0),
            tick(90, 11.5),
            tick(121, 13.0),
        ];
        for t in &ticks {
            agg.apply(&mut buf, t).unwrap();
        }

        let snap = buf.snapshot();
        assert_eq!(snap.len(), 3);

        // Candle 0: ticks at 0, 10, 50.
        assert_eq!(snap[0].open, 10.0);
        assert_eq!(snap[0].high, 12.0);
        assert_eq!(snap[0].low, 9.0);
        assert_eq!(snap[0].close, 9.0);

        // Candle 1: ticks at 60, 90.
        assert_eq!(snap[1].open, 11.0);
        assert_eq!(snap[1].high, 11.5);
        assert_eq!(snap[1].low, 11.0);
        assert_eq!(snap[1].close, 11.5);

        // Candle 2: single tick at 121.
        assert_eq!(snap[2].open_time, 120);
        assert_eq!(snap[2].open, 13.0);
        assert_eq!(snap[2].close, 13.0);
    }
}
