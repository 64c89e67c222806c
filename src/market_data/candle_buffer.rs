// =============================================================================
// CandleBuffer — bounded, time-ordered candle cache for one session
// =============================================================================
//
// The ground truth every indicator reads from. One buffer belongs to exactly
// one (symbol, interval) session and is replaced wholesale when the session
// switches. Insertion evicts the oldest candle once the cap is exceeded, so
// a full recompute over the buffer is always bounded by `max_candles`.

use std::collections::VecDeque;

use crate::market_data::Candle;

/// Bounded ring of candles, oldest first, strictly increasing `open_time`.
#[derive(Debug)]
pub struct CandleBuffer {
    candles: VecDeque<Candle>,
    max_candles: usize,
}

impl CandleBuffer {
    /// Create an empty buffer that retains at most `max_candles` entries.
    pub fn new(max_candles: usize) -> Self {
        Self {
            candles: VecDeque::with_capacity(max_candles + 1),
            max_candles,
        }
    }

    /// Replace the buffer contents with a historical seed.
    ///
    /// The seed must already be ordered oldest-first (the klines endpoint
    /// returns it that way). Candles with non-increasing `open_time` relative
    /// to their predecessor are skipped, and only the most recent
    /// `max_candles` entries are kept.
    pub fn seed(&mut self, candles: Vec<Candle>) {
        self.candles.clear();
        for candle in candles {
            match self.candles.back() {
                Some(last) if candle.open_time <= last.open_time => continue,
                _ => self.candles.push_back(candle),
            }
        }
        while self.candles.len() > self.max_candles {
            self.candles.pop_front();
        }
    }

    /// Append a new candle, evicting the oldest entry if over capacity.
    ///
    /// The caller guarantees `candle.open_time` is greater than the current
    /// last open time (the tick aggregator enforces this).
    pub fn push(&mut self, candle: Candle) {
        self.candles.push_back(candle);
        while self.candles.len() > self.max_candles {
            self.candles.pop_front();
        }
    }

    /// Mutable access to the in-progress (last) candle.
    pub fn last_mut(&mut self) -> Option<&mut Candle> {
        self.candles.back_mut()
    }

    pub fn last(&self) -> Option<&Candle> {
        self.candles.back()
    }

    /// Open time of the in-progress candle, if any.
    pub fn last_open_time(&self) -> Option<i64> {
        self.candles.back().map(|c| c.open_time)
    }

    /// Contiguous copy of the buffer contents, oldest first.
    ///
    /// The recompute path works on a plain slice; cloning the capped buffer
    /// once per event is part of the full-recompute-per-event policy.
    pub fn snapshot(&self) -> Vec<Candle> {
        self.candles.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.candles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candles.is_empty()
    }

    /// Drop all candles (session switch).
    pub fn clear(&mut self) {
        self.candles.clear();
    }
}

// =============================================================================
// Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;

    fn candle(open_time: i64, close: f64) -> Candle {
        Candle {
            open_time,
            open: close,
            high: close + 1.0,
            low: close - 1.0,
            close,
            volume: 10.0,
        }
    }

    #[test]
    fn push_evicts_oldest_past_cap() {
        let mut buf = CandleBuffer::new(3);
        for i in 0..5 {
            buf.push(candle(i * 60, 100.0 + i as f64));
        }
        assert_eq!(buf.len(), 3);
        let snap = buf.snapshot();
        assert_eq!(snap[0].open_time, 120);
        assert_eq!(snap[2].close, 104.0);
    }

    #[test]
    fn seed_replaces_contents_and_trims() {
        let mut buf = CandleBuffer::new(3);
        buf.push(candle(0, 1.0));

        buf.seed((0..10).map(|i| candle(i * 60, i as f64)).collect());
        assert_eq!(buf.len(), 3);
        assert_eq!(buf.last_open_time(), Some(540));
    }

    #[test]
    fn seed_skips_non_increasing_times() {
        let mut buf = CandleBuffer::new(10);
        buf.seed(vec![
            candle(0, 1.0),
            candle(60, 2.0),
            candle(60, 3.0),
            candle(30, 4.0),
            candle(120, 5.0),
        ]);
        let times: Vec<i64> = buf.snapshot().iter().map(|c| c.open_time).collect();
        assert_eq!(times, vec![0, 60, 120]);
    }

    #[test]
    fn last_mut_extends_in_place() {
        let mut buf = CandleBuffer::new(5);
        buf.push(candle(0, 100.0));
        if let Some(last) = buf.last_mut() {
            last.close = 105.0;
            last.high = last.high.max(105.0);
        }
        assert_eq!(buf.last().unwrap().close, 105.0);
        assert_eq!(buf.last().unwrap().high, 105.0);
    }

    #[test]
    fn clear_empties_buffer() {
        let mut buf = CandleBuffer::new(5);
        buf.push(candle(0, 1.0));
        buf.clear();
        assert!(buf.is_empty());
        assert_eq!(buf.last_open_time(), None);
    }
}
