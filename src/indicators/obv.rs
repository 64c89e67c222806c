// =============================================================================
// On-Balance Volume (OBV)
// =============================================================================
//
// Running sum seeded at 0 on the first candle:
//   close > prevClose => add volume
//   close < prevClose => subtract volume
//   close == prevClose => unchanged

use crate::market_data::Candle;

/// Compute the OBV series. Output length equals input length; empty input
/// yields an empty series.
pub fn calculate_obv(candles: &[Candle]) -> Vec<f64> {
    let mut result = Vec::with_capacity(candles.len());
    let mut obv = 0.0;

    for (i, candle) in candles.iter().enumerate() {
        if i > 0 {
            let prev_close = candles[i - 1].close;
            if candle.close > prev_close {
                obv += candle.volume;
            } else if candle.close < prev_close {
                obv -= candle.volume;
            }
        }
        result.push(obv);
    }

    result
}

// =============================================================================
// Unit Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;

    fn candle(close: f64, volume: f64) -> Candle {
        Candle {
            open_time: 0,
            open: close,
            high: close,
            low: close,
            close,
            volume,
        }
    }

    #[test]
    fn obv_empty_input() {
        assert!(calculate_obv(&[]).is_empty());
    }

    #[test]
    fn obv_seeded_at_zero() {
        let out = calculate_obv(&[candle(100.0, 50.0)]);
        assert_eq!(out, vec![0.0]);
    }

    #[test]
    fn obv_rising_closes_accumulate() {
        let candles: Vec<Candle> = (1..=5).map(|i| candle(100.0 + i as f64, 10.0)).collect();
        let out = calculate_obv(&candles);
        assert_eq!(out, vec![0.0, 10.0, 20.0, 30.0, 40.0]);
        for w in out.windows(2) {
            assert!(w[1] >= w[0]);
        }
    }

    #[test]
    fn obv_falling_closes_drain() {
        let candles: Vec<Candle> = (1..=5).rev().map(|i| candle(100.0 + i as f64, 10.0)).collect();
        let out = calculate_obv(&candles);
        assert_eq!(out, vec![0.0, -10.0, -20.0, -30.0, -40.0]);
        for w in out.windows(2) {
            assert!(w[1] <= w[0]);
        }
    }

    #[test]
    fn obv_equal_close_is_unchanged() {
        let candles = vec![candle(100.0, 10.0), candle(100.0, 99.0), candle(101.0, 5.0)];
        let out = calculate_obv(&candles);
        assert_eq!(out, vec![0.0, 0.0, 5.0]);
    }
}
