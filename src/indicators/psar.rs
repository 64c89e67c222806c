// =============================================================================
// Parabolic SAR (stop and reverse)
// =============================================================================
//
// Tracks a trend direction, an extreme point (EP), and an acceleration
// factor (AF) that starts at `step`, grows by `step` whenever a new extreme
// is made, and is capped at `max_af`:
//
//   SAR_next = SAR + AF * (EP - SAR)
//
// The SAR is clamped against the prior one or two candles' extremes so it
// never enters the recent range. When price crosses the SAR the trend
// reverses: SAR resets to the prior EP and AF back to `step`.

use crate::market_data::Candle;

/// One SAR sample: the stop level plus the trend flag (`±1`).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PsarPoint {
    pub value: f64,
    pub direction: i8,
}

/// Compute the Parabolic SAR series for `candles`.
///
/// The first output corresponds to candle index 1 (the seed needs one prior
/// candle), so the output length is `max(0, n - 1)`.
///
/// # Edge cases
/// - Fewer than 2 candles => empty vec
/// - `step <= 0` or `max_af < step` => empty vec (degenerate acceleration)
pub fn calculate_psar(candles: &[Candle], step: f64, max_af: f64) -> Vec<PsarPoint> {
    if candles.len() < 2 || step <= 0.0 || max_af < step {
        return Vec::new();
    }

    let mut uptrend = candles[1].close >= candles[0].close;
    let mut sar = if uptrend {
        candles[0].low
    } else {
        candles[0].high
    };
    let mut ep = if uptrend {
        candles[1].high
    } else {
        candles[1].low
    };
    let mut af = step;

    let mut result = Vec::with_capacity(candles.len() - 1);
    result.push(PsarPoint {
        value: sar,
        direction: if uptrend { 1 } else { -1 },
    });

    for i in 2..candles.len() {
        sar += af * (ep - sar);

        if uptrend {
            // SAR may not rise into the prior two candles' lows.
            sar = sar.min(candles[i - 1].low).min(candles[i - 2].low);

            if candles[i].low < sar {
                // Reversal: flip down, SAR jumps to the prior extreme.
                uptrend = false;
                sar = ep;
                ep = candles[i].low;
                af = step;
            } else if candles[i].high > ep {
                ep = candles[i].high;
                af = (af + step).min(max_af);
            }
        } else {
            sar = sar.max(candles[i - 1].high).max(candles[i - 2].high);

            if candles[i].high > sar {
                uptrend = true;
                sar = ep;
                ep = candles[i].high;
                af = step;
            } else if candles[i].low < ep {
                ep = candles[i].low;
                af = (af + step).min(max_af);
            }
        }

        result.push(PsarPoint {
            value: sar,
            direction: if uptrend { 1 } else { -1 },
        });
    }

    result
}

// =============================================================================
// Unit Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;

    fn candle(high: f64, low: f64, close: f64) -> Candle {
        Candle {
            open_time: 0,
            open: close,
            high,
            low,
            close,
            volume: 1.0,
        }
    }

    fn rising(n: usize) -> Vec<Candle> {
        (0..n)
            .map(|i| {
                let base = 100.0 + i as f64 * 2.0;
                candle(base + 1.0, base - 1.0, base + 0.5)
            })
            .collect()
    }

    #[test]
    fn psar_needs_two_candles() {
        assert!(calculate_psar(&rising(1), 0.02, 0.2).is_empty());
    }

    #[test]
    fn psar_rejects_degenerate_acceleration() {
        let candles = rising(20);
        assert!(calculate_psar(&candles, 0.0, 0.2).is_empty());
        assert!(calculate_psar(&candles, 0.3, 0.2).is_empty());
    }

    #[test]
    fn psar_output_length() {
        assert_eq!(calculate_psar(&rising(30), 0.02, 0.2).len(), 29);
    }

    #[test]
    fn psar_stays_below_price_in_uptrend() {
        let candles = rising(40);
        let out = calculate_psar(&candles, 0.02, 0.2);
        for (i, p) in out.iter().enumerate() {
            assert_eq!(p.direction, 1, "uptrend flag lost at {i}");
            assert!(
                p.value <= candles[i + 1].low + 1e-9,
                "SAR {} above low at {i}",
                p.value
            );
        }
    }

    #[test]
    fn psar_stays_above_price_in_downtrend() {
        let candles: Vec<Candle> = (0..40)
            .map(|i| {
                let base = 200.0 - i as f64 * 2.0;
                candle(base + 1.0, base - 1.0, base - 0.5)
            })
            .collect();
        let out = calculate_psar(&candles, 0.02, 0.2);
        for (i, p) in out.iter().enumerate() {
            assert_eq!(p.direction, -1);
            assert!(p.value >= candles[i + 1].high - 1e-9);
        }
    }

    #[test]
    fn psar_reversal_flips_and_jumps_to_extreme() {
        // Up leg, then a hard drop through the SAR.
        let mut candles = rising(20);
        let peak = candles.last().unwrap().close;
        candles.extend((1..=10).map(|i| {
            let base = peak - i as f64 * 10.0;
            candle(base + 1.0, base - 1.0, base - 0.5)
        }));

        let out = calculate_psar(&candles, 0.02, 0.2);
        assert_eq!(out.last().unwrap().direction, -1);
        assert!(out.iter().any(|p| p.direction == 1));
    }

    #[test]
    fn psar_accelerates_toward_price() {
        // With fresh extremes every bar, the SAR-to-price gap shrinks in
        // relative terms as AF ramps up.
        let candles = rising(50);
        let out = calculate_psar(&candles, 0.02, 0.2);
        let early_gap = candles[6].low - out[5].value;
        let late_gap = candles[49].low - out[48].value;
        assert!(late_gap < early_gap, "SAR never caught up: {early_gap} vs {late_gap}");
    }
}
