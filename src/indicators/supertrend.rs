// =============================================================================
// Supertrend
// =============================================================================
//
// Basic bands around the bar midpoint:
//   basic_upper = hl2 + multiplier * ATR(period)
//   basic_lower = hl2 - multiplier * ATR(period)
//
// Bands are carried forward with prior-close rules: the upper band only
// moves down while price stays below it, the lower band only moves up while
// price stays above it. Direction flips when the close crosses the active
// band; the plotted value is the lower band in an up-trend and the upper
// band in a down-trend.

use crate::indicators::atr::calculate_atr;
use crate::market_data::Candle;

/// One supertrend sample: plotted band value plus trend flag (`±1`).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SupertrendPoint {
    pub value: f64,
    pub direction: i8,
}

/// Compute the supertrend series for `candles`.
///
/// The first output corresponds to candle index `period` (where ATR first
/// exists), so the output length is `max(0, n - period)`.
pub fn calculate_supertrend(
    candles: &[Candle],
    period: usize,
    multiplier: f64,
) -> Vec<SupertrendPoint> {
    let atr = calculate_atr(candles, period);
    if atr.is_empty() {
        return Vec::new();
    }

    let start = candles.len() - atr.len();
    let mut result = Vec::with_capacity(atr.len());

    let mut final_upper = 0.0;
    let mut final_lower = 0.0;
    let mut direction: i8 = 1;

    for (j, &atr_val) in atr.iter().enumerate() {
        let i = start + j;
        let c = &candles[i];
        let hl2 = (c.high + c.low) / 2.0;
        let basic_upper = hl2 + multiplier * atr_val;
        let basic_lower = hl2 - multiplier * atr_val;

        if j == 0 {
            final_upper = basic_upper;
            final_lower = basic_lower;
            direction = if c.close >= hl2 { 1 } else { -1 };
        } else {
            let prev_close = candles[i - 1].close;

            // Carry-forward rules.
            final_upper = if basic_upper < final_upper || prev_close > final_upper {
                basic_upper
            } else {
                final_upper
            };
            final_lower = if basic_lower > final_lower || prev_close < final_lower {
                basic_lower
            } else {
                final_lower
            };

            // Flip when the close crosses the active band.
            direction = if direction == 1 && c.close < final_lower {
                -1
            } else if direction == -1 && c.close > final_upper {
                1
            } else {
                direction
            };
        }

        let value = if direction == 1 { final_lower } else { final_upper };
        result.push(SupertrendPoint { value, direction });
    }

    result
}
