// =============================================================================
// Average True Range (ATR) — Wilder's Smoothing Method
// =============================================================================
//
// True Range (TR) for each bar:
//   TR = max(H - L, |H - prevClose|, |L - prevClose|)
//
// ATR is the smoothed average of TR:
//   ATR_0 = SMA of the first `period` TR values
//   ATR_t = (ATR_{t-1} * (period - 1) + TR_t) / period
//
// The first ATR value corresponds to candle index `period` (every TR needs a
// previous close), so the output length is `max(0, n - period)`.

use crate::market_data::Candle;

/// True-range series: one value per candle from index 1 onwards.
///
/// A candle with a non-finite high/low/prev-close yields a NaN TR.
/// `f64::max` silently ignores NaN operands, so the inputs are guarded
/// explicitly to keep the truncation contract in [`calculate_atr`].
pub fn true_ranges(candles: &[Candle]) -> Vec<f64> {
    candles
        .windows(2)
        .map(|w| {
            let high = w[1].high;
            let low = w[1].low;
            let prev_close = w[0].close;
            if !(high.is_finite() && low.is_finite() && prev_close.is_finite()) {
                return f64::NAN;
            }
            (high - low)
                .max((high - prev_close).abs())
                .max((low - prev_close).abs())
        })
        .collect()
}

/// Compute the full ATR series for `candles` (oldest first).
///
/// # Edge cases
/// - `period == 0` => empty vec
/// - Fewer than `period + 1` candles => empty vec
/// - A non-finite intermediate value truncates the series.
pub fn calculate_atr(candles: &[Candle], period: usize) -> Vec<f64> {
    if period == 0 || candles.len() < period + 1 {
        return Vec::new();
    }

    let tr = true_ranges(candles);

    let seed: f64 = tr[..period].iter().sum::<f64>() / period as f64;
    if !seed.is_finite() {
        return Vec::new();
    }

    let period_f = period as f64;
    let mut result = Vec::with_capacity(tr.len() - period + 1);
    result.push(seed);

    let mut atr = seed;
    for &t in &tr[period..] {
        atr = (atr * (period_f - 1.0) + t) / period_f;
        if !atr.is_finite() {
            break;
        }
        result.push(atr);
    }

    result
}
