// =============================================================================
// Average Directional Index (ADX)
// =============================================================================
//
// Quantifies trend strength regardless of direction.
//
//   1. +DM / -DM per bar from consecutive high/low deltas — only the larger,
//      positive one counts.
//   2. True Range per bar.
//   3. Wilder smoothing (period) of +DM, -DM, TR.
//   4. +DI = smoothed(+DM) / smoothed(TR) * 100, -DI likewise.
//   5. DX  = |+DI - -DI| / (+DI + -DI) * 100
//   6. ADX = Wilder-smoothed average of DX.
//
// A bar with zero smoothed TR (totally flat market) yields DI = DX = 0
// rather than aborting the series.

use crate::market_data::Candle;

/// The ADX line plus its two directional components. Lengths differ: the DI
/// series start `period` candles in, ADX a further `period - 1` later. Each
/// is tail-aligned to the input candles.
#[derive(Debug, Clone, PartialEq)]
pub struct AdxSeries {
    pub adx: Vec<f64>,
    pub plus_di: Vec<f64>,
    pub minus_di: Vec<f64>,
}

impl AdxSeries {
    fn empty() -> Self {
        Self {
            adx: Vec::new(),
            plus_di: Vec::new(),
            minus_di: Vec::new(),
        }
    }
}

/// Compute the full ADX / +DI / -DI series for `candles`.
///
/// # Edge cases
/// - `period == 0` => empty series
/// - Fewer than `2 * period + 1` candles => empty series (need `period` bars
///   to seed the DM/TR smoothing and `period` DX values to seed the ADX)
pub fn calculate_adx(candles: &[Candle], period: usize) -> AdxSeries {
    if period == 0 || candles.len() < 2 * period + 1 {
        return AdxSeries::empty();
    }

    let period_f = period as f64;
    let n = candles.len();
    let bar_count = n - 1;

    // Raw +DM, -DM, TR per bar transition.
    let mut plus_dm = Vec::with_capacity(bar_count);
    let mut minus_dm = Vec::with_capacity(bar_count);
    let mut tr_vals = Vec::with_capacity(bar_count);

    for w in candles.windows(2) {
        let (prev, cur) = (&w[0], &w[1]);

        let tr = (cur.high - cur.low)
            .max((cur.high - prev.close).abs())
            .max((cur.low - prev.close).abs());

        let up_move = cur.high - prev.high;
        let down_move = prev.low - cur.low;

        plus_dm.push(if up_move > down_move && up_move > 0.0 {
            up_move
        } else {
            0.0
        });
        minus_dm.push(if down_move > up_move && down_move > 0.0 {
            down_move
        } else {
            0.0
        });
        tr_vals.push(tr);
    }

    // Wilder running sums, seeded over the first `period` bars.
    let mut smooth_plus_dm: f64 = plus_dm[..period].iter().sum();
    let mut smooth_minus_dm: f64 = minus_dm[..period].iter().sum();
    let mut smooth_tr: f64 = tr_vals[..period].iter().sum();

    let mut plus_di_series = Vec::with_capacity(bar_count - period + 1);
    let mut minus_di_series = Vec::with_capacity(bar_count - period + 1);
    let mut dx_values = Vec::with_capacity(bar_count - period + 1);

    let (pdi, mdi, dx) = directional_values(smooth_plus_dm, smooth_minus_dm, smooth_tr);
    plus_di_series.push(pdi);
    minus_di_series.push(mdi);
    dx_values.push(dx);

    for i in period..bar_count {
        smooth_plus_dm = smooth_plus_dm - smooth_plus_dm / period_f + plus_dm[i];
        smooth_minus_dm = smooth_minus_dm - smooth_minus_dm / period_f + minus_dm[i];
        smooth_tr = smooth_tr - smooth_tr / period_f + tr_vals[i];

        let (pdi, mdi, dx) = directional_values(smooth_plus_dm, smooth_minus_dm, smooth_tr);
        plus_di_series.push(pdi);
        minus_di_series.push(mdi);
        dx_values.push(dx);
    }

    // ADX: SMA seed over the first `period` DX values, then Wilder smoothing.
    let mut adx = dx_values[..period].iter().sum::<f64>() / period_f;
    let mut adx_series = Vec::with_capacity(dx_values.len() - period + 1);
    adx_series.push(adx);

    for &dx in &dx_values[period..] {
        adx = (adx * (period_f - 1.0) + dx) / period_f;
        adx_series.push(adx);
    }

    AdxSeries {
        adx: adx_series,
        plus_di: plus_di_series,
        minus_di: minus_di_series,
    }
}

/// (+DI, -DI, DX) from the smoothed sums. All zero when TR is zero.
fn directional_values(smooth_plus_dm: f64, smooth_minus_dm: f64, smooth_tr: f64) -> (f64, f64, f64) {
    if smooth_tr == 0.0 {
        return (0.0, 0.0, 0.0);
    }

    let plus_di = smooth_plus_dm / smooth_tr * 100.0;
    let minus_di = smooth_minus_dm / smooth_tr * 100.0;

    let di_sum = plus_di + minus_di;
    let dx = if di_sum == 0.0 {
        0.0
    } else {
        (plus_di - minus_di).abs() / di_sum * 100.0
    };

    (plus_di, minus_di, dx)
}
