// =============================================================================
// Ichimoku Kinko Hyo
// =============================================================================
//
//   Tenkan   = midpoint of highest-high / lowest-low over `tenkan` candles
//   Kijun    = same midpoint over `kijun` candles
//   Senkou A = (Tenkan + Kijun) / 2, projected forward by `displacement`
//   Senkou B = midpoint over `senkou_b` candles, projected forward likewise
//   Chikou   = close, projected backward by `displacement`
//
// Projection uses the active interval width for the time shift, so projected
// points carry synthesized times beyond (or before) the buffer range. Each
// line that lacks enough history is empty on its own; the others still
// produce values.

use crate::indicators::output::SeriesPoint;
use crate::market_data::Candle;

/// The five Ichimoku lines, each with explicit point times.
#[derive(Debug, Clone, PartialEq)]
pub struct IchimokuSeries {
    pub tenkan: Vec<SeriesPoint>,
    pub kijun: Vec<SeriesPoint>,
    pub senkou_a: Vec<SeriesPoint>,
    pub senkou_b: Vec<SeriesPoint>,
    pub chikou: Vec<SeriesPoint>,
}

/// Window midpoint series: `(highestHigh + lowestLow) / 2` per window,
/// tail-aligned to the input.
fn midpoints(candles: &[Candle], period: usize) -> Vec<f64> {
    if period == 0 || candles.len() < period {
        return Vec::new();
    }
    candles
        .windows(period)
        .map(|w| {
            let highest = w.iter().map(|c| c.high).fold(f64::MIN, f64::max);
            let lowest = w.iter().map(|c| c.low).fold(f64::MAX, f64::min);
            (highest + lowest) / 2.0
        })
        .collect()
}

/// Attach candle open times to a tail-aligned value series.
fn tail_points(candles: &[Candle], values: &[f64], time_shift: i64) -> Vec<SeriesPoint> {
    let offset = candles.len() - values.len();
    values
        .iter()
        .zip(&candles[offset..])
        .map(|(&value, c)| SeriesPoint {
            time: c.open_time + time_shift,
            value,
        })
        .collect()
}

/// Compute all five Ichimoku lines.
pub fn calculate_ichimoku(
    candles: &[Candle],
    tenkan_period: usize,
    kijun_period: usize,
    senkou_b_period: usize,
    displacement: usize,
    interval_secs: i64,
) -> IchimokuSeries {
    let shift = displacement as i64 * interval_secs;

    let tenkan_vals = midpoints(candles, tenkan_period);
    let kijun_vals = midpoints(candles, kijun_period);

    // Senkou A exists where both conversion lines do; align the longer
    // series to the shorter one's tail before averaging.
    let senkou_a_vals: Vec<f64> = if tenkan_vals.is_empty() || kijun_vals.is_empty() {
        Vec::new()
    } else {
        let len = tenkan_vals.len().min(kijun_vals.len());
        let t = &tenkan_vals[tenkan_vals.len() - len..];
        let k = &kijun_vals[kijun_vals.len() - len..];
        t.iter().zip(k).map(|(a, b)| (a + b) / 2.0).collect()
    };

    let senkou_b_vals = midpoints(candles, senkou_b_period);
    let closes: Vec<f64> = candles.iter().map(|c| c.close).collect();

    IchimokuSeries {
        tenkan: tail_points(candles, &tenkan_vals, 0),
        kijun: tail_points(candles, &kijun_vals, 0),
        senkou_a: tail_points(candles, &senkou_a_vals, shift),
        senkou_b: tail_points(candles, &senkou_b_vals, shift),
        chikou: tail_points(candles, &closes, -shift),
    }
}
