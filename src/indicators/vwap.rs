// =============================================================================
// Volume-Weighted Average Price (VWAP) with deviation bands
// =============================================================================
//
// vwap_i = Σ(typical_j * volume_j) / Σ(volume_j) over j = 0..=i — cumulative
// over the entire visible buffer, no daily reset.
//
// band_i = vwap_i ± k * popStdDev(typical_j - vwap_i) over the same growing
// prefix. The prefix stddev is recomputed per point (O(n²)); fine at the
// buffer caps in use. TODO: switch to a running sum of squares if the cap is
// ever raised above 1000.

use crate::market_data::Candle;

/// One VWAP sample with its deviation band.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VwapPoint {
    pub upper: f64,
    pub vwap: f64,
    pub lower: f64,
}

/// Compute the VWAP band series over `candles`. Output length equals input
/// length; an empty input yields an empty series.
///
/// When the cumulative volume of a prefix is zero the typical price itself
/// stands in for the VWAP (degenerate but defined).
pub fn calculate_vwap(candles: &[Candle], band_mult: f64) -> Vec<VwapPoint> {
    let typical: Vec<f64> = candles
        .iter()
        .map(|c| (c.high + c.low + c.close) / 3.0)
        .collect();

    let mut cum_pv = 0.0;
    let mut cum_vol = 0.0;

    let mut result = Vec::with_capacity(candles.len());
    for (i, candle) in candles.iter().enumerate() {
        cum_pv += typical[i] * candle.volume;
        cum_vol += candle.volume;

        let vwap = if cum_vol > 0.0 {
            cum_pv / cum_vol
        } else {
            typical[i]
        };

        // Population stddev of typical-price deviations over the prefix.
        let count = (i + 1) as f64;
        let variance = typical[..=i]
            .iter()
            .map(|tp| (tp - vwap).powi(2))
            .sum::<f64>()
            / count;
        let dev = band_mult * variance.sqrt();

        result.push(VwapPoint {
            upper: vwap + dev,
            vwap,
            lower: vwap - dev,
        });
    }

    result
}
