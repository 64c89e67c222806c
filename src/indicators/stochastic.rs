// =============================================================================
// Stochastic Oscillator
// =============================================================================
//
// raw %K   = (close - lowestLow) / (highestHigh - lowestLow) * 100
//            over `k_period` candles; 50 when the range is degenerate.
// %K       = SMA(smooth) of raw %K  (the smoothed series is what the chart
//            displays as "%K")
// %D       = SMA(d_period) of the smoothed %K
//
// Both returned series are tail-aligned to the input candles.

use crate::indicators::sma::calculate_sma;
use crate::market_data::Candle;

/// Smoothed %K and %D, tail-aligned to the input (lengths differ).
#[derive(Debug, Clone, PartialEq)]
pub struct StochasticSeries {
    pub k: Vec<f64>,
    pub d: Vec<f64>,
}

/// Compute the stochastic oscillator over `candles`.
///
/// # Edge cases
/// - Any zero period => empty series
/// - Fewer candles than `k_period` => empty series
/// - Zero high-low range in a window => raw %K of 50 (neutral)
pub fn calculate_stochastic(
    candles: &[Candle],
    k_period: usize,
    d_period: usize,
    smooth: usize,
) -> StochasticSeries {
    if k_period == 0 || d_period == 0 || smooth == 0 || candles.len() < k_period {
        return StochasticSeries {
            k: Vec::new(),
            d: Vec::new(),
        };
    }

    let raw_k: Vec<f64> = candles
        .windows(k_period)
        .map(|w| {
            let highest = w.iter().map(|c| c.high).fold(f64::MIN, f64::max);
            let lowest = w.iter().map(|c| c.low).fold(f64::MAX, f64::min);
            let range = highest - lowest;
            if range == 0.0 {
                50.0
            } else {
                (w[k_period - 1].close - lowest) / range * 100.0
            }
        })
        .collect();

    let k = calculate_sma(&raw_k, smooth);
    let d = calculate_sma(&k, d_period);

    StochasticSeries { k, d }
}
