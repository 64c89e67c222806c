// =============================================================================
// Bollinger Bands
// =============================================================================
//
// middle = SMA(period) of the closes
// upper  = middle + k * σ
// lower  = middle - k * σ
//
// σ is the *population* standard deviation over the same window as the SMA.
// The first band corresponds to input index `period - 1`.

/// One window's band values.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BollingerPoint {
    pub upper: f64,
    pub middle: f64,
    pub lower: f64,
}

/// Compute the Bollinger Band series for `closes`.
///
/// # Edge cases
/// - `period == 0` or `closes.len() < period` => empty vec
/// - `k <= 0` still produces bands (they collapse onto the middle at k = 0)
pub fn calculate_bollinger(closes: &[f64], period: usize, k: f64) -> Vec<BollingerPoint> {
    if period == 0 || closes.len() < period {
        return Vec::new();
    }

    closes
        .windows(period)
        .map(|w| {
            let middle = w.iter().sum::<f64>() / period as f64;
            let variance = w.iter().map(|x| (x - middle).powi(2)).sum::<f64>() / period as f64;
            let dev = k * variance.sqrt();
            BollingerPoint {
                upper: middle + dev,
                middle,
                lower: middle - dev,
            }
        })
        .collect()
}
