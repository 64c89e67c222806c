// =============================================================================
// Moving Average Convergence Divergence (MACD)
// =============================================================================
//
//   macd      = EMA(fast) - EMA(slow), aligned by time
//   signal    = EMA(signal_period) over the macd line
//   histogram = macd - signal, coloured by sign
//
// EMA(fast) starts `slow - fast` candles earlier than EMA(slow), so the fast
// series is offset before subtraction. All three returned series are
// tail-aligned to the input: the last element of each corresponds to the
// last close.

use crate::indicators::ema::calculate_ema;

/// The three MACD series. Lengths differ (`histogram` is the shortest); each
/// is tail-aligned to the input closes.
#[derive(Debug, Clone, PartialEq)]
pub struct MacdSeries {
    pub macd: Vec<f64>,
    pub signal: Vec<f64>,
    pub histogram: Vec<f64>,
}

impl MacdSeries {
    fn empty() -> Self {
        Self {
            macd: Vec::new(),
            signal: Vec::new(),
            histogram: Vec::new(),
        }
    }
}

/// Compute MACD over `closes`.
///
/// # Edge cases
/// - `fast == 0`, `slow == 0`, or `fast >= slow` => empty series
/// - Not enough closes for the slow EMA => empty series
/// - Enough for the macd line but not the signal EMA => macd only
pub fn calculate_macd(
    closes: &[f64],
    fast: usize,
    slow: usize,
    signal_period: usize,
) -> MacdSeries {
    if fast == 0 || slow == 0 || signal_period == 0 || fast >= slow {
        return MacdSeries::empty();
    }

    let ema_fast = calculate_ema(closes, fast);
    let ema_slow = calculate_ema(closes, slow);
    if ema_slow.is_empty() {
        return MacdSeries::empty();
    }

    // The fast series is longer; skip its head so both end on the same close.
    let offset = ema_fast.len() - ema_slow.len();
    let macd: Vec<f64> = ema_fast[offset..]
        .iter()
        .zip(ema_slow.iter())
        .map(|(f, s)| f - s)
        .collect();

    let signal = calculate_ema(&macd, signal_period);

    let offset = macd.len() - signal.len();
    let histogram: Vec<f64> = macd[offset..]
        .iter()
        .zip(signal.iter())
        .map(|(m, s)| m - s)
        .collect();

    MacdSeries {
        macd,
        signal,
        histogram,
    }
}
