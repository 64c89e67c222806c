// =============================================================================
// Relative Strength Index (RSI) — Wilder's Smoothing
// =============================================================================
//
// Step 1 — Deltas of consecutive closes, split into gains and losses.
// Step 2 — Seed average gain / loss with the simple mean of the first
//          `period` deltas.
// Step 3 — Wilder smoothing for the rest:
//            avg = (avg * (period - 1) + new) / period
// Step 4 — RS  = avg_gain / avg_loss
//          RSI = 100 - 100 / (1 + RS)
//
// When avg_loss is zero (only gains in the window) RSI is 100; when there is
// no movement at all the value is a neutral 50.

/// Compute the full RSI series for `closes` and `period`.
///
/// The first output value consumes the first `period` deltas, so it
/// corresponds to input index `period` and the output length is
/// `max(0, n - period)`. All values lie in `[0, 100]`.
///
/// # Edge cases
/// - `period == 0` => empty vec
/// - `closes.len() < period + 1` => empty vec (need `period` deltas)
/// - A non-finite intermediate value truncates the series.
pub fn calculate_rsi(closes: &[f64], period: usize) -> Vec<f64> {
    if period == 0 || closes.len() < period + 1 {
        return Vec::new();
    }

    let period_f = period as f64;

    let gain_of = |delta: f64| if delta > 0.0 { delta } else { 0.0 };
    let loss_of = |delta: f64| if delta < 0.0 { -delta } else { 0.0 };

    // Seed with the simple mean of the first `period` up/down moves.
    let mut avg_gain = 0.0;
    let mut avg_loss = 0.0;
    for w in closes[..=period].windows(2) {
        let delta = w[1] - w[0];
        avg_gain += gain_of(delta);
        avg_loss += loss_of(delta);
    }
    avg_gain /= period_f;
    avg_loss /= period_f;

    let mut result = Vec::with_capacity(closes.len() - period);
    match rsi_value(avg_gain, avg_loss) {
        Some(v) => result.push(v),
        None => return Vec::new(),
    }

    // Wilder smoothing for the remaining deltas.
    for w in closes[period..].windows(2) {
        let delta = w[1] - w[0];
        avg_gain = (avg_gain * (period_f - 1.0) + gain_of(delta)) / period_f;
        avg_loss = (avg_loss * (period_f - 1.0) + loss_of(delta)) / period_f;

        match rsi_value(avg_gain, avg_loss) {
            Some(v) => result.push(v),
            None => break,
        }
    }

    result
}

/// Convert smoothed average gain / loss into an RSI value in [0, 100].
fn rsi_value(avg_gain: f64, avg_loss: f64) -> Option<f64> {
    let rsi = if avg_loss == 0.0 && avg_gain == 0.0 {
        50.0 // No movement at all — neutral.
    } else if avg_loss == 0.0 {
        100.0
    } else {
        let rs = avg_gain / avg_loss;
        100.0 - 100.0 / (1.0 + rs)
    };

    rsi.is_finite().then_some(rsi)
}
