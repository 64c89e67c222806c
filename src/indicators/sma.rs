// =============================================================================
// Simple Moving Average (SMA)
// =============================================================================
//
// Windowed arithmetic mean of the closing prices. The first output value
// corresponds to input index `period - 1`; output length is
// `max(0, n - period + 1)`.

/// Compute the SMA series for `closes` with the given look-back `period`.
///
/// # Edge cases
/// - `period == 0` => empty vec
/// - `closes.len() < period` => empty vec (not enough history)
pub fn calculate_sma(closes: &[f64], period: usize) -> Vec<f64> {
    if period == 0 || closes.len() < period {
        return Vec::new();
    }

    closes
        .windows(period)
        .map(|w| w.iter().sum::<f64>() / period as f64)
        .collect()
}

// =============================================================================
// Unit Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sma_empty_input() {
        assert!(calculate_sma(&[], 5).is_empty());
    }

    #[test]
    fn sma_period_zero() {
        assert!(calculate_sma(&[1.0, 2.0, 3.0], 0).is_empty());
    }

    #[test]
    fn sma_insufficient_data() {
        assert!(calculate_sma(&[1.0, 2.0], 3).is_empty());
    }

    #[test]
    fn sma_output_length() {
        for period in 1..=10 {
            let closes: Vec<f64> = (1..=10).map(|x| x as f64).collect();
            let sma = calculate_sma(&closes, period);
            assert_eq!(sma.len(), closes.len() - period + 1);
        }
    }

    #[test]
    fn sma_first_value_is_mean_of_first_window() {
        let closes = vec![2.0, 4.0, 9.0, 5.0];
        let sma = calculate_sma(&closes, 3);
        assert!((sma[0] - 5.0).abs() < 1e-10);
        assert!((sma[1] - 6.0).abs() < 1e-10);
    }

    #[test]
    fn sma_known_two_period_series() {
        // closes [10, 12, 11, 13], period 2 => [11.0, 11.5, 12.0]
        let closes = vec![10.0, 12.0, 11.0, 13.0];
        let sma = calculate_sma(&closes, 2);
        assert_eq!(sma.len(), 3);
        assert!((sma[0] - 11.0).abs() < 1e-10);
        assert!((sma[1] - 11.5).abs() < 1e-10);
        assert!((sma[2] - 12.0).abs() < 1e-10);
    }

    #[test]
    fn sma_period_one_is_identity() {
        let closes = vec![3.0, 1.0, 4.0];
        assert_eq!(calculate_sma(&closes, 1), closes);
    }
}
