// =============================================================================
// Indicator engine — pure dispatch from instance parameters to output series
// =============================================================================
//
// Every indicator function is pure and stateless: given the full candle
// snapshot and an instance's parameters it rebuilds the complete output from
// scratch. The interface still threads a `ComputeState` through each call so
// that any single kind can later switch to an O(1)-amortised incremental
// variant (ring-buffer sums, recurrence-only state) without changing the
// registry contract — the state is simply unused today.
//
// Raw series come back tail-aligned to the candles; this module attaches
// candle open times so differently sized lookbacks stay aligned by time.

use crate::indicators::adx::calculate_adx;
use crate::indicators::atr::calculate_atr;
use crate::indicators::bollinger::calculate_bollinger;
use crate::indicators::ema::calculate_ema;
use crate::indicators::ichimoku::calculate_ichimoku;
use crate::indicators::macd::calculate_macd;
use crate::indicators::obv::calculate_obv;
use crate::indicators::output::{
    BandPoint, BarColor, DirectionalPoint, HistogramBar, IndicatorOutput, NamedLine, SeriesPoint,
};
use crate::indicators::psar::calculate_psar;
use crate::indicators::rsi::calculate_rsi;
use crate::indicators::sma::calculate_sma;
use crate::indicators::stochastic::calculate_stochastic;
use crate::indicators::supertrend::calculate_supertrend;
use crate::indicators::vwap::calculate_vwap;
use crate::market_data::Candle;
use crate::registry::{IndicatorParams, MaSmoothing};

/// Per-instance carry-over state for future incremental recompute variants.
///
/// Deliberately empty: the default policy is a full recompute per event, and
/// no kind maintains rolling state yet.
#[derive(Debug, Clone, Copy, Default)]
pub struct ComputeState;

/// Compute one instance's complete output over the candle snapshot.
pub fn compute(
    params: &IndicatorParams,
    candles: &[Candle],
    interval_secs: i64,
    _prior: Option<&ComputeState>,
) -> (IndicatorOutput, ComputeState) {
    let output = match params {
        IndicatorParams::MovingAverage { period, smoothing } => {
            let closes = closes(candles);
            let values = match smoothing {
                MaSmoothing::Simple => calculate_sma(&closes, *period),
                MaSmoothing::Exponential => calculate_ema(&closes, *period),
            };
            IndicatorOutput::Line(tail_points(candles, &values))
        }

        IndicatorParams::Rsi { period, .. } => {
            let values = calculate_rsi(&closes(candles), *period);
            IndicatorOutput::Line(tail_points(candles, &values))
        }

        IndicatorParams::Macd { fast, slow, signal } => {
            let out = calculate_macd(&closes(candles), *fast, *slow, *signal);
            let bars = tail_points(candles, &out.histogram)
                .into_iter()
                .map(|p| HistogramBar {
                    time: p.time,
                    value: p.value,
                    color: BarColor::from_sign(p.value),
                })
                .collect();
            IndicatorOutput::Histogram {
                line: tail_points(candles, &out.macd),
                signal: tail_points(candles, &out.signal),
                bars,
            }
        }

        IndicatorParams::BollingerBands { period, mult } => {
            let bands = calculate_bollinger(&closes(candles), *period, *mult);
            let offset = candles.len() - bands.len();
            let points = bands
                .iter()
                .zip(&candles[offset..])
                .map(|(b, c)| BandPoint {
                    time: c.open_time,
                    upper: b.upper,
                    middle: b.middle,
                    lower: b.lower,
                })
                .collect();
            IndicatorOutput::Bands(points)
        }

        IndicatorParams::Stochastic {
            k_period,
            d_period,
            smooth,
        } => {
            let out = calculate_stochastic(candles, *k_period, *d_period, *smooth);
            IndicatorOutput::MultiLine(vec![
                named_line("%K", tail_points(candles, &out.k)),
                named_line("%D", tail_points(candles, &out.d)),
            ])
        }

        IndicatorParams::Atr { period } => {
            let values = calculate_atr(candles, *period);
            IndicatorOutput::Line(tail_points(candles, &values))
        }

        IndicatorParams::Vwap { band_mult } => {
            let points = calculate_vwap(candles, *band_mult)
                .iter()
                .zip(candles)
                .map(|(v, c)| BandPoint {
                    time: c.open_time,
                    upper: v.upper,
                    middle: v.vwap,
                    lower: v.lower,
                })
                .collect();
            IndicatorOutput::Bands(points)
        }

        IndicatorParams::Supertrend { period, multiplier } => {
            let out = calculate_supertrend(candles, *period, *multiplier);
            let offset = candles.len() - out.len();
            let points = out
                .iter()
                .zip(&candles[offset..])
                .map(|(p, c)| DirectionalPoint {
                    time: c.open_time,
                    value: p.value,
                    direction: p.direction,
                })
                .collect();
            IndicatorOutput::Directional(points)
        }

        IndicatorParams::Adx { period } => {
            let out = calculate_adx(candles, *period);
            IndicatorOutput::MultiLine(vec![
                named_line("ADX", tail_points(candles, &out.adx)),
                named_line("+DI", tail_points(candles, &out.plus_di)),
                named_line("-DI", tail_points(candles, &out.minus_di)),
            ])
        }

        IndicatorParams::Obv => {
            let values = calculate_obv(candles);
            IndicatorOutput::Line(tail_points(candles, &values))
        }

        IndicatorParams::ParabolicSar { step, max_af } => {
            let out = calculate_psar(candles, *step, *max_af);
            let offset = candles.len() - out.len();
            let points = out
                .iter()
                .zip(&candles[offset..])
                .map(|(p, c)| DirectionalPoint {
                    time: c.open_time,
                    value: p.value,
                    direction: p.direction,
                })
                .collect();
            IndicatorOutput::Directional(points)
        }

        IndicatorParams::Ichimoku {
            tenkan,
            kijun,
            senkou_b,
            displacement,
        } => {
            let out = calculate_ichimoku(
                candles,
                *tenkan,
                *kijun,
                *senkou_b,
                *displacement,
                interval_secs,
            );
            IndicatorOutput::MultiLine(vec![
                named_line("tenkan", out.tenkan),
                named_line("kijun", out.kijun),
                named_line("senkou_a", out.senkou_a),
                named_line("senkou_b", out.senkou_b),
                named_line("chikou", out.chikou),
            ])
        }

        IndicatorParams::EmaRibbon { periods } => {
            let closes = closes(candles);
            let lines = periods
                .iter()
                .map(|&p| {
                    let values = calculate_ema(&closes, p);
                    named_line(&format!("EMA {p}"), tail_points(candles, &values))
                })
                .collect();
            IndicatorOutput::MultiLine(lines)
        }
    };

    (output, ComputeState)
}

fn closes(candles: &[Candle]) -> Vec<f64> {
    candles.iter().map(|c| c.close).collect()
}

/// Attach candle open times to a tail-aligned value series: `values[last]`
/// belongs to the last candle.
fn tail_points(candles: &[Candle], values: &[f64]) -> Vec<SeriesPoint> {
    let offset = candles.len() - values.len();
    values
        .iter()
        .zip(&candles[offset..])
        .map(|(&value, c)| SeriesPoint {
            time: c.open_time,
            value,
        })
        .collect()
}

fn named_line(label: &str, points: Vec<SeriesPoint>) -> NamedLine {
    NamedLine {
        label: label.to_string(),
        points,
    }
}

// =============================================================================
// Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::IndicatorKind;

    fn candle(open_time: i64, close: f64) -> Candle {
        Candle {
            open_time,
            open: close,
            high: close + 1.0,
            low: close - 1.0,
            close,
            volume: 10.0,
        }
    }

    fn candles(closes: &[f64]) -> Vec<Candle> {
        closes
            .iter()
            .enumerate()
            .map(|(i, &c)| candle(i as i64 * 60, c))
            .collect()
    }

    #[test]
    fn sma_points_align_to_candle_times() {
        // closes [10,12,11,13] @ 60s, SMA(2) => 11.0@60, 11.5@120, 12.0@180.
        let candles = candles(&[10.0, 12.0, 11.0, 13.0]);
        let params = IndicatorParams::MovingAverage {
            period: 2,
            smoothing: MaSmoothing::Simple,
        };
        let (out, _) = compute(&params, &candles, 60, None);

        let IndicatorOutput::Line(points) = out else {
            panic!("expected line output");
        };
        assert_eq!(points.len(), 3);
        assert_eq!(points[0], SeriesPoint { time: 60, value: 11.0 });
        assert_eq!(points[1], SeriesPoint { time: 120, value: 11.5 });
        assert_eq!(points[2], SeriesPoint { time: 180, value: 12.0 });
    }

    #[test]
    fn insufficient_history_is_empty_not_error() {
        let candles = candles(&[10.0, 11.0]);
        for kind in [
            IndicatorKind::Rsi,
            IndicatorKind::Macd,
            IndicatorKind::BollingerBands,
            IndicatorKind::Adx,
            IndicatorKind::Supertrend,
        ] {
            let params = IndicatorParams::default_for(kind);
            let (out, _) = compute(&params, &candles, 60, None);
            assert!(out.is_empty(), "{kind} should be empty on 2 candles");
        }
    }

    #[test]
    fn macd_histogram_bars_match_line_minus_signal() {
        let closes: Vec<f64> = (0..120)
            .map(|i| 100.0 + (i as f64 * 0.4).sin() * 5.0)
            .collect();
        let candles = candles(&closes);
        let (out, _) = compute(&IndicatorParams::default_for(IndicatorKind::Macd), &candles, 60, None);

        let IndicatorOutput::Histogram { line, signal, bars } = out else {
            panic!("expected histogram output");
        };
        for bar in &bars {
            let m = line.iter().find(|p| p.time == bar.time).unwrap();
            let s = signal.iter().find(|p| p.time == bar.time).unwrap();
            assert!((bar.value - (m.value - s.value)).abs() < 1e-12);
            assert_eq!(bar.color, BarColor::from_sign(bar.value));
        }
    }

    #[test]
    fn bollinger_band_ordering_holds() {
        let closes: Vec<f64> = (0..50).map(|i| 100.0 + (i as f64 * 0.5).sin() * 8.0).collect();
        let candles = candles(&closes);
        let (out, _) = compute(
            &IndicatorParams::default_for(IndicatorKind::BollingerBands),
            &candles,
            60,
            None,
        );

        let IndicatorOutput::Bands(points) = out else {
            panic!("expected bands output");
        };
        assert!(!points.is_empty());
        for p in points {
            assert!(p.upper >= p.middle && p.middle >= p.lower);
        }
    }

    #[test]
    fn ribbon_has_one_line_per_period() {
        let closes: Vec<f64> = (0..100).map(|i| 100.0 + i as f64 * 0.1).collect();
        let candles = candles(&closes);
        let (out, _) = compute(
            &IndicatorParams::EmaRibbon {
                periods: vec![8, 13, 21, 34, 55, 89],
            },
            &candles,
            60,
            None,
        );

        let IndicatorOutput::MultiLine(lines) = out else {
            panic!("expected multi-line output");
        };
        assert_eq!(lines.len(), 6);
        assert_eq!(lines[0].label, "EMA 8");
        assert_eq!(lines[5].label, "EMA 89");
        assert_eq!(lines[0].points.len(), 100 - 8 + 1);
        assert_eq!(lines[5].points.len(), 100 - 89 + 1);
    }

    #[test]
    fn obv_covers_every_candle() {
        let candles = candles(&[10.0, 11.0, 10.5, 12.0]);
        let (out, _) = compute(&IndicatorParams::Obv, &candles, 60, None);

        let IndicatorOutput::Line(points) = out else {
            panic!("expected line output");
        };
        assert_eq!(points.len(), 4);
        assert_eq!(points[0].time, 0);
        assert_eq!(points[0].value, 0.0); // seeded at zero
    }
}
