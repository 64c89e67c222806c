// =============================================================================
// Indicator output shapes
// =============================================================================
//
// Every enabled indicator instance owns exactly one `IndicatorOutput`, fully
// replaced (never patched) on each recompute. All points carry the open time
// of the candle they belong to, so series with different lookback lengths
// stay aligned by time rather than by index.

use serde::Serialize;

/// One `(time, value)` sample of a line series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SeriesPoint {
    pub time: i64,
    pub value: f64,
}

/// One sample of a volatility band (upper/middle/lower share a time).
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BandPoint {
    pub time: i64,
    pub upper: f64,
    pub middle: f64,
    pub lower: f64,
}

/// Sign-derived colour of a histogram bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BarColor {
    Up,
    Down,
}

impl BarColor {
    pub fn from_sign(value: f64) -> Self {
        if value >= 0.0 {
            Self::Up
        } else {
            Self::Down
        }
    }
}

/// One histogram bar.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HistogramBar {
    pub time: i64,
    pub value: f64,
    pub color: BarColor,
}

/// One sample of a directional series (value plus a ±1 trend flag).
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DirectionalPoint {
    pub time: i64,
    pub value: f64,
    /// `1` for up-trend, `-1` for down-trend.
    pub direction: i8,
}

/// One labelled line of a multi-line output (Ichimoku, ribbon, ADX/DI).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NamedLine {
    pub label: String,
    pub points: Vec<SeriesPoint>,
}

/// Tagged union of output shapes.
///
/// `Histogram` carries the two lines it is derived from alongside the bars,
/// since the chart draws MACD line, signal line, and histogram in one pane.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "shape", content = "data", rename_all = "snake_case")]
pub enum IndicatorOutput {
    Line(Vec<SeriesPoint>),
    Bands(Vec<BandPoint>),
    Histogram {
        line: Vec<SeriesPoint>,
        signal: Vec<SeriesPoint>,
        bars: Vec<HistogramBar>,
    },
    Directional(Vec<DirectionalPoint>),
    MultiLine(Vec<NamedLine>),
}

impl IndicatorOutput {
    /// Whether the output holds no points at all (insufficient history).
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Line(points) => points.is_empty(),
            Self::Bands(points) => points.is_empty(),
            Self::Histogram { line, signal, bars } => {
                line.is_empty() && signal.is_empty() && bars.is_empty()
            }
            Self::Directional(points) => points.is_empty(),
            Self::MultiLine(lines) => lines.iter().all(|l| l.points.is_empty()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bar_color_from_sign() {
        assert_eq!(BarColor::from_sign(1.5), BarColor::Up);
        assert_eq!(BarColor::from_sign(0.0), BarColor::Up);
        assert_eq!(BarColor::from_sign(-0.1), BarColor::Down);
    }

    #[test]
    fn empty_detection() {
        assert!(IndicatorOutput::Line(vec![]).is_empty());
        assert!(IndicatorOutput::MultiLine(vec![NamedLine {
            label: "a".into(),
            points: vec![],
        }])
        .is_empty());
        assert!(!IndicatorOutput::Line(vec![SeriesPoint { time: 0, value: 1.0 }]).is_empty());
    }

    #[test]
    fn output_serialises_with_shape_tag() {
        let out = IndicatorOutput::Line(vec![SeriesPoint { time: 60, value: 2.0 }]);
        let json = serde_json::to_value(&out).unwrap();
        assert_eq!(json["shape"], "line");
        assert_eq!(json["data"][0]["time"], 60);
    }
}
