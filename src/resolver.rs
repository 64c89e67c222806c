// =============================================================================
// Value resolver — point-in-time lookup across indicator outputs
// =============================================================================
//
// Answers "what did every active indicator read at time T?" for crosshair
// style queries. A query is either an exact candle open time or `latest`.
// Exact lookup never interpolates: an instance with no point at T is simply
// absent from the result, as are disabled instances and instances whose
// output is still empty.

use std::collections::HashMap;
use std::str::FromStr;

use serde::Serialize;

use crate::indicators::output::{IndicatorOutput, SeriesPoint};
use crate::registry::{IndicatorRegistry, InstanceId};

/// Lookup time: a specific candle open time, or the newest point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimeQuery {
    At(i64),
    #[default]
    Latest,
}

impl FromStr for TimeQuery {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("latest") {
            return Ok(TimeQuery::Latest);
        }
        s.parse::<i64>()
            .map(TimeQuery::At)
            .map_err(|_| format!("invalid time query '{s}': expected unix seconds or 'latest'"))
    }
}

/// One line of a multi-line indicator, resolved. Lines carry their own times
/// because displaced lines (Ichimoku) do not share the query time.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedLine {
    pub label: String,
    pub time: i64,
    pub value: f64,
}

/// A single instance's reading at the queried time, shaped like its output.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "shape", rename_all = "snake_case")]
pub enum ResolvedValue {
    Line {
        time: i64,
        value: f64,
    },
    Bands {
        time: i64,
        upper: f64,
        middle: f64,
        lower: f64,
    },
    Histogram {
        time: i64,
        #[serde(skip_serializing_if = "Option::is_none")]
        line: Option<f64>,
        #[serde(skip_serializing_if = "Option::is_none")]
        signal: Option<f64>,
        #[serde(skip_serializing_if = "Option::is_none")]
        histogram: Option<f64>,
    },
    Directional {
        time: i64,
        value: f64,
        direction: i8,
    },
    MultiLine {
        lines: Vec<ResolvedLine>,
    },
}

/// Resolve one output at the queried time. `None` when the output holds no
/// matching point.
pub fn resolve_output(output: &IndicatorOutput, query: TimeQuery) -> Option<ResolvedValue> {
    match output {
        IndicatorOutput::Line(points) => {
            let p = point_at(points, query)?;
            Some(ResolvedValue::Line {
                time: p.time,
                value: p.value,
            })
        }

        IndicatorOutput::Bands(points) => {
            let p = match query {
                TimeQuery::Latest => points.last(),
                TimeQuery::At(t) => points.iter().rev().find(|p| p.time == t),
            }?;
            Some(ResolvedValue::Bands {
                time: p.time,
                upper: p.upper,
                middle: p.middle,
                lower: p.lower,
            })
        }

        IndicatorOutput::Histogram { line, signal, bars } => {
            let bar = match query {
                TimeQuery::Latest => bars.last(),
                TimeQuery::At(t) => bars.iter().rev().find(|b| b.time == t),
            };
            let line_pt = point_at(line, query);
            let signal_pt = point_at(signal, query);

            let time = bar
                .map(|b| b.time)
                .or(line_pt.map(|p| p.time))
                .or(signal_pt.map(|p| p.time))?;
            Some(ResolvedValue::Histogram {
                time,
                line: line_pt.map(|p| p.value),
                signal: signal_pt.map(|p| p.value),
                histogram: bar.map(|b| b.value),
            })
        }

        IndicatorOutput::Directional(points) => {
            let p = match query {
                TimeQuery::Latest => points.last(),
                TimeQuery::At(t) => points.iter().rev().find(|p| p.time == t),
            }?;
            Some(ResolvedValue::Directional {
                time: p.time,
                value: p.value,
                direction: p.direction,
            })
        }

        IndicatorOutput::MultiLine(lines) => {
            let resolved: Vec<ResolvedLine> = lines
                .iter()
                .filter_map(|l| {
                    point_at(&l.points, query).map(|p| ResolvedLine {
                        label: l.label.clone(),
                        time: p.time,
                        value: p.value,
                    })
                })
                .collect();
            (!resolved.is_empty()).then_some(ResolvedValue::MultiLine { lines: resolved })
        }
    }
}

/// Resolve every enabled instance with a matching point. Instances without
/// one (disabled, empty output, no point at T) are omitted.
pub fn resolve_all(
    registry: &IndicatorRegistry,
    query: TimeQuery,
) -> HashMap<InstanceId, ResolvedValue> {
    registry
        .outputs()
        .iter()
        .filter_map(|(&id, output)| resolve_output(output, query).map(|v| (id, v)))
        .collect()
}

fn point_at(points: &[SeriesPoint], query: TimeQuery) -> Option<&SeriesPoint> {
    match query {
        TimeQuery::Latest => points.last(),
        TimeQuery::At(t) => points.iter().rev().find(|p| p.time == t),
    }
}
