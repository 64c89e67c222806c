// =============================================================================
// Candle & session identity types
// =============================================================================

use serde::{Deserialize, Serialize};

/// A single OHLCV candle.
///
/// `open_time` is a UNIX timestamp in **seconds**, aligned to the interval
/// boundary (`open_time % interval.seconds() == 0`). Within a buffer,
/// `open_time` is strictly increasing and unique. The most recent candle is
/// mutable (extended in place by the tick aggregator) until its interval
/// boundary passes; everything before it is immutable history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub open_time: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Candle {
    /// Open a fresh candle from a single trade price.
    ///
    /// All four OHLC fields start at `price`; volume starts at zero and is
    /// accumulated by the tick aggregator as quantities arrive.
    pub fn open_at(open_time: i64, price: f64) -> Self {
        Self {
            open_time,
            open: price,
            high: price,
            low: price,
            close: price,
            volume: 0.0,
        }
    }
}

// =============================================================================
// Interval
// =============================================================================

/// Candle width. The supported grammar matches the Binance kline intervals
/// the dashboard exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Interval {
    #[serde(rename = "1m")]
    M1,
    #[serde(rename = "3m")]
    M3,
    #[serde(rename = "5m")]
    M5,
    #[serde(rename = "15m")]
    M15,
    #[serde(rename = "30m")]
    M30,
    #[serde(rename = "1h")]
    H1,
    #[serde(rename = "2h")]
    H2,
    #[serde(rename = "4h")]
    H4,
    #[serde(rename = "6h")]
    H6,
    #[serde(rename = "8h")]
    H8,
    #[serde(rename = "12h")]
    H12,
    #[serde(rename = "1d")]
    D1,
    #[serde(rename = "3d")]
    D3,
    #[serde(rename = "1w")]
    W1,
    #[serde(rename = "1M")]
    Mo1,
}

impl Interval {
    /// Candle width in seconds.
    ///
    /// `1M` uses a fixed 30-day width; the exchange aligns monthly candles to
    /// calendar months but the engine only needs a bucketing constant.
    pub fn seconds(self) -> i64 {
        match self {
            Self::M1 => 60,
            Self::M3 => 180,
            Self::M5 => 300,
            Self::M15 => 900,
            Self::M30 => 1_800,
            Self::H1 => 3_600,
            Self::H2 => 7_200,
            Self::H4 => 14_400,
            Self::H6 => 21_600,
            Self::H8 => 28_800,
            Self::H12 => 43_200,
            Self::D1 => 86_400,
            Self::D3 => 259_200,
            Self::W1 => 604_800,
            Self::Mo1 => 2_592_000,
        }
    }

    /// Wire representation (`"1m"`, `"4h"`, ...).
    pub fn as_str(self) -> &'static str {
        match self {
            Self::M1 => "1m",
            Self::M3 => "3m",
            Self::M5 => "5m",
            Self::M15 => "15m",
            Self::M30 => "30m",
            Self::H1 => "1h",
            Self::H2 => "2h",
            Self::H4 => "4h",
            Self::H6 => "6h",
            Self::H8 => "8h",
            Self::H12 => "12h",
            Self::D1 => "1d",
            Self::D3 => "3d",
            Self::W1 => "1w",
            Self::Mo1 => "1M",
        }
    }
}

impl std::str::FromStr for Interval {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "1m" => Ok(Self::M1),
            "3m" => Ok(Self::M3),
            "5m" => Ok(Self::M5),
            "15m" => Ok(Self::M15),
            "30m" => Ok(Self::M30),
            "1h" => Ok(Self::H1),
            "2h" => Ok(Self::H2),
            "4h" => Ok(Self::H4),
            "6h" => Ok(Self::H6),
            "8h" => Ok(Self::H8),
            "12h" => Ok(Self::H12),
            "1d" => Ok(Self::D1),
            "3d" => Ok(Self::D3),
            "1w" => Ok(Self::W1),
            "1M" => Ok(Self::Mo1),
            other => anyhow::bail!("unsupported interval: {other}"),
        }
    }
}

impl std::fmt::Display for Interval {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// SessionKey
// =============================================================================

/// Composite key identifying one chart session: a `(symbol, interval)` pair.
///
/// Each session owns an independent candle buffer and indicator registry;
/// switching either component is a cancel-and-replace of the whole session.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionKey {
    pub symbol: String,
    pub interval: Interval,
}

impl SessionKey {
    pub fn new(symbol: impl Into<String>, interval: Interval) -> Self {
        Self {
            symbol: symbol.into().to_uppercase(),
            interval,
        }
    }
}

impl std::fmt::Display for SessionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}@{}", self.symbol, self.interval)
    }
}

// =============================================================================
// Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interval_roundtrip() {
        for s in [
            "1m", "3m", "5m", "15m", "30m", "1h", "2h", "4h", "6h", "8h", "12h", "1d", "3d",
            "1w", "1M",
        ] {
            let iv: Interval = s.parse().unwrap();
            assert_eq!(iv.as_str(), s);
            assert!(iv.seconds() > 0);
        }
    }

    #[test]
    fn interval_rejects_unknown() {
        assert!("7m".parse::<Interval>().is_err());
        assert!("".parse::<Interval>().is_err());
    }

    #[test]
    fn interval_seconds_ordering() {
        assert_eq!(Interval::M1.seconds(), 60);
        assert_eq!(Interval::H1.seconds(), 3600);
        assert!(Interval::W1.seconds() < Interval::Mo1.seconds());
    }

    #[test]
    fn session_key_display() {
        let key = SessionKey::new("btcusdt", Interval::M5);
        assert_eq!(key.symbol, "BTCUSDT");
        assert_eq!(key.to_string(), "BTCUSDT@5m");
    }

    #[test]
    fn candle_open_at_collapses_ohlc() {
        let c = Candle::open_at(120, 42.5);
        assert_eq!(c.open, 42.5);
        assert_eq!(c.high, 42.5);
        assert_eq!(c.low, 42.5);
        assert_eq!(c.close, 42.5);
        assert_eq!(c.volume, 0.0);
    }
}
