// =============================================================================
// Technical Indicators Module
// =============================================================================
//
// Pure, side-effect-free indicator math plus the engine that maps instance
// parameters onto typed output series. The calculation functions know nothing
// about sessions or time: they take value/candle slices and return
// tail-aligned series; `engine::compute` attaches candle open times.

pub mod adx;
pub mod atr;
pub mod bollinger;
pub mod ema;
pub mod engine;
pub mod ichimoku;
pub mod macd;
pub mod obv;
pub mod output;
pub mod psar;
pub mod rsi;
pub mod sma;
pub mod stochastic;
pub mod supertrend;
pub mod vwap;
