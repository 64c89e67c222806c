pub mod candle;
pub mod candle_buffer;
pub mod history;
pub mod stream;
pub mod tick;

// Re-export the core data types for convenient access
// (e.g. `use crate::market_data::Candle`).
pub use candle::{Candle, Interval, SessionKey};
pub use candle_buffer::CandleBuffer;
pub use tick::{Tick, TickAggregator, TickApplied};
