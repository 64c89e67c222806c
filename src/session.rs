// =============================================================================
// ChartSession — one symbol+interval context owning buffer and registry
// =============================================================================
//
// The session is the unit of consistency: the candle buffer, the tick
// aggregator, and the indicator registry always describe the same
// symbol+interval pair. Callers mutate the session under the app-level write
// lock, so recomputes never interleave with a switch.
//
// Switching uses cancel-and-replace with an epoch counter: `switch` bumps the
// epoch and clears market data, and any in-flight history fetch started under
// an older epoch is discarded when it lands. Indicator configuration survives
// the switch; only outputs are dropped until fresh history arrives.

use tracing::{debug, info, warn};

use crate::error::{EngineError, TickRejection};
use crate::indicators::output::IndicatorOutput;
use crate::market_data::{Candle, CandleBuffer, SessionKey, Tick, TickAggregator, TickApplied};
use crate::registry::{IndicatorParams, IndicatorRegistry, InstanceId, InstanceStyle};
use crate::resolver::{resolve_all, ResolvedValue, TimeQuery};

pub struct ChartSession {
    key: SessionKey,
    epoch: u64,
    buffer: CandleBuffer,
    aggregator: TickAggregator,
    registry: IndicatorRegistry,
}

impl ChartSession {
    pub fn new(key: SessionKey, max_candles: usize) -> Self {
        let aggregator = TickAggregator::new(key.symbol.clone(), key.interval);
        Self {
            key,
            epoch: 0,
            buffer: CandleBuffer::new(max_candles),
            aggregator,
            registry: IndicatorRegistry::new(),
        }
    }

    pub fn key(&self) -> &SessionKey {
        &self.key
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn candles(&self) -> Vec<Candle> {
        self.buffer.snapshot()
    }

    pub fn candle_count(&self) -> usize {
        self.buffer.len()
    }

    pub fn registry(&self) -> &IndicatorRegistry {
        &self.registry
    }

    /// Switch to a new symbol+interval. Market data is cleared, indicator
    /// configuration survives, outputs are dropped until fresh history is
    /// seeded. Returns the new epoch for the caller's history fetch.
    pub fn switch(&mut self, key: SessionKey) -> u64 {
        info!(from = %self.key, to = %key, "switching session");
        self.aggregator = TickAggregator::new(key.symbol.clone(), key.interval);
        self.key = key;
        self.epoch += 1;
        self.buffer.clear();
        self.registry.clear_outputs();
        self.epoch
    }

    /// Seed the buffer with fetched history, unless the session has switched
    /// since the fetch started. Returns whether the seed was applied.
    pub fn seed_history(&mut self, epoch: u64, candles: Vec<Candle>) -> bool {
        if epoch != self.epoch {
            warn!(
                fetched = epoch,
                current = self.epoch,
                "discarding history fetched for a replaced session"
            );
            return false;
        }
        info!(session = %self.key, candles = candles.len(), "seeding history");
        self.buffer.seed(candles);
        self.recompute();
        true
    }

    /// Fold one live tick into the buffer and refresh indicator outputs.
    /// Rejected ticks leave buffer and outputs untouched.
    pub fn apply_tick(&mut self, tick: &Tick) -> Result<TickApplied, TickRejection> {
        let applied = self.aggregator.apply(&mut self.buffer, tick)?;
        self.recompute();
        Ok(applied)
    }

    pub fn add_indicator(
        &mut self,
        params: IndicatorParams,
        style: InstanceStyle,
    ) -> Result<InstanceId, EngineError> {
        let id = self.registry.add_instance(params, style)?;
        debug!(session = %self.key, %id, "indicator added");
        self.recompute();
        Ok(id)
    }

    pub fn update_indicator(
        &mut self,
        id: InstanceId,
        params: IndicatorParams,
    ) -> Result<(), EngineError> {
        self.registry.update_instance(id, params)?;
        self.recompute();
        Ok(())
    }

    pub fn remove_indicator(&mut self, id: InstanceId) -> Result<(), EngineError> {
        self.registry.remove_instance(id)
    }

    pub fn set_indicator_enabled(
        &mut self,
        id: InstanceId,
        enabled: bool,
    ) -> Result<(), EngineError> {
        self.registry.set_enabled(id, enabled)?;
        if enabled {
            self.recompute();
        }
        Ok(())
    }

    pub fn set_indicator_style(
        &mut self,
        id: InstanceId,
        style: InstanceStyle,
    ) -> Result<(), EngineError> {
        self.registry.set_style(id, style)
    }

    /// Point-in-time readings for every enabled instance with data.
    pub fn resolve(&self, query: TimeQuery) -> std::collections::HashMap<InstanceId, ResolvedValue> {
        resolve_all(&self.registry, query)
    }

    pub fn output(&self, id: InstanceId) -> Option<&IndicatorOutput> {
        self.registry.output(id)
    }

    fn recompute(&mut self) {
        let snapshot = self.buffer.snapshot();
        self.registry
            .recompute_all(&snapshot, self.key.interval.seconds());
    }
}

// =============================================================================
// Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;
    use crate::market_data::Interval;
    use crate::registry::IndicatorKind;

    fn session() -> ChartSession {
        ChartSession::new(SessionKey::new("BTCUSDT", Interval::M1), 500)
    }

    fn history(n: usize) -> Vec<Candle> {
        (0..n)
            .map(|i| {
                let close = 100.0 + (i as f64 * 0.3).sin() * 4.0;
                Candle {
                    open_time: i as i64 * 60,
                    open: close,
                    high: close + 1.0,
                    low: close - 1.0,
                    close,
                    volume: 10.0,
                }
            })
            .collect()
    }

    fn tick(ts: i64, price: f64) -> Tick {
        Tick {
            symbol: "BTCUSDT".to_string(),
            price,
            quantity: 1.0,
            timestamp: ts,
        }
    }

    #[test]
    fn seed_then_tick_updates_outputs() {
        let mut s = session();
        let id = s
            .add_indicator(
                IndicatorParams::default_for(IndicatorKind::Rsi),
                InstanceStyle::default(),
            )
            .unwrap();
        assert!(s.output(id).unwrap().is_empty()); // no candles yet

        assert!(s.seed_history(0, history(60)));
        let before = s.output(id).cloned().unwrap();
        assert!(!before.is_empty());

        // A tick extending the last candle moves the newest RSI value.
        s.apply_tick(&tick(59 * 60 + 30, 250.0)).unwrap();
        let after = s.output(id).cloned().unwrap();
        assert_ne!(before, after);
    }

    #[test]
    fn stale_seed_is_discarded_after_switch() {
        let mut s = session();
        let old_epoch = s.epoch();
        let new_epoch = s.switch(SessionKey::new("ETHUSDT", Interval::M5));
        assert_eq!(new_epoch, old_epoch + 1);

        // The fetch that raced the switch must not land.
        assert!(!s.seed_history(old_epoch, history(60)));
        assert_eq!(s.candle_count(), 0);

        assert!(s.seed_history(new_epoch, history(60)));
        assert_eq!(s.candle_count(), 60);
    }

    #[test]
    fn switch_keeps_config_drops_outputs() {
        let mut s = session();
        let id = s
            .add_indicator(
                IndicatorParams::default_for(IndicatorKind::Obv),
                InstanceStyle::default(),
            )
            .unwrap();
        s.seed_history(0, history(30));
        assert!(!s.output(id).unwrap().is_empty());

        let epoch = s.switch(SessionKey::new("ETHUSDT", Interval::M1));
        assert!(s.output(id).is_none());
        assert!(s.registry().get(id).is_some());

        // Fresh history repopulates the surviving instance.
        s.seed_history(epoch, history(30));
        assert!(!s.output(id).unwrap().is_empty());
    }

    #[test]
    fn ticks_for_old_symbol_rejected_after_switch() {
        let mut s = session();
        s.seed_history(0, history(10));
        s.switch(SessionKey::new("ETHUSDT", Interval::M1));

        let err = s.apply_tick(&tick(700, 100.0)).unwrap_err();
        assert!(matches!(err, TickRejection::SymbolMismatch { .. }));
    }

    #[test]
    fn resolve_latest_reads_the_newest_candle() {
        let mut s = session();
        let id = s
            .add_indicator(
                IndicatorParams::default_for(IndicatorKind::Obv),
                InstanceStyle::default(),
            )
            .unwrap();
        s.seed_history(0, history(20));

        let resolved = s.resolve(TimeQuery::Latest);
        match resolved.get(&id).unwrap() {
            ResolvedValue::Line { time, .. } => assert_eq!(*time, 19 * 60),
            other => panic!("unexpected shape {other:?}"),
        }
    }

    #[test]
    fn rejected_tick_leaves_outputs_untouched() {
        let mut s = session();
        let id = s
            .add_indicator(
                IndicatorParams::default_for(IndicatorKind::Obv),
                InstanceStyle::default(),
            )
            .unwrap();
        s.seed_history(0, history(20));
        let before = s.output(id).cloned().unwrap();

        // Stale tick, bucketed before the in-progress candle.
        let err = s.apply_tick(&tick(0, 50.0)).unwrap_err();
        assert!(matches!(err, TickRejection::StaleTick { .. }));
        assert_eq!(s.output(id).cloned().unwrap(), before);
    }
}
