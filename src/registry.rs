// =============================================================================
// Indicator registry — instance configuration, cardinality caps, outputs
// =============================================================================
//
// Holds the set of configured indicator instances for one chart session along
// with their latest computed outputs. Parameters form a closed, typed union:
// every kind declares exactly the fields it understands, so a malformed
// payload fails at deserialization instead of at compute time.
//
// Cardinality caps per kind:
//   moving average  10
//   RSI              5
//   everything else  1 (singleton)
//
// Add/update/remove only mutate configuration; the owning session triggers
// `recompute_all` afterwards so outputs never lag the config.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::EngineError;
use crate::indicators::engine::{compute, ComputeState};
use crate::indicators::output::IndicatorOutput;
use crate::market_data::Candle;

pub type InstanceId = Uuid;

/// Indicator kind, used for cap accounting and wire payload tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndicatorKind {
    MovingAverage,
    Rsi,
    Macd,
    BollingerBands,
    Stochastic,
    Atr,
    Vwap,
    Supertrend,
    Adx,
    Obv,
    ParabolicSar,
    Ichimoku,
    EmaRibbon,
}

impl IndicatorKind {
    /// Maximum simultaneous instances of this kind in one session.
    pub fn max_instances(self) -> usize {
        match self {
            IndicatorKind::MovingAverage => 10,
            IndicatorKind::Rsi => 5,
            _ => 1,
        }
    }
}

impl fmt::Display for IndicatorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            IndicatorKind::MovingAverage => "moving average",
            IndicatorKind::Rsi => "RSI",
            IndicatorKind::Macd => "MACD",
            IndicatorKind::BollingerBands => "Bollinger bands",
            IndicatorKind::Stochastic => "stochastic",
            IndicatorKind::Atr => "ATR",
            IndicatorKind::Vwap => "VWAP",
            IndicatorKind::Supertrend => "supertrend",
            IndicatorKind::Adx => "ADX",
            IndicatorKind::Obv => "OBV",
            IndicatorKind::ParabolicSar => "parabolic SAR",
            IndicatorKind::Ichimoku => "Ichimoku",
            IndicatorKind::EmaRibbon => "EMA ribbon",
        };
        write!(f, "{name}")
    }
}

/// Averaging rule for a moving-average instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaSmoothing {
    Simple,
    Exponential,
}

fn default_ma_period() -> usize {
    20
}
fn default_ma_smoothing() -> MaSmoothing {
    MaSmoothing::Simple
}
fn default_rsi_period() -> usize {
    14
}
fn default_rsi_overbought() -> f64 {
    70.0
}
fn default_rsi_oversold() -> f64 {
    30.0
}
fn default_macd_fast() -> usize {
    12
}
fn default_macd_slow() -> usize {
    26
}
fn default_macd_signal() -> usize {
    9
}
fn default_bb_period() -> usize {
    20
}
fn default_bb_mult() -> f64 {
    2.0
}
fn default_stoch_k() -> usize {
    14
}
fn default_stoch_d() -> usize {
    3
}
fn default_stoch_smooth() -> usize {
    3
}
fn default_atr_period() -> usize {
    14
}
fn default_vwap_mult() -> f64 {
    2.0
}
fn default_st_period() -> usize {
    10
}
fn default_st_mult() -> f64 {
    3.0
}
fn default_adx_period() -> usize {
    14
}
fn default_psar_step() -> f64 {
    0.02
}
fn default_psar_max_af() -> f64 {
    0.2
}
fn default_ichimoku_tenkan() -> usize {
    9
}
fn default_ichimoku_kijun() -> usize {
    26
}
fn default_ichimoku_senkou_b() -> usize {
    52
}
fn default_ichimoku_displacement() -> usize {
    26
}
fn default_ribbon_periods() -> Vec<usize> {
    vec![8, 13, 21, 34, 55, 89]
}

/// Closed parameter union, tagged by kind. Every field has a default so a
/// bare `{"kind": "rsi"}` payload configures a standard instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum IndicatorParams {
    MovingAverage {
        #[serde(default = "default_ma_period")]
        period: usize,
        #[serde(default = "default_ma_smoothing")]
        smoothing: MaSmoothing,
    },
    Rsi {
        #[serde(default = "default_rsi_period")]
        period: usize,
        #[serde(default = "default_rsi_overbought")]
        overbought: f64,
        #[serde(default = "default_rsi_oversold")]
        oversold: f64,
    },
    Macd {
        #[serde(default = "default_macd_fast")]
        fast: usize,
        #[serde(default = "default_macd_slow")]
        slow: usize,
        #[serde(default = "default_macd_signal")]
        signal: usize,
    },
    BollingerBands {
        #[serde(default = "default_bb_period")]
        period: usize,
        #[serde(default = "default_bb_mult")]
        mult: f64,
    },
    Stochastic {
        #[serde(default = "default_stoch_k")]
        k_period: usize,
        #[serde(default = "default_stoch_d")]
        d_period: usize,
        #[serde(default = "default_stoch_smooth")]
        smooth: usize,
    },
    Atr {
        #[serde(default = "default_atr_period")]
        period: usize,
    },
    Vwap {
        #[serde(default = "default_vwap_mult")]
        band_mult: f64,
    },
    Supertrend {
        #[serde(default = "default_st_period")]
        period: usize,
        #[serde(default = "default_st_mult")]
        multiplier: f64,
    },
    Adx {
        #[serde(default = "default_adx_period")]
        period: usize,
    },
    Obv,
    ParabolicSar {
        #[serde(default = "default_psar_step")]
        step: f64,
        #[serde(default = "default_psar_max_af")]
        max_af: f64,
    },
    Ichimoku {
        #[serde(default = "default_ichimoku_tenkan")]
        tenkan: usize,
        #[serde(default = "default_ichimoku_kijun")]
        kijun: usize,
        #[serde(default = "default_ichimoku_senkou_b")]
        senkou_b: usize,
        #[serde(default = "default_ichimoku_displacement")]
        displacement: usize,
    },
    EmaRibbon {
        #[serde(default = "default_ribbon_periods")]
        periods: Vec<usize>,
    },
}

impl IndicatorParams {
    pub fn kind(&self) -> IndicatorKind {
        match self {
            IndicatorParams::MovingAverage { .. } => IndicatorKind::MovingAverage,
            IndicatorParams::Rsi { .. } => IndicatorKind::Rsi,
            IndicatorParams::Macd { .. } => IndicatorKind::Macd,
            IndicatorParams::BollingerBands { .. } => IndicatorKind::BollingerBands,
            IndicatorParams::Stochastic { .. } => IndicatorKind::Stochastic,
            IndicatorParams::Atr { .. } => IndicatorKind::Atr,
            IndicatorParams::Vwap { .. } => IndicatorKind::Vwap,
            IndicatorParams::Supertrend { .. } => IndicatorKind::Supertrend,
            IndicatorParams::Adx { .. } => IndicatorKind::Adx,
            IndicatorParams::Obv => IndicatorKind::Obv,
            IndicatorParams::ParabolicSar { .. } => IndicatorKind::ParabolicSar,
            IndicatorParams::Ichimoku { .. } => IndicatorKind::Ichimoku,
            IndicatorParams::EmaRibbon { .. } => IndicatorKind::EmaRibbon,
        }
    }

    /// Standard-parameter instance for `kind`.
    pub fn default_for(kind: IndicatorKind) -> Self {
        match kind {
            IndicatorKind::MovingAverage => IndicatorParams::MovingAverage {
                period: default_ma_period(),
                smoothing: default_ma_smoothing(),
            },
            IndicatorKind::Rsi => IndicatorParams::Rsi {
                period: default_rsi_period(),
                overbought: default_rsi_overbought(),
                oversold: default_rsi_oversold(),
            },
            IndicatorKind::Macd => IndicatorParams::Macd {
                fast: default_macd_fast(),
                slow: default_macd_slow(),
                signal: default_macd_signal(),
            },
            IndicatorKind::BollingerBands => IndicatorParams::BollingerBands {
                period: default_bb_period(),
                mult: default_bb_mult(),
            },
            IndicatorKind::Stochastic => IndicatorParams::Stochastic {
                k_period: default_stoch_k(),
                d_period: default_stoch_d(),
                smooth: default_stoch_smooth(),
            },
            IndicatorKind::Atr => IndicatorParams::Atr {
                period: default_atr_period(),
            },
            IndicatorKind::Vwap => IndicatorParams::Vwap {
                band_mult: default_vwap_mult(),
            },
            IndicatorKind::Supertrend => IndicatorParams::Supertrend {
                period: default_st_period(),
                multiplier: default_st_mult(),
            },
            IndicatorKind::Adx => IndicatorParams::Adx {
                period: default_adx_period(),
            },
            IndicatorKind::Obv => IndicatorParams::Obv,
            IndicatorKind::ParabolicSar => IndicatorParams::ParabolicSar {
                step: default_psar_step(),
                max_af: default_psar_max_af(),
            },
            IndicatorKind::Ichimoku => IndicatorParams::Ichimoku {
                tenkan: default_ichimoku_tenkan(),
                kijun: default_ichimoku_kijun(),
                senkou_b: default_ichimoku_senkou_b(),
                displacement: default_ichimoku_displacement(),
            },
            IndicatorKind::EmaRibbon => IndicatorParams::EmaRibbon {
                periods: default_ribbon_periods(),
            },
        }
    }
}

/// Display hints carried with an instance, opaque to the engine.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct InstanceStyle {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line_width: Option<f32>,
}

/// One configured indicator instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorInstance {
    pub id: InstanceId,
    #[serde(flatten)]
    pub params: IndicatorParams,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default)]
    pub style: InstanceStyle,
}

fn default_enabled() -> bool {
    true
}

/// Instance set plus latest outputs for one session.
#[derive(Debug, Default)]
pub struct IndicatorRegistry {
    instances: Vec<IndicatorInstance>,
    outputs: HashMap<InstanceId, IndicatorOutput>,
    states: HashMap<InstanceId, ComputeState>,
}

impl IndicatorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an instance, enforcing the per-kind cap. Existing instances are
    /// untouched on failure.
    pub fn add_instance(
        &mut self,
        params: IndicatorParams,
        style: InstanceStyle,
    ) -> Result<InstanceId, EngineError> {
        let kind = params.kind();
        let limit = kind.max_instances();
        let count = self
            .instances
            .iter()
            .filter(|i| i.params.kind() == kind)
            .count();
        if count >= limit {
            return Err(EngineError::CapacityExceeded { kind, limit });
        }

        let id = Uuid::new_v4();
        self.instances.push(IndicatorInstance {
            id,
            params,
            enabled: true,
            style,
        });
        Ok(id)
    }

    pub fn remove_instance(&mut self, id: InstanceId) -> Result<(), EngineError> {
        let pos = self
            .instances
            .iter()
            .position(|i| i.id == id)
            .ok_or(EngineError::UnknownInstance(id))?;
        self.instances.remove(pos);
        self.outputs.remove(&id);
        self.states.remove(&id);
        Ok(())
    }

    /// Replace an instance's parameters in place. Changing the kind is
    /// allowed as long as the target kind's cap still holds without this
    /// instance counted.
    pub fn update_instance(
        &mut self,
        id: InstanceId,
        params: IndicatorParams,
    ) -> Result<(), EngineError> {
        let new_kind = params.kind();
        let existing = self
            .instances
            .iter()
            .find(|i| i.id == id)
            .ok_or(EngineError::UnknownInstance(id))?;

        if existing.params.kind() != new_kind {
            let limit = new_kind.max_instances();
            let count = self
                .instances
                .iter()
                .filter(|i| i.id != id && i.params.kind() == new_kind)
                .count();
            if count >= limit {
                return Err(EngineError::CapacityExceeded {
                    kind: new_kind,
                    limit,
                });
            }
        }

        let instance = self
            .instances
            .iter_mut()
            .find(|i| i.id == id)
            .ok_or(EngineError::UnknownInstance(id))?;
        instance.params = params;
        self.states.remove(&id);
        Ok(())
    }

    /// Toggle an instance. Disabling drops its output immediately but keeps
    /// the configuration for later re-enable.
    pub fn set_enabled(&mut self, id: InstanceId, enabled: bool) -> Result<(), EngineError> {
        let instance = self
            .instances
            .iter_mut()
            .find(|i| i.id == id)
            .ok_or(EngineError::UnknownInstance(id))?;
        instance.enabled = enabled;
        if !enabled {
            self.outputs.remove(&id);
            self.states.remove(&id);
        }
        Ok(())
    }

    pub fn set_style(&mut self, id: InstanceId, style: InstanceStyle) -> Result<(), EngineError> {
        let instance = self
            .instances
            .iter_mut()
            .find(|i| i.id == id)
            .ok_or(EngineError::UnknownInstance(id))?;
        instance.style = style;
        Ok(())
    }

    /// Recompute every enabled instance over the candle snapshot. Disabled
    /// instances contribute no output.
    pub fn recompute_all(&mut self, candles: &[Candle], interval_secs: i64) {
        for instance in &self.instances {
            if !instance.enabled {
                continue;
            }
            let prior = self.states.get(&instance.id);
            let (output, state) = compute(&instance.params, candles, interval_secs, prior);
            self.outputs.insert(instance.id, output);
            self.states.insert(instance.id, state);
        }
    }

    /// Drop all computed outputs, keeping the instance configuration. Used
    /// when the session switches symbol or interval.
    pub fn clear_outputs(&mut self) {
        self.outputs.clear();
        self.states.clear();
    }

    pub fn instances(&self) -> &[IndicatorInstance] {
        &self.instances
    }

    pub fn get(&self, id: InstanceId) -> Option<&IndicatorInstance> {
        self.instances.iter().find(|i| i.id == id)
    }

    pub fn outputs(&self) -> &HashMap<InstanceId, IndicatorOutput> {
        &self.outputs
    }

    pub fn output(&self, id: InstanceId) -> Option<&IndicatorOutput> {
        self.outputs.get(&id)
    }
}
