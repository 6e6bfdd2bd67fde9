use std::fmt;
use std::str::FromStr;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ConfigError;

/// Reward/observation strategy family.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum StrategyKind {
    /// Dual moving-average deviation regime (5-float observation).
    DualMa,
    /// Donchian channel regime (9-float observation).
    Donchian,
}

impl FromStr for StrategyKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "DUAL_MA" | "A" => Ok(StrategyKind::DualMa),
            "DONCHIAN_CHANNEL" | "B" => Ok(StrategyKind::Donchian),
            _ => Err(ConfigError::UnknownStrategy(s.to_string())),
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StrategyKind::DualMa => f.write_str("DUAL_MA"),
            StrategyKind::Donchian => f.write_str("DONCHIAN_CHANNEL"),
        }
    }
}

/// How a raw action value from the agent is decoded.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ActionMode {
    /// Integer actions: 0 long, 1 short, else hold.
    Discrete,
    /// One float in [-1, 1] with a dead band around zero.
    Continuous,
}

impl FromStr for ActionMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "discrete" | "discrete-3" | "default" => Ok(ActionMode::Discrete),
            "continuous" | "continuous-1" | "box" => Ok(ActionMode::Continuous),
            _ => Err(ConfigError::UnknownActionMode(s.to_string())),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrokerConfig {
    pub starting_balance: f64,
    pub leverage: f64,
    pub max_order: u32,
    pub minimum_lot: f64,
    pub commission_trade: f64,
    pub commission_funding: f64,
    pub is_long_only: bool,
    pub is_random_inventory: bool,
    /// Reserved. Parsed and validated, no behavior attached.
    pub is_scalping: bool,
    pub strategy_type: String,
    pub action_mode: String,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            starting_balance: 1000.0,
            leverage: 5.0,
            max_order: 10,
            minimum_lot: 10.0,
            commission_trade: 0.0003,
            commission_funding: 0.0001,
            is_long_only: false,
            is_random_inventory: false,
            is_scalping: false,
            strategy_type: "DUAL_MA".to_string(),
            action_mode: "discrete".to_string(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EpisodeConfig {
    /// Episode ends once max drawdown exceeds this fraction.
    pub max_drawdown_limit: f64,
    /// Funding is charged every N steps; 0 disables it.
    pub funding_interval_steps: u64,
}

impl Default for EpisodeConfig {
    fn default() -> Self {
        Self {
            max_drawdown_limit: 0.5,
            funding_interval_steps: 0,
        }
    }
}

/// Market-row column names.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldsConfig {
    pub price: String,
    pub mark: String,
    pub deviation: String,
    pub upper_channel: String,
    pub lower_channel: String,
    pub upper_shift: String,
    pub lower_shift: String,
    pub upper_shift_5: String,
    pub lower_shift_5: String,
}

impl Default for FieldsConfig {
    fn default() -> Self {
        Self {
            price: "close".to_string(),
            mark: "SMA5".to_string(),
            deviation: "V3".to_string(),
            upper_channel: "DC_UPPER".to_string(),
            lower_channel: "DC_LOWER".to_string(),
            upper_shift: "DC_UPPER_CHANGES".to_string(),
            lower_shift: "DC_LOWER_CHANGES".to_string(),
            upper_shift_5: "DC_UPPER_CHANGES_5_ROW".to_string(),
            lower_shift_5: "DC_LOWER_CHANGES_5_ROW".to_string(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecordsConfig {
    pub enabled: bool,
    /// Capacity of the recent equity / inventory / price windows.
    pub window: usize,
    pub equity_curve: usize,
    /// Capacity of the recent non-idle fill window.
    pub fills: usize,
}

impl Default for RecordsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            window: 100,
            equity_curve: 86_400,
            fills: 10,
        }
    }
}

/// Typed simulator configuration. Every key has a default.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub broker: BrokerConfig,
    pub episode: EpisodeConfig,
    pub fields: FieldsConfig,
    pub records: RecordsConfig,
}

impl SimConfig {
    /// Deserialize from a merged config document (see `load_layered_yaml`).
    pub fn from_json(v: &Value) -> Result<Self> {
        let cfg: SimConfig =
            serde_json::from_value(v.clone()).context("config does not match simulator schema")?;
        Ok(cfg)
    }

    pub fn strategy_kind(&self) -> Result<StrategyKind, ConfigError> {
        self.broker.strategy_type.parse()
    }

    pub fn action_mode(&self) -> Result<ActionMode, ConfigError> {
        self.broker.action_mode.parse()
    }

    /// Reject names and numbers the simulator cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.strategy_kind()?;
        self.action_mode()?;

        let b = &self.broker;
        if !(b.starting_balance.is_finite() && b.starting_balance > 0.0) {
            return Err(ConfigError::invalid("broker.starting_balance", "must be > 0"));
        }
        if !(b.leverage.is_finite() && b.leverage >= 1.0) {
            return Err(ConfigError::invalid("broker.leverage", "must be >= 1"));
        }
        // signed inventory is an i32
        if b.max_order < 1 || b.max_order > i32::MAX as u32 {
            return Err(ConfigError::invalid(
                "broker.max_order",
                "must be in [1, 2147483647]",
            ));
        }
        if !(b.minimum_lot.is_finite() && b.minimum_lot >= 0.0) {
            return Err(ConfigError::invalid("broker.minimum_lot", "must be >= 0"));
        }
        if !(b.commission_trade.is_finite() && (0.0..1.0).contains(&b.commission_trade)) {
            return Err(ConfigError::invalid(
                "broker.commission_trade",
                "must be a fraction in [0, 1)",
            ));
        }
        if !(b.commission_funding.is_finite() && b.commission_funding >= 0.0) {
            return Err(ConfigError::invalid("broker.commission_funding", "must be >= 0"));
        }

        let dd = self.episode.max_drawdown_limit;
        if !(dd.is_finite() && dd > 0.0 && dd <= 1.0) {
            return Err(ConfigError::invalid(
                "episode.max_drawdown_limit",
                "must be in (0, 1]",
            ));
        }

        if self.records.enabled && (self.records.window == 0 || self.records.fills == 0) {
            return Err(ConfigError::invalid(
                "records",
                "window and fills must be >= 1 when recording",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strategy_aliases_parse() {
        assert_eq!("A".parse::<StrategyKind>(), Ok(StrategyKind::DualMa));
        assert_eq!("dual_ma".parse::<StrategyKind>(), Ok(StrategyKind::DualMa));
        assert_eq!("B".parse::<StrategyKind>(), Ok(StrategyKind::Donchian));
        assert_eq!(
            "DONCHIAN_CHANNEL".parse::<StrategyKind>(),
            Ok(StrategyKind::Donchian)
        );
        assert!(matches!(
            "RSI".parse::<StrategyKind>(),
            Err(ConfigError::UnknownStrategy(_))
        ));
    }

    #[test]
    fn action_mode_aliases_parse() {
        assert_eq!("discrete-3".parse::<ActionMode>(), Ok(ActionMode::Discrete));
        assert_eq!("continuous-1".parse::<ActionMode>(), Ok(ActionMode::Continuous));
        assert_eq!("box".parse::<ActionMode>(), Ok(ActionMode::Continuous));
        assert!(matches!(
            "multi".parse::<ActionMode>(),
            Err(ConfigError::UnknownActionMode(_))
        ));
    }

    #[test]
    fn defaults_validate() {
        SimConfig::default().validate().unwrap();
    }

    #[test]
    fn out_of_range_numbers_are_rejected() {
        let mut c = SimConfig::default();
        c.broker.leverage = 0.5;
        assert!(matches!(
            c.validate(),
            Err(ConfigError::InvalidValue { field: "broker.leverage", .. })
        ));

        let mut c = SimConfig::default();
        c.broker.max_order = 0;
        assert!(c.validate().is_err());

        let mut c = SimConfig::default();
        c.broker.starting_balance = f64::NAN;
        assert!(c.validate().is_err());
    }

    #[test]
    fn max_order_must_fit_signed_inventory() {
        let mut c = SimConfig::default();
        c.broker.max_order = 3_000_000_000;
        c.broker.is_random_inventory = true;
        assert!(matches!(
            c.validate(),
            Err(ConfigError::InvalidValue { field: "broker.max_order", .. })
        ));

        c.broker.max_order = i32::MAX as u32;
        c.validate().unwrap();
    }

    #[test]
    fn partial_document_fills_defaults() {
        let v = serde_json::json!({ "broker": { "leverage": 20.0 } });
        let c = SimConfig::from_json(&v).unwrap();
        assert_eq!(c.broker.leverage, 20.0);
        assert_eq!(c.broker.max_order, 10);
        assert_eq!(c.fields.price, "close");
    }
}
