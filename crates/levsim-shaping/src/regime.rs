use levsim_config::{FieldsConfig, StrategyKind};
use levsim_portfolio::MarkMap;
use thiserror::Error;

/// A market row lacks a column the selected strategy reads.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("market row is missing field {0:?}")]
pub struct MissingField(pub String);

/// Donchian channel bounds and shift flags for one bar.
#[derive(Clone, Debug, PartialEq)]
pub struct ChannelMarks {
    pub upper: f64,
    pub lower: f64,
    pub upper_shift: bool,
    pub lower_shift: bool,
    pub upper_shift_5: bool,
    pub lower_shift_5: bool,
}

impl ChannelMarks {
    /// (mark - lower) / (upper - lower) clamped to [0, 1].
    /// 0.5 when the channel has no width or the inputs are not finite.
    pub fn position_of(&self, mark: f64) -> f64 {
        let width = self.upper - self.lower;
        if width == 0.0 || !width.is_finite() {
            return 0.5;
        }
        crate::math::bounded((mark - self.lower) / width, 0.0, 1.0)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum RegimeSignal {
    /// Long-vs-short moving average deviation, in percent.
    Deviation(f64),
    Channel(ChannelMarks),
}

/// Exogenous indicator values for the current bar.
#[derive(Clone, Debug, PartialEq)]
pub struct RegimeMarks {
    /// Smoothed reference price used for distances and the lowest reference.
    pub mark: f64,
    pub signal: RegimeSignal,
}

impl RegimeMarks {
    /// Pull the mark and the strategy's regime fields out of a row.
    pub fn from_row(
        kind: StrategyKind,
        fields: &FieldsConfig,
        row: &MarkMap,
    ) -> Result<Self, MissingField> {
        let get = |key: &str| row.get(key).copied().ok_or_else(|| MissingField(key.to_string()));
        let flag = |key: &str| get(key).map(|v| v != 0.0 && !v.is_nan());

        let mark = get(&fields.mark)?;
        let signal = match kind {
            StrategyKind::DualMa => RegimeSignal::Deviation(get(&fields.deviation)?),
            StrategyKind::Donchian => RegimeSignal::Channel(ChannelMarks {
                upper: get(&fields.upper_channel)?,
                lower: get(&fields.lower_channel)?,
                upper_shift: flag(&fields.upper_shift)?,
                lower_shift: flag(&fields.lower_shift)?,
                upper_shift_5: flag(&fields.upper_shift_5)?,
                lower_shift_5: flag(&fields.lower_shift_5)?,
            }),
        };
        Ok(Self { mark, signal })
    }

    pub fn deviation(&self) -> Option<f64> {
        match &self.signal {
            RegimeSignal::Deviation(v) => Some(*v),
            RegimeSignal::Channel(_) => None,
        }
    }

    pub fn channel(&self) -> Option<&ChannelMarks> {
        match &self.signal {
            RegimeSignal::Channel(c) => Some(c),
            RegimeSignal::Deviation(_) => None,
        }
    }
}
