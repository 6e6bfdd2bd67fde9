//! levsim-shaping
//!
//! Reward and observation shaping over an immutable per-step snapshot.
//! - Two strategy families, selected once from configuration
//! - Post-action reward (fill just applied) and post-update reward (one bar later)
//! - Observations are fixed-length, finite and bounded
//! - Pure functions: nothing here mutates account or inventory state

mod donchian;
mod dual_ma;
pub mod math;
mod regime;
mod snapshot;

pub use donchian::{Donchian, DonchianFeatures};
pub use dual_ma::DualMa;
pub use regime::{ChannelMarks, MissingField, RegimeMarks, RegimeSignal};
pub use snapshot::{FillContext, FillEffect, PositionView, StepSnapshot};

use levsim_config::StrategyKind;
use serde::{Deserialize, Serialize};
use tracing::trace;

/// Observation vector handed to the agent.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Observation(pub Vec<f64>);

impl Observation {
    /// Every component is mapped into [-1, 1]; NaN becomes 0.5.
    pub fn bounded(values: Vec<f64>) -> Self {
        Self(
            values
                .into_iter()
                .map(|v| if v.is_nan() { 0.5 } else { v.clamp(-1.0, 1.0) })
                .collect(),
        )
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }
}

/// Shaping contract shared by both strategy families.
pub trait Shaping {
    fn observe(&self, snap: &StepSnapshot) -> Observation;

    /// Reward for the fill just applied. `pre` is the snapshot taken before
    /// the fill on the same bar.
    fn post_action_reward(&self, pre: &StepSnapshot, ctx: &FillContext<'_>) -> f64;

    /// Reward for holding through the bar that followed the fill.
    fn post_update_reward(&self, mark_now: f64, mark_before: f64, inventory: i32) -> f64;
}

/// log10(mark_now / mark_before) * sign(inventory).
/// 0 when flat or when either mark is not strictly positive.
pub(crate) fn trend_alignment(mark_now: f64, mark_before: f64, inventory: i32) -> f64 {
    if inventory == 0 || !(mark_now > 0.0 && mark_before > 0.0) {
        return 0.0;
    }
    math::safe_log10(mark_now / mark_before) * f64::from(inventory.signum())
}

/// Strategy selected by configuration name.
#[derive(Clone, Debug, PartialEq)]
pub enum Strategy {
    DualMa(DualMa),
    Donchian(Donchian),
}

impl Strategy {
    pub fn new(kind: StrategyKind, commission_trade: f64) -> Self {
        match kind {
            StrategyKind::DualMa => Strategy::DualMa(DualMa::new(commission_trade)),
            StrategyKind::Donchian => Strategy::Donchian(Donchian::new(commission_trade)),
        }
    }

    pub fn kind(&self) -> StrategyKind {
        match self {
            Strategy::DualMa(_) => StrategyKind::DualMa,
            Strategy::Donchian(_) => StrategyKind::Donchian,
        }
    }

    pub fn observation_len(&self) -> usize {
        match self {
            Strategy::DualMa(_) => DualMa::OBSERVATION_LEN,
            Strategy::Donchian(_) => Donchian::OBSERVATION_LEN,
        }
    }

    fn inner(&self) -> &dyn Shaping {
        match self {
            Strategy::DualMa(s) => s,
            Strategy::Donchian(s) => s,
        }
    }
}

impl Shaping for Strategy {
    fn observe(&self, snap: &StepSnapshot) -> Observation {
        self.inner().observe(snap)
    }

    fn post_action_reward(&self, pre: &StepSnapshot, ctx: &FillContext<'_>) -> f64 {
        let r = self.inner().post_action_reward(pre, ctx);
        trace!(kind = %ctx.fill.kind, lots = ctx.fill.lots, reward = r, "post-action reward");
        r
    }

    fn post_update_reward(&self, mark_now: f64, mark_before: f64, inventory: i32) -> f64 {
        let r = self.inner().post_update_reward(mark_now, mark_before, inventory);
        trace!(mark_now, mark_before, inventory, reward = r, "post-update reward");
        r
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn post_update_follows_position_sign() {
        let up = (101.0f64 / 100.0).log10();
        assert!((trend_alignment(101.0, 100.0, 3) - up).abs() < 1e-12);
        assert!((trend_alignment(101.0, 100.0, -1) + up).abs() < 1e-12);
        assert_eq!(trend_alignment(101.0, 100.0, 0), 0.0);
        assert_eq!(trend_alignment(101.0, 0.0, 2), 0.0);
    }

    #[test]
    fn weights_differ_per_family() {
        let a = Strategy::new(StrategyKind::DualMa, 0.0003);
        let b = Strategy::new(StrategyKind::Donchian, 0.0003);
        let ra = a.post_update_reward(110.0, 100.0, 1);
        let rb = b.post_update_reward(110.0, 100.0, 1);
        assert!((rb - 2.0 * ra).abs() < 1e-12);
    }

    #[test]
    fn observation_is_clamped() {
        let o = Observation::bounded(vec![f64::NAN, 7.0, -9.0, f64::INFINITY, 0.25]);
        assert_eq!(o.as_slice(), &[0.5, 1.0, -1.0, 1.0, 0.25]);
    }
}
