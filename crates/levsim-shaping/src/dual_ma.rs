use crate::math::{commission_drag, fit_log_distance, fit_percentage, safe_log10};
use crate::snapshot::{FillContext, FillEffect, StepSnapshot};
use crate::{Observation, Shaping};

/// Entry bias subtracted inside the entry log term.
const ENTRY_BIAS: f64 = 0.001;
/// Bias subtracted inside exit and re-entry log terms.
const EXIT_BIAS: f64 = 0.01;
const FLATTEN_ENTRY_WEIGHT: f64 = 0.2;
const PROFIT_TAKING_WEIGHT: f64 = 1.0;
const CUT_LOSS_WEIGHT: f64 = 0.8;
const POST_UPDATE_WEIGHT: f64 = 1.0;
const LOG_MULTIPLIER: f64 = 2.0;

/// Moving-average deviation regime.
///
/// Observation (5): [fit(deviation), fit(dist avg entry), fit(dist lowest),
/// long lots / max, short lots / max].
#[derive(Clone, Debug, PartialEq)]
pub struct DualMa {
    commission_trade: f64,
}

impl DualMa {
    pub const OBSERVATION_LEN: usize = 5;

    pub fn new(commission_trade: f64) -> Self {
        Self { commission_trade }
    }

    /// Buying into a negative deviation (or selling into a positive one) pays.
    fn entry_term(&self, pre: &StepSnapshot, ctx: &FillContext<'_>) -> f64 {
        let dev = fit_percentage(pre.regime.deviation().unwrap_or(0.0));
        let tilt = ctx.side_sign() * (0.5 - dev) / 2.0 * ctx.lots();
        safe_log10(1.0 + tilt - ENTRY_BIAS)
    }

    fn exit_term(distance: f64, lots: f64) -> f64 {
        safe_log10(1.0 + distance - EXIT_BIAS) * lots
    }
}

impl Shaping for DualMa {
    fn observe(&self, snap: &StepSnapshot) -> Observation {
        let pos = &snap.position;
        let max = f64::from(pos.max_order.max(1));
        let lowest = if pos.lowest.is_some() {
            fit_log_distance(snap.distance_from_lowest(), LOG_MULTIPLIER)
        } else {
            0.5
        };

        Observation::bounded(vec![
            fit_percentage(snap.regime.deviation().unwrap_or(0.0)),
            fit_log_distance(snap.distance_from_average(), LOG_MULTIPLIER),
            lowest,
            f64::from(pos.long_lots()) / max,
            f64::from(pos.short_lots()) / max,
        ])
    }

    fn post_action_reward(&self, pre: &StepSnapshot, ctx: &FillContext<'_>) -> f64 {
        let drag = commission_drag(self.commission_trade);
        if ctx.fill.is_wait() {
            return if ctx.is_idle_directional() { drag } else { 0.0 };
        }

        let lots = ctx.lots();
        let mut reward = drag * lots;

        match ctx.effect(pre.position.inventory) {
            FillEffect::Entry => reward += self.entry_term(pre, ctx),
            FillEffect::Flatten => {
                reward += self.entry_term(pre, ctx) * FLATTEN_ENTRY_WEIGHT;
                reward += Self::exit_term(pre.distance_from_average(), lots) * PROFIT_TAKING_WEIGHT;
                reward += Self::exit_term(pre.distance_from_lowest(), lots) * CUT_LOSS_WEIGHT;
            }
            FillEffect::Add => {
                // buying above the last entry is penalized, selling above it rewarded
                let d = ctx.side_sign() * pre.distance_from_last();
                reward += safe_log10(1.0 - d - EXIT_BIAS);
            }
            FillEffect::Reduce | FillEffect::None => {}
        }
        reward
    }

    fn post_update_reward(&self, mark_now: f64, mark_before: f64, inventory: i32) -> f64 {
        crate::trend_alignment(mark_now, mark_before, inventory) * POST_UPDATE_WEIGHT
    }
}
