use serde::{Deserialize, Serialize};

use crate::math::{bounded, commission_drag, fit_log_distance};
use crate::snapshot::{FillContext, FillEffect, StepSnapshot};
use crate::{Observation, Shaping};

const SHIFT_PENALTY: f64 = 0.001;
const ENTRY_SCALE: f64 = 0.01;
const BUY_ENTRY_ANCHOR: f64 = 0.3;
const SELL_ENTRY_ANCHOR: f64 = 0.5;
const POST_UPDATE_WEIGHT: f64 = 2.0;
const LOG_MULTIPLIER: f64 = 1.0;

/// The 9 Donchian features, in observation order. The this-bar flags come
/// lower first; the 5-row flags upper first.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DonchianFeatures {
    pub position_in_channel: f64,
    pub lower_shift: f64,
    pub upper_shift: f64,
    pub upper_shift_5: f64,
    pub lower_shift_5: f64,
    pub distance_from_avg: f64,
    pub distance_from_lowest: f64,
    pub distance_from_last: f64,
    pub inventory: f64,
}

impl DonchianFeatures {
    pub fn from_snapshot(snap: &StepSnapshot) -> Self {
        let flag = |b: bool| if b { 1.0 } else { 0.0 };
        let pos = &snap.position;
        let (position_in_channel, lo, up, up5, lo5) = match snap.regime.channel() {
            Some(c) => (
                c.position_of(snap.regime.mark),
                flag(c.lower_shift),
                flag(c.upper_shift),
                flag(c.upper_shift_5),
                flag(c.lower_shift_5),
            ),
            None => (0.5, 0.0, 0.0, 0.0, 0.0),
        };
        let lowest = if pos.lowest.is_some() {
            fit_log_distance(snap.distance_from_lowest(), LOG_MULTIPLIER)
        } else {
            0.5
        };

        Self {
            position_in_channel,
            lower_shift: lo,
            upper_shift: up,
            upper_shift_5: up5,
            lower_shift_5: lo5,
            distance_from_avg: fit_log_distance(snap.distance_from_average(), LOG_MULTIPLIER),
            distance_from_lowest: lowest,
            distance_from_last: fit_log_distance(snap.distance_from_last(), LOG_MULTIPLIER),
            inventory: bounded(
                f64::from(pos.inventory) / f64::from(pos.max_order.max(1)),
                -1.0,
                1.0,
            ),
        }
    }

    pub fn to_vec(&self) -> Vec<f64> {
        vec![
            self.position_in_channel,
            self.lower_shift,
            self.upper_shift,
            self.upper_shift_5,
            self.lower_shift_5,
            self.distance_from_avg,
            self.distance_from_lowest,
            self.distance_from_last,
            self.inventory,
        ]
    }
}

/// Donchian channel regime. Terms are evaluated on the feature set rather
/// than raw prices, and carry a small penalty when a channel boundary moved
/// within the last 5 bars.
#[derive(Clone, Debug, PartialEq)]
pub struct Donchian {
    commission_trade: f64,
}

impl Donchian {
    pub const OBSERVATION_LEN: usize = 9;

    pub fn new(commission_trade: f64) -> Self {
        Self { commission_trade }
    }

    /// Buys pay near the bottom of the channel, sells near the top.
    fn entry_term(f: &DonchianFeatures, ctx: &FillContext<'_>) -> f64 {
        let tilt = if ctx.side_sign() > 0.0 {
            BUY_ENTRY_ANCHOR - f.position_in_channel
        } else {
            f.position_in_channel - SELL_ENTRY_ANCHOR
        };
        tilt * ctx.lots() * ENTRY_SCALE
    }
}

impl Shaping for Donchian {
    fn observe(&self, snap: &StepSnapshot) -> Observation {
        Observation::bounded(DonchianFeatures::from_snapshot(snap).to_vec())
    }

    fn post_action_reward(&self, pre: &StepSnapshot, ctx: &FillContext<'_>) -> f64 {
        let drag = commission_drag(self.commission_trade);
        if ctx.fill.is_wait() {
            return if ctx.is_idle_directional() { drag } else { 0.0 };
        }

        let f = DonchianFeatures::from_snapshot(pre);
        let lots = ctx.lots();
        let lower_moved = f.lower_shift_5 != 0.0;
        let upper_moved = f.upper_shift_5 != 0.0;
        let mut reward = drag * lots;

        match ctx.effect(pre.position.inventory) {
            FillEffect::Entry => {
                reward += Self::entry_term(&f, ctx);
                if lower_moved {
                    reward -= SHIFT_PENALTY;
                }
            }
            FillEffect::Add => {
                // no side sign: adding close to the last entry is neutral
                reward -= f.distance_from_last - 0.5;
                if lower_moved {
                    reward -= SHIFT_PENALTY;
                }
            }
            FillEffect::Flatten => {
                reward += Self::entry_term(&f, ctx);
                reward += (f.distance_from_avg - 0.5) * lots;
                reward += (f.distance_from_lowest - 0.5) * lots;
                if lower_moved || upper_moved {
                    reward -= SHIFT_PENALTY;
                }
            }
            FillEffect::Reduce | FillEffect::None => {}
        }
        reward
    }

    fn post_update_reward(&self, mark_now: f64, mark_before: f64, inventory: i32) -> f64 {
        crate::trend_alignment(mark_now, mark_before, inventory) * POST_UPDATE_WEIGHT
    }
}
