use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::order::Order;

/// Account valuation derived from realized balance and open lots.
///
/// equity == balance + Σ open-lot profit, and equity == balance when flat.
/// The account never opens or closes lots itself.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Account {
    initial_balance: f64,
    balance: f64,
    equity: f64,
    equity_highest: f64,
    margin_used: f64,
    margin_available: f64,
    drawdown: f64,
    max_drawdown: f64,
    local_high: f64,
    local_low: f64,
}

impl Account {
    pub fn new(starting_balance: f64) -> Self {
        debug_assert!(starting_balance > 0.0, "starting balance must be > 0");
        Self {
            initial_balance: starting_balance,
            balance: starting_balance,
            equity: starting_balance,
            equity_highest: starting_balance,
            margin_used: 0.0,
            margin_available: starting_balance,
            drawdown: 0.0,
            max_drawdown: 0.0,
            local_high: starting_balance,
            local_low: starting_balance,
        }
    }

    pub fn reset(&mut self) {
        *self = Self::new(self.initial_balance);
    }

    /// Fold realized profit into balance.
    pub fn realize(&mut self, profit: f64) {
        self.balance += profit;
    }

    /// Revalue every open lot at `price` and recompute margin and equity.
    /// Local high/low track equity while any lot is open and are pinned to
    /// balance while flat.
    pub fn update_margin(&mut self, price: f64, orders: &mut [Order]) {
        let mut margin = 0.0;
        let mut profits = 0.0;
        for o in orders.iter_mut() {
            o.update_profit(price);
            margin += o.margin();
            profits += o.profit();
        }

        self.margin_used = margin;
        self.margin_available = self.balance - margin;
        self.equity = self.balance + profits;

        if orders.is_empty() {
            self.local_high = self.balance;
            self.local_low = self.balance;
        } else {
            self.local_high = self.local_high.max(self.equity);
            self.local_low = self.local_low.min(self.equity);
        }

        trace!(
            price,
            equity = self.equity,
            margin_used = self.margin_used,
            "revalued"
        );
    }

    /// Equity at or below zero pins drawdown to 1.0 without moving the peak.
    pub fn update_drawdown(&mut self) {
        if self.equity <= 0.0 {
            self.drawdown = 1.0;
        } else {
            self.equity_highest = self.equity_highest.max(self.equity);
            self.drawdown = (self.equity_highest - self.equity) / self.equity_highest;
        }
        self.max_drawdown = self.max_drawdown.max(self.drawdown);
    }

    /// balance / starting balance.
    pub fn equity_multiplier(&self) -> f64 {
        self.balance / self.initial_balance
    }

    /// max((equity - local_low) / equity, 0). 0 when equity <= 0.
    pub fn local_low_distance(&self) -> f64 {
        if self.equity <= 0.0 {
            return 0.0;
        }
        ((self.equity - self.local_low) / self.equity).max(0.0)
    }

    pub fn initial_balance(&self) -> f64 {
        self.initial_balance
    }

    pub fn balance(&self) -> f64 {
        self.balance
    }

    pub fn equity(&self) -> f64 {
        self.equity
    }

    pub fn equity_highest(&self) -> f64 {
        self.equity_highest
    }

    pub fn margin_used(&self) -> f64 {
        self.margin_used
    }

    pub fn margin_available(&self) -> f64 {
        self.margin_available
    }

    pub fn drawdown(&self) -> f64 {
        self.drawdown
    }

    pub fn max_drawdown(&self) -> f64 {
        self.max_drawdown
    }

    pub fn local_high(&self) -> f64 {
        self.local_high
    }

    pub fn local_low(&self) -> f64 {
        self.local_low
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Side;
    use crate::MarkMap;

    fn long_lot(price: f64) -> Order {
        Order::open(Side::Long, 100.0, 5.0, price, 0.0, MarkMap::new())
    }

    #[test]
    fn flat_equity_equals_balance() {
        let mut ac = Account::new(1000.0);
        ac.realize(12.5);
        ac.update_margin(100.0, &mut []);
        assert_eq!(ac.equity(), ac.balance());
        assert_eq!(ac.local_low(), 1012.5);
        assert_eq!(ac.margin_available(), 1012.5);
    }

    #[test]
    fn drawdown_tracks_peak() {
        let mut ac = Account::new(1000.0);
        let mut lots = vec![long_lot(100.0)];
        ac.update_margin(110.0, &mut lots);
        ac.update_drawdown();
        assert_eq!(ac.drawdown(), 0.0);
        assert!((ac.equity_highest() - 1050.0).abs() < 1e-9);

        ac.update_margin(100.0, &mut lots);
        ac.update_drawdown();
        assert!((ac.drawdown() - 50.0 / 1050.0).abs() < 1e-12);
        assert_eq!(ac.margin_used(), 100.0);
        assert_eq!(ac.margin_available(), 900.0);
    }

    #[test]
    fn non_positive_equity_pins_drawdown() {
        let mut ac = Account::new(100.0);
        let mut lots = vec![Order::open(Side::Long, 100.0, 10.0, 100.0, 0.0, MarkMap::new())];
        ac.update_margin(80.0, &mut lots);
        assert!(ac.equity() <= 0.0);
        ac.update_drawdown();
        assert_eq!(ac.drawdown(), 1.0);
        assert_eq!(ac.max_drawdown(), 1.0);
        assert_eq!(ac.equity_highest(), 100.0, "peak unchanged");
        assert_eq!(ac.local_low_distance(), 0.0);
    }

    #[test]
    fn local_low_distance_measures_recovery() {
        let mut ac = Account::new(1000.0);
        let mut lots = vec![long_lot(100.0)];
        ac.update_margin(90.0, &mut lots); // equity 950
        ac.update_margin(100.0, &mut lots); // equity 1000
        assert!((ac.local_low_distance() - 50.0 / 1000.0).abs() < 1e-12);
        assert_eq!(ac.local_high(), 1000.0);
    }

    #[test]
    fn reset_restores_fresh_state() {
        let mut ac = Account::new(1000.0);
        ac.realize(-200.0);
        ac.update_margin(1.0, &mut []);
        ac.update_drawdown();
        ac.reset();
        assert_eq!(ac, Account::new(1000.0));
        assert_eq!(ac.equity_multiplier(), 1.0);
    }
}
