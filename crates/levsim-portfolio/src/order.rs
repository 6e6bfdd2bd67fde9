use crate::types::Side;
use crate::MarkMap;

/// One margin-backed lot.
///
/// size, margin and commission are fixed at open. Only profit, funding and
/// holding_steps move afterwards.
#[derive(Clone, Debug, PartialEq)]
pub struct Order {
    side: Side,
    margin: f64,
    size: f64,
    entry_price: f64,
    commission: f64,
    funding: f64,
    profit: f64,
    holding_steps: u64,
    entry_marks: MarkMap,
}

impl Order {
    /// Open a lot at `price`. `entry_marks` is a snapshot of the row fields
    /// recorded at entry, used later for average/last-entry queries.
    pub fn open(
        side: Side,
        margin: f64,
        leverage: f64,
        price: f64,
        commission_rate: f64,
        entry_marks: MarkMap,
    ) -> Self {
        debug_assert!(margin >= 0.0, "Order.margin must be >= 0");
        debug_assert!(leverage >= 1.0, "Order.leverage must be >= 1");
        let size = margin * leverage;
        Self {
            side,
            margin,
            size,
            entry_price: price,
            commission: size * commission_rate,
            funding: 0.0,
            profit: 0.0,
            holding_steps: 0,
            entry_marks,
        }
    }

    /// Revalue at `price` and count one holding step.
    ///
    /// long:  (price / entry - 1) * size
    /// short: (1 - price / entry) * size
    /// minus commission and accrued funding.
    /// A zero entry price is treated as a flat price ratio.
    pub fn update_profit(&mut self, price: f64) {
        self.holding_steps += 1;
        let ratio = if self.entry_price == 0.0 {
            1.0
        } else {
            price / self.entry_price
        };
        let gross = match self.side {
            Side::Long => (ratio - 1.0) * self.size,
            Side::Short => (1.0 - ratio) * self.size,
        };
        self.profit = gross - self.commission - self.funding;
    }

    /// Final revaluation. Returns (profit, (size + profit) / size).
    pub fn close_position(&mut self, price: f64) -> (f64, f64) {
        self.update_profit(price);
        (self.profit, self.delta(self.profit))
    }

    pub fn add_funding_fee(&mut self, rate: f64) {
        self.funding += self.size * rate;
    }

    fn delta(&self, profit: f64) -> f64 {
        if self.size == 0.0 {
            return 1.0;
        }
        (self.size + profit) / self.size
    }

    pub fn side(&self) -> Side {
        self.side
    }

    pub fn margin(&self) -> f64 {
        self.margin
    }

    pub fn size(&self) -> f64 {
        self.size
    }

    pub fn entry_price(&self) -> f64 {
        self.entry_price
    }

    pub fn commission(&self) -> f64 {
        self.commission
    }

    pub fn funding(&self) -> f64 {
        self.funding
    }

    pub fn profit(&self) -> f64 {
        self.profit
    }

    pub fn holding_steps(&self) -> u64 {
        self.holding_steps
    }

    pub fn entry_mark(&self, key: &str) -> Option<f64> {
        self.entry_marks.get(key).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lot(side: Side, price: f64) -> Order {
        Order::open(side, 10.0, 5.0, price, 0.0003, MarkMap::new())
    }

    #[test]
    fn sizing_and_commission_fixed_at_open() {
        let o = lot(Side::Long, 100.0);
        assert_eq!(o.size(), 50.0);
        assert!((o.commission() - 0.015).abs() < 1e-12);
    }

    #[test]
    fn long_and_short_profit_mirror() {
        let mut l = lot(Side::Long, 100.0);
        let mut s = lot(Side::Short, 100.0);
        l.update_profit(110.0);
        s.update_profit(110.0);
        assert!((l.profit() - (5.0 - 0.015)).abs() < 1e-9);
        assert!((s.profit() - (-5.0 - 0.015)).abs() < 1e-9);
        assert_eq!(l.holding_steps(), 1);
    }

    #[test]
    fn funding_accrues_into_profit() {
        let mut o = lot(Side::Long, 100.0);
        o.add_funding_fee(0.0001);
        o.add_funding_fee(0.0001);
        o.update_profit(100.0);
        assert!((o.funding() - 0.01).abs() < 1e-12);
        assert!((o.profit() - (-0.015 - 0.01)).abs() < 1e-12);
    }

    #[test]
    fn close_returns_relative_delta() {
        let mut o = lot(Side::Long, 100.0);
        let (profit, delta) = o.close_position(100.0);
        assert!((profit + 0.015).abs() < 1e-12);
        assert!((delta - (50.0 - 0.015) / 50.0).abs() < 1e-12);
    }

    #[test]
    fn zero_entry_price_degrades_to_commission_only() {
        let mut o = lot(Side::Short, 0.0);
        o.update_profit(123.0);
        assert!(o.profit().is_finite());
        assert!((o.profit() + 0.015).abs() < 1e-12);
    }

    #[test]
    fn zero_size_delta_is_one() {
        let mut o = Order::open(Side::Long, 0.0, 5.0, 100.0, 0.0003, MarkMap::new());
        let (_, delta) = o.close_position(90.0);
        assert_eq!(delta, 1.0);
    }
}
