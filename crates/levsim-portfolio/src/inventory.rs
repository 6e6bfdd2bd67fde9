use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::order::Order;
use crate::types::{
    FillInfo, FillKind, PositionSide, PositionStatus, Side, REASON_MAX_INVENTORY,
    REASON_NO_OPEN_ORDERS,
};
use crate::MarkMap;

/// Lots held for fewer steps than this count as short-term on close.
pub const SHORT_TERM_THRESHOLD: u64 = 30;

/// Fixed sizing and fee parameters for an inventory.
#[derive(Clone, Debug, PartialEq)]
pub struct InventoryParams {
    pub max_order: u32,
    pub leverage: f64,
    /// Floor for the margin committed per lot.
    pub minimum_lot: f64,
    pub commission_rate: f64,
    pub random_inventory: bool,
    pub long_only: bool,
}

/// Aggregate counters over closed lots.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TradeStats {
    pub trades: u64,
    pub profitable: u64,
    pub total_profit: f64,
    /// Running sum of (size + profit) / size over closed lots.
    pub delta_sum: f64,
    pub longs_closed: u64,
    pub shorts_closed: u64,
    pub holding_steps: u64,
    pub short_term: u64,
}

/// Open lots and the rules for adding to and closing them.
///
/// Rules:
/// - lots form a stack; closes always pop the most recent lot (LIFO)
/// - all open lots share one side, so |inventory| == number of lots
/// - a request at capacity returns a wait fill and changes nothing
/// - a request against the open side closes exactly one lot
/// - margin per lot is re-derived from balance only while flat
#[derive(Clone, Debug, PartialEq)]
pub struct InventoryManager {
    params: InventoryParams,
    orders: Vec<Order>,
    inventory: i32,
    margin_per_order: f64,
    stats: TradeStats,
}

impl InventoryManager {
    pub fn new(params: InventoryParams, balance: f64) -> Self {
        let mut im = Self {
            params,
            orders: Vec::new(),
            inventory: 0,
            margin_per_order: 0.0,
            stats: TradeStats::default(),
        };
        im.size_for(balance);
        im
    }

    /// Clear all lots and counters. With randomized inventory enabled, draws
    /// a signed lot count from `rng` and opens that many lots at `price`.
    /// `rng` is untouched otherwise.
    pub fn reset<R: Rng>(
        &mut self,
        balance: f64,
        price: f64,
        marks: &MarkMap,
        rng: &mut R,
    ) {
        self.orders.clear();
        self.inventory = 0;
        self.stats = TradeStats::default();
        self.size_for(balance);

        if !self.params.random_inventory {
            return;
        }

        let max = i64::from(self.params.max_order);
        let min = if self.params.long_only { 0 } else { -max };
        let n = rng.gen_range(min..=max);
        if n == 0 {
            return;
        }

        let side = if n > 0 { Side::Long } else { Side::Short };
        for _ in 0..n.unsigned_abs() {
            self.open(side, price, balance, marks);
        }
        debug!(inventory = self.inventory, "randomized starting inventory");
    }

    /// Margin for the next lot.
    ///
    /// Recomputed as round(balance / max_order * 100) / 100 only when flat,
    /// otherwise the value fixed when the current position started.
    /// Never below the configured minimum lot.
    pub fn size_for(&mut self, balance: f64) -> f64 {
        if self.inventory == 0 {
            let max = f64::from(self.params.max_order.max(1));
            self.margin_per_order = (balance / max * 100.0).round() / 100.0;
        }
        self.margin_per_order.max(self.params.minimum_lot)
    }

    pub fn buy(&mut self, price: f64, balance: f64, marks: &MarkMap) -> FillInfo {
        self.place(Side::Long, price, balance, marks)
    }

    pub fn sell(&mut self, price: f64, balance: f64, marks: &MarkMap) -> FillInfo {
        self.place(Side::Short, price, balance, marks)
    }

    fn place(&mut self, side: Side, price: f64, balance: f64, marks: &MarkMap) -> FillInfo {
        if self.orders.len() >= self.params.max_order as usize {
            debug!(?side, price, "order rejected: {}", REASON_MAX_INVENTORY);
            return FillInfo::wait(REASON_MAX_INVENTORY, price);
        }

        let same_side = match side {
            Side::Long => self.inventory >= 0,
            Side::Short => self.inventory <= 0,
        };

        let profit = if same_side {
            self.open(side, price, balance, marks);
            0.0
        } else {
            self.close_last(price)
        };

        debug!(
            kind = %side.fill_kind(),
            price,
            profit,
            inventory = self.inventory,
            "fill"
        );
        FillInfo::filled(side.fill_kind(), 1, price, profit)
    }

    fn open(&mut self, side: Side, price: f64, balance: f64, marks: &MarkMap) {
        let margin = self.size_for(balance);
        self.orders.push(Order::open(
            side,
            margin,
            self.params.leverage,
            price,
            self.params.commission_rate,
            marks.clone(),
        ));
        self.inventory += side.sign();
    }

    /// Pop the most recent lot and realize it. 0 when nothing is open.
    fn close_last(&mut self, price: f64) -> f64 {
        let Some(mut order) = self.orders.pop() else {
            return 0.0;
        };
        let (profit, delta) = order.close_position(price);

        let s = &mut self.stats;
        s.trades += 1;
        s.total_profit += profit;
        s.delta_sum += delta;
        if profit > 0.0 {
            s.profitable += 1;
        }
        match order.side() {
            Side::Long => s.longs_closed += 1,
            Side::Short => s.shorts_closed += 1,
        }
        s.holding_steps += order.holding_steps();
        if order.holding_steps() < SHORT_TERM_THRESHOLD {
            s.short_term += 1;
        }

        self.inventory -= order.side().sign();
        profit
    }

    /// Close every lot at `price`. The fill is labeled with the side that
    /// flattens the position (sell when long, buy when short).
    pub fn close_all(&mut self, price: f64) -> FillInfo {
        if self.orders.is_empty() {
            return FillInfo::wait(REASON_NO_OPEN_ORDERS, price);
        }

        let kind = if self.inventory > 0 {
            FillKind::Sell
        } else {
            FillKind::Buy
        };
        let lots = self.orders.len() as u32;
        let mut total = 0.0;
        while !self.orders.is_empty() {
            total += self.close_last(price);
        }

        debug!(%kind, lots, price, profit = total, "flattened");
        FillInfo::filled(kind, lots, price, total)
    }

    pub fn apply_funding_fee(&mut self, rate: f64) {
        for o in &mut self.orders {
            o.add_funding_fee(rate);
        }
    }

    // ---------------------------------------------------------------------
    // Read surface
    // ---------------------------------------------------------------------

    /// Size-weighted mean of `key` recorded at each lot's entry.
    /// None when flat or when any lot lacks the field.
    pub fn average_entry_mark(&self, key: &str) -> Option<f64> {
        let mut weighted = 0.0;
        let mut total = 0.0;
        for o in &self.orders {
            weighted += o.entry_mark(key)? * o.size();
            total += o.size();
        }
        if total == 0.0 {
            return None;
        }
        Some(weighted / total)
    }

    /// `key` recorded at entry of the most recent lot.
    pub fn last_entry_mark(&self, key: &str) -> Option<f64> {
        self.orders.last().and_then(|o| o.entry_mark(key))
    }

    /// Size-weighted entry price, 0 when flat.
    pub fn average_entry_price(&self) -> f64 {
        let total: f64 = self.orders.iter().map(Order::size).sum();
        if total == 0.0 {
            return 0.0;
        }
        let weighted: f64 = self
            .orders
            .iter()
            .map(|o| o.entry_price() * o.size())
            .sum();
        weighted / total
    }

    /// (long lots, short lots). One side is always zero.
    pub fn inventory_count(&self) -> (u32, u32) {
        let n = self.inventory.unsigned_abs();
        if self.inventory > 0 {
            (n, 0)
        } else {
            (0, n)
        }
    }

    pub fn current_position(&self) -> PositionStatus {
        if self.inventory == 0 {
            return PositionStatus::neutral();
        }
        let side = if self.inventory > 0 {
            PositionSide::Long
        } else {
            PositionSide::Short
        };
        PositionStatus {
            side,
            lots: self.inventory.unsigned_abs(),
            avg_price: self.average_entry_price(),
        }
    }

    /// Share of closed lots that realized a positive profit.
    pub fn profitability(&self) -> f64 {
        if self.stats.trades == 0 {
            return 0.0;
        }
        self.stats.profitable as f64 / self.stats.trades as f64
    }

    pub fn inventory(&self) -> i32 {
        self.inventory
    }

    pub fn orders(&self) -> &[Order] {
        &self.orders
    }

    /// Mutable view for revaluation. The stack itself cannot be resized
    /// through this slice.
    pub fn orders_mut(&mut self) -> &mut [Order] {
        &mut self.orders
    }

    pub fn stats(&self) -> &TradeStats {
        &self.stats
    }

    pub fn params(&self) -> &InventoryParams {
        &self.params
    }

    pub fn margin_per_order(&self) -> f64 {
        self.margin_per_order.max(self.params.minimum_lot)
    }
}
