use std::collections::VecDeque;

use levsim_config::RecordsConfig;
use levsim_portfolio::{FillInfo, PositionStatus};

/// Fixed-capacity window keeping the most recent items (tail).
/// O(1) append; the oldest item is evicted once full.
#[derive(Clone, Debug, PartialEq)]
pub struct RingBuffer<T> {
    capacity: usize,
    items: VecDeque<T>,
}

impl<T> RingBuffer<T> {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            items: VecDeque::new(),
        }
    }

    pub fn push(&mut self, item: T) {
        if self.capacity == 0 {
            return;
        }
        if self.items.len() == self.capacity {
            self.items.pop_front();
        }
        self.items.push_back(item);
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn latest(&self) -> Option<&T> {
        self.items.back()
    }

    /// Oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.items.iter()
    }
}

/// Recent history for reporting. Never read back by the bookkeeping.
#[derive(Clone, Debug, PartialEq)]
pub struct Records {
    enabled: bool,
    equity: RingBuffer<f64>,
    inventory: RingBuffer<i32>,
    price: RingBuffer<f64>,
    equity_curve: RingBuffer<f64>,
    /// Non-wait fills only.
    fills: RingBuffer<FillInfo>,
    position: PositionStatus,
}

impl Records {
    pub fn new(cfg: &RecordsConfig) -> Self {
        Self {
            enabled: cfg.enabled,
            equity: RingBuffer::new(cfg.window),
            inventory: RingBuffer::new(cfg.window),
            price: RingBuffer::new(cfg.window),
            equity_curve: RingBuffer::new(cfg.equity_curve),
            fills: RingBuffer::new(cfg.fills),
            position: PositionStatus::neutral(),
        }
    }

    pub fn reset(&mut self) {
        self.equity.clear();
        self.inventory.clear();
        self.price.clear();
        self.equity_curve.clear();
        self.fills.clear();
        self.position = PositionStatus::neutral();
    }

    pub fn record_step(
        &mut self,
        price: f64,
        equity: f64,
        inventory: i32,
        position: PositionStatus,
        fill: &FillInfo,
    ) {
        if !self.enabled {
            return;
        }
        self.price.push(price);
        self.equity.push(equity);
        self.inventory.push(inventory);
        self.equity_curve.push(equity);
        if !fill.is_wait() {
            self.fills.push(fill.clone());
        }
        self.position = position;
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn equity(&self) -> &RingBuffer<f64> {
        &self.equity
    }

    pub fn inventory(&self) -> &RingBuffer<i32> {
        &self.inventory
    }

    pub fn price(&self) -> &RingBuffer<f64> {
        &self.price
    }

    pub fn equity_curve(&self) -> &RingBuffer<f64> {
        &self.equity_curve
    }

    pub fn fills(&self) -> &RingBuffer<FillInfo> {
        &self.fills
    }

    pub fn position(&self) -> &PositionStatus {
        &self.position
    }
}
