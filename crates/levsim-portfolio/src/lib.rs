//! levsim-portfolio
//!
//! Lot and account bookkeeping for a leveraged single-instrument account.
//! - Margin-backed lots with fixed size and commission
//! - LIFO close policy over a same-side lot stack
//! - Balance / equity / drawdown valuation
//! - Pure deterministic logic (no IO, no time); the only randomness is the
//!   caller-supplied generator passed to `InventoryManager::reset`

mod account;
mod inventory;
mod order;
mod types;

pub use account::Account;
pub use inventory::{InventoryManager, InventoryParams, TradeStats, SHORT_TERM_THRESHOLD};
pub use order::Order;
pub use types::{
    Action, FillInfo, FillKind, PositionSide, PositionStatus, Side, CONTINUOUS_ACTION_BAND,
    REASON_IDLE, REASON_MAX_INVENTORY, REASON_NO_OPEN_ORDERS,
};

use std::collections::BTreeMap;

/// Row fields snapshotted at lot entry (field name -> value).
pub type MarkMap = BTreeMap<String, f64>;

