use levsim_portfolio::{Action, FillInfo, FillKind};

use crate::math::distance;
use crate::regime::RegimeMarks;

/// Position facts read by the shaping functions.
///
/// Entry references are recorded on the regime mark at each lot's entry.
#[derive(Clone, Debug, PartialEq)]
pub struct PositionView {
    pub inventory: i32,
    pub max_order: u32,
    /// Size-weighted mark at entry over open lots.
    pub avg_entry: Option<f64>,
    /// Mark at entry of the most recent lot.
    pub last_entry: Option<f64>,
    /// Lowest mark seen while the position has been open.
    pub lowest: Option<f64>,
}

impl PositionView {
    pub fn flat(max_order: u32) -> Self {
        Self {
            inventory: 0,
            max_order,
            avg_entry: None,
            last_entry: None,
            lowest: None,
        }
    }

    pub fn long_lots(&self) -> u32 {
        if self.inventory > 0 {
            self.inventory.unsigned_abs()
        } else {
            0
        }
    }

    pub fn short_lots(&self) -> u32 {
        if self.inventory < 0 {
            self.inventory.unsigned_abs()
        } else {
            0
        }
    }
}

/// Immutable view of one step, built once and shared by every reader.
#[derive(Clone, Debug, PartialEq)]
pub struct StepSnapshot {
    pub price: f64,
    pub regime: RegimeMarks,
    pub position: PositionView,
}

impl StepSnapshot {
    pub fn distance_from_average(&self) -> f64 {
        distance(self.regime.mark, self.position.avg_entry, self.position.inventory)
    }

    pub fn distance_from_last(&self) -> f64 {
        distance(self.regime.mark, self.position.last_entry, self.position.inventory)
    }

    pub fn distance_from_lowest(&self) -> f64 {
        distance(self.regime.mark, self.position.lowest, self.position.inventory)
    }
}

/// What happened on the fill being rewarded.
#[derive(Clone, Copy, Debug)]
pub struct FillContext<'a> {
    pub action: Action,
    pub fill: &'a FillInfo,
    pub inventory_after: i32,
}

/// How a fill changed the position.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum FillEffect {
    /// Decision produced no fill.
    None,
    /// Opened the first lot from flat.
    Entry,
    /// Added a lot to an existing position.
    Add,
    /// Closed lots but left some open.
    Reduce,
    /// Closed the position to flat.
    Flatten,
}

impl<'a> FillContext<'a> {
    pub fn new(action: Action, fill: &'a FillInfo, inventory_after: i32) -> Self {
        Self {
            action,
            fill,
            inventory_after,
        }
    }

    pub fn effect(&self, inventory_before: i32) -> FillEffect {
        if self.fill.is_wait() {
            return FillEffect::None;
        }
        let before = inventory_before.unsigned_abs();
        let after = self.inventory_after.unsigned_abs();
        if after == 0 {
            FillEffect::Flatten
        } else if before == 0 && after == 1 {
            FillEffect::Entry
        } else if after > before {
            FillEffect::Add
        } else {
            FillEffect::Reduce
        }
    }

    /// +1 for buy fills, -1 for sell fills, 0 for waits.
    pub fn side_sign(&self) -> f64 {
        match self.fill.kind {
            FillKind::Buy => 1.0,
            FillKind::Sell => -1.0,
            FillKind::Wait => 0.0,
        }
    }

    /// A directional decision that ended in a wait.
    pub fn is_idle_directional(&self) -> bool {
        self.fill.is_wait() && self.action != Action::Hold
    }

    pub fn lots(&self) -> f64 {
        f64::from(self.fill.lots)
    }
}
