use std::fmt;

use serde::{Deserialize, Serialize};

/// Direction of a single lot.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Long,
    Short,
}

impl Side {
    /// +1 for long, -1 for short.
    pub fn sign(self) -> i32 {
        match self {
            Side::Long => 1,
            Side::Short => -1,
        }
    }

    pub fn fill_kind(self) -> FillKind {
        match self {
            Side::Long => FillKind::Buy,
            Side::Short => FillKind::Sell,
        }
    }
}

/// Trading decision for one step.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Long,
    Short,
    Hold,
}

/// Threshold used when decoding a continuous action value.
pub const CONTINUOUS_ACTION_BAND: f64 = 0.33;

impl Action {
    /// 0 = long, 1 = short, anything else is hold.
    pub fn from_discrete(a: i64) -> Self {
        match a {
            0 => Action::Long,
            1 => Action::Short,
            _ => Action::Hold,
        }
    }

    /// Values above the band go long, below the negative band go short.
    /// Non-finite input decodes to hold.
    pub fn from_continuous(a: f64) -> Self {
        if !a.is_finite() {
            return Action::Hold;
        }
        if a > CONTINUOUS_ACTION_BAND {
            Action::Long
        } else if a < -CONTINUOUS_ACTION_BAND {
            Action::Short
        } else {
            Action::Hold
        }
    }

    pub fn side(self) -> Option<Side> {
        match self {
            Action::Long => Some(Side::Long),
            Action::Short => Some(Side::Short),
            Action::Hold => None,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FillKind {
    Buy,
    Sell,
    Wait,
}

impl fmt::Display for FillKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FillKind::Buy => "buy",
            FillKind::Sell => "sell",
            FillKind::Wait => "wait",
        };
        f.write_str(s)
    }
}

/// Reason attached to a wait fill when capacity is exhausted.
pub const REASON_MAX_INVENTORY: &str = "max inventory reached";
/// Reason attached to a flatten request with nothing open.
pub const REASON_NO_OPEN_ORDERS: &str = "no open orders";
/// Reason attached to a decision that produced no fill.
pub const REASON_IDLE: &str = "idle";

/// Outcome of one order-book mutation (the fill atom).
///
/// lots is the number of lots opened or closed (0 for wait).
/// profit is realized profit, 0 unless lots were closed.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FillInfo {
    pub kind: FillKind,
    pub lots: u32,
    pub price: f64,
    pub profit: f64,
    pub reason: String,
}

impl FillInfo {
    pub fn filled(kind: FillKind, lots: u32, price: f64, profit: f64) -> Self {
        debug_assert!(kind != FillKind::Wait, "use FillInfo::wait for waits");
        Self {
            kind,
            lots,
            price,
            profit,
            reason: String::new(),
        }
    }

    pub fn wait<S: Into<String>>(reason: S, price: f64) -> Self {
        Self {
            kind: FillKind::Wait,
            lots: 0,
            price,
            profit: 0.0,
            reason: reason.into(),
        }
    }

    pub fn is_wait(&self) -> bool {
        self.kind == FillKind::Wait
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PositionSide {
    Neutral,
    Long,
    Short,
}

/// Summary of the open position.
/// avg_price is the size-weighted entry price, 0 when neutral.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PositionStatus {
    pub side: PositionSide,
    pub lots: u32,
    pub avg_price: f64,
}

impl PositionStatus {
    pub fn neutral() -> Self {
        Self {
            side: PositionSide::Neutral,
            lots: 0,
            avg_price: 0.0,
        }
    }
}
