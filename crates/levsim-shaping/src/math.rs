//! Numeric guards shared by every shaping term.

/// Smallest argument passed to log10.
pub const LOG_FLOOR: f64 = 1e-12;

/// log10 with the argument floored at `LOG_FLOOR`. NaN maps to the floor,
/// +inf to the largest finite value, so the result is always finite.
pub fn safe_log10(x: f64) -> f64 {
    if x.is_nan() || x < LOG_FLOOR {
        return LOG_FLOOR.log10();
    }
    x.min(f64::MAX).log10()
}

/// Clamp into [lo, hi]; NaN becomes the midpoint.
pub fn bounded(x: f64, lo: f64, hi: f64) -> f64 {
    if x.is_nan() {
        return (lo + hi) / 2.0;
    }
    x.clamp(lo, hi)
}

/// Percent-style regime value fitted to [0, 1]: clamp(0.5 + x / 50, 0, 1).
pub fn fit_percentage(x: f64) -> f64 {
    bounded(0.5 + x / 50.0, 0.0, 1.0)
}

/// Relative distance mark / entry - 1.
/// 0 when flat, when the entry is unknown, zero or non-finite.
pub fn distance(mark: f64, entry: Option<f64>, inventory: i32) -> f64 {
    match entry {
        Some(e) if inventory != 0 && e != 0.0 && e.is_finite() => {
            let d = mark / e - 1.0;
            if d.is_finite() {
                d
            } else {
                0.0
            }
        }
        _ => 0.0,
    }
}

/// Distance fitted to [0, 1] on a log scale: clamp(0.5 + log10(1 + d * m), 0, 1).
pub fn fit_log_distance(d: f64, multiplier: f64) -> f64 {
    bounded(0.5 + safe_log10(1.0 + d * multiplier), 0.0, 1.0)
}

/// log10 of the per-lot commission factor, e.g. 0.0003 -> log10(99.97 / 100).
pub fn commission_drag(commission_trade: f64) -> f64 {
    let pct = commission_trade * 100.0;
    safe_log10((100.0 - pct) / 100.0)
}
