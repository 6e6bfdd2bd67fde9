/// JSON-pointer prefixes read by the simulator. A leaf under any of these
/// is consumed; anything else in a loaded document is reported as unused.
///
/// Keep in step with the fields of `SimConfig`.
pub fn consumed_pointers() -> &'static [&'static str] {
    CONSUMED
}

static CONSUMED: &[&str] = &[
    "/broker/starting_balance",
    "/broker/leverage",
    "/broker/max_order",
    "/broker/minimum_lot",
    "/broker/commission_trade",
    "/broker/commission_funding",
    "/broker/is_long_only",
    "/broker/is_random_inventory",
    "/broker/is_scalping",
    "/broker/strategy_type",
    "/broker/action_mode",
    "/episode/max_drawdown_limit",
    "/episode/funding_interval_steps",
    "/fields/price",
    "/fields/mark",
    "/fields/deviation",
    "/fields/upper_channel",
    "/fields/lower_channel",
    "/fields/upper_shift",
    "/fields/lower_shift",
    "/fields/upper_shift_5",
    "/fields/lower_shift_5",
    "/records/enabled",
    "/records/window",
    "/records/equity_curve",
    "/records/fills",
];
