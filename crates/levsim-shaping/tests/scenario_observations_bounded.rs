use levsim_config::StrategyKind;
use levsim_shaping::{
    ChannelMarks, PositionView, RegimeMarks, RegimeSignal, Shaping, StepSnapshot, Strategy,
};

fn extreme_positions() -> Vec<PositionView> {
    vec![
        PositionView::flat(10),
        PositionView {
            inventory: 10,
            max_order: 10,
            avg_entry: Some(1e-300),
            last_entry: Some(0.0),
            lowest: Some(f64::MAX),
        },
        PositionView {
            inventory: -25,
            max_order: 10,
            avg_entry: Some(f64::NAN),
            last_entry: Some(-4.0),
            lowest: Some(1e-9),
        },
        PositionView {
            inventory: 3,
            max_order: 0,
            avg_entry: None,
            last_entry: None,
            lowest: None,
        },
    ]
}

fn signals() -> Vec<(StrategyKind, RegimeSignal)> {
    vec![
        (StrategyKind::DualMa, RegimeSignal::Deviation(1e9)),
        (StrategyKind::DualMa, RegimeSignal::Deviation(f64::NAN)),
        (StrategyKind::DualMa, RegimeSignal::Deviation(f64::NEG_INFINITY)),
        (
            StrategyKind::Donchian,
            RegimeSignal::Channel(ChannelMarks {
                upper: f64::INFINITY,
                lower: 0.0,
                upper_shift: true,
                lower_shift: true,
                upper_shift_5: true,
                lower_shift_5: true,
            }),
        ),
        (
            StrategyKind::Donchian,
            RegimeSignal::Channel(ChannelMarks {
                upper: 1.0,
                lower: 2.0,
                upper_shift: false,
                lower_shift: false,
                upper_shift_5: false,
                lower_shift_5: false,
            }),
        ),
    ]
}

#[test]
fn scenario_observations_are_finite_and_bounded() {
    for (kind, signal) in signals() {
        let s = Strategy::new(kind, 0.0003);
        for mark in [0.0, -1.0, 1e300, f64::NAN] {
            for position in extreme_positions() {
                let snap = StepSnapshot {
                    price: mark,
                    regime: RegimeMarks {
                        mark,
                        signal: signal.clone(),
                    },
                    position,
                };
                let obs = s.observe(&snap);
                assert_eq!(obs.len(), s.observation_len());
                for (i, v) in obs.as_slice().iter().enumerate() {
                    assert!(v.is_finite(), "{kind} obs[{i}] not finite: {v}");
                    assert!((-1.0..=1.0).contains(v), "{kind} obs[{i}] out of range: {v}");
                }
            }
        }
    }
}
