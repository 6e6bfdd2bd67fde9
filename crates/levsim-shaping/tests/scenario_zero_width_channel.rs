use levsim_config::StrategyKind;
use levsim_shaping::{
    ChannelMarks, PositionView, RegimeMarks, RegimeSignal, Shaping, StepSnapshot, Strategy,
};

#[test]
fn scenario_zero_width_channel_is_neutral_regardless_of_mark() {
    let s = Strategy::new(StrategyKind::Donchian, 0.0003);

    for mark in [0.0, 1.0, 50.0, 100.0, 1e12] {
        let snap = StepSnapshot {
            price: mark,
            regime: RegimeMarks {
                mark,
                signal: RegimeSignal::Channel(ChannelMarks {
                    upper: 100.0,
                    lower: 100.0,
                    upper_shift: false,
                    lower_shift: false,
                    upper_shift_5: false,
                    lower_shift_5: false,
                }),
            },
            position: PositionView::flat(10),
        };
        let obs = s.observe(&snap);
        assert_eq!(obs.len(), 9);
        assert_eq!(obs.as_slice()[0], 0.5, "position_inside_channel at mark {mark}");
    }
}
