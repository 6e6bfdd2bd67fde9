use levsim_config::StrategyKind;
use levsim_shaping::{
    ChannelMarks, DonchianFeatures, PositionView, RegimeMarks, RegimeSignal, Shaping, StepSnapshot,
    Strategy,
};

fn assert_vec_close(got: &[f64], want: &[f64]) {
    assert_eq!(got.len(), want.len(), "length: got {got:?}");
    for (i, (g, w)) in got.iter().zip(want).enumerate() {
        assert!((g - w).abs() < 1e-12, "slot {i}: got {g}, want {w} (full: {got:?})");
    }
}

fn position(inventory: i32, avg: f64, last: f64, lowest: Option<f64>) -> PositionView {
    PositionView {
        inventory,
        max_order: 10,
        avg_entry: Some(avg),
        last_entry: Some(last),
        lowest,
    }
}

fn dual_ma_snapshot(deviation: f64, mark: f64, position: PositionView) -> StepSnapshot {
    StepSnapshot {
        price: mark,
        regime: RegimeMarks {
            mark,
            signal: RegimeSignal::Deviation(deviation),
        },
        position,
    }
}

fn channel_snapshot(mark: f64, channel: ChannelMarks, position: PositionView) -> StepSnapshot {
    StepSnapshot {
        price: mark,
        regime: RegimeMarks {
            mark,
            signal: RegimeSignal::Channel(channel),
        },
        position,
    }
}

#[test]
fn dual_ma_short_position_without_session_low() {
    let s = Strategy::new(StrategyKind::DualMa, 0.0003);
    let snap = dual_ma_snapshot(-5.0, 95.0, position(-3, 100.0, 100.0, None));

    let obs = s.observe(&snap);
    assert_vec_close(
        obs.as_slice(),
        // distance -0.05 fitted with multiplier 2
        &[0.4, 0.5 + 0.9f64.log10(), 0.5, 0.0, 0.3],
    );
}

#[test]
fn dual_ma_long_position_with_session_low_and_clamped_deviation() {
    let s = Strategy::new(StrategyKind::DualMa, 0.0003);
    let snap = dual_ma_snapshot(30.0, 110.0, position(4, 100.0, 105.0, Some(90.0)));

    let d_low: f64 = 110.0 / 90.0 - 1.0;
    let obs = s.observe(&snap);
    assert_vec_close(
        obs.as_slice(),
        &[1.0, 0.5 + 1.2f64.log10(), 0.5 + (1.0 + 2.0 * d_low).log10(), 0.4, 0.0],
    );
}

#[test]
fn donchian_short_position_with_mixed_flags() {
    let s = Strategy::new(StrategyKind::Donchian, 0.0003);
    let channel = ChannelMarks {
        upper: 110.0,
        lower: 90.0,
        upper_shift: false,
        lower_shift: true,
        upper_shift_5: true,
        lower_shift_5: false,
    };
    let snap = channel_snapshot(100.0, channel, position(-3, 125.0, 110.0, None));

    let obs = s.observe(&snap);
    assert_vec_close(
        obs.as_slice(),
        &[
            0.5,
            1.0, // lower shifted this bar
            0.0, // upper shifted this bar
            1.0, // upper shifted within 5 rows
            0.0, // lower shifted within 5 rows
            0.5 + 0.8f64.log10(),
            0.5,
            0.5 + (100.0f64 / 110.0).log10(),
            -0.3,
        ],
    );

    let f = DonchianFeatures::from_snapshot(&snap);
    assert_eq!(f.to_vec(), obs.as_slice().to_vec());
    assert_eq!(f.lower_shift, 1.0);
    assert_eq!(f.upper_shift, 0.0);
}

#[test]
fn donchian_long_position_above_channel_clamps_position_and_inventory() {
    let s = Strategy::new(StrategyKind::Donchian, 0.0003);
    let channel = ChannelMarks {
        upper: 110.0,
        lower: 90.0,
        upper_shift: true,
        lower_shift: false,
        upper_shift_5: false,
        lower_shift_5: true,
    };
    let snap = channel_snapshot(120.0, channel, position(12, 100.0, 120.0, Some(96.0)));

    let obs = s.observe(&snap);
    assert_vec_close(
        obs.as_slice(),
        &[
            1.0,
            0.0,
            1.0,
            0.0,
            1.0,
            // multiplier 1
            0.5 + 1.2f64.log10(),
            0.5 + 1.25f64.log10(),
            0.5,
            1.0,
        ],
    );
}
