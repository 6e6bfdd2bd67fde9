use levsim_broker::{EnvError, MarketRow, TradingEnv};
use levsim_config::SimConfig;
use rand::rngs::StdRng;
use rand::SeedableRng;

fn rows(closes: &[f64]) -> Vec<MarketRow> {
    closes
        .iter()
        .map(|&c| [("close", c), ("SMA5", c), ("V3", 2.0)].into_iter().collect())
        .collect()
}

#[test]
fn scenario_crash_terminates_on_drawdown_and_flattens() {
    let mut cfg = SimConfig::default();
    cfg.broker.leverage = 50.0;
    cfg.episode.max_drawdown_limit = 0.5;

    let closes = [100.0, 100.0, 100.0, 99.0, 97.0, 95.0, 90.0, 80.0, 70.0, 60.0, 50.0];
    let mut env = TradingEnv::new(&cfg, rows(&closes)).unwrap();
    env.reset(&mut StdRng::seed_from_u64(0)).unwrap();

    let mut last_max = 0.0;
    let mut terminated_at = None;
    for step in 0..closes.len() - 1 {
        let out = env.step(0.0).unwrap();
        let b = env.broker();
        let dd = b.drawdown();
        assert!((0.0..=1.0).contains(&dd), "drawdown out of range: {dd}");
        assert_eq!(dd == 1.0, b.account().equity() <= 0.0);
        assert!(b.max_drawdown() >= last_max, "max drawdown decreased");
        last_max = b.max_drawdown();
        assert!(out.reward.is_finite());
        if out.terminated {
            terminated_at = Some(step);
            break;
        }
    }

    let at = terminated_at.expect("a 50x long into a crash must stop out");
    assert!(at < closes.len() - 2, "stopped by drawdown before the data ran out");
    assert!(env.broker().max_drawdown() > 0.5);
    assert_eq!(env.broker().inventory().inventory(), 0, "terminal flatten");
    assert_eq!(env.broker().account().equity(), env.broker().account().balance());

    assert_eq!(
        env.step(0.0).unwrap_err(),
        EnvError::DataExhausted { step: env.cursor() }
    );
}

#[test]
fn scenario_episode_ends_on_last_row() {
    let closes = [100.0, 101.0, 102.0, 103.0];
    let mut env = TradingEnv::new(&SimConfig::default(), rows(&closes)).unwrap();
    env.reset(&mut StdRng::seed_from_u64(0)).unwrap();

    assert!(!env.step(0.0).unwrap().terminated);
    assert!(!env.step(0.0).unwrap().terminated);
    let last = env.step(2.0).unwrap();
    assert!(last.terminated);
    assert_eq!(env.cursor(), closes.len() - 1);

    let s = env.summary();
    assert_eq!(s.inventory, 0);
    assert_eq!(s.trades, 2, "two lots closed by the terminal flatten");
    assert_eq!(s.steps, 3);
    assert!(s.final_balance > 1000.0);
}

#[test]
fn scenario_env_guards() {
    assert_eq!(
        TradingEnv::new(&SimConfig::default(), rows(&[100.0])).unwrap_err(),
        EnvError::NotEnoughRows { got: 1 }
    );

    let mut env = TradingEnv::new(&SimConfig::default(), rows(&[1.0, 2.0])).unwrap();
    assert_eq!(env.step(0.0).unwrap_err(), EnvError::NotReset);
}
