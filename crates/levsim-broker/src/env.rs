use levsim_config::{ActionMode, EpisodeConfig, SimConfig};
use levsim_portfolio::{Action, FillInfo};
use levsim_shaping::{FillContext, Observation, Shaping, Strategy};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::broker::{Broker, StepFill};
use crate::error::EnvError;
use crate::row::MarketRow;

/// Output of one environment step.
#[derive(Clone, Debug, PartialEq)]
pub struct StepOutput {
    pub observation: Observation,
    pub reward: f64,
    pub terminated: bool,
    pub fill: FillInfo,
}

/// End-of-episode figures.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EpisodeSummary {
    pub steps: u64,
    pub final_balance: f64,
    pub final_equity: f64,
    pub max_drawdown: f64,
    pub trades: u64,
    pub profitability: f64,
    pub cumulative_reward: f64,
    pub inventory: i32,
}

/// Drives one broker over a fixed slice of rows.
///
/// Per step: decode action -> fill on the current bar -> post-action reward
/// -> advance one bar -> observe -> termination check (flatten on end) ->
/// post-update reward.
#[derive(Clone, Debug)]
pub struct TradingEnv {
    broker: Broker,
    strategy: Strategy,
    mode: ActionMode,
    episode: EpisodeConfig,
    rows: Vec<MarketRow>,
    cursor: usize,
    started: bool,
    terminated: bool,
    cumulative_reward: f64,
    initial_mark: f64,
}

impl TradingEnv {
    pub fn new(cfg: &SimConfig, rows: Vec<MarketRow>) -> Result<Self, EnvError> {
        if rows.len() < 2 {
            return Err(EnvError::NotEnoughRows { got: rows.len() });
        }
        let broker = Broker::new(cfg)?;
        let kind = broker.strategy_kind();
        let mode = cfg.action_mode().map_err(crate::BrokerError::from)?;

        Ok(Self {
            broker,
            strategy: Strategy::new(kind, cfg.broker.commission_trade),
            mode,
            episode: cfg.episode.clone(),
            rows,
            cursor: 0,
            started: false,
            terminated: false,
            cumulative_reward: 0.0,
            initial_mark: 0.0,
        })
    }

    /// Start a new episode on the first row and return its observation.
    pub fn reset<R: Rng>(&mut self, rng: &mut R) -> Result<Observation, EnvError> {
        self.cursor = 0;
        self.broker.reset(self.rows[0].clone(), rng)?;
        self.started = true;
        self.terminated = false;
        self.cumulative_reward = 0.0;
        self.initial_mark = self.broker.mark()?;

        Ok(self.strategy.observe(&self.broker.snapshot()?))
    }

    pub fn decode(&self, raw: f64) -> Action {
        match self.mode {
            ActionMode::Discrete if raw.is_finite() => Action::from_discrete(raw as i64),
            ActionMode::Discrete => Action::Hold,
            ActionMode::Continuous => Action::from_continuous(raw),
        }
    }

    pub fn step(&mut self, raw_action: f64) -> Result<StepOutput, EnvError> {
        if !self.started {
            return Err(EnvError::NotReset);
        }
        if self.terminated {
            return Err(EnvError::DataExhausted { step: self.cursor });
        }

        let action = self.decode(raw_action);
        let StepFill { fill, pre } = self.broker.step(action)?;
        let ctx = FillContext::new(action, &fill, self.broker.inventory().inventory());
        let mut reward = self.strategy.post_action_reward(&pre, &ctx);

        self.cursor += 1;
        self.broker.update_state(self.rows[self.cursor].clone())?;
        let interval = self.episode.funding_interval_steps;
        if interval > 0 && self.broker.steps() % interval == 0 {
            self.broker.apply_funding_fee();
        }

        let observation = self.strategy.observe(&self.broker.snapshot()?);

        let out_of_rows = self.cursor >= self.rows.len() - 1;
        let blown = self.broker.max_drawdown() > self.episode.max_drawdown_limit;
        if out_of_rows || blown {
            self.terminated = true;
            self.broker.close_all()?;
        }

        reward += self.strategy.post_update_reward(
            self.broker.mark()?,
            pre.regime.mark,
            self.broker.inventory().inventory(),
        );
        self.cumulative_reward += reward;

        if self.terminated {
            let mark_change = if self.initial_mark != 0.0 {
                self.broker.mark()? / self.initial_mark * 100.0
            } else {
                0.0
            };
            info!(
                balance = self.broker.account().balance(),
                steps = self.cursor,
                trades = self.broker.inventory().stats().trades,
                reward = self.cumulative_reward,
                mark_change_pct = mark_change,
                drawdown_stop = blown,
                "episode ended"
            );
        }

        Ok(StepOutput {
            observation,
            reward,
            terminated: self.terminated,
            fill,
        })
    }

    pub fn summary(&self) -> EpisodeSummary {
        let ac = self.broker.account();
        let im = self.broker.inventory();
        EpisodeSummary {
            steps: self.broker.steps(),
            final_balance: ac.balance(),
            final_equity: ac.equity(),
            max_drawdown: ac.max_drawdown(),
            trades: im.stats().trades,
            profitability: im.profitability(),
            cumulative_reward: self.cumulative_reward,
            inventory: im.inventory(),
        }
    }

    pub fn broker(&self) -> &Broker {
        &self.broker
    }

    pub fn strategy(&self) -> &Strategy {
        &self.strategy
    }

    pub fn action_mode(&self) -> ActionMode {
        self.mode
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn is_terminated(&self) -> bool {
        self.terminated
    }

    pub fn cumulative_reward(&self) -> f64 {
        self.cumulative_reward
    }

    pub fn rows(&self) -> &[MarketRow] {
        &self.rows
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn row(close: f64) -> MarketRow {
        [("close", close), ("SMA5", close), ("V3", 0.5)]
            .into_iter()
            .collect()
    }

    #[test]
    fn hold_episode_summary_is_untouched() {
        let rows = vec![row(100.0), row(101.0), row(102.0)];
        let mut env = TradingEnv::new(&SimConfig::default(), rows).unwrap();
        env.reset(&mut StdRng::seed_from_u64(0)).unwrap();
        assert!(!env.step(2.0).unwrap().terminated);
        assert!(env.step(2.0).unwrap().terminated);

        let v = serde_json::to_value(env.summary()).unwrap();
        assert_eq!(v["steps"], 2);
        assert_eq!(v["trades"], 0);
        assert_eq!(v["final_balance"], 1000.0);
        assert_eq!(v["cumulative_reward"], 0.0);
    }

    #[test]
    fn discrete_decoding_truncates_and_holds_on_nan() {
        let env = TradingEnv::new(&SimConfig::default(), vec![row(1.0), row(1.0)]).unwrap();
        assert_eq!(env.decode(0.0), Action::Long);
        assert_eq!(env.decode(1.0), Action::Short);
        assert_eq!(env.decode(2.0), Action::Hold);
        assert_eq!(env.decode(f64::NAN), Action::Hold);
    }
}
