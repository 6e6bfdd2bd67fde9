//! levsim-broker
//!
//! Step orchestration for the leveraged single-instrument simulator.
//! - `Broker` owns the account, the inventory and the records and is the only writer
//! - Fill rules: reversals flatten in one step, capacity and idle are waits
//! - `TradingEnv` walks a row slice and pairs each step with shaped rewards
//! - Deterministic replay: same rows + actions (+ seed) => identical state

mod broker;
mod env;
mod error;
mod records;
mod row;

pub use broker::{Broker, StepFill};
pub use env::{EpisodeSummary, StepOutput, TradingEnv};
pub use error::{BrokerError, EnvError};
pub use records::{Records, RingBuffer};
pub use row::MarketRow;
