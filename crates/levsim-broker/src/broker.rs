use levsim_config::{FieldsConfig, SimConfig, StrategyKind};
use levsim_portfolio::{
    Account, Action, FillInfo, InventoryManager, InventoryParams, REASON_IDLE,
};
use levsim_shaping::{PositionView, RegimeMarks, StepSnapshot};
use rand::Rng;
use tracing::{debug, trace};

use crate::error::BrokerError;
use crate::records::Records;
use crate::row::MarketRow;

/// Current bar with its parsed price and regime marks.
#[derive(Clone, Debug, PartialEq)]
struct Bar {
    row: MarketRow,
    price: f64,
    regime: RegimeMarks,
}

/// Result of one broker step.
#[derive(Clone, Debug, PartialEq)]
pub struct StepFill {
    pub fill: FillInfo,
    /// Snapshot taken on the same bar immediately before the fill.
    pub pre: StepSnapshot,
}

/// Step orchestrator. Sole owner of the account, the inventory and the records.
///
/// Transition rules, given signed inventory I:
/// - Long: I < 0 flattens every short lot in one fill; otherwise opens/adds a long
/// - Short: I > 0 flattens every long lot; otherwise opens/adds a short, unless
///   long-only, in which case it is an idle wait
/// - Hold: idle wait
///
/// Waits are results, never errors. The idle counter resets on any real fill.
#[derive(Clone, Debug, PartialEq)]
pub struct Broker {
    kind: StrategyKind,
    fields: FieldsConfig,
    long_only: bool,
    funding_rate: f64,
    account: Account,
    inventory: InventoryManager,
    records: Records,
    bar: Option<Bar>,
    steps: u64,
    idle_steps: u64,
    lowest: Option<f64>,
}

impl Broker {
    pub fn new(cfg: &SimConfig) -> Result<Self, BrokerError> {
        cfg.validate()?;
        let kind = cfg.strategy_kind()?;
        let b = &cfg.broker;

        let params = InventoryParams {
            max_order: b.max_order,
            leverage: b.leverage,
            minimum_lot: b.minimum_lot,
            commission_rate: b.commission_trade,
            random_inventory: b.is_random_inventory,
            long_only: b.is_long_only,
        };

        Ok(Self {
            kind,
            fields: cfg.fields.clone(),
            long_only: b.is_long_only,
            funding_rate: b.commission_funding,
            account: Account::new(b.starting_balance),
            inventory: InventoryManager::new(params, b.starting_balance),
            records: Records::new(&cfg.records),
            bar: None,
            steps: 0,
            idle_steps: 0,
            lowest: None,
        })
    }

    /// Start an episode on `row`. `rng` is only drawn from when randomized
    /// starting inventory is enabled.
    pub fn reset<R: Rng>(&mut self, row: MarketRow, rng: &mut R) -> Result<(), BrokerError> {
        let bar = self.parse(row)?;

        self.steps = 0;
        self.idle_steps = 0;
        self.lowest = None;
        self.account.reset();
        self.inventory
            .reset(self.account.balance(), bar.price, bar.row.marks(), rng);
        self.records.reset();

        self.update_state(bar.row)
    }

    /// Apply one decision on the current bar.
    pub fn step(&mut self, action: Action) -> Result<StepFill, BrokerError> {
        let pre = self.snapshot()?;
        let inv = self.inventory.inventory();

        let fill = match action {
            Action::Long if inv < 0 => self.flatten()?,
            Action::Long => self.buy()?,
            Action::Short if inv > 0 => self.flatten()?,
            Action::Short if !self.long_only => self.sell()?,
            Action::Short | Action::Hold => FillInfo::wait(REASON_IDLE, pre.price),
        };

        self.after_action(&fill, pre.price);
        Ok(StepFill { fill, pre })
    }

    /// Move to the next bar and revalue.
    pub fn update_state(&mut self, row: MarketRow) -> Result<(), BrokerError> {
        let bar = self.parse(row)?;
        let price = bar.price;
        let mark = bar.regime.mark;
        self.bar = Some(bar);

        self.account.update_margin(price, self.inventory.orders_mut());
        self.account.update_drawdown();
        self.update_lowest(mark);

        trace!(
            price,
            equity = self.account.equity(),
            drawdown = self.account.drawdown(),
            inventory = self.inventory.inventory(),
            "state updated"
        );
        Ok(())
    }

    /// Close every open lot at the current price. Used by the episode
    /// driver on termination.
    pub fn close_all(&mut self) -> Result<FillInfo, BrokerError> {
        self.flatten()
    }

    /// Charge one funding period on every open lot.
    pub fn apply_funding_fee(&mut self) {
        self.inventory.apply_funding_fee(self.funding_rate);
    }

    /// Immutable view of the current bar and position.
    pub fn snapshot(&self) -> Result<StepSnapshot, BrokerError> {
        let bar = self.bar.as_ref().ok_or(BrokerError::NotReset)?;
        Ok(StepSnapshot {
            price: bar.price,
            regime: bar.regime.clone(),
            position: PositionView {
                inventory: self.inventory.inventory(),
                max_order: self.inventory.params().max_order,
                avg_entry: self.inventory.average_entry_mark(&self.fields.mark),
                last_entry: self.inventory.last_entry_mark(&self.fields.mark),
                lowest: self.lowest,
            },
        })
    }

    // ---------------------------------------------------------------------
    // Fills
    // ---------------------------------------------------------------------

    fn buy(&mut self) -> Result<FillInfo, BrokerError> {
        let bar = self.bar.as_ref().ok_or(BrokerError::NotReset)?;
        let price = bar.price;
        let fill = self
            .inventory
            .buy(price, self.account.balance(), bar.row.marks());
        self.after_sales(price, &fill);
        Ok(fill)
    }

    fn sell(&mut self) -> Result<FillInfo, BrokerError> {
        let bar = self.bar.as_ref().ok_or(BrokerError::NotReset)?;
        let price = bar.price;
        let fill = self
            .inventory
            .sell(price, self.account.balance(), bar.row.marks());
        self.after_sales(price, &fill);
        Ok(fill)
    }

    fn flatten(&mut self) -> Result<FillInfo, BrokerError> {
        let price = self.price()?;
        let fill = self.inventory.close_all(price);
        self.after_sales(price, &fill);
        Ok(fill)
    }

    fn after_sales(&mut self, price: f64, fill: &FillInfo) {
        if fill.profit != 0.0 {
            self.account.realize(fill.profit);
        }
        self.account.update_margin(price, self.inventory.orders_mut());
        self.account.update_drawdown();
        if let Some(mark) = self.bar.as_ref().map(|b| b.regime.mark) {
            self.update_lowest(mark);
        }
    }

    fn after_action(&mut self, fill: &FillInfo, price: f64) {
        self.steps += 1;
        if fill.is_wait() {
            self.idle_steps += 1;
        } else {
            self.idle_steps = 0;
            debug!(
                step = self.steps,
                kind = %fill.kind,
                lots = fill.lots,
                price = fill.price,
                profit = fill.profit,
                inventory = self.inventory.inventory(),
                balance = self.account.balance(),
                "fill applied"
            );
        }

        self.records.record_step(
            price,
            self.account.equity(),
            self.inventory.inventory(),
            self.inventory.current_position(),
            fill,
        );
    }

    /// Lowest mark while a position is open; unset while flat.
    fn update_lowest(&mut self, mark: f64) {
        self.lowest = if self.inventory.inventory() == 0 {
            None
        } else {
            Some(self.lowest.map_or(mark, |low| low.min(mark)))
        };
    }

    fn parse(&self, row: MarketRow) -> Result<Bar, BrokerError> {
        let price = row.require(&self.fields.price)?;
        let regime = RegimeMarks::from_row(self.kind, &self.fields, row.marks())?;
        Ok(Bar { row, price, regime })
    }

    // ---------------------------------------------------------------------
    // Read surface
    // ---------------------------------------------------------------------

    pub fn price(&self) -> Result<f64, BrokerError> {
        self.bar.as_ref().map(|b| b.price).ok_or(BrokerError::NotReset)
    }

    pub fn mark(&self) -> Result<f64, BrokerError> {
        self.bar
            .as_ref()
            .map(|b| b.regime.mark)
            .ok_or(BrokerError::NotReset)
    }

    pub fn row(&self) -> Option<&MarketRow> {
        self.bar.as_ref().map(|b| &b.row)
    }

    pub fn drawdown(&self) -> f64 {
        self.account.drawdown()
    }

    pub fn max_drawdown(&self) -> f64 {
        self.account.max_drawdown()
    }

    /// max(equity, 0) / balance - 1. 0 when balance <= 0.
    pub fn profit(&self) -> f64 {
        let balance = self.account.balance();
        if balance <= 0.0 {
            return 0.0;
        }
        self.account.equity().max(0.0) / balance - 1.0
    }

    pub fn idle_steps(&self) -> u64 {
        self.idle_steps
    }

    pub fn steps(&self) -> u64 {
        self.steps
    }

    pub fn lowest_mark(&self) -> Option<f64> {
        self.lowest
    }

    /// mark / size-weighted entry mark - 1. 0 when flat.
    pub fn distance_from_average(&self, mark: f64) -> f64 {
        levsim_shaping::math::distance(
            mark,
            self.inventory.average_entry_mark(&self.fields.mark),
            self.inventory.inventory(),
        )
    }

    /// mark / most recent entry mark - 1. 0 when flat.
    pub fn distance_from_last(&self, mark: f64) -> f64 {
        levsim_shaping::math::distance(
            mark,
            self.inventory.last_entry_mark(&self.fields.mark),
            self.inventory.inventory(),
        )
    }

    pub fn strategy_kind(&self) -> StrategyKind {
        self.kind
    }

    pub fn is_long_only(&self) -> bool {
        self.long_only
    }

    pub fn account(&self) -> &Account {
        &self.account
    }

    pub fn inventory(&self) -> &InventoryManager {
        &self.inventory
    }

    pub fn records(&self) -> &Records {
        &self.records
    }
}
