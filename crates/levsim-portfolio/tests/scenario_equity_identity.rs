use levsim_portfolio::{Account, FillKind, InventoryManager, InventoryParams, MarkMap};

const EPS: f64 = 1e-9;

fn check(ac: &Account, im: &InventoryManager) {
    let open: f64 = im.orders().iter().map(|o| o.profit()).sum();
    assert!(
        (ac.equity() - (ac.balance() + open)).abs() < EPS,
        "equity {} != balance {} + open {}",
        ac.equity(),
        ac.balance(),
        open
    );
    if im.inventory() == 0 {
        assert_eq!(ac.equity(), ac.balance(), "flat equity must equal balance exactly");
    }
    assert!((0.0..=1.0).contains(&ac.drawdown()));
    assert_eq!(im.orders().len() as u32, im.inventory().unsigned_abs());
}

#[test]
fn scenario_equity_identity_over_mixed_fills() {
    let mut im = InventoryManager::new(
        InventoryParams {
            max_order: 4,
            leverage: 10.0,
            minimum_lot: 10.0,
            commission_rate: 0.0005,
            random_inventory: false,
            long_only: false,
        },
        1000.0,
    );
    let mut ac = Account::new(1000.0);
    let m = MarkMap::new();

    let prices = [100.0, 101.5, 99.0, 97.25, 98.0, 103.0, 104.5, 102.0, 100.0, 95.0, 96.0, 99.5];
    let plan = [0u8, 0, 0, 1, 2, 1, 1, 1, 1, 0, 2, 2];
    let mut last_max_dd = 0.0;

    for (price, step) in prices.iter().copied().zip(plan) {
        let fill = match step {
            0 => im.buy(price, ac.balance(), &m),
            1 => im.sell(price, ac.balance(), &m),
            _ => im.close_all(price),
        };
        if fill.kind != FillKind::Wait && fill.profit != 0.0 {
            ac.realize(fill.profit);
        }
        ac.update_margin(price, im.orders_mut());
        ac.update_drawdown();

        check(&ac, &im);
        assert!(ac.max_drawdown() >= last_max_dd, "max drawdown must never decrease");
        last_max_dd = ac.max_drawdown();
    }
}
