//! Property tests for the runner.
//!
//! `run_on_series` must agree with driving the core pieces by hand, and its
//! result must be a pure function of (config, series).

use backtest_core::strategy::{create_strategy, StrategyKind};
use backtest_core::{MarketSeries, PortfolioSimulator, PriceBar};
use backtest_runner::{run_on_series, BacktestConfig};
use chrono::NaiveDate;
use proptest::prelude::*;

// ── Strategies (proptest) ────────────────────────────────────────────

fn arb_closes() -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(
        (1.0..300.0_f64).prop_map(|p| (p * 100.0).round() / 100.0),
        20..100,
    )
}

fn arb_config() -> impl Strategy<Value = BacktestConfig> {
    (
        prop_oneof![Just(StrategyKind::Sma), Just(StrategyKind::Ema)],
        2usize..15,
        0.0..0.5_f64,
        0.0..1.0_f64,
        1_000.0..100_000.0_f64,
    )
        .prop_map(|(kind, window, sl, tp, cash)| {
            let mut config = BacktestConfig::default();
            config.backtest.symbol = "PROP".into();
            config.backtest.initial_cash = cash;
            config.strategy.kind = kind;
            config.strategy.observation_window = window;
            config.strategy.stop_loss_pct = sl;
            config.strategy.take_profit_pct = tp;
            config
        })
}

fn series_from(closes: &[f64]) -> MarketSeries {
    let base = NaiveDate::from_ymd_opt(2023, 1, 2).unwrap();
    MarketSeries::new(
        closes
            .iter()
            .enumerate()
            .map(|(i, &c)| {
                let day = base + chrono::Duration::days(i as i64);
                PriceBar::new("PROP", day, c, c, c, c, 100)
            })
            .collect(),
    )
}

proptest! {
    #[test]
    fn runner_matches_core_pipeline(closes in arb_closes(), config in arb_config()) {
        let series = series_from(&closes);
        let result = run_on_series(&config, &series).unwrap();

        let strategy = create_strategy(config.strategy.kind, config.to_risk_config()).unwrap();
        let signals = strategy.simulate_trades(&series).unwrap();
        let summary = PortfolioSimulator::new(config.backtest.initial_cash).run(&signals);

        prop_assert_eq!(&result.signals, &signals);
        prop_assert_eq!(result.summary, summary);
        prop_assert!(result.executions.len() <= result.signals.len());
        prop_assert_eq!(result.bar_count, closes.len());
    }

    #[test]
    fn run_on_series_is_deterministic(closes in arb_closes(), config in arb_config()) {
        let series = series_from(&closes);
        let a = run_on_series(&config, &series).unwrap();
        let b = run_on_series(&config, &series).unwrap();

        prop_assert_eq!(a.dataset_hash, b.dataset_hash);
        prop_assert_eq!(a.signals, b.signals);
        prop_assert_eq!(a.executions, b.executions);
        prop_assert_eq!(a.summary, b.summary);
    }
}
