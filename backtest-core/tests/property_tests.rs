//! Property tests for strategy invariants.
//!
//! Uses proptest to verify, for both SMA and EMA:
//! 1. Signals alternate and the first one is a BUY
//! 2. Signals are strictly date-ordered and priced at a bar close
//! 3. Determinism: the same input gives the same output
//! 4. Idempotence: one instance reused across runs gives identical output
//! 5. InsufficientData whenever the series is shorter than the window

use backtest_core::strategy::{create_strategy, PositionState, RiskConfig, StrategyKind};
use backtest_core::{MarketSeries, PortfolioSimulator, PriceBar, SignalKind, StrategyError};
use chrono::NaiveDate;
use proptest::prelude::*;

// ── Strategies (proptest) ────────────────────────────────────────────

fn arb_closes(min_len: usize) -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec((1.0..500.0_f64).prop_map(|p| (p * 100.0).round() / 100.0), min_len..120)
}

fn arb_kind() -> impl Strategy<Value = StrategyKind> {
    prop_oneof![Just(StrategyKind::Sma), Just(StrategyKind::Ema)]
}

fn arb_config() -> impl Strategy<Value = RiskConfig> {
    (2usize..15, 0.0..0.5_f64, 0.0..1.0_f64)
        .prop_map(|(window, sl, tp)| RiskConfig::new(window, sl, tp))
}

fn series_from(closes: &[f64]) -> MarketSeries {
    let base = NaiveDate::from_ymd_opt(2023, 1, 2).unwrap();
    MarketSeries::new(
        closes
            .iter()
            .enumerate()
            .map(|(i, &c)| {
                PriceBar::new("PROP", base + chrono::Duration::days(i as i64), c, c, c, c, 100)
            })
            .collect(),
    )
}

proptest! {
    #[test]
    fn signals_alternate_starting_with_buy(
        closes in arb_closes(15),
        kind in arb_kind(),
        config in arb_config(),
    ) {
        let strategy = create_strategy(kind, config).unwrap();
        let signals = strategy.simulate_trades(&series_from(&closes)).unwrap();

        if let Some(first) = signals.first() {
            prop_assert_eq!(first.kind, SignalKind::Buy);
        }
        for pair in signals.windows(2) {
            prop_assert_ne!(pair[0].kind, pair[1].kind);
        }
    }

    #[test]
    fn signals_are_date_ordered_at_bar_closes(
        closes in arb_closes(15),
        kind in arb_kind(),
        config in arb_config(),
    ) {
        let series = series_from(&closes);
        let strategy = create_strategy(kind, config).unwrap();
        let signals = strategy.simulate_trades(&series).unwrap();

        for pair in signals.windows(2) {
            prop_assert!(pair[0].date < pair[1].date);
        }
        for signal in &signals {
            let bar = series.bars().iter().find(|b| b.date == signal.date).unwrap();
            prop_assert_eq!(bar.close, signal.price);
            // the last bar is never evaluated
            prop_assert!(Some(signal.date) != series.last_date());
        }
    }

    #[test]
    fn simulate_trades_is_deterministic(
        closes in arb_closes(15),
        kind in arb_kind(),
        config in arb_config(),
    ) {
        let series = series_from(&closes);
        let a = create_strategy(kind, config).unwrap().simulate_trades(&series).unwrap();
        let b = create_strategy(kind, config).unwrap().simulate_trades(&series).unwrap();
        prop_assert_eq!(a, b);
    }

    #[test]
    fn reused_instance_is_idempotent(
        closes in arb_closes(15),
        kind in arb_kind(),
        config in arb_config(),
    ) {
        let series = series_from(&closes);
        let strategy = create_strategy(kind, config).unwrap();
        let mut state = PositionState::default();

        let first = strategy.simulate_trades_with(&series, &mut state).unwrap();
        let terminal = state;
        let second = strategy.simulate_trades_with(&series, &mut state).unwrap();

        prop_assert_eq!(first, second);
        prop_assert_eq!(terminal, state);
    }

    #[test]
    fn terminal_state_matches_last_signal(
        closes in arb_closes(15),
        kind in arb_kind(),
        config in arb_config(),
    ) {
        let strategy = create_strategy(kind, config).unwrap();
        let mut state = PositionState::default();
        let signals = strategy.simulate_trades_with(&series_from(&closes), &mut state).unwrap();

        let open_at_end = signals.last().is_some_and(|s| s.kind == SignalKind::Buy);
        prop_assert_eq!(state.position_open, open_at_end);
    }

    #[test]
    fn short_series_is_insufficient_data(
        window in 2usize..30,
        kind in arb_kind(),
    ) {
        let closes = vec![10.0; window - 1];
        let strategy = create_strategy(kind, RiskConfig::new(window, 0.1, 0.2)).unwrap();
        let err = strategy.simulate_trades(&series_from(&closes)).unwrap_err();
        prop_assert_eq!(
            err,
            StrategyError::InsufficientData { required: window, available: window - 1 }
        );
    }

    #[test]
    fn flat_book_after_sell_means_profit_equals_cash_delta(
        closes in arb_closes(15),
        kind in arb_kind(),
        config in arb_config(),
        cash in 1_000.0..1_000_000.0_f64,
    ) {
        let strategy = create_strategy(kind, config).unwrap();
        let signals = strategy.simulate_trades(&series_from(&closes)).unwrap();
        let summary = PortfolioSimulator::new(cash).run(&signals);

        if signals.last().map_or(true, |s| s.kind == SignalKind::Sell) {
            prop_assert_eq!(summary.shares_owned, 0.0);
            prop_assert!((summary.net_profit - (summary.final_cash_balance - cash)).abs() < 1e-6);
        }
    }
}
