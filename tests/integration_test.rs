//! End-to-end simulation tests over the public domain API.
//!
//! Tests cover:
//! - Flat and trending markets with known crossover timing
//! - Capital conservation across the trade ledger
//! - Stop-loss, take-profit and run-end exits
//! - Insufficient history
//! - Parallel batches, their determinism and combined totals
//! - Every strategy over synthetic data

mod common;

use approx::assert_relative_eq;
use chrono::Duration;
use common::*;
use fxbacktest::adapters::json_report_adapter::JsonReportAdapter;
use fxbacktest::adapters::synthetic_adapter::SyntheticAdapter;
use fxbacktest::domain::backtest::{run_backtest, run_batch, simulate, BacktestJob};
use fxbacktest::domain::execution::FixedSlippage;
use fxbacktest::domain::metrics::{BacktestResult, BatchSummary};
use fxbacktest::domain::position::ExitReason;
use fxbacktest::domain::signal::{Direction, Signal};
use fxbacktest::domain::strategy::{
    BollingerParams, MacdParams, MultiIndicatorParams, RiskParams, RsiParams,
    SmaCrossoverParams, Strategy, StrategyConfig,
};
use fxbacktest::ports::data_port::DataPort;

fn sma_strategy() -> StrategyConfig {
    StrategyConfig::new(Strategy::SmaCrossover(SmaCrossoverParams::default()))
}

fn assert_conserved(result: &BacktestResult) {
    let pnl: f64 = result.trades.iter().map(|t| t.pnl).sum();
    assert_relative_eq!(
        result.final_capital,
        result.initial_capital + pnl - result.total_commission(),
        epsilon = 1e-6
    );
}

fn all_strategies() -> Vec<StrategyConfig> {
    vec![
        StrategyConfig::new(Strategy::SmaCrossover(SmaCrossoverParams::default())),
        StrategyConfig::new(Strategy::RsiMeanReversion(RsiParams::default())),
        StrategyConfig::new(Strategy::BollingerBands(BollingerParams::default())),
        StrategyConfig::new(Strategy::Macd(MacdParams::default())),
        StrategyConfig::new(Strategy::MultiIndicator(MultiIndicatorParams::default())),
    ]
}

mod market_scenarios {
    use super::*;

    #[test]
    fn flat_market_never_trades() {
        let candles = flat_candles(100, 1.1);
        let config = make_config("EUR/USD", 10_000.0);

        let result = run_backtest(&candles, &sma_strategy(), &config, &mut FixedSlippage(1.0));

        assert_eq!(result.total_trades, 0);
        assert_eq!(result.final_capital, 10_000.0);
        assert_eq!(result.max_drawdown, 0.0);
        assert_eq!(result.sharpe_ratio, 0.0);
        // No losing trades over a completed run.
        assert!(result.profit_factor.is_infinite());
        // 100 hourly candles span 5 calendar days; the last partial day is not recorded.
        assert_eq!(result.daily_returns.len(), 4);
        assert!(result.daily_returns.iter().all(|d| d.daily_return == 0.0));
    }

    #[test]
    fn v_shape_buys_on_golden_cross_and_takes_profit() {
        // Down 60 steps, bottom at index 60, then up 80 steps.
        let candles = v_shape(60, 80, 1.2, 0.001);
        let config = make_config("EUR/USD", 10_000.0);

        let result = run_backtest(&candles, &sma_strategy(), &config, &mut FixedSlippage(1.0));

        assert_eq!(result.total_trades, 1);
        let trade = &result.trades[0];
        assert_eq!(trade.direction, Direction::Buy);
        // Fast SMA(10) first exceeds SMA(30) thirteen candles after the bottom.
        assert_eq!(trade.entry_time, candles[73].timestamp);
        assert_eq!(trade.exit_reason, ExitReason::TakeProfit);
        assert!(trade.pnl > 0.0);
        assert!(trade.exit_price >= trade.entry_price * 1.04);
        assert_eq!(result.winning_trades, 1);
        assert_eq!(result.win_rate, 1.0);
        assert!(result.profit_factor.is_infinite());
        assert!(result.final_capital > 10_000.0);
        assert_conserved(&result);
    }

    #[test]
    fn inverted_v_sells_on_death_cross() {
        let closes: Vec<f64> = (0..60)
            .map(|i| 1.1 + 0.001 * i as f64)
            .chain((0..80).map(|i| 1.16 - 0.001 * i as f64))
            .collect();
        let candles = hourly_candles(&closes);
        let config = make_config("GBP/USD", 10_000.0);

        let result = run_backtest(&candles, &sma_strategy(), &config, &mut FixedSlippage(1.0));

        assert!(result.total_trades >= 1);
        let trade = &result.trades[0];
        assert_eq!(trade.direction, Direction::Sell);
        assert!(trade.exit_price < trade.entry_price);
        assert!(trade.pnl > 0.0);
        assert_conserved(&result);
    }

    #[test]
    fn up_then_down_ramp_shorts_after_the_top() {
        let closes: Vec<f64> = (0..60)
            .map(|i| 1.1 + 0.001 * i as f64)
            .chain((0..60).map(|i| 1.16 - 0.001 * i as f64))
            .collect();
        let candles = hourly_candles(&closes);
        let config = make_config("EUR/USD", 10_000.0);

        let result = run_backtest(&candles, &sma_strategy(), &config, &mut FixedSlippage(1.0));

        let sells: Vec<_> = result
            .trades
            .iter()
            .filter(|t| t.direction == Direction::Sell)
            .collect();
        let buys = result.trades.len() - sells.len();
        assert_eq!(sells.len(), 1);
        assert!(sells[0].entry_time > candles[60].timestamp);
        assert!(buys <= 1);
        assert!((1..=2).contains(&result.total_trades));
        assert!(result.max_drawdown_percent >= 0.0);
        assert_conserved(&result);
    }

    #[test]
    fn insufficient_history_yields_empty_result() {
        let candles = ramp_candles(49, 1.0, 0.01);
        let config = make_config("EUR/USD", 5_000.0);

        let result = run_backtest(&candles, &sma_strategy(), &config, &mut FixedSlippage(1.0));

        assert_eq!(result, BacktestResult::empty(&config, "sma_crossover"));
        assert_eq!(result.final_capital, 5_000.0);
    }
}

mod exits {
    use super::*;

    fn buy_at(candle: &Candle) -> Signal {
        Signal {
            timestamp: candle.timestamp,
            direction: Direction::Buy,
            strength: 1.0,
            source: "test",
        }
    }

    fn risk(stop: Option<f64>, take: Option<f64>, hours: i64) -> RiskParams {
        RiskParams {
            max_position_fraction: 0.1,
            stop_loss_pct: stop,
            take_profit_pct: take,
            max_holding: Duration::hours(hours),
        }
    }

    #[test]
    fn stop_loss_closes_long_on_drop() {
        let mut closes = vec![1.1; 60];
        closes[10] = 1.07;
        let candles = hourly_candles(&closes);
        let config = make_config("EUR/USD", 10_000.0);
        let signals = vec![buy_at(&candles[5])];

        let state = simulate(
            &candles,
            &signals,
            &risk(Some(0.02), Some(0.04), 168),
            &config,
            &mut FixedSlippage(1.0),
        );

        assert_eq!(state.closed_trades.len(), 1);
        let trade = &state.closed_trades[0];
        assert_eq!(trade.exit_reason, ExitReason::StopLoss);
        assert_eq!(trade.exit_time, candles[10].timestamp);
        assert!(trade.pnl < 0.0);
        assert!(state.capital < 10_000.0);
    }

    #[test]
    fn max_holding_closes_after_deadline() {
        let candles = flat_candles(60, 1.1);
        let config = make_config("EUR/USD", 10_000.0);
        let signals = vec![buy_at(&candles[5])];

        let state = simulate(
            &candles,
            &signals,
            &risk(None, None, 24),
            &config,
            &mut FixedSlippage(1.0),
        );

        assert_eq!(state.closed_trades.len(), 1);
        let trade = &state.closed_trades[0];
        assert_eq!(trade.exit_reason, ExitReason::MaxHoldingTime);
        // Expires strictly after 24h: the first candle 25h past entry.
        assert_eq!(trade.exit_time, candles[30].timestamp);
    }

    #[test]
    fn open_position_closed_at_run_end() {
        let candles = flat_candles(60, 1.1);
        let config = make_config("EUR/USD", 10_000.0);
        let signals = vec![buy_at(&candles[50])];

        let state = simulate(
            &candles,
            &signals,
            &risk(Some(0.02), Some(0.04), 168),
            &config,
            &mut FixedSlippage(1.0),
        );

        assert!(state.positions.is_empty());
        assert_eq!(state.closed_trades.len(), 1);
        let trade = &state.closed_trades[0];
        assert_eq!(trade.exit_reason, ExitReason::RunEnd);
        assert_eq!(trade.exit_time, candles[59].timestamp);
        // Flat prices: only spread, slippage and commission are lost.
        assert!(trade.pnl < 0.0);
        assert_relative_eq!(
            state.capital,
            10_000.0 + trade.pnl - trade.commission,
            epsilon = 1e-9
        );
    }
}

mod batches {
    use super::*;

    fn jobs() -> Vec<BacktestJob> {
        vec![
            BacktestJob {
                config: make_config("EUR/USD", 10_000.0),
                strategy: sma_strategy(),
                candles: v_shape(60, 80, 1.2, 0.001),
            },
            BacktestJob {
                config: make_config("GBP/USD", 20_000.0),
                strategy: sma_strategy(),
                candles: flat_candles(100, 1.27),
            },
            BacktestJob {
                config: make_config("USD/JPY", 10_000.0),
                strategy: sma_strategy(),
                candles: flat_candles(10, 150.0),
            },
        ]
    }

    #[test]
    fn results_keep_job_order() {
        let results = run_batch(&jobs(), 42);
        let pairs: Vec<&str> = results.iter().map(|r| r.pair.as_str()).collect();
        assert_eq!(pairs, ["EUR/USD", "GBP/USD", "USD/JPY"]);
        assert_eq!(results[1].initial_capital, 20_000.0);
        assert_eq!(results[2].total_trades, 0);
    }

    #[test]
    fn same_seed_same_results() {
        let a = run_batch(&jobs(), 7);
        let b = run_batch(&jobs(), 7);
        assert_eq!(a, b);
    }

    #[test]
    fn slippage_draws_differ_by_seed() {
        let a = run_batch(&jobs(), 1);
        let b = run_batch(&jobs(), 2);
        assert_eq!(a[0].total_trades, b[0].total_trades);
        assert_ne!(a[0].trades[0].entry_price, b[0].trades[0].entry_price);
    }

    #[test]
    fn summary_totals_the_batch() {
        let results = run_batch(&jobs(), 42);
        let summary = BatchSummary::from_results(&results);

        assert_eq!(summary.pairs, ["EUR/USD", "GBP/USD", "USD/JPY"]);
        assert_eq!(summary.initial_capital, 40_000.0);
        // Only the V-shape pair trades; the others keep their capital.
        assert_relative_eq!(
            summary.final_capital,
            results[0].final_capital + 30_000.0,
            epsilon = 1e-9
        );
        assert_relative_eq!(summary.total_return, results[0].total_return, epsilon = 1e-9);
        assert_relative_eq!(
            summary.total_return_percent,
            results[0].total_return / 40_000.0 * 100.0,
            epsilon = 1e-9
        );
        assert_eq!(summary.total_trades, 1);
        assert_eq!(summary.winning_trades, 1);
        assert_eq!(summary.win_rate, 1.0);
    }

    #[test]
    fn empty_batch() {
        assert!(run_batch(&[], 42).is_empty());
    }
}

mod synthetic_end_to_end {
    use super::*;

    #[test]
    fn every_strategy_holds_invariants() {
        let adapter = SyntheticAdapter::new(42);
        let config = make_config("EUR/USD", 10_000.0);
        let candles = adapter
            .fetch_candles(&config.pair, config.start_date, config.end_date)
            .unwrap();
        assert_eq!(candles.len(), 60 * 24);

        let jobs: Vec<BacktestJob> = all_strategies()
            .into_iter()
            .map(|strategy| BacktestJob {
                config: config.clone(),
                strategy,
                candles: candles.clone(),
            })
            .collect();

        for result in run_batch(&jobs, 42) {
            assert_conserved(&result);
            assert!(result.max_drawdown_percent >= 0.0 && result.max_drawdown_percent <= 100.0);
            assert!((0.0..=1.0).contains(&result.win_rate));
            assert!(result.winning_trades + result.losing_trades <= result.total_trades);
            assert_eq!(result.total_trades, result.trades.len());
            assert!(result.sharpe_ratio.is_finite());
            for trade in &result.trades {
                assert!(trade.exit_time >= trade.entry_time);
                assert!(trade.volume > 0.0);
                assert!(trade.commission > 0.0);
            }
            let ids: Vec<u64> = result.trades.iter().map(|t| t.id).collect();
            let mut sorted = ids.clone();
            sorted.sort_unstable();
            sorted.dedup();
            assert_eq!(sorted.len(), ids.len());
        }
    }

    #[test]
    fn results_render_as_json() {
        let adapter = SyntheticAdapter::new(9);
        let config = make_config("USD/JPY", 10_000.0);
        let candles = adapter
            .fetch_candles(&config.pair, config.start_date, config.end_date)
            .unwrap();
        let jobs = vec![BacktestJob {
            config,
            strategy: StrategyConfig::new(Strategy::Macd(MacdParams::default())),
            candles,
        }];
        let results = run_batch(&jobs, 9);

        let json = JsonReportAdapter::new().render(&results).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value[0]["pair"], "USD/JPY");
        assert_eq!(value[0]["strategy"], "macd");
        assert_eq!(
            value[0]["daily_returns"].as_array().unwrap().len(),
            results[0].daily_returns.len()
        );
    }
}
