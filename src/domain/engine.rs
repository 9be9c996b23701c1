//! The backtest engine: a single forward pass over an indicator-augmented
//! candle series, holding at most one open position.
//!
//! Per-bar procedure:
//! 1. A bar that begins flat evaluates the entry signal; a fire opens a long
//!    position at the close adjusted up by slippage.
//! 2. A bar that begins in position evaluates exits in priority order:
//!    take-profit, stop-loss, rule exit, time exit. The first match closes
//!    the position at the close adjusted down by slippage.
//! 3. A position still open after the final bar is force-closed there with
//!    reason "End of Data" so its P&L reaches the metrics.
//!
//! Closing a position never re-enters on the same bar.

use crate::domain::error::TradesimError;
use crate::domain::rule_eval;
use crate::domain::series::{validate_series, IndicatorRow};
use crate::domain::signal::{EntrySignal, RuleEntrySignal};
use crate::domain::strategy::Strategy;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub struct BacktestConfig {
    pub initial_capital: f64,
    /// Flat commission per round-trip trade.
    pub commission: f64,
    /// Execution-price penalty versus the observed close, in percent.
    pub slippage_pct: f64,
    /// Annual risk-free rate used by the metrics stage.
    pub risk_free_rate: f64,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        BacktestConfig {
            initial_capital: 10_000.0,
            commission: 4.0,
            slippage_pct: 0.5,
            risk_free_rate: 0.02,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Long,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ExitReason {
    #[serde(rename = "Take Profit")]
    TakeProfit,
    #[serde(rename = "Stop Loss")]
    StopLoss,
    #[serde(rename = "Rule Exit")]
    RuleExit,
    #[serde(rename = "Time Exit")]
    TimeExit,
    #[serde(rename = "End of Data")]
    EndOfData,
}

impl fmt::Display for ExitReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ExitReason::TakeProfit => "Take Profit",
            ExitReason::StopLoss => "Stop Loss",
            ExitReason::RuleExit => "Rule Exit",
            ExitReason::TimeExit => "Time Exit",
            ExitReason::EndOfData => "End of Data",
        };
        f.write_str(label)
    }
}

/// A closed round-trip.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Trade {
    pub side: Side,
    pub entry_time: DateTime<Utc>,
    pub entry_price: f64,
    pub exit_time: DateTime<Utc>,
    pub exit_price: f64,
    pub quantity: f64,
    pub gross_pnl: f64,
    pub commission: f64,
    pub slippage_cost: f64,
    pub net_pnl: f64,
    pub exit_reason: ExitReason,
    pub duration_ms: i64,
}

/// Transient simulation state: the one open position.
#[derive(Debug, Clone)]
struct OpenPosition {
    entry_price: f64,
    entry_time: DateTime<Utc>,
    entry_index: usize,
    quantity: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BacktestRun {
    /// Closed trades in exit-time order.
    pub trades: Vec<Trade>,
    /// Initial capital plus the sum of net P&Ls.
    pub final_value: f64,
    /// Largest peak-to-trough decline of the running value, as a fraction.
    pub max_drawdown: f64,
}

pub struct BacktestEngine {
    config: BacktestConfig,
}

impl BacktestEngine {
    pub fn new(config: BacktestConfig) -> Result<Self, TradesimError> {
        if !(config.initial_capital > 0.0) {
            return Err(TradesimError::InvalidConfig {
                reason: format!("initial_capital must be positive, got {}", config.initial_capital),
            });
        }
        if config.commission < 0.0 {
            return Err(TradesimError::InvalidConfig {
                reason: format!("commission must not be negative, got {}", config.commission),
            });
        }
        if config.slippage_pct < 0.0 {
            return Err(TradesimError::InvalidConfig {
                reason: format!("slippage_pct must not be negative, got {}", config.slippage_pct),
            });
        }
        Ok(BacktestEngine { config })
    }

    pub fn config(&self) -> &BacktestConfig {
        &self.config
    }

    /// Run with the strategy's entry rules as the entry signal.
    pub fn run(
        &self,
        rows: &[IndicatorRow],
        strategy: &Strategy,
    ) -> Result<BacktestRun, TradesimError> {
        let entry = RuleEntrySignal::new(&strategy.entry_rules);
        self.run_with_entry(rows, strategy, &entry)
    }

    /// Run with an explicit entry signal (e.g. the demo double).
    pub fn run_with_entry(
        &self,
        rows: &[IndicatorRow],
        strategy: &Strategy,
        entry: &dyn EntrySignal,
    ) -> Result<BacktestRun, TradesimError> {
        validate_series(rows)?;

        let slip = self.config.slippage_pct / 100.0;
        let mut trades: Vec<Trade> = Vec::new();
        let mut open: Option<OpenPosition> = None;
        let mut value = self.config.initial_capital;
        let mut peak = value;
        let mut max_drawdown = 0.0_f64;

        for (i, row) in rows.iter().enumerate() {
            match open.take() {
                None => {
                    if entry.should_enter(rows, i) {
                        open = Some(OpenPosition {
                            entry_price: row.candle.close * (1.0 + slip),
                            entry_time: row.candle.timestamp,
                            entry_index: i,
                            quantity: 1.0,
                        });
                        log::debug!(
                            "entered long at bar {} ({}), price {:.4}",
                            i,
                            row.candle.timestamp,
                            row.candle.close * (1.0 + slip),
                        );
                    }
                }
                Some(position) => match self.exit_reason(rows, i, strategy, &position) {
                    Some(reason) => {
                        let trade = self.close_position(position, row, reason);
                        value += trade.net_pnl;
                        if value > peak {
                            peak = value;
                        } else if peak > 0.0 {
                            let drawdown = (peak - value) / peak;
                            if drawdown > max_drawdown {
                                max_drawdown = drawdown;
                            }
                        }
                        trades.push(trade);
                    }
                    None => open = Some(position),
                },
            }
        }

        if let Some(position) = open {
            // rows is non-empty by validate_series
            if let Some(last) = rows.last() {
                let trade = self.close_position(position, last, ExitReason::EndOfData);
                value += trade.net_pnl;
                if value > peak {
                    peak = value;
                } else if peak > 0.0 {
                    let drawdown = (peak - value) / peak;
                    if drawdown > max_drawdown {
                        max_drawdown = drawdown;
                    }
                }
                trades.push(trade);
            }
        }

        Ok(BacktestRun {
            trades,
            final_value: value,
            max_drawdown,
        })
    }

    /// First matching exit wins: take-profit, stop-loss, rule exit, time exit.
    fn exit_reason(
        &self,
        rows: &[IndicatorRow],
        index: usize,
        strategy: &Strategy,
        position: &OpenPosition,
    ) -> Option<ExitReason> {
        let row = &rows[index];
        let close = row.candle.close;

        if let Some(take_profit) = &strategy.take_profit {
            match take_profit.target_threshold(position.entry_price, row.atr) {
                Some(target) if close >= target => return Some(ExitReason::TakeProfit),
                Some(_) => {}
                None => log::debug!("take-profit threshold undefined at bar {} (ATR warm-up)", index),
            }
        }

        if let Some(stop_loss) = &strategy.stop_loss {
            match stop_loss.stop_threshold(position.entry_price, row.atr) {
                Some(stop) if close <= stop => return Some(ExitReason::StopLoss),
                Some(_) => {}
                None => log::debug!("stop-loss threshold undefined at bar {} (ATR warm-up)", index),
            }
        }

        if rule_eval::evaluate_exit(rows, index, &strategy.exit_rules) {
            return Some(ExitReason::RuleExit);
        }

        if let Some(max_hold) = strategy.max_hold_bars {
            if index - position.entry_index >= max_hold {
                return Some(ExitReason::TimeExit);
            }
        }

        None
    }

    fn close_position(&self, position: OpenPosition, row: &IndicatorRow, reason: ExitReason) -> Trade {
        let slip = self.config.slippage_pct / 100.0;
        let raw_close = row.candle.close;
        let exit_price = raw_close * (1.0 - slip);

        let gross_pnl = (exit_price - position.entry_price) * position.quantity;
        let slippage_cost = (exit_price - raw_close).abs() * slip * position.quantity;
        let net_pnl = gross_pnl - self.config.commission - slippage_cost;
        let exit_time = row.candle.timestamp;

        log::debug!(
            "closed long at bar time {}: {} (net {:.4})",
            exit_time,
            reason,
            net_pnl,
        );

        Trade {
            side: Side::Long,
            entry_time: position.entry_time,
            entry_price: position.entry_price,
            exit_time,
            exit_price,
            quantity: position.quantity,
            gross_pnl,
            commission: self.config.commission,
            slippage_cost,
            net_pnl,
            exit_reason: reason,
            duration_ms: (exit_time - position.entry_time).num_milliseconds(),
        }
    }
}
