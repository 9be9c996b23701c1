//! Performance metrics and rating.
//!
//! A pure function of (closed trades, initial capital, simulated range,
//! risk-free rate). Risk ratios that are mathematically undefined for the
//! input are `None` — a computed record never carries NaN or Infinity.

use crate::domain::engine::Trade;
use chrono::{DateTime, Utc};
use serde::Serialize;

pub const TRADING_DAYS_PER_YEAR: f64 = 252.0;
const AVG_DAYS_PER_MONTH: f64 = 30.44;
const MS_PER_DAY: f64 = 86_400_000.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Rating {
    pub label: &'static str,
    pub color: &'static str,
}

impl Rating {
    pub const EXCELLENT: Rating = Rating { label: "Excellent", color: "#16a34a" };
    pub const VERY_GOOD: Rating = Rating { label: "Very Good", color: "#22c55e" };
    pub const GOOD: Rating = Rating { label: "Good", color: "#84cc16" };
    pub const FAIR: Rating = Rating { label: "Fair", color: "#f59e0b" };
    pub const POOR: Rating = Rating { label: "Poor", color: "#ef4444" };

    pub fn from_score(score: u32) -> Rating {
        match score {
            8.. => Rating::EXCELLENT,
            6..=7 => Rating::VERY_GOOD,
            4..=5 => Rating::GOOD,
            2..=3 => Rating::FAIR,
            _ => Rating::POOR,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Metrics {
    pub total_trades: usize,
    pub winning_trades: usize,
    pub losing_trades: usize,
    /// Winning / total × 100; 0 when there are no trades.
    pub win_rate: f64,
    pub total_return: f64,
    pub total_return_percent: f64,
    pub gross_profit: f64,
    /// Magnitude of the summed losing P&L (non-negative).
    pub gross_loss: f64,
    pub average_win: f64,
    /// Mean net P&L of the losing subset (non-positive).
    pub average_loss: f64,
    pub largest_win: f64,
    pub largest_loss: f64,
    /// Gross profit / gross loss; equals gross profit when there are no
    /// losses, 0 when there are no profits either. Never Infinity.
    pub profit_factor: f64,
    pub expectancy: f64,
    pub sharpe_ratio: Option<f64>,
    pub sortino_ratio: Option<f64>,
    pub volatility: Option<f64>,
    /// Most negative equity drawdown, in percent (≤ 0).
    pub max_drawdown_percent: f64,
    /// The drawdown fraction applied to initial capital (≤ 0).
    pub max_drawdown: f64,
    pub calmar_ratio: Option<f64>,
    pub recovery_factor: Option<f64>,
    pub max_consecutive_wins: usize,
    pub max_consecutive_losses: usize,
    pub average_trade_duration_days: f64,
    pub trades_per_month: Option<f64>,
    pub rating: Rating,
}

impl Metrics {
    /// The record for a run with no trades. Ratios are undefined and the
    /// rating is Poor by definition, not by scoring.
    pub fn empty() -> Self {
        Metrics {
            total_trades: 0,
            winning_trades: 0,
            losing_trades: 0,
            win_rate: 0.0,
            total_return: 0.0,
            total_return_percent: 0.0,
            gross_profit: 0.0,
            gross_loss: 0.0,
            average_win: 0.0,
            average_loss: 0.0,
            largest_win: 0.0,
            largest_loss: 0.0,
            profit_factor: 0.0,
            expectancy: 0.0,
            sharpe_ratio: None,
            sortino_ratio: None,
            volatility: None,
            max_drawdown_percent: 0.0,
            max_drawdown: 0.0,
            calmar_ratio: None,
            recovery_factor: None,
            max_consecutive_wins: 0,
            max_consecutive_losses: 0,
            average_trade_duration_days: 0.0,
            trades_per_month: None,
            rating: Rating::POOR,
        }
    }

    pub fn compute(
        trades: &[Trade],
        initial_capital: f64,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        risk_free_rate: f64,
    ) -> Self {
        if trades.is_empty() {
            return Metrics::empty();
        }

        let total_trades = trades.len();
        let wins: Vec<f64> = trades.iter().map(|t| t.net_pnl).filter(|p| *p > 0.0).collect();
        let losses: Vec<f64> = trades.iter().map(|t| t.net_pnl).filter(|p| *p < 0.0).collect();
        let winning_trades = wins.len();
        let losing_trades = losses.len();
        let win_rate = winning_trades as f64 / total_trades as f64 * 100.0;

        let total_return: f64 = trades.iter().map(|t| t.net_pnl).sum();
        let total_return_percent = if initial_capital > 0.0 {
            total_return / initial_capital * 100.0
        } else {
            0.0
        };

        let gross_profit: f64 = wins.iter().sum();
        let gross_loss: f64 = losses.iter().sum::<f64>().abs();
        let average_win = mean(&wins).unwrap_or(0.0);
        let average_loss = mean(&losses).unwrap_or(0.0);
        let largest_win = trades.iter().map(|t| t.net_pnl).fold(f64::NEG_INFINITY, f64::max);
        let largest_loss = trades.iter().map(|t| t.net_pnl).fold(f64::INFINITY, f64::min);

        let profit_factor = if gross_loss > 0.0 {
            gross_profit / gross_loss
        } else if gross_profit > 0.0 {
            gross_profit
        } else {
            0.0
        };

        let expectancy = total_return / total_trades as f64;

        let equity_curve = build_equity_curve(trades, initial_capital);
        let returns = period_returns(&equity_curve);
        let daily_rf = risk_free_rate / TRADING_DAYS_PER_YEAR;

        let stddev = population_stddev(&returns);
        let sharpe_ratio = match (mean(&returns), stddev) {
            (Some(mean_return), Some(sd)) if sd > 0.0 => {
                Some((mean_return - daily_rf) / sd * TRADING_DAYS_PER_YEAR.sqrt())
            }
            _ => None,
        };

        let downside: Vec<f64> = returns.iter().copied().filter(|r| *r < 0.0).collect();
        let sortino_ratio = match (mean(&returns), population_stddev(&downside)) {
            (Some(mean_return), Some(ds)) if ds > 0.0 => {
                Some((mean_return - daily_rf) / ds * TRADING_DAYS_PER_YEAR.sqrt())
            }
            _ => None,
        };

        let volatility = stddev.map(|sd| sd * TRADING_DAYS_PER_YEAR.sqrt());

        let max_drawdown_fraction = max_drawdown(&equity_curve);
        let max_drawdown_percent = max_drawdown_fraction * 100.0;
        let max_drawdown_currency = max_drawdown_fraction * initial_capital;

        let calmar_ratio = if max_drawdown_percent < 0.0 {
            Some(total_return_percent / max_drawdown_percent.abs())
        } else {
            None
        };
        let recovery_factor = if max_drawdown_currency < 0.0 {
            Some(total_return / max_drawdown_currency.abs())
        } else {
            None
        };

        let (max_consecutive_wins, max_consecutive_losses) = consecutive_streaks(trades);

        let average_trade_duration_days = trades
            .iter()
            .map(|t| t.duration_ms as f64)
            .sum::<f64>()
            / total_trades as f64
            / MS_PER_DAY;

        let simulated_days = (end - start).num_milliseconds() as f64 / MS_PER_DAY;
        let trades_per_month = if simulated_days > 0.0 {
            Some(total_trades as f64 / (simulated_days / AVG_DAYS_PER_MONTH))
        } else {
            None
        };

        let rating = score_rating(
            sharpe_ratio,
            win_rate,
            profit_factor,
            max_drawdown_percent,
            total_return,
        );

        Metrics {
            total_trades,
            winning_trades,
            losing_trades,
            win_rate,
            total_return,
            total_return_percent,
            gross_profit,
            gross_loss,
            average_win,
            average_loss,
            largest_win,
            largest_loss,
            profit_factor,
            expectancy,
            sharpe_ratio,
            sortino_ratio,
            volatility,
            max_drawdown_percent,
            max_drawdown: max_drawdown_currency,
            calmar_ratio,
            recovery_factor,
            max_consecutive_wins,
            max_consecutive_losses,
            average_trade_duration_days,
            trades_per_month,
            rating,
        }
    }
}

/// Initial capital followed by the running value after each trade.
fn build_equity_curve(trades: &[Trade], initial_capital: f64) -> Vec<f64> {
    let mut curve = Vec::with_capacity(trades.len() + 1);
    let mut value = initial_capital;
    curve.push(value);
    for trade in trades {
        value += trade.net_pnl;
        curve.push(value);
    }
    curve
}

fn period_returns(equity_curve: &[f64]) -> Vec<f64> {
    equity_curve
        .windows(2)
        .map(|pair| {
            if pair[0] > 0.0 {
                (pair[1] - pair[0]) / pair[0]
            } else {
                0.0
            }
        })
        .collect()
}

fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

fn population_stddev(values: &[f64]) -> Option<f64> {
    let mean = mean(values)?;
    let variance =
        values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64;
    Some(variance.sqrt())
}

/// Most negative (equity − running peak) / peak across the curve; ≤ 0.
fn max_drawdown(equity_curve: &[f64]) -> f64 {
    let mut peak = f64::NEG_INFINITY;
    let mut worst = 0.0_f64;
    for &equity in equity_curve {
        if equity > peak {
            peak = equity;
        }
        if peak > 0.0 {
            let drawdown = (equity - peak) / peak;
            if drawdown < worst {
                worst = drawdown;
            }
        }
    }
    worst
}

fn consecutive_streaks(trades: &[Trade]) -> (usize, usize) {
    let mut max_wins = 0usize;
    let mut max_losses = 0usize;
    let mut wins = 0usize;
    let mut losses = 0usize;

    for trade in trades {
        if trade.net_pnl > 0.0 {
            wins += 1;
            losses = 0;
        } else if trade.net_pnl < 0.0 {
            losses += 1;
            wins = 0;
        } else {
            wins = 0;
            losses = 0;
        }
        max_wins = max_wins.max(wins);
        max_losses = max_losses.max(losses);
    }

    (max_wins, max_losses)
}

fn score_rating(
    sharpe_ratio: Option<f64>,
    win_rate: f64,
    profit_factor: f64,
    max_drawdown_percent: f64,
    total_return: f64,
) -> Rating {
    let mut score = 0u32;

    if let Some(sharpe) = sharpe_ratio {
        if sharpe > 2.0 {
            score += 3;
        } else if sharpe > 1.5 {
            score += 2;
        } else if sharpe > 1.0 {
            score += 1;
        }
    }

    if win_rate > 60.0 {
        score += 2;
    } else if win_rate > 50.0 {
        score += 1;
    }

    if profit_factor > 2.0 {
        score += 2;
    } else if profit_factor > 1.5 {
        score += 1;
    }

    if max_drawdown_percent > -10.0 {
        score += 2;
    } else if max_drawdown_percent > -20.0 {
        score += 1;
    }

    if total_return > 0.0 {
        score += 1;
    }

    Rating::from_score(score)
}
