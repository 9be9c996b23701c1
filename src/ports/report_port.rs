//! Report rendering port.

use crate::domain::engine::Trade;
use crate::domain::error::TradesimError;
use crate::domain::metrics::Metrics;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Everything a renderer needs about one finished run.
#[derive(Debug, Clone, Serialize)]
pub struct BacktestReport<'a> {
    pub strategy: &'a str,
    pub symbol: &'a str,
    pub timeframe: &'a str,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub initial_capital: f64,
    pub final_value: f64,
    /// Peak-to-trough fraction tracked by the simulator.
    pub max_drawdown: f64,
    pub trades: &'a [Trade],
    pub metrics: &'a Metrics,
}

pub trait ReportPort {
    fn render(&self, report: &BacktestReport<'_>) -> Result<String, TradesimError>;
}
