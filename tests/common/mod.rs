//! Shared test helpers.

#![allow(dead_code)]

use chrono::{DateTime, TimeZone, Utc};
use std::collections::HashMap;
use tradesim::domain::candle::Candle;
use tradesim::domain::error::TradesimError;
use tradesim::ports::data_port::CandleProvider;

pub fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 15, 9, 30, 0).unwrap()
}

pub fn make_candle(index: usize, close: f64) -> Candle {
    Candle {
        timestamp: base_time() + chrono::Duration::minutes(5 * index as i64),
        open: close - 1.0,
        high: close + 5.0,
        low: close - 5.0,
        close,
        volume: 1_000 + index as i64,
    }
}

pub fn make_candles(closes: &[f64]) -> Vec<Candle> {
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| make_candle(i, close))
        .collect()
}

pub struct MockCandleProvider {
    candles: HashMap<String, Vec<Candle>>,
}

impl MockCandleProvider {
    pub fn new() -> Self {
        Self {
            candles: HashMap::new(),
        }
    }

    pub fn with_candles(mut self, symbol: &str, candles: Vec<Candle>) -> Self {
        self.candles.insert(symbol.to_string(), candles);
        self
    }
}

impl CandleProvider for MockCandleProvider {
    fn fetch_candles(
        &self,
        symbol: &str,
        _timeframe: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Candle>, TradesimError> {
        let candles = self.candles.get(symbol).ok_or_else(|| TradesimError::Data {
            reason: format!("no mock data for {}", symbol),
        })?;
        Ok(candles
            .iter()
            .filter(|c| c.timestamp >= start && c.timestamp <= end)
            .cloned()
            .collect())
    }

    fn list_symbols(&self, _timeframe: &str) -> Result<Vec<String>, TradesimError> {
        let mut symbols: Vec<String> = self.candles.keys().cloned().collect();
        symbols.sort();
        Ok(symbols)
    }
}
