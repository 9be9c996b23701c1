//! Candle data access port.

use crate::domain::candle::Candle;
use crate::domain::error::TradesimError;
use chrono::{DateTime, Utc};

pub trait CandleProvider {
    /// Fetch candles for a symbol/timeframe in `[start, end]`, ordered by
    /// strictly increasing timestamp.
    fn fetch_candles(
        &self,
        symbol: &str,
        timeframe: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Candle>, TradesimError>;

    fn list_symbols(&self, timeframe: &str) -> Result<Vec<String>, TradesimError>;
}
