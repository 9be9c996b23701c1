//! Indicator computation port.

use crate::domain::candle::Candle;
use crate::domain::error::TradesimError;
use crate::domain::series::IndicatorRow;

/// Pure enrichment: candles in, indicator-augmented rows out, one row per
/// candle, input order preserved.
pub trait IndicatorEngine {
    fn enrich(&self, candles: &[Candle]) -> Result<Vec<IndicatorRow>, TradesimError>;
}
