//! Indicator-augmented candle series.
//!
//! An [`IndicatorRow`] is one candle plus the fixed set of derived columns
//! the rule language can reference. Columns are `None` while the producing
//! indicator is still inside its warm-up window; NaN never appears in a row.

use crate::domain::candle::Candle;
use crate::domain::error::TradesimError;
use serde::Serialize;
use std::fmt;

/// The recognized operand fields, resolvable by name (case-insensitive).
/// `price` is accepted as an alias for `close`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Open,
    High,
    Low,
    Close,
    Volume,
    Rsi,
    Sma20,
    Sma50,
    Ema20,
    Ema50,
    Vwap,
    Atr,
    MacdLine,
    MacdSignal,
    MacdHistogram,
    StochK,
    StochD,
    BbUpper,
    BbMiddle,
    BbLower,
}

impl Field {
    pub fn from_name(name: &str) -> Option<Field> {
        match name.to_ascii_lowercase().as_str() {
            "open" => Some(Field::Open),
            "high" => Some(Field::High),
            "low" => Some(Field::Low),
            "close" | "price" => Some(Field::Close),
            "volume" => Some(Field::Volume),
            "rsi" => Some(Field::Rsi),
            "sma_20" => Some(Field::Sma20),
            "sma_50" => Some(Field::Sma50),
            "ema_20" => Some(Field::Ema20),
            "ema_50" => Some(Field::Ema50),
            "vwap" => Some(Field::Vwap),
            "atr" => Some(Field::Atr),
            "macd_line" => Some(Field::MacdLine),
            "macd_signal" => Some(Field::MacdSignal),
            "macd_histogram" => Some(Field::MacdHistogram),
            "stoch_k" => Some(Field::StochK),
            "stoch_d" => Some(Field::StochD),
            "bb_upper" => Some(Field::BbUpper),
            "bb_middle" => Some(Field::BbMiddle),
            "bb_lower" => Some(Field::BbLower),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Field::Open => "open",
            Field::High => "high",
            Field::Low => "low",
            Field::Close => "close",
            Field::Volume => "volume",
            Field::Rsi => "rsi",
            Field::Sma20 => "sma_20",
            Field::Sma50 => "sma_50",
            Field::Ema20 => "ema_20",
            Field::Ema50 => "ema_50",
            Field::Vwap => "vwap",
            Field::Atr => "atr",
            Field::MacdLine => "macd_line",
            Field::MacdSignal => "macd_signal",
            Field::MacdHistogram => "macd_histogram",
            Field::StochK => "stoch_k",
            Field::StochD => "stoch_d",
            Field::BbUpper => "bb_upper",
            Field::BbMiddle => "bb_middle",
            Field::BbLower => "bb_lower",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndicatorRow {
    #[serde(flatten)]
    pub candle: Candle,
    pub rsi: Option<f64>,
    pub sma_20: Option<f64>,
    pub sma_50: Option<f64>,
    pub ema_20: Option<f64>,
    pub ema_50: Option<f64>,
    pub vwap: Option<f64>,
    pub atr: Option<f64>,
    pub macd_line: Option<f64>,
    pub macd_signal: Option<f64>,
    pub macd_histogram: Option<f64>,
    pub stoch_k: Option<f64>,
    pub stoch_d: Option<f64>,
    pub bb_upper: Option<f64>,
    pub bb_middle: Option<f64>,
    pub bb_lower: Option<f64>,
}

impl IndicatorRow {
    /// A row with no indicator columns populated.
    pub fn bare(candle: Candle) -> Self {
        IndicatorRow {
            candle,
            rsi: None,
            sma_20: None,
            sma_50: None,
            ema_20: None,
            ema_50: None,
            vwap: None,
            atr: None,
            macd_line: None,
            macd_signal: None,
            macd_histogram: None,
            stoch_k: None,
            stoch_d: None,
            bb_upper: None,
            bb_middle: None,
            bb_lower: None,
        }
    }

    /// Resolve a field against this row. Warm-up columns are `None`; a stray
    /// NaN from an indicator is also reported as `None`.
    pub fn field(&self, field: Field) -> Option<f64> {
        let value = match field {
            Field::Open => Some(self.candle.open),
            Field::High => Some(self.candle.high),
            Field::Low => Some(self.candle.low),
            Field::Close => Some(self.candle.close),
            Field::Volume => Some(self.candle.volume as f64),
            Field::Rsi => self.rsi,
            Field::Sma20 => self.sma_20,
            Field::Sma50 => self.sma_50,
            Field::Ema20 => self.ema_20,
            Field::Ema50 => self.ema_50,
            Field::Vwap => self.vwap,
            Field::Atr => self.atr,
            Field::MacdLine => self.macd_line,
            Field::MacdSignal => self.macd_signal,
            Field::MacdHistogram => self.macd_histogram,
            Field::StochK => self.stoch_k,
            Field::StochD => self.stoch_d,
            Field::BbUpper => self.bb_upper,
            Field::BbMiddle => self.bb_middle,
            Field::BbLower => self.bb_lower,
        };
        value.filter(|v| v.is_finite())
    }
}

/// Precondition check for simulation: the series must be non-empty and in
/// strictly increasing timestamp order.
pub fn validate_series(rows: &[IndicatorRow]) -> Result<(), TradesimError> {
    if rows.is_empty() {
        return Err(TradesimError::EmptyCandleSeries);
    }
    for (i, pair) in rows.windows(2).enumerate() {
        if pair[1].candle.timestamp <= pair[0].candle.timestamp {
            return Err(TradesimError::OutOfOrderCandle { index: i + 1 });
        }
    }
    Ok(())
}
