//! ATR (Average True Range) with Wilder smoothing.
//!
//! Seed at bar `period - 1` is the simple mean of the first `period` true
//! ranges; later bars smooth with (prev * (period - 1) + tr) / period.

use crate::domain::candle::Candle;

pub fn calculate_atr(candles: &[Candle], period: usize) -> Vec<Option<f64>> {
    if period == 0 {
        return vec![None; candles.len()];
    }

    let mut tr_values = Vec::with_capacity(candles.len());
    for (i, candle) in candles.iter().enumerate() {
        let tr = if i == 0 {
            candle.high - candle.low
        } else {
            candle.true_range(candles[i - 1].close)
        };
        tr_values.push(tr);
    }

    let mut values = Vec::with_capacity(candles.len());
    let mut atr = 0.0;

    for i in 0..candles.len() {
        if i + 1 < period {
            values.push(None);
        } else if i + 1 == period {
            atr = tr_values[..period].iter().sum::<f64>() / period as f64;
            values.push(Some(atr));
        } else {
            atr = (atr * (period - 1) as f64 + tr_values[i]) / period as f64;
            values.push(Some(atr));
        }
    }

    values
}
