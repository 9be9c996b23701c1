//! Exponential moving average over closing prices.
//!
//! Seeded with the simple average of the first `period` closes, then
//! smoothed with alpha = 2 / (period + 1).

use crate::domain::candle::Candle;

pub fn calculate_ema(candles: &[Candle], period: usize) -> Vec<Option<f64>> {
    if period == 0 {
        return vec![None; candles.len()];
    }

    let alpha = 2.0 / (period as f64 + 1.0);
    let mut values = Vec::with_capacity(candles.len());
    let mut ema = 0.0;

    for (i, candle) in candles.iter().enumerate() {
        if i + 1 < period {
            values.push(None);
        } else if i + 1 == period {
            let seed: f64 =
                candles[..period].iter().map(|c| c.close).sum::<f64>() / period as f64;
            ema = seed;
            values.push(Some(ema));
        } else {
            ema = candle.close * alpha + ema * (1.0 - alpha);
            values.push(Some(ema));
        }
    }

    values
}
