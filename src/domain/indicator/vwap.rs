//! Cumulative volume-weighted average price.
//!
//! VWAP at bar i = Σ(typical_price × volume) / Σ(volume) over bars 0..=i.
//! Undefined while cumulative volume is zero.

use crate::domain::candle::Candle;

pub fn calculate_vwap(candles: &[Candle]) -> Vec<Option<f64>> {
    let mut values = Vec::with_capacity(candles.len());
    let mut pv_sum = 0.0;
    let mut volume_sum = 0.0;

    for candle in candles {
        pv_sum += candle.typical_price() * candle.volume as f64;
        volume_sum += candle.volume as f64;
        values.push(if volume_sum > 0.0 {
            Some(pv_sum / volume_sum)
        } else {
            None
        });
    }

    values
}
