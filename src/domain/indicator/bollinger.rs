//! Bollinger Bands: SMA middle band ± multiplier × population stddev.

use crate::domain::candle::Candle;

#[derive(Debug, Clone)]
pub struct BollingerColumns {
    pub upper: Vec<Option<f64>>,
    pub middle: Vec<Option<f64>>,
    pub lower: Vec<Option<f64>>,
}

pub fn calculate_bollinger(candles: &[Candle], period: usize, mult: f64) -> BollingerColumns {
    let len = candles.len();
    let mut columns = BollingerColumns {
        upper: vec![None; len],
        middle: vec![None; len],
        lower: vec![None; len],
    };
    if period == 0 {
        return columns;
    }

    for i in 0..len {
        if i + 1 < period {
            continue;
        }
        let window = &candles[i + 1 - period..=i];
        let mean = window.iter().map(|c| c.close).sum::<f64>() / period as f64;
        let variance = window
            .iter()
            .map(|c| (c.close - mean).powi(2))
            .sum::<f64>()
            / period as f64;
        let stddev = variance.sqrt();

        columns.middle[i] = Some(mean);
        columns.upper[i] = Some(mean + mult * stddev);
        columns.lower[i] = Some(mean - mult * stddev);
    }

    columns
}
