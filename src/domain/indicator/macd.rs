//! MACD (Moving Average Convergence Divergence).
//!
//! Line = EMA(fast) - EMA(slow), defined once the slow EMA is seeded.
//! Signal = EMA(signal_period) of the line, seeded with a simple average of
//! the first `signal_period` line values. Histogram = line - signal.

use crate::domain::candle::Candle;
use crate::domain::indicator::ema::calculate_ema;

#[derive(Debug, Clone)]
pub struct MacdColumns {
    pub line: Vec<Option<f64>>,
    pub signal: Vec<Option<f64>>,
    pub histogram: Vec<Option<f64>>,
}

pub fn calculate_macd(
    candles: &[Candle],
    fast: usize,
    slow: usize,
    signal_period: usize,
) -> MacdColumns {
    let fast_ema = calculate_ema(candles, fast);
    let slow_ema = calculate_ema(candles, slow);

    let line: Vec<Option<f64>> = fast_ema
        .iter()
        .zip(slow_ema.iter())
        .map(|(f, s)| match (f, s) {
            (Some(f), Some(s)) => Some(f - s),
            _ => None,
        })
        .collect();

    let signal = smooth_line(&line, signal_period);

    let histogram: Vec<Option<f64>> = line
        .iter()
        .zip(signal.iter())
        .map(|(l, s)| match (l, s) {
            (Some(l), Some(s)) => Some(l - s),
            _ => None,
        })
        .collect();

    MacdColumns {
        line,
        signal,
        histogram,
    }
}

fn smooth_line(line: &[Option<f64>], period: usize) -> Vec<Option<f64>> {
    if period == 0 {
        return vec![None; line.len()];
    }

    let alpha = 2.0 / (period as f64 + 1.0);
    let mut values = Vec::with_capacity(line.len());
    let mut ema = 0.0;
    let mut seen = 0usize;
    let mut seed_sum = 0.0;

    for value in line {
        match value {
            None => values.push(None),
            Some(v) => {
                seen += 1;
                if seen < period {
                    seed_sum += v;
                    values.push(None);
                } else if seen == period {
                    seed_sum += v;
                    ema = seed_sum / period as f64;
                    values.push(Some(ema));
                } else {
                    ema = v * alpha + ema * (1.0 - alpha);
                    values.push(Some(ema));
                }
            }
        }
    }

    values
}
