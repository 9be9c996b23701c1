//! Stochastic oscillator.
//!
//! %K = 100 × (close - lowest_low) / (highest_high - lowest_low) over the
//! %K window; a flat window reads 50. %D is the SMA of %K over the %D window.

use crate::domain::candle::Candle;

#[derive(Debug, Clone)]
pub struct StochasticColumns {
    pub k: Vec<Option<f64>>,
    pub d: Vec<Option<f64>>,
}

pub fn calculate_stochastic(
    candles: &[Candle],
    k_period: usize,
    d_period: usize,
) -> StochasticColumns {
    let len = candles.len();
    let mut k = vec![None; len];

    if k_period > 0 {
        for i in 0..len {
            if i + 1 < k_period {
                continue;
            }
            let window = &candles[i + 1 - k_period..=i];
            let lowest = window.iter().map(|c| c.low).fold(f64::INFINITY, f64::min);
            let highest = window
                .iter()
                .map(|c| c.high)
                .fold(f64::NEG_INFINITY, f64::max);
            let range = highest - lowest;
            k[i] = Some(if range == 0.0 {
                50.0
            } else {
                100.0 * (candles[i].close - lowest) / range
            });
        }
    }

    let d = smooth_k(&k, d_period);
    StochasticColumns { k, d }
}

fn smooth_k(k: &[Option<f64>], d_period: usize) -> Vec<Option<f64>> {
    if d_period == 0 {
        return vec![None; k.len()];
    }

    let mut d = vec![None; k.len()];
    for i in 0..k.len() {
        if i + 1 < d_period {
            continue;
        }
        let window = &k[i + 1 - d_period..=i];
        if window.iter().all(|v| v.is_some()) {
            let sum: f64 = window.iter().flatten().sum();
            d[i] = Some(sum / d_period as f64);
        }
    }
    d
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn make_candle(index: u32, high: f64, low: f64, close: f64) -> Candle {
        Candle {
            timestamp: Utc.with_ymd_and_hms(2024, 1, 15, 9, 0, 0).unwrap()
                + chrono::Duration::minutes(index as i64),
            open: close,
            high,
            low,
            close,
            volume: 1000,
        }
    }

    #[test]
    fn stochastic_warmup() {
        let candles: Vec<Candle> = (0..6)
            .map(|i| make_candle(i, 110.0, 90.0, 100.0 + i as f64))
            .collect();
        let stoch = calculate_stochastic(&candles, 3, 2);

        assert!(stoch.k[1].is_none());
        assert!(stoch.k[2].is_some());
        assert!(stoch.d[2].is_none());
        assert!(stoch.d[3].is_some());
    }

    #[test]
    fn stochastic_close_at_high_reads_100() {
        let candles = vec![
            make_candle(0, 110.0, 90.0, 95.0),
            make_candle(1, 112.0, 92.0, 100.0),
            make_candle(2, 115.0, 95.0, 115.0),
        ];
        let stoch = calculate_stochastic(&candles, 3, 3);
        // close 115 == highest high over window [90..115]
        assert!((stoch.k[2].unwrap() - 100.0).abs() < 1e-9);
    }

    #[test]
    fn stochastic_close_at_low_reads_0() {
        let candles = vec![
            make_candle(0, 110.0, 90.0, 95.0),
            make_candle(1, 112.0, 92.0, 100.0),
            make_candle(2, 115.0, 90.0, 90.0),
        ];
        let stoch = calculate_stochastic(&candles, 3, 3);
        assert!((stoch.k[2].unwrap() - 0.0).abs() < 1e-9);
    }

    #[test]
    fn stochastic_flat_window_reads_50() {
        let candles: Vec<Candle> = (0..4).map(|i| make_candle(i, 100.0, 100.0, 100.0)).collect();
        let stoch = calculate_stochastic(&candles, 3, 2);
        assert!((stoch.k[3].unwrap() - 50.0).abs() < 1e-9);
    }

    #[test]
    fn stochastic_d_is_mean_of_k() {
        let candles: Vec<Candle> = (0..6)
            .map(|i| make_candle(i, 110.0 + i as f64, 90.0, 100.0 + i as f64))
            .collect();
        let stoch = calculate_stochastic(&candles, 2, 2);

        let expected = (stoch.k[2].unwrap() + stoch.k[3].unwrap()) / 2.0;
        assert!((stoch.d[3].unwrap() - expected).abs() < 1e-9);
    }
}
