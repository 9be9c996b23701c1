//! RSI (Relative Strength Index).
//!
//! Uses Wilder's smoothing for average gain/loss:
//! - First average: simple mean of gains/losses over the first `period` changes
//! - Subsequent: avg = (prev_avg * (period - 1) + current) / period
//!
//! RSI = 100 - (100 / (1 + avg_gain / avg_loss)); 100 when avg_loss is zero.
//! Warm-up: the first `period` bars carry no value (a change needs two bars).

use crate::domain::candle::Candle;

pub fn calculate_rsi(candles: &[Candle], period: usize) -> Vec<Option<f64>> {
    if period == 0 || candles.len() < 2 {
        return vec![None; candles.len()];
    }

    let mut gains = Vec::with_capacity(candles.len() - 1);
    let mut losses = Vec::with_capacity(candles.len() - 1);
    for i in 1..candles.len() {
        let change = candles[i].close - candles[i - 1].close;
        gains.push(change.max(0.0));
        losses.push((-change).max(0.0));
    }

    let mut values = vec![None];
    let mut avg_gain = 0.0;
    let mut avg_loss = 0.0;

    for i in 1..candles.len() {
        let change_idx = i - 1;

        if change_idx + 1 < period {
            values.push(None);
            continue;
        }

        if change_idx + 1 == period {
            avg_gain = gains[..period].iter().sum::<f64>() / period as f64;
            avg_loss = losses[..period].iter().sum::<f64>() / period as f64;
        } else {
            avg_gain = (avg_gain * (period - 1) as f64 + gains[change_idx]) / period as f64;
            avg_loss = (avg_loss * (period - 1) as f64 + losses[change_idx]) / period as f64;
        }

        let rsi = if avg_loss == 0.0 {
            100.0
        } else {
            100.0 - (100.0 / (1.0 + avg_gain / avg_loss))
        };
        values.push(Some(rsi));
    }

    values
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn make_candle(index: u32, close: f64) -> Candle {
        Candle {
            timestamp: Utc.with_ymd_and_hms(2024, 1, 15, 9, 0, 0).unwrap()
                + chrono::Duration::minutes(index as i64),
            open: close,
            high: close,
            low: close,
            close,
            volume: 1000,
        }
    }

    #[test]
    fn rsi_empty_input() {
        assert!(calculate_rsi(&[], 14).is_empty());
    }

    #[test]
    fn rsi_single_bar() {
        let candles = vec![make_candle(0, 100.0)];
        assert_eq!(calculate_rsi(&candles, 14), vec![None]);
    }

    #[test]
    fn rsi_warmup_period() {
        let candles: Vec<Candle> = (0..15)
            .map(|i| make_candle(i, 100.0 + (i as f64 % 5.0) * 2.0))
            .collect();

        let rsi = calculate_rsi(&candles, 14);
        assert_eq!(rsi.len(), 15);
        for (i, value) in rsi.iter().enumerate().take(14) {
            assert!(value.is_none(), "bar {} should be warming up", i);
        }
        assert!(rsi[14].is_some(), "bar 14 should carry a value");
    }

    #[test]
    fn rsi_all_gains_is_100() {
        let candles: Vec<Candle> = (0..15).map(|i| make_candle(i, 100.0 + i as f64)).collect();
        let rsi = calculate_rsi(&candles, 14);
        assert!((rsi[14].unwrap() - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn rsi_all_losses_is_0() {
        let candles: Vec<Candle> = (0..15).map(|i| make_candle(i, 100.0 - i as f64)).collect();
        let rsi = calculate_rsi(&candles, 14);
        assert!((rsi[14].unwrap() - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn rsi_stays_in_range() {
        let candles: Vec<Candle> = (0..40)
            .map(|i| make_candle(i, 100.0 + ((i as f64) % 7.0 - 3.0) * 2.0))
            .collect();

        for value in calculate_rsi(&candles, 14).into_iter().flatten() {
            assert!((0.0..=100.0).contains(&value), "RSI {} out of range", value);
        }
    }

    #[test]
    fn rsi_zero_period() {
        let candles = vec![make_candle(0, 100.0), make_candle(1, 101.0)];
        assert_eq!(calculate_rsi(&candles, 0), vec![None, None]);
    }
}
