//! Simple moving average over closing prices.

use crate::domain::candle::Candle;

pub fn calculate_sma(candles: &[Candle], period: usize) -> Vec<Option<f64>> {
    if period == 0 {
        return vec![None; candles.len()];
    }

    let mut values = Vec::with_capacity(candles.len());
    let mut window_sum = 0.0;

    for (i, candle) in candles.iter().enumerate() {
        window_sum += candle.close;
        if i >= period {
            window_sum -= candles[i - period].close;
        }
        if i + 1 >= period {
            values.push(Some(window_sum / period as f64));
        } else {
            values.push(None);
        }
    }

    values
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn make_candle(minute: u32, close: f64) -> Candle {
        Candle {
            timestamp: Utc.with_ymd_and_hms(2024, 1, 15, 9, minute, 0).unwrap(),
            open: close,
            high: close,
            low: close,
            close,
            volume: 1000,
        }
    }

    #[test]
    fn sma_warmup_and_values() {
        let candles: Vec<Candle> = [10.0, 20.0, 30.0, 40.0]
            .iter()
            .enumerate()
            .map(|(i, &c)| make_candle(i as u32, c))
            .collect();

        let sma = calculate_sma(&candles, 3);

        assert_eq!(sma[0], None);
        assert_eq!(sma[1], None);
        assert_eq!(sma[2], Some(20.0));
        assert_eq!(sma[3], Some(30.0));
    }

    #[test]
    fn sma_period_one_is_close() {
        let candles = vec![make_candle(0, 10.0), make_candle(1, 12.0)];
        let sma = calculate_sma(&candles, 1);
        assert_eq!(sma, vec![Some(10.0), Some(12.0)]);
    }

    #[test]
    fn sma_insufficient_bars() {
        let candles = vec![make_candle(0, 10.0), make_candle(1, 12.0)];
        let sma = calculate_sma(&candles, 5);
        assert_eq!(sma, vec![None, None]);
    }

    #[test]
    fn sma_zero_period() {
        let candles = vec![make_candle(0, 10.0)];
        assert_eq!(calculate_sma(&candles, 0), vec![None]);
    }

    #[test]
    fn sma_empty_input() {
        assert!(calculate_sma(&[], 3).is_empty());
    }
}
