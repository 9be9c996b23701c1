//! The standard indicator engine: computes the fixed column set the rule
//! language exposes.

use crate::domain::candle::Candle;
use crate::domain::error::TradesimError;
use crate::domain::indicator::{atr, bollinger, ema, macd, rsi, sma, stochastic, vwap};
use crate::domain::series::IndicatorRow;
use crate::ports::indicator_port::IndicatorEngine;

pub const RSI_PERIOD: usize = 14;
pub const ATR_PERIOD: usize = 14;
pub const SMA_FAST: usize = 20;
pub const SMA_SLOW: usize = 50;
pub const EMA_FAST: usize = 20;
pub const EMA_SLOW: usize = 50;
pub const MACD_FAST: usize = 12;
pub const MACD_SLOW: usize = 26;
pub const MACD_SIGNAL: usize = 9;
pub const STOCH_K: usize = 14;
pub const STOCH_D: usize = 3;
pub const BOLLINGER_PERIOD: usize = 20;
pub const BOLLINGER_MULT: f64 = 2.0;

#[derive(Debug, Default)]
pub struct StandardIndicatorEngine;

impl IndicatorEngine for StandardIndicatorEngine {
    fn enrich(&self, candles: &[Candle]) -> Result<Vec<IndicatorRow>, TradesimError> {
        let rsi = rsi::calculate_rsi(candles, RSI_PERIOD);
        let sma_20 = sma::calculate_sma(candles, SMA_FAST);
        let sma_50 = sma::calculate_sma(candles, SMA_SLOW);
        let ema_20 = ema::calculate_ema(candles, EMA_FAST);
        let ema_50 = ema::calculate_ema(candles, EMA_SLOW);
        let vwap = vwap::calculate_vwap(candles);
        let atr = atr::calculate_atr(candles, ATR_PERIOD);
        let macd = macd::calculate_macd(candles, MACD_FAST, MACD_SLOW, MACD_SIGNAL);
        let stoch = stochastic::calculate_stochastic(candles, STOCH_K, STOCH_D);
        let bands = bollinger::calculate_bollinger(candles, BOLLINGER_PERIOD, BOLLINGER_MULT);

        let rows = candles
            .iter()
            .enumerate()
            .map(|(i, candle)| IndicatorRow {
                candle: candle.clone(),
                rsi: rsi[i],
                sma_20: sma_20[i],
                sma_50: sma_50[i],
                ema_20: ema_20[i],
                ema_50: ema_50[i],
                vwap: vwap[i],
                atr: atr[i],
                macd_line: macd.line[i],
                macd_signal: macd.signal[i],
                macd_histogram: macd.histogram[i],
                stoch_k: stoch.k[i],
                stoch_d: stoch.d[i],
                bb_upper: bands.upper[i],
                bb_middle: bands.middle[i],
                bb_lower: bands.lower[i],
            })
            .collect();

        Ok(rows)
    }
}
