//! CSV file candle provider.
//!
//! One file per symbol/timeframe named `{SYMBOL}_{TIMEFRAME}.csv` with
//! header `timestamp,open,high,low,close,volume`; timestamps are
//! `%Y-%m-%d %H:%M:%S` in UTC.

use crate::domain::candle::Candle;
use crate::domain::error::TradesimError;
use crate::ports::data_port::CandleProvider;
use chrono::{DateTime, NaiveDateTime, Utc};
use std::fs;
use std::path::PathBuf;

pub struct CsvCandleProvider {
    base_path: PathBuf,
}

impl CsvCandleProvider {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn csv_path(&self, symbol: &str, timeframe: &str) -> PathBuf {
        self.base_path.join(format!("{}_{}.csv", symbol, timeframe))
    }

    fn parse_field<T: std::str::FromStr>(
        record: &csv::StringRecord,
        index: usize,
        name: &str,
        line: u64,
    ) -> Result<T, TradesimError>
    where
        T::Err: std::fmt::Display,
    {
        record
            .get(index)
            .ok_or_else(|| TradesimError::Data {
                reason: format!("missing {} column on line {}", name, line),
            })?
            .trim()
            .parse()
            .map_err(|e| TradesimError::Data {
                reason: format!("invalid {} value on line {}: {}", name, line, e),
            })
    }
}

impl CandleProvider for CsvCandleProvider {
    fn fetch_candles(
        &self,
        symbol: &str,
        timeframe: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Candle>, TradesimError> {
        let path = self.csv_path(symbol, timeframe);
        let content = fs::read_to_string(&path).map_err(|e| TradesimError::Data {
            reason: format!("failed to read {}: {}", path.display(), e),
        })?;

        let mut reader = csv::Reader::from_reader(content.as_bytes());
        let mut candles = Vec::new();

        for result in reader.records() {
            let record = result.map_err(|e| TradesimError::Data {
                reason: format!("CSV parse error: {}", e),
            })?;
            let line = record.position().map(|p| p.line()).unwrap_or(0);

            let timestamp_str = record.get(0).ok_or_else(|| TradesimError::Data {
                reason: format!("missing timestamp column on line {}", line),
            })?;
            let timestamp = NaiveDateTime::parse_from_str(timestamp_str.trim(), "%Y-%m-%d %H:%M:%S")
                .map_err(|e| TradesimError::Data {
                    reason: format!("invalid timestamp on line {}: {}", line, e),
                })?
                .and_utc();

            if timestamp < start || timestamp > end {
                continue;
            }

            candles.push(Candle {
                timestamp,
                open: Self::parse_field(&record, 1, "open", line)?,
                high: Self::parse_field(&record, 2, "high", line)?,
                low: Self::parse_field(&record, 3, "low", line)?,
                close: Self::parse_field(&record, 4, "close", line)?,
                volume: Self::parse_field(&record, 5, "volume", line)?,
            });
        }

        candles.sort_by_key(|c| c.timestamp);
        log::info!(
            "loaded {} candles for {}/{} from {}",
            candles.len(),
            symbol,
            timeframe,
            path.display(),
        );
        Ok(candles)
    }

    fn list_symbols(&self, timeframe: &str) -> Result<Vec<String>, TradesimError> {
        let entries = fs::read_dir(&self.base_path).map_err(|e| TradesimError::Data {
            reason: format!("failed to read directory {}: {}", self.base_path.display(), e),
        })?;

        let suffix = format!("_{}.csv", timeframe);
        let mut symbols = Vec::new();

        for entry in entries {
            let entry = entry.map_err(|e| TradesimError::Data {
                reason: format!("directory entry error: {}", e),
            })?;
            let name = entry.file_name();
            let name_str = name.to_string_lossy();
            if name_str.ends_with(&suffix) {
                symbols.push(name_str[..name_str.len() - suffix.len()].to_string());
            }
        }

        symbols.sort();
        Ok(symbols)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::TempDir;

    fn setup_test_data() -> (TempDir, PathBuf) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().to_path_buf();

        let csv_content = "timestamp,open,high,low,close,volume\n\
            2024-01-15 09:30:00,4000.0,4010.0,3990.0,4005.0,1500\n\
            2024-01-15 09:35:00,4005.0,4015.0,4000.0,4012.0,1600\n\
            2024-01-15 09:40:00,4012.0,4020.0,4008.0,4010.0,1400\n";

        fs::write(path.join("ES_5m.csv"), csv_content).unwrap();
        fs::write(path.join("NQ_5m.csv"), "timestamp,open,high,low,close,volume\n").unwrap();
        fs::write(path.join("ES_1h.csv"), "timestamp,open,high,low,close,volume\n").unwrap();

        (dir, path)
    }

    fn range() -> (DateTime<Utc>, DateTime<Utc>) {
        (
            Utc.with_ymd_and_hms(2024, 1, 15, 0, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2024, 1, 16, 0, 0, 0).unwrap(),
        )
    }

    #[test]
    fn fetch_candles_parses_rows() {
        let (_dir, path) = setup_test_data();
        let provider = CsvCandleProvider::new(path);
        let (start, end) = range();

        let candles = provider.fetch_candles("ES", "5m", start, end).unwrap();

        assert_eq!(candles.len(), 3);
        assert_eq!(
            candles[0].timestamp,
            Utc.with_ymd_and_hms(2024, 1, 15, 9, 30, 0).unwrap()
        );
        assert_eq!(candles[0].open, 4000.0);
        assert_eq!(candles[0].high, 4010.0);
        assert_eq!(candles[0].low, 3990.0);
        assert_eq!(candles[0].close, 4005.0);
        assert_eq!(candles[0].volume, 1500);
    }

    #[test]
    fn fetch_candles_filters_by_range() {
        let (_dir, path) = setup_test_data();
        let provider = CsvCandleProvider::new(path);

        let start = Utc.with_ymd_and_hms(2024, 1, 15, 9, 35, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2024, 1, 15, 9, 35, 0).unwrap();
        let candles = provider.fetch_candles("ES", "5m", start, end).unwrap();

        assert_eq!(candles.len(), 1);
        assert_eq!(candles[0].close, 4012.0);
    }

    #[test]
    fn fetch_candles_missing_file_errors() {
        let (_dir, path) = setup_test_data();
        let provider = CsvCandleProvider::new(path);
        let (start, end) = range();

        assert!(matches!(
            provider.fetch_candles("SPY", "5m", start, end),
            Err(TradesimError::Data { .. })
        ));
    }

    #[test]
    fn fetch_candles_bad_number_errors() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().to_path_buf();
        fs::write(
            path.join("ES_5m.csv"),
            "timestamp,open,high,low,close,volume\n2024-01-15 09:30:00,x,4010,3990,4005,1500\n",
        )
        .unwrap();

        let provider = CsvCandleProvider::new(path);
        let (start, end) = range();
        let err = provider.fetch_candles("ES", "5m", start, end).unwrap_err();
        assert!(err.to_string().contains("invalid open value"));
    }

    #[test]
    fn fetch_candles_missing_column_errors() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().to_path_buf();
        fs::write(
            path.join("ES_5m.csv"),
            "timestamp,open,high,low,close\n2024-01-15 09:30:00,4000,4010,3990,4005\n",
        )
        .unwrap();

        let provider = CsvCandleProvider::new(path);
        let (start, end) = range();
        let err = provider.fetch_candles("ES", "5m", start, end).unwrap_err();
        assert!(err.to_string().contains("missing volume column"));
    }

    #[test]
    fn list_symbols_filters_by_timeframe() {
        let (_dir, path) = setup_test_data();
        let provider = CsvCandleProvider::new(path);

        assert_eq!(provider.list_symbols("5m").unwrap(), vec!["ES", "NQ"]);
        assert_eq!(provider.list_symbols("1h").unwrap(), vec!["ES"]);
    }
}
