//! CSV file data adapter.
//!
//! One file per pair, `<base_path>/<PAIR without '/'>.csv`, with header
//! `timestamp,open,high,low,close,volume`. Timestamps are
//! `YYYY-MM-DD HH:MM:SS` or a bare `YYYY-MM-DD` (midnight).

use crate::domain::error::BacktestError;
use crate::domain::indicator_helpers::IndicatorSet;
use crate::domain::ohlcv::Candle;
use crate::ports::data_port::DataPort;
use chrono::{NaiveDate, NaiveDateTime};
use std::fs;
use std::path::{Path, PathBuf};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const HEADER: [&str; 6] = ["timestamp", "open", "high", "low", "close", "volume"];

pub struct CsvAdapter {
    base_path: PathBuf,
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    pub fn csv_path(&self, pair: &str) -> PathBuf {
        self.base_path.join(file_name(pair))
    }
}

/// `EUR/USD` -> `EURUSD.csv`
pub fn file_name(pair: &str) -> String {
    format!("{}.csv", pair.replace('/', ""))
}

impl DataPort for CsvAdapter {
    fn fetch_candles(
        &self,
        pair: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<Candle>, BacktestError> {
        let path = self.csv_path(pair);
        let mut candles: Vec<Candle> = read_candles(&path)?
            .into_iter()
            .filter(|c| c.day() >= start_date && c.day() <= end_date)
            .collect();
        candles.sort_by_key(|c| c.timestamp);
        candles.dedup_by_key(|c| c.timestamp);
        Ok(candles)
    }
}

/// Every candle in the file, in file order.
pub fn read_candles(path: &Path) -> Result<Vec<Candle>, BacktestError> {
    let content = fs::read_to_string(path).map_err(|e| BacktestError::Data {
        reason: format!("failed to read {}: {}", path.display(), e),
    })?;

    let mut rdr = csv::Reader::from_reader(content.as_bytes());
    let mut candles = Vec::new();

    for (line, result) in rdr.records().enumerate() {
        let record = result.map_err(|e| BacktestError::Data {
            reason: format!("CSV parse error: {}", e),
        })?;

        let timestamp = parse_timestamp(field(&record, 0, "timestamp")?)?;
        let candle = Candle {
            timestamp,
            open: number(&record, 1, "open")?,
            high: number(&record, 2, "high")?,
            low: number(&record, 3, "low")?,
            close: number(&record, 4, "close")?,
            volume: number(&record, 5, "volume")?,
        };
        if !candle.is_consistent() {
            return Err(BacktestError::Data {
                reason: format!(
                    "{}: row {} violates low <= open, close <= high",
                    path.display(),
                    line + 1
                ),
            });
        }
        candles.push(candle);
    }

    Ok(candles)
}

pub fn write_candles(path: &Path, candles: &[Candle]) -> Result<(), BacktestError> {
    let mut wtr = csv::Writer::from_path(path).map_err(csv_error)?;
    wtr.write_record(HEADER).map_err(csv_error)?;
    for c in candles {
        wtr.write_record([
            c.timestamp.format(TIMESTAMP_FORMAT).to_string(),
            c.open.to_string(),
            c.high.to_string(),
            c.low.to_string(),
            c.close.to_string(),
            c.volume.to_string(),
        ])
        .map_err(csv_error)?;
    }
    wtr.flush()?;
    Ok(())
}

/// Candles joined with every indicator column; undefined values are empty cells.
pub fn write_indicator_table(
    path: &Path,
    candles: &[Candle],
    indicators: &IndicatorSet,
) -> Result<(), BacktestError> {
    let names: Vec<&str> = indicators.names().collect();
    let mut wtr = csv::Writer::from_path(path).map_err(csv_error)?;

    let mut header = vec!["timestamp", "close"];
    header.extend(&names);
    wtr.write_record(&header).map_err(csv_error)?;

    for (i, c) in candles.iter().enumerate() {
        let mut row = vec![
            c.timestamp.format(TIMESTAMP_FORMAT).to_string(),
            c.close.to_string(),
        ];
        row.extend(names.iter().map(|name| {
            indicators
                .value(name, i)
                .map(|v| v.to_string())
                .unwrap_or_default()
        }));
        wtr.write_record(&row).map_err(csv_error)?;
    }
    wtr.flush()?;
    Ok(())
}

fn csv_error(e: csv::Error) -> BacktestError {
    BacktestError::Data {
        reason: format!("CSV write error: {}", e),
    }
}

fn field<'r>(record: &'r csv::StringRecord, index: usize, name: &str) -> Result<&'r str, BacktestError> {
    record.get(index).ok_or_else(|| BacktestError::Data {
        reason: format!("missing {} column", name),
    })
}

fn number(record: &csv::StringRecord, index: usize, name: &str) -> Result<f64, BacktestError> {
    field(record, index, name)?
        .trim()
        .parse()
        .map_err(|e| BacktestError::Data {
            reason: format!("invalid {} value: {}", name, e),
        })
}

fn parse_timestamp(value: &str) -> Result<NaiveDateTime, BacktestError> {
    let value = value.trim();
    NaiveDateTime::parse_from_str(value, TIMESTAMP_FORMAT)
        .or_else(|_| {
            NaiveDate::parse_from_str(value, "%Y-%m-%d")
                .map(|d| d.and_time(chrono::NaiveTime::MIN))
        })
        .map_err(|e| BacktestError::Data {
            reason: format!("invalid timestamp {:?}: {}", value, e),
        })
}
