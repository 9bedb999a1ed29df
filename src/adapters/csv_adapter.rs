//! CSV file data adapter.
//!
//! One file per symbol, `<base_path>/<SYMBOL>.csv`, with a header row. Columns
//! are resolved by name (case-insensitive): `date` and `close` are required,
//! `open`, `high`, `low` and `volume` are optional. `Adj Close` is ignored.

use crate::domain::error::EmatrailError;
use crate::domain::ohlcv::{OhlcvBar, PriceSeries};
use crate::ports::data_port::DataPort;
use chrono::NaiveDate;
use std::fs;
use std::path::PathBuf;
use tracing::{debug, warn};

pub struct CsvAdapter {
    base_path: PathBuf,
}

struct Columns {
    date: usize,
    close: usize,
    open: Option<usize>,
    high: Option<usize>,
    low: Option<usize>,
    volume: Option<usize>,
}

impl Columns {
    fn resolve(symbol: &str, headers: &csv::StringRecord) -> Result<Self, EmatrailError> {
        let find = |name: &str| {
            headers
                .iter()
                .position(|h| h.trim().eq_ignore_ascii_case(name))
        };
        let missing = |name: &str| EmatrailError::NoData {
            symbol: symbol.to_string(),
            reason: format!("missing {name} column"),
        };

        Ok(Columns {
            date: find("date").ok_or_else(|| missing("date"))?,
            close: find("close").ok_or_else(|| missing("close"))?,
            open: find("open"),
            high: find("high"),
            low: find("low"),
            volume: find("volume"),
        })
    }
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn csv_path(&self, symbol: &str) -> PathBuf {
        self.base_path.join(format!("{}.csv", symbol))
    }

    fn read_bars(&self, symbol: &str) -> Result<Vec<OhlcvBar>, EmatrailError> {
        let path = self.csv_path(symbol);
        let content = fs::read_to_string(&path).map_err(|e| EmatrailError::NoData {
            symbol: symbol.to_string(),
            reason: format!("failed to read {}: {}", path.display(), e),
        })?;

        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        let headers = rdr
            .headers()
            .map_err(|e| EmatrailError::DataIntegrity {
                reason: format!("{}: CSV header error: {}", path.display(), e),
            })?
            .clone();
        let cols = Columns::resolve(symbol, &headers)?;

        let mut bars = Vec::new();
        for (line, result) in rdr.records().enumerate() {
            let record = result.map_err(|e| EmatrailError::DataIntegrity {
                reason: format!("CSV parse error: {}", e),
            })?;
            // header is line 1
            let row = line + 2;

            let date_str = record.get(cols.date).unwrap_or("").trim();
            let date = parse_date(date_str).ok_or_else(|| EmatrailError::DataIntegrity {
                reason: format!("{symbol} row {row}: invalid date '{date_str}'"),
            })?;

            let close = parse_price(&record, cols.close).ok_or_else(|| EmatrailError::NoData {
                symbol: symbol.to_string(),
                reason: format!("row {row}: missing close"),
            })?;

            let price_or_close =
                |idx: Option<usize>| idx.and_then(|i| parse_price(&record, i)).unwrap_or(close);

            bars.push(OhlcvBar {
                date,
                open: price_or_close(cols.open),
                high: price_or_close(cols.high),
                low: price_or_close(cols.low),
                close,
                volume: cols
                    .volume
                    .and_then(|i| record.get(i))
                    .and_then(parse_volume)
                    .unwrap_or(0),
            });
        }

        bars.sort_by_key(|b| b.date);
        debug!(symbol, bars = bars.len(), path = %path.display(), "loaded csv");
        Ok(bars)
    }
}

fn parse_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .or_else(|| s.get(..10).and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok()))
}

fn parse_price(record: &csv::StringRecord, idx: usize) -> Option<f64> {
    record.get(idx)?.trim().parse::<f64>().ok()
}

fn parse_volume(s: &str) -> Option<i64> {
    let s = s.trim();
    s.parse::<i64>()
        .ok()
        .or_else(|| s.parse::<f64>().ok().map(|v| v as i64))
}

impl DataPort for CsvAdapter {
    fn fetch_ohlcv(
        &self,
        symbol: &str,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> Result<PriceSeries, EmatrailError> {
        let bars: Vec<OhlcvBar> = self
            .read_bars(symbol)?
            .into_iter()
            .filter(|b| start_date.is_none_or(|s| b.date >= s))
            .filter(|b| end_date.is_none_or(|e| b.date <= e))
            .collect();

        if bars.is_empty() {
            warn!(symbol, "no bars in requested window");
        }
        PriceSeries::new(symbol, bars)
    }

    fn list_symbols(&self) -> Result<Vec<String>, EmatrailError> {
        let entries = fs::read_dir(&self.base_path)?;

        let mut symbols = Vec::new();
        for entry in entries {
            let path = entry?.path();
            if path.extension().is_some_and(|ext| ext == "csv") {
                if let Some(stem) = path.file_stem() {
                    symbols.push(stem.to_string_lossy().into_owned());
                }
            }
        }

        symbols.sort();
        Ok(symbols)
    }

    fn get_data_range(
        &self,
        symbol: &str,
    ) -> Result<Option<(NaiveDate, NaiveDate, usize)>, EmatrailError> {
        if !self.csv_path(symbol).exists() {
            return Ok(None);
        }
        let bars = self.read_bars(symbol)?;
        Ok(match (bars.first(), bars.last()) {
            (Some(first), Some(last)) => Some((first.date, last.date, bars.len())),
            _ => None,
        })
    }
}
