//! Price history sources consumed by the backtest workers.

use crate::error::LoadError;
use crate::models::{PriceRecord, PriceSeries};
use csv::{ReaderBuilder, StringRecord, Trim};
use std::collections::HashMap;
use std::fs::File;
use std::path::{Path, PathBuf};

const DATE_COLUMN: usize = 0;
const OPEN_COLUMN: usize = 1;
const CLOSE_COLUMN: usize = 4;
const VOLUME_COLUMN: usize = 6;

pub trait PriceSource: Send + Sync {
    /// Loads the full history for `symbol` from `location`.
    fn load(&self, symbol: &str, location: &str) -> Result<PriceSeries, LoadError>;
}

/// Reads daily exports laid out as `Date,Open,High,Low,Close,Adj Close,Volume`.
#[derive(Debug, Clone)]
pub struct CsvPriceSource {
    root: PathBuf,
}

impl CsvPriceSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn resolve(&self, location: &str) -> PathBuf {
        let path = Path::new(location);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }
}

impl PriceSource for CsvPriceSource {
    fn load(&self, symbol: &str, location: &str) -> Result<PriceSeries, LoadError> {
        let path = self.resolve(location);
        let display = path.display().to_string();
        let file = File::open(&path).map_err(|source| LoadError::Open {
            location: display.clone(),
            source,
        })?;

        let mut reader = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .trim(Trim::All)
            .from_reader(file);

        let mut records = Vec::new();
        for (idx, row) in reader.records().enumerate() {
            let row = row.map_err(|source| LoadError::Csv {
                location: display.clone(),
                source,
            })?;
            let line = row.position().map(|p| p.line()).unwrap_or(idx as u64 + 1);
            if idx == 0 && is_header(&row) {
                continue;
            }
            if row.iter().all(|field| field.is_empty()) {
                continue;
            }
            records.push(parse_record(&row).map_err(|reason| LoadError::Malformed {
                location: display.clone(),
                line,
                reason,
            })?);
        }

        Ok(PriceSeries::new(symbol, records))
    }
}

fn is_header(row: &StringRecord) -> bool {
    row.get(DATE_COLUMN)
        .map(|field| field.eq_ignore_ascii_case("date"))
        .unwrap_or(false)
}

fn parse_record(row: &StringRecord) -> Result<PriceRecord, String> {
    if row.len() <= VOLUME_COLUMN {
        return Err(format!(
            "expected at least {} columns, found {}",
            VOLUME_COLUMN + 1,
            row.len()
        ));
    }
    let field = |column: usize| row.get(column).unwrap_or_default();

    let open_price = parse_price(field(OPEN_COLUMN), "open")?;
    let close_price = parse_price(field(CLOSE_COLUMN), "close")?;
    let volume = field(VOLUME_COLUMN)
        .parse::<i64>()
        .map_err(|_| format!("volume is not an integer: {:?}", field(VOLUME_COLUMN)))?;

    Ok(PriceRecord::new(
        field(DATE_COLUMN),
        open_price,
        close_price,
        volume,
    ))
}

fn parse_price(raw: &str, name: &str) -> Result<f32, String> {
    let value = raw
        .parse::<f32>()
        .map_err(|_| format!("{} price is not a number: {:?}", name, raw))?;
    if !value.is_finite() {
        return Err(format!("{} price must be finite: {:?}", name, raw));
    }
    Ok(value)
}

/// Serves preloaded records keyed by location.
#[derive(Debug, Clone, Default)]
pub struct InMemoryPriceSource {
    series: HashMap<String, Vec<PriceRecord>>,
}

impl InMemoryPriceSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, location: impl Into<String>, records: Vec<PriceRecord>) {
        self.series.insert(location.into(), records);
    }

    pub fn with_closes(mut self, location: impl Into<String>, closes: &[f32]) -> Self {
        let records = PriceSeries::from_closes("", closes).records().to_vec();
        self.insert(location, records);
        self
    }
}

impl PriceSource for InMemoryPriceSource {
    fn load(&self, symbol: &str, location: &str) -> Result<PriceSeries, LoadError> {
        self.series
            .get(location)
            .map(|records| PriceSeries::new(symbol, records.clone()))
            .ok_or_else(|| LoadError::NotFound {
                symbol: symbol.to_string(),
                location: location.to_string(),
            })
    }
}
