use serde::{Deserialize, Serialize};

/// One trading period for a symbol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceRecord {
    pub date: String,
    pub open_price: f32,
    pub close_price: f32,
    pub volume: i64,
}

impl PriceRecord {
    pub fn new(date: impl Into<String>, open_price: f32, close_price: f32, volume: i64) -> Self {
        Self {
            date: date.into(),
            open_price,
            close_price,
            volume,
        }
    }
}

/// Chronological price history for one symbol (index 0 is the earliest period).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceSeries {
    symbol_name: String,
    records: Vec<PriceRecord>,
}

impl PriceSeries {
    pub fn new(symbol_name: impl Into<String>, records: Vec<PriceRecord>) -> Self {
        Self {
            symbol_name: symbol_name.into(),
            records,
        }
    }

    /// Builds a series from closing prices only, labelling periods by index.
    pub fn from_closes(symbol_name: impl Into<String>, closes: &[f32]) -> Self {
        let records = closes
            .iter()
            .enumerate()
            .map(|(idx, &close)| PriceRecord::new(format!("day-{}", idx), close, close, 0))
            .collect();
        Self::new(symbol_name, records)
    }

    pub fn symbol_name(&self) -> &str {
        &self.symbol_name
    }

    pub fn records(&self) -> &[PriceRecord] {
        &self.records
    }

    pub fn closes(&self) -> Vec<f32> {
        self.records.iter().map(|r| r.close_price).collect()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SignalAction {
    #[default]
    None,
    EnterLong,
    ExitLong,
    EnterShort,
    ExitShort,
}

impl SignalAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            SignalAction::None => "none",
            SignalAction::EnterLong => "enter_long",
            SignalAction::ExitLong => "exit_long",
            SignalAction::EnterShort => "enter_short",
            SignalAction::ExitShort => "exit_short",
        }
    }

    pub fn is_entry(&self) -> bool {
        matches!(self, SignalAction::EnterLong | SignalAction::EnterShort)
    }
}

/// Realized trade statistics for one symbol under one strategy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BacktestResult {
    pub symbol_name: String,
    pub strategy_name: String,
    pub total_trades: usize,
    pub profitable_trades: usize,
    pub total_profit_percent: f32,
    /// `None` when no trade was closed.
    pub average_profit_percent: Option<f32>,
    /// Closed trades whose profit came out as inf/NaN (zero reference price).
    #[serde(default)]
    pub non_finite_trades: usize,
}

/// A queued unit of work: which symbol to load and where its data lives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BacktestJob {
    pub symbol_name: String,
    pub location: String,
}

impl BacktestJob {
    pub fn new(symbol_name: impl Into<String>, location: impl Into<String>) -> Self {
        Self {
            symbol_name: symbol_name.into(),
            location: location.into(),
        }
    }
}
