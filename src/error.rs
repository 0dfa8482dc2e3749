use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to open {location}: {source}")]
    Open {
        location: String,
        #[source]
        source: io::Error,
    },
    #[error("failed to read {location}: {source}")]
    Csv {
        location: String,
        #[source]
        source: csv::Error,
    },
    #[error("malformed record in {location} at line {line}: {reason}")]
    Malformed {
        location: String,
        line: u64,
        reason: String,
    },
    #[error("no price data registered for {symbol} at {location}")]
    NotFound { symbol: String, location: String },
}

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("lookback period must be at least 1 (value: {0})")]
    InvalidLookback(i64),
    #[error("{name} must not be negative (value: {value})")]
    NegativePercentage { name: String, value: i64 },
    #[error("{name} must be a finite integer (value: {value})")]
    InvalidParameter { name: String, value: f64 },
    #[error("unknown strategy template: {0}")]
    UnknownStrategy(String),
}
