use crate::market_data::PriceSource;
use crate::report::ReportSink;
use anyhow::{Context, Result};
use log::info;

/// Prints every record of one series as `date, open, close, volume`.
pub fn run(
    source: &dyn PriceSource,
    symbol: &str,
    location: &str,
    sink: &dyn ReportSink,
) -> Result<usize> {
    let series = source
        .load(symbol, location)
        .with_context(|| format!("Failed to load {} from {}", symbol, location))?;
    info!("Loaded {} record(s) for {}", series.len(), symbol);

    let lines: Vec<String> = series
        .records()
        .iter()
        .map(|r| format!("{}, {}, {}, {}", r.date, r.open_price, r.close_price, r.volume))
        .collect();
    sink.emit_block(&lines);

    Ok(series.len())
}
