use crate::models::*;
use crate::performance::PerformanceCalculator;
use crate::strategy::Strategy;
use log::debug;

/// Runs one strategy over one price series. Holds no state between runs, so a single
/// engine can be shared by every worker.
pub struct Engine<'a> {
    strategy: &'a (dyn Strategy + Send + Sync),
}

impl<'a> Engine<'a> {
    pub fn new(strategy: &'a (dyn Strategy + Send + Sync)) -> Self {
        Self { strategy }
    }

    pub fn backtest(&self, series: &PriceSeries) -> BacktestResult {
        let signals = self.strategy.generate_signals(series);
        let stats = PerformanceCalculator::evaluate(series, &signals);
        debug!(
            "Backtested {} over {} records: {} trade(s), {} profitable",
            series.symbol_name(),
            series.len(),
            stats.total_trades,
            stats.profitable_trades
        );
        PerformanceCalculator::to_result(series, self.strategy.name(), &stats)
    }
}
