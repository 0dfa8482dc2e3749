use crate::indicators::percentage_change;
use crate::models::*;
use log::{debug, warn};

/// Aggregate statistics over realized trades, before they are attached to a symbol.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TradeStats {
    pub total_trades: usize,
    pub profitable_trades: usize,
    pub total_profit_percent: f32,
    pub non_finite_trades: usize,
}

impl TradeStats {
    /// Mean profit per trade, or `None` when nothing was closed.
    pub fn average_profit_percent(&self) -> Option<f32> {
        if self.total_trades == 0 {
            None
        } else {
            Some(self.total_profit_percent / self.total_trades as f32)
        }
    }

    fn record(&mut self, profit: f32) {
        self.total_profit_percent += profit;
        self.total_trades += 1;
        if profit > 0.0 {
            self.profitable_trades += 1;
        }
        if !profit.is_finite() {
            self.non_finite_trades += 1;
        }
    }
}

pub struct PerformanceCalculator;

impl PerformanceCalculator {
    /// Walks the signals alongside the series and realizes one trade per exit.
    /// Long profit is measured from entry to exit, short profit from exit back to entry.
    pub fn evaluate(series: &PriceSeries, signals: &[SignalAction]) -> TradeStats {
        if signals.len() != series.len() {
            warn!(
                "Signal count {} does not match {} records for {}; evaluating the common prefix",
                signals.len(),
                series.len(),
                series.symbol_name()
            );
        }

        let mut stats = TradeStats::default();
        let mut open_price: Option<f32> = None;

        for (record, signal) in series.records().iter().zip(signals) {
            let close = record.close_price;
            let profit = match signal {
                SignalAction::None => continue,
                SignalAction::EnterLong | SignalAction::EnterShort => {
                    open_price = Some(close);
                    continue;
                }
                // The last entry price stays in effect until the next entry.
                SignalAction::ExitLong => open_price.map(|open| percentage_change(open, close)),
                SignalAction::ExitShort => open_price.map(|open| percentage_change(close, open)),
            };

            let Some(profit) = profit else {
                debug!(
                    "Ignoring {} on {} for {} before any entry",
                    signal.as_str(),
                    record.date,
                    series.symbol_name()
                );
                continue;
            };

            if !profit.is_finite() {
                warn!(
                    "Non-finite trade profit on {} for {} (zero reference price)",
                    record.date,
                    series.symbol_name()
                );
            }
            stats.record(profit);
        }

        stats
    }

    pub fn to_result(
        series: &PriceSeries,
        strategy_name: &str,
        stats: &TradeStats,
    ) -> BacktestResult {
        BacktestResult {
            symbol_name: series.symbol_name().to_string(),
            strategy_name: strategy_name.to_string(),
            total_trades: stats.total_trades,
            profitable_trades: stats.profitable_trades,
            total_profit_percent: stats.total_profit_percent,
            average_profit_percent: stats.average_profit_percent(),
            non_finite_trades: stats.non_finite_trades,
        }
    }
}
