use crate::models::BacktestResult;
use std::io::{self, Write};
use std::sync::{Mutex, MutexGuard};

const BANNER: &str = "*************************************************************";

/// Destination for human-readable output. Implementations serialize concurrent writers.
pub trait ReportSink: Send + Sync {
    fn emit_line(&self, line: &str);

    /// Emits several lines without interleaving with other writers.
    fn emit_block(&self, lines: &[String]) {
        for line in lines {
            self.emit_line(line);
        }
    }
}

fn lock_recovering<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[derive(Default)]
pub struct ConsoleSink {
    lock: Mutex<()>,
}

impl ConsoleSink {
    pub fn new() -> Self {
        Self::default()
    }

    fn write_lines(lines: &[&str]) {
        let stdout = io::stdout();
        let mut handle = stdout.lock();
        for line in lines {
            if writeln!(handle, "{}", line).is_err() {
                return;
            }
        }
        let _ = handle.flush();
    }
}

impl ReportSink for ConsoleSink {
    fn emit_line(&self, line: &str) {
        let _guard = lock_recovering(&self.lock);
        Self::write_lines(&[line]);
    }

    fn emit_block(&self, lines: &[String]) {
        let _guard = lock_recovering(&self.lock);
        let borrowed: Vec<&str> = lines.iter().map(String::as_str).collect();
        Self::write_lines(&borrowed);
    }
}

/// Collects emitted lines in memory.
#[derive(Default)]
pub struct CaptureSink {
    lines: Mutex<Vec<String>>,
}

impl CaptureSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<String> {
        lock_recovering(&self.lines).clone()
    }

    pub fn contents(&self) -> String {
        self.lines().join("\n")
    }
}

impl ReportSink for CaptureSink {
    fn emit_line(&self, line: &str) {
        lock_recovering(&self.lines).push(line.to_string());
    }

    fn emit_block(&self, lines: &[String]) {
        lock_recovering(&self.lines).extend(lines.iter().cloned());
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReportFormat {
    #[default]
    Text,
    Json,
}

pub fn format_result(result: &BacktestResult, format: ReportFormat) -> Vec<String> {
    match format {
        ReportFormat::Text => format_result_text(result),
        ReportFormat::Json => vec![serde_json::to_string(result)
            .unwrap_or_else(|err| format!("{{\"error\":\"{}\"}}", err))],
    }
}

fn format_result_text(result: &BacktestResult) -> Vec<String> {
    let average = result
        .average_profit_percent
        .map(|value| value.to_string())
        .unwrap_or_else(|| "N/A".to_string());

    let mut lines = vec![
        String::new(),
        BANNER.to_string(),
        format!("Symbol: {}", result.symbol_name),
        format!("Strategy: {}", result.strategy_name),
        format!("Total Trades Taken: {}", result.total_trades),
        format!("Number Of Profitable Trades: {}", result.profitable_trades),
        format!("Total Profit Percentage: {}", result.total_profit_percent),
        format!("Average Profit Percentage Per Trade: {}", average),
    ];
    if result.non_finite_trades > 0 {
        lines.push(format!(
            "Non-finite Trade Results: {}",
            result.non_finite_trades
        ));
    }
    lines.push(BANNER.to_string());
    lines
}

pub fn format_load_failure(symbol: &str, error: &str, format: ReportFormat) -> Vec<String> {
    match format {
        ReportFormat::Text => vec![
            String::new(),
            BANNER.to_string(),
            format!("Symbol: {}", symbol),
            format!("Load Failed: {}", error),
            BANNER.to_string(),
        ],
        ReportFormat::Json => vec![serde_json::json!({
            "symbolName": symbol,
            "error": error,
        })
        .to_string()],
    }
}
