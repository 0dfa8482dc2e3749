use anyhow::Result;
use breakout_backtester::{
    commands::{backtest, show_data},
    config::{collect_settings, data_dir_setting, parse_symbol_entry, RunSettings},
    market_data::CsvPriceSource,
    models::BacktestJob,
    report::{ConsoleSink, ReportFormat},
};
use clap::{Parser, Subcommand};
use log::info;
use std::env;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "breakout-backtester")]
#[command(about = "Backtests a trailing-window breakout strategy across symbols in parallel")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Backtest every configured symbol and print per-symbol trade statistics
    Backtest {
        /// Number of worker threads
        #[arg(long)]
        workers: Option<usize>,
        /// Trailing window size used for breakout extremes
        #[arg(long)]
        lookback: Option<i64>,
        /// Percentage move away from the window extreme that opens a position
        #[arg(long)]
        enter_trigger: Option<i64>,
        /// Percentage reversal that closes an open position
        #[arg(long)]
        exit_trigger: Option<i64>,
        /// Profit percentage that closes an open position
        #[arg(long)]
        target: Option<i64>,
        /// Loss percentage that closes an open position
        #[arg(long)]
        stop_loss: Option<i64>,
        /// Directory that relative symbol paths resolve against
        #[arg(long, value_name = "DIR")]
        data_dir: Option<PathBuf>,
        /// Symbol to backtest as NAME=PATH (repeatable, replaces the configured list)
        #[arg(long = "symbol", value_name = "NAME=PATH", value_parser = parse_symbol_arg)]
        symbols: Vec<BacktestJob>,
        /// Emit one JSON object per symbol instead of the text report
        #[arg(long)]
        json: bool,
    },
    /// Print the parsed records of one price file
    ShowData {
        /// Symbol label
        symbol: String,
        /// Path to the CSV file
        path: String,
        /// Directory that a relative path resolves against
        #[arg(long, value_name = "DIR")]
        data_dir: Option<PathBuf>,
    },
}

fn parse_symbol_arg(raw: &str) -> Result<BacktestJob, String> {
    parse_symbol_entry(raw).map_err(|err| err.to_string())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let env_settings = collect_settings(|key| env::var(key).ok());
    let sink = ConsoleSink::new();

    match cli.command {
        Commands::Backtest {
            workers,
            lookback,
            enter_trigger,
            exit_trigger,
            target,
            stop_loss,
            data_dir,
            symbols,
            json,
        } => {
            let mut settings = RunSettings::from_settings_map(&env_settings)?;
            if let Some(value) = workers {
                settings.worker_count = value;
            }
            if let Some(value) = lookback {
                settings.strategy.lookback_period = value;
            }
            if let Some(value) = enter_trigger {
                settings.strategy.enter_trigger_percent = value;
            }
            if let Some(value) = exit_trigger {
                settings.strategy.exit_trigger_percent = value;
            }
            if let Some(value) = target {
                settings.strategy.target_percent = value;
            }
            if let Some(value) = stop_loss {
                settings.strategy.stop_loss_percent = value;
            }
            if let Some(dir) = data_dir {
                settings.data_dir = dir;
            }
            if !symbols.is_empty() {
                settings.jobs = symbols;
            }
            let format = if json {
                ReportFormat::Json
            } else {
                ReportFormat::Text
            };

            let summary = backtest::run(&settings, format, &sink)?;
            info!(
                "Finished {} symbol(s): {} completed, {} failed",
                summary.total_jobs(),
                summary.results.len(),
                summary.failures.len()
            );
        }
        Commands::ShowData {
            symbol,
            path,
            data_dir,
        } => {
            let data_dir = data_dir.unwrap_or_else(|| data_dir_setting(&env_settings));
            let source = CsvPriceSource::new(data_dir);
            show_data::run(&source, &symbol, &path, &sink)?;
        }
    }

    Ok(())
}
