use crate::backtester::{ParallelBacktester, RunSummary};
use crate::config::RunSettings;
use crate::market_data::CsvPriceSource;
use crate::report::{ReportFormat, ReportSink};
use crate::strategy::{create_strategy, trend_following::TEMPLATE_ID};
use anyhow::{Context, Result};
use log::{info, warn};

pub fn run(
    settings: &RunSettings,
    format: ReportFormat,
    sink: &dyn ReportSink,
) -> Result<RunSummary> {
    let strategy = create_strategy(
        TEMPLATE_ID,
        &settings.strategy_name,
        settings.strategy_parameters(),
    )
    .context("Invalid strategy configuration")?;
    info!(
        "Running {} with parameters {:?}",
        strategy.name(),
        strategy.parameters()
    );

    let source = CsvPriceSource::new(&settings.data_dir);
    info!("Loading price data from {}", source.root().display());

    let backtester = ParallelBacktester::new(settings.worker_count)?.with_format(format);
    let summary = backtester.run(settings.jobs.clone(), &source, strategy.as_ref(), sink);

    if !summary.failures.is_empty() {
        warn!(
            "{} of {} symbol{} could not be loaded",
            summary.failures.len(),
            summary.total_jobs(),
            if summary.total_jobs() == 1 { "" } else { "s" }
        );
    }

    Ok(summary)
}
