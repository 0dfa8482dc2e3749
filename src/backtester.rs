use crate::engine::Engine;
use crate::market_data::PriceSource;
use crate::models::{BacktestJob, BacktestResult};
use crate::report::{format_load_failure, format_result, ReportFormat, ReportSink};
use crate::strategy::Strategy;
use anyhow::{anyhow, Result};
use crossbeam_channel::{bounded, Receiver, Sender};
use log::{debug, info, warn};
use std::collections::VecDeque;
use std::sync::Mutex;
use std::thread;
use std::time::{Duration, Instant};

pub const DEFAULT_WORKER_COUNT: usize = 5;

/// Jobs shared by the workers. Filled once up front and only ever drained.
pub struct JobQueue {
    jobs: Mutex<VecDeque<BacktestJob>>,
}

impl JobQueue {
    pub fn new(jobs: impl IntoIterator<Item = BacktestJob>) -> Self {
        Self {
            jobs: Mutex::new(jobs.into_iter().collect()),
        }
    }

    /// Checks and pops under one lock acquisition. A poisoned lock reads as empty.
    pub fn pop_next(&self) -> Option<BacktestJob> {
        self.jobs.lock().ok()?.pop_front()
    }

    pub fn len(&self) -> usize {
        self.jobs.lock().map(|jobs| jobs.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug)]
pub enum SymbolOutcome {
    Completed(BacktestResult),
    LoadFailed { symbol: String, error: String },
}

impl SymbolOutcome {
    pub fn symbol(&self) -> &str {
        match self {
            SymbolOutcome::Completed(result) => &result.symbol_name,
            SymbolOutcome::LoadFailed { symbol, .. } => symbol,
        }
    }
}

#[derive(Debug, Default)]
pub struct RunSummary {
    /// In completion order.
    pub results: Vec<BacktestResult>,
    pub failures: Vec<(String, String)>,
    pub elapsed: Duration,
}

impl RunSummary {
    pub fn total_jobs(&self) -> usize {
        self.results.len() + self.failures.len()
    }
}

/// Fixed-size pool that drains a [`JobQueue`], one backtest per job.
pub struct ParallelBacktester {
    worker_count: usize,
    format: ReportFormat,
}

impl ParallelBacktester {
    pub fn new(worker_count: usize) -> Result<Self> {
        if worker_count == 0 {
            return Err(anyhow!("Worker count must be at least 1"));
        }
        Ok(Self {
            worker_count,
            format: ReportFormat::Text,
        })
    }

    pub fn with_format(mut self, format: ReportFormat) -> Self {
        self.format = format;
        self
    }

    pub fn worker_count(&self) -> usize {
        self.worker_count
    }

    /// Runs every job and blocks until all workers have seen an empty queue.
    /// Outcomes are forwarded to `sink` as they arrive, from the calling thread.
    pub fn run(
        &self,
        jobs: Vec<BacktestJob>,
        source: &dyn PriceSource,
        strategy: &(dyn Strategy + Send + Sync),
        sink: &dyn ReportSink,
    ) -> RunSummary {
        let start = Instant::now();
        let total = jobs.len();
        let queue = JobQueue::new(jobs);
        let engine = Engine::new(strategy);

        info!(
            "Backtesting {} symbol{} with {} worker thread{} ({})",
            total,
            if total == 1 { "" } else { "s" },
            self.worker_count,
            if self.worker_count == 1 { "" } else { "s" },
            strategy.name()
        );

        let (result_tx, result_rx): (Sender<SymbolOutcome>, Receiver<SymbolOutcome>) =
            bounded(total.max(1));
        let mut summary = RunSummary::default();

        thread::scope(|scope| {
            let mut handles = Vec::with_capacity(self.worker_count);
            for worker_id in 0..self.worker_count {
                let result_tx = result_tx.clone();
                let queue = &queue;
                let engine = &engine;
                handles.push(scope.spawn(move || {
                    run_worker(worker_id, queue, source, engine, &result_tx)
                }));
            }
            drop(result_tx);

            // Ends once every worker has dropped its sender.
            while let Ok(outcome) = result_rx.recv() {
                self.report(sink, &outcome);
                match outcome {
                    SymbolOutcome::Completed(result) => summary.results.push(result),
                    SymbolOutcome::LoadFailed { symbol, error } => {
                        summary.failures.push((symbol, error))
                    }
                }
            }

            for handle in handles {
                if handle.join().is_err() {
                    warn!("A backtest worker panicked before finishing");
                }
            }
        });

        summary.elapsed = start.elapsed();
        info!(
            "Backtest run finished: {} completed, {} failed in {:.2}s",
            summary.results.len(),
            summary.failures.len(),
            summary.elapsed.as_secs_f64()
        );
        summary
    }

    fn report(&self, sink: &dyn ReportSink, outcome: &SymbolOutcome) {
        let lines = match outcome {
            SymbolOutcome::Completed(result) => format_result(result, self.format),
            SymbolOutcome::LoadFailed { symbol, error } => {
                format_load_failure(symbol, error, self.format)
            }
        };
        sink.emit_block(&lines);
    }
}

fn run_worker(
    worker_id: usize,
    queue: &JobQueue,
    source: &dyn PriceSource,
    engine: &Engine<'_>,
    result_tx: &Sender<SymbolOutcome>,
) -> usize {
    debug!("Worker {} started", worker_id);
    let mut processed = 0usize;

    // The queue lock is released before loading or computing.
    while let Some(job) = queue.pop_next() {
        debug!("Worker {} started symbol {}", worker_id, job.symbol_name);
        let outcome = match source.load(&job.symbol_name, &job.location) {
            Ok(series) => SymbolOutcome::Completed(engine.backtest(&series)),
            Err(err) => {
                warn!(
                    "Failed to load {} from {}: {}",
                    job.symbol_name, job.location, err
                );
                SymbolOutcome::LoadFailed {
                    symbol: job.symbol_name.clone(),
                    error: err.to_string(),
                }
            }
        };
        processed += 1;
        debug!("Worker {} completed symbol {}", worker_id, outcome.symbol());
        if result_tx.send(outcome).is_err() {
            break;
        }
    }

    debug!("Worker {} finished after {} job(s)", worker_id, processed);
    processed
}
