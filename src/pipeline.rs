//! The batch run: batch → validate in parallel → merge in order → route.
//!
//! A run either completes with every partition filled, or fails as a whole.
//! Partial partitions are never returned, so a caller can not persist an
//! incomplete result by accident.

use crate::batch::make_batches;
use crate::config::PipelineConfig;
use crate::error::PipelineError;
use crate::metrics::RunMetrics;
use crate::partition::{PartitionKind, PartitionSet};
use crate::pool::WorkerPool;
use crate::record::Record;
use crate::router::route;
use crate::validation::{FieldRules, Validator};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

#[cfg(feature = "io-csv")]
use crate::partition::{flush_all, PartitionSink};
#[cfg(feature = "io-csv")]
use anyhow::Context;
#[cfg(feature = "io-csv")]
use std::path::Path;

/// How long a failed run waits for its abandoned workers before returning.
///
/// Workers still busy after this keep running in the background until their
/// current batch finishes.
pub const ABANDONED_DRAIN_GRACE: Duration = Duration::from_millis(100);

/// Result of a successful run.
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub partitions: PartitionSet,
    pub metrics: RunMetrics,
}

/// A configured validation-and-routing run.
#[derive(Clone)]
pub struct Pipeline {
    config: PipelineConfig,
    validator: Arc<dyn Validator>,
}

impl Pipeline {
    /// Create a pipeline using the standard [`FieldRules`].
    ///
    /// # Errors
    /// [`PipelineError::InvalidConfig`] if `config` fails validation.
    pub fn new(config: PipelineConfig) -> Result<Self, PipelineError> {
        config.validate()?;
        Ok(Self {
            config,
            validator: Arc::new(FieldRules),
        })
    }

    /// Replace the rule set.
    #[must_use]
    pub fn with_validator(mut self, validator: Arc<dyn Validator>) -> Self {
        self.validator = validator;
        self
    }

    #[must_use]
    pub const fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Validate and route `records`, which must be in input order.
    ///
    /// # Errors
    /// Configuration errors, a worker fault, a result timeout, or a pool that
    /// fails to drain. No partitions are returned on error.
    pub fn run(&self, records: Vec<Record>) -> Result<RunOutput, PipelineError> {
        let mut metrics = RunMetrics::new();
        metrics.record_start();
        self.execute(records, metrics)
    }

    fn execute(
        &self,
        records: Vec<Record>,
        mut metrics: RunMetrics,
    ) -> Result<RunOutput, PipelineError> {
        let cfg = &self.config;
        metrics.records = records.len();
        metrics.workers = cfg.worker_count;

        let batches = make_batches(records, cfg.batch_size)?;
        metrics.batches = batches.len();
        info!(
            records = metrics.records,
            batches = metrics.batches,
            workers = cfg.worker_count,
            "validating records"
        );

        let pool = WorkerPool::new(cfg.worker_count)?;
        let processed = match pool.process_all(batches, Arc::clone(&self.validator), cfg.shutdown_timeout) {
            Ok(processed) => {
                pool.shutdown(cfg.shutdown_timeout)?;
                processed
            }
            Err(err) => {
                // remaining results are discarded; do not wait long for them
                if let Err(drain_err) = pool.shutdown(ABANDONED_DRAIN_GRACE.min(cfg.shutdown_timeout)) {
                    warn!(%drain_err, "worker pool still busy after failed run");
                }
                return Err(err);
            }
        };

        let mut partitions = PartitionSet::new(cfg.partition_capacity);
        let summary = route(processed, &mut partitions);
        metrics.record_routing(&summary, &partitions);
        metrics.record_end();

        if summary.dropped > 0 {
            warn!(dropped = summary.dropped, "records dropped at partition capacity");
        }
        info!(
            male = partitions.get(PartitionKind::Male).row_count(),
            female = partitions.get(PartitionKind::Female).row_count(),
            invalid = partitions.get(PartitionKind::Invalid).row_count(),
            dropped = summary.dropped,
            "records routed"
        );
        Ok(RunOutput {
            partitions,
            metrics,
        })
    }

    /// Read `input`, run, and hand every partition to `sink`.
    ///
    /// The sink is only touched after the run succeeded.
    ///
    /// # Errors
    /// Input I/O failures, any [`PipelineError`] from [`run`](Self::run), or
    /// sink failures.
    #[cfg(feature = "io-csv")]
    pub fn run_file<S: PartitionSink + ?Sized>(
        &self,
        input: impl AsRef<Path>,
        sink: &mut S,
    ) -> anyhow::Result<RunOutput> {
        let mut metrics = RunMetrics::new();
        metrics.record_start();
        let read = crate::io::csv::read_records(input, &self.config)?;
        metrics.rows_read = read.rows_read;
        metrics.malformed_rows = read.malformed;

        let mut output = self
            .execute(read.records, metrics)
            .context("pipeline run failed")?;

        flush_all(&output.partitions, sink).context("persist partitions")?;
        output.metrics.record_end();
        Ok(output)
    }
}
