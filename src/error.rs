//! Run-level failures.
//!
//! Only configuration problems and pool faults surface here. Per-record
//! validation failures are data (see [`ValidationOutcome`](crate::ValidationOutcome)),
//! and malformed rows or capacity drops are counted in [`RunMetrics`](crate::RunMetrics).

use std::time::Duration;
use thiserror::Error;

/// Errors that abort a pipeline run.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// A configuration value is out of range. Raised before any processing.
    #[error("invalid configuration for `{option}`: {reason}")]
    InvalidConfig {
        option: &'static str,
        reason: String,
    },
    /// A configuration file could not be decoded.
    #[error("could not parse configuration: {0}")]
    ConfigParse(String),
    /// The worker pool could not be created.
    #[error("failed to build worker pool: {0}")]
    PoolBuild(String),
    /// A worker panicked while processing a batch.
    #[error("worker fault while processing batch #{batch}: {message}")]
    WorkerFault { batch: usize, message: String },
    /// Batch results were not all available before the deadline.
    #[error("timed out after {waited:?} waiting for batch results ({completed}/{total} completed)")]
    Timeout {
        waited: Duration,
        completed: usize,
        total: usize,
    },
    /// Worker threads did not exit in time during shutdown.
    #[error("worker pool did not drain within {waited:?}")]
    ShutdownTimeout { waited: Duration },
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl PipelineError {
    pub(crate) fn invalid_config(option: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            option,
            reason: reason.into(),
        }
    }

    /// `true` for errors raised before any record was processed.
    #[must_use]
    pub const fn is_config_error(&self) -> bool {
        matches!(self, Self::InvalidConfig { .. } | Self::ConfigParse(_))
    }
}
