//! Run configuration.
//!
//! Values come from defaults, an optional JSON file, and CLI overrides, in
//! that order. [`PipelineConfig::validate`] rejects out-of-range values before
//! any record is touched.
//!
//! ```
//! use ironsieve::PipelineConfig;
//!
//! let cfg = PipelineConfig::from_json_str(r#"{ "batch_size": 250, "worker_count": 8 }"#).unwrap();
//! assert_eq!(cfg.batch_size, 250);
//! assert_eq!(cfg.partition_capacity, 1_048_575);
//! assert!(cfg.validate().is_ok());
//! ```

use crate::error::PipelineError;
use crate::partition::DEFAULT_PARTITION_CAPACITY;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::warn;

pub const DEFAULT_BATCH_SIZE: usize = 1000;
pub const DEFAULT_WORKER_COUNT: usize = 4;
pub const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(60);

/// Options recognized by a pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    /// Records per batch.
    pub batch_size: usize,
    /// Number of worker threads.
    pub worker_count: usize,
    /// Maximum data rows per partition (header excluded).
    pub partition_capacity: usize,
    /// Deadline for all batch results, and for the pool to drain afterwards.
    ///
    /// A successful run may take up to twice this long in total. A run that
    /// misses the deadline fails after at most this plus
    /// [`ABANDONED_DRAIN_GRACE`](crate::pipeline::ABANDONED_DRAIN_GRACE).
    #[serde(rename = "shutdown_timeout_secs", with = "secs")]
    pub shutdown_timeout: Duration,
    /// Field delimiter of the input.
    pub delimiter: char,
    /// Whether the first input line is a header.
    pub has_headers: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            worker_count: DEFAULT_WORKER_COUNT,
            partition_capacity: DEFAULT_PARTITION_CAPACITY,
            shutdown_timeout: DEFAULT_SHUTDOWN_TIMEOUT,
            delimiter: ',',
            has_headers: true,
        }
    }
}

impl PipelineConfig {
    /// Decode a JSON document. Missing keys keep their defaults.
    ///
    /// # Errors
    /// [`PipelineError::ConfigParse`] on malformed JSON, unknown keys, or
    /// negative numbers.
    pub fn from_json_str(json: &str) -> Result<Self, PipelineError> {
        serde_json::from_str(json).map_err(|e| PipelineError::ConfigParse(e.to_string()))
    }

    /// Read and decode a JSON config file.
    ///
    /// # Errors
    /// [`PipelineError::Io`] if the file can not be read, otherwise as
    /// [`from_json_str`](Self::from_json_str).
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, PipelineError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    #[must_use]
    pub const fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    #[must_use]
    pub const fn with_worker_count(mut self, worker_count: usize) -> Self {
        self.worker_count = worker_count;
        self
    }

    #[must_use]
    pub const fn with_partition_capacity(mut self, capacity: usize) -> Self {
        self.partition_capacity = capacity;
        self
    }

    #[must_use]
    pub const fn with_shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.shutdown_timeout = timeout;
        self
    }

    #[must_use]
    pub const fn with_delimiter(mut self, delimiter: char) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Delimiter as the single byte the CSV reader expects.
    ///
    /// Only meaningful after [`validate`](Self::validate) has accepted the
    /// config.
    #[must_use]
    pub fn delimiter_byte(&self) -> u8 {
        u8::try_from(self.delimiter).unwrap_or(b',')
    }

    /// Check every option. Called before any processing starts.
    ///
    /// # Errors
    /// [`PipelineError::InvalidConfig`] naming the first offending option.
    pub fn validate(&self) -> Result<(), PipelineError> {
        if self.batch_size == 0 {
            return Err(PipelineError::invalid_config(
                "batch_size",
                "must be a positive integer",
            ));
        }
        if self.worker_count == 0 {
            return Err(PipelineError::invalid_config(
                "worker_count",
                "must be a positive integer",
            ));
        }
        if self.partition_capacity == 0 {
            return Err(PipelineError::invalid_config(
                "partition_capacity",
                "must be a positive integer",
            ));
        }
        if self.shutdown_timeout.is_zero() {
            return Err(PipelineError::invalid_config(
                "shutdown_timeout",
                "must be longer than zero",
            ));
        }
        if !self.delimiter.is_ascii() || self.delimiter == '"' {
            return Err(PipelineError::invalid_config(
                "delimiter",
                format!("{:?} is not a usable single-byte delimiter", self.delimiter),
            ));
        }

        let cpus = num_cpus::get();
        if self.worker_count > cpus {
            warn!(
                workers = self.worker_count,
                cpus, "more workers than CPUs; batches will time-share cores"
            );
        }
        Ok(())
    }
}

/// Serde adapter: `Duration` as fractional seconds.
mod secs {
    use serde::{de::Error, Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(value.as_secs_f64())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(secs).map_err(D::Error::custom)
    }
}
