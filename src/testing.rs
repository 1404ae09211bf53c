//! Testing utilities for ironsieve runs.
//!
//! This module gives tests everything they need to exercise the pipeline
//! without real input files or spreadsheets:
//!
//! - **Fixtures**: the canonical sample rows and a deterministic generator
//! - **Builders**: [`RecordBuilder`] for one-off records
//! - **Assertions**: order preservation, capacity bounds, partition contents
//! - **Fault injection**: validators that panic or stall on purpose
//! - **Mock I/O**: an in-memory [`MemorySink`] and temporary input files
//!
//! # Quick Start
//!
//! ```
//! use ironsieve::testing::*;
//! use ironsieve::PartitionKind;
//!
//! # fn main() -> anyhow::Result<()> {
//! let input = generate_records(500);
//! let output = TestPipeline::new().run(input.clone())?;
//!
//! assert_order_preserved(&output.partitions, &input);
//! assert_within_capacity(&output.partitions);
//! assert!(output.partitions.get(PartitionKind::Invalid).row_count() > 0);
//! # Ok(())
//! # }
//! ```

pub mod assertions;
pub mod builders;
pub mod faults;
pub mod fixtures;
pub mod mock_io;

// Re-export commonly used items
pub use assertions::*;
pub use builders::*;
pub use faults::*;
pub use fixtures::*;
pub use mock_io::*;

use crate::{Pipeline, PipelineConfig};
use std::time::Duration;

/// A [`Pipeline`] preconfigured for tests.
///
/// Small batches and several workers force records across batch boundaries
/// and out-of-order completion, which is where ordering bugs show up.
///
/// # Example
///
/// ```
/// use ironsieve::testing::{sample_records, TestPipeline};
///
/// let output = TestPipeline::new().run(sample_records()).unwrap();
/// assert_eq!(output.partitions.total_rows(), 3);
/// ```
#[derive(Clone)]
pub struct TestPipeline {
    pipeline: Pipeline,
}

impl TestPipeline {
    /// Batch size 2, 2 workers, 10 second deadline.
    ///
    /// # Panics
    ///
    /// Never in practice: the built-in test configuration is valid.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(test_config()).expect("test configuration is valid")
    }

    /// Wrap a pipeline built from `config`.
    ///
    /// # Errors
    /// Returns the configuration error if `config` is invalid.
    pub fn with_config(config: PipelineConfig) -> Result<Self, crate::PipelineError> {
        Ok(Self {
            pipeline: Pipeline::new(config)?,
        })
    }
}

/// The configuration used by [`TestPipeline::new`].
#[must_use]
pub fn test_config() -> PipelineConfig {
    PipelineConfig::default()
        .with_batch_size(2)
        .with_worker_count(2)
        .with_shutdown_timeout(Duration::from_secs(10))
}

impl Default for TestPipeline {
    fn default() -> Self {
        Self::new()
    }
}

// Allow TestPipeline to be used wherever Pipeline is expected
impl std::ops::Deref for TestPipeline {
    type Target = Pipeline;

    fn deref(&self) -> &Self::Target {
        &self.pipeline
    }
}

impl AsRef<Pipeline> for TestPipeline {
    fn as_ref(&self) -> &Pipeline {
        &self.pipeline
    }
}
