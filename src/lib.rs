//! # ironsieve
//!
//! **Concurrent batch validation and partition routing** for tabular member
//! records. Rows are validated against field-shape rules on a bounded worker
//! pool, merged back in input order, and routed into three fixed partitions:
//! `Male`, `Female`, and `Invalid Records`.
//!
//! ## Key Features
//!
//! - **Order-preserving parallelism** - batches are awaited in submission order,
//!   never completion order
//! - **Accumulating validation** - every rule runs; all failure reasons are kept
//! - **Bounded partitions** - capacity limits with counted, observable drops
//! - **All-or-nothing runs** - a worker fault or timeout fails the whole run
//! - **CSV I/O** - delimited input and one output file per partition (feature
//!   `io-csv`), optionally gzip/zstd compressed
//!
//! ## Quick Start
//!
//! ```
//! use ironsieve::*;
//! # use anyhow::Result;
//!
//! # fn main() -> Result<()> {
//! let records = vec![
//!     Record::new(0, "12345678", "Jane", "1234567890", "jane@x.com", "Male"),
//!     Record::new(1, "1", "John", "2", "bad", "Female"),
//!     Record::new(2, "87654321", "Amy", "9876543210", "amy@y.org", "Female"),
//! ];
//!
//! let config = PipelineConfig::default().with_batch_size(2).with_worker_count(2);
//! let output = Pipeline::new(config)?.run(records)?;
//!
//! let invalid = output.partitions.get(PartitionKind::Invalid);
//! assert_eq!(
//!     invalid.records()[0].joined_errors(),
//!     "Invalid ID Number, Invalid Phone Number, Invalid Email"
//! );
//! # Ok(())
//! # }
//! ```
//!
//! ## Core Concepts
//!
//! ### Data flow
//!
//! input → [`make_batches`] → [`WorkerPool`] (parallel [`Validator`]) →
//! ordered merge → [`route`] → [`PartitionSet`] → [`PartitionSink`]
//!
//! ### Routing
//!
//! A record with any validation error goes to [`PartitionKind::Invalid`]. A
//! valid record goes to the partition named by its gender field, matched
//! case-insensitively; anything else also falls back to `Invalid`, with no
//! reason attached.
//!
//! ### Failures
//!
//! Validation failures are data, never errors. Only configuration errors and
//! pool faults surface as [`PipelineError`].

pub mod batch;
pub mod config;
pub mod error;
pub mod io;
pub mod metrics;
pub mod partition;
pub mod pipeline;
pub mod pool;
pub mod record;
pub mod router;
pub mod testing;
pub mod validation;

// General re-exports
pub use batch::{make_batches, Batch};
pub use config::PipelineConfig;
pub use error::PipelineError;
pub use io::compression::Compression;
pub use metrics::{PartitionMetrics, RunMetrics};
pub use partition::{flush_all, Partition, PartitionKind, PartitionSet, PartitionSink};
pub use pipeline::{Pipeline, RunOutput};
pub use pool::{BatchTicket, WorkerPool};
pub use record::{Record, ValidationOutcome, FIELD_COUNT, HEADER_COLUMNS};
pub use router::{route, target_for, RouteSummary};
pub use validation::{FieldRules, Validator};

// Gated re-exports
#[cfg(feature = "io-csv")]
pub use io::csv::{read_records, read_records_from, CsvDirSink, ReadOutcome};
