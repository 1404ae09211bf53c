//! Counters and timings for one pipeline run.
//!
//! [`RunMetrics`] makes the lossy parts of a run observable: malformed rows
//! excluded at read time and records dropped at full partitions are counted
//! here instead of vanishing silently.
//!
//! ```no_run
//! use ironsieve::{testing::sample_records, Pipeline, PipelineConfig};
//!
//! # fn main() -> anyhow::Result<()> {
//! let output = Pipeline::new(PipelineConfig::default())?.run(sample_records())?;
//! output.metrics.print();
//! output.metrics.save_to_file("metrics.json")?;
//! # Ok(())
//! # }
//! ```

use crate::partition::{PartitionKind, PartitionSet};
use crate::router::RouteSummary;
use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use std::time::{Duration, Instant};

/// Per-partition totals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PartitionMetrics {
    pub rows: usize,
    pub dropped: usize,
    pub capacity: usize,
}

/// Everything counted during one run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunMetrics {
    /// Data rows seen by the reader (header excluded).
    pub rows_read: usize,
    /// Rows excluded for having the wrong field count.
    pub malformed_rows: usize,
    /// Records handed to the pool.
    pub records: usize,
    pub batches: usize,
    pub workers: usize,
    pub failed_validation: usize,
    pub unrecognized_category: usize,
    pub partitions: BTreeMap<PartitionKind, PartitionMetrics>,
    #[serde(skip)]
    start_time: Option<Instant>,
    #[serde(skip)]
    end_time: Option<Instant>,
}

impl RunMetrics {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark the start of the run.
    pub fn record_start(&mut self) {
        self.start_time = Some(Instant::now());
    }

    /// Mark the end of the run.
    pub fn record_end(&mut self) {
        self.end_time = Some(Instant::now());
    }

    /// Wall-clock time between start and end, once both are recorded.
    #[must_use]
    pub fn elapsed(&self) -> Option<Duration> {
        match (self.start_time, self.end_time) {
            (Some(start), Some(end)) => Some(end.duration_since(start)),
            _ => None,
        }
    }

    /// Fold in the router's counts and the final partition sizes.
    pub fn record_routing(&mut self, summary: &RouteSummary, partitions: &PartitionSet) {
        self.failed_validation = summary.failed_validation;
        self.unrecognized_category = summary.unrecognized_category;
        self.partitions = partitions
            .iter()
            .map(|p| {
                (
                    p.kind(),
                    PartitionMetrics {
                        rows: p.row_count(),
                        dropped: p.dropped(),
                        capacity: p.capacity(),
                    },
                )
            })
            .collect();
    }

    /// Rows stored in `kind`.
    #[must_use]
    pub fn rows_in(&self, kind: PartitionKind) -> usize {
        self.partitions.get(&kind).map_or(0, |p| p.rows)
    }

    /// Records dropped across all partitions.
    #[must_use]
    pub fn total_dropped(&self) -> usize {
        self.partitions.values().map(|p| p.dropped).sum()
    }

    /// All counters as a JSON object, with `execution_time_ms` when known.
    #[must_use]
    pub fn to_json(&self) -> Value {
        let mut value = serde_json::to_value(self).unwrap_or_else(|_| json!({}));
        if let (Some(elapsed), Value::Object(map)) = (self.elapsed(), &mut value) {
            map.insert("execution_time_ms".to_string(), json!(elapsed.as_millis()));
        }
        value
    }

    /// Print a human-readable summary to stdout.
    pub fn print(&self) {
        println!("\n========== Run Metrics ==========");
        if let Some(elapsed) = self.elapsed() {
            println!(
                "Execution Time: {:.3}s ({:.4} minutes)",
                elapsed.as_secs_f64(),
                elapsed.as_secs_f64() / 60.0
            );
            println!("---------------------------------");
        }
        println!("rows_read: {}", self.rows_read);
        println!("malformed_rows: {}", self.malformed_rows);
        println!("records: {}", self.records);
        println!("batches: {} ({} workers)", self.batches, self.workers);
        println!("failed_validation: {}", self.failed_validation);
        println!("unrecognized_category: {}", self.unrecognized_category);
        for (kind, p) in &self.partitions {
            if p.dropped > 0 {
                println!("{kind}: {} rows ({} dropped at capacity {})", p.rows, p.dropped, p.capacity);
            } else {
                println!("{kind}: {} rows", p.rows);
            }
        }
        println!("=================================\n");
    }

    /// Save [`to_json`](Self::to_json) to a file, pretty-printed.
    ///
    /// # Errors
    /// Returns an error if the file can not be created or written.
    pub fn save_to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let formatted = serde_json::to_string_pretty(&self.to_json())?;
        let mut file = File::create(path).with_context(|| format!("create {}", path.display()))?;
        file.write_all(formatted.as_bytes())?;
        Ok(())
    }
}
