//! Output partitions and the sink contract.
//!
//! The set of partitions is closed: two category partitions and one for
//! invalid records. Each [`Partition`] owns its rows and its row count, and is
//! mutated only by the router after all parallel work has finished.

use crate::record::{Record, ERRORS_COLUMN, HEADER_COLUMNS};
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Row ceiling of the spreadsheet format the partitions were modelled on.
pub const DEFAULT_PARTITION_CAPACITY: usize = 1_048_575;

/// One of the fixed output buckets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PartitionKind {
    Male,
    Female,
    Invalid,
}

impl PartitionKind {
    /// All kinds, in output order.
    pub const ALL: [Self; 3] = [Self::Male, Self::Female, Self::Invalid];

    /// Display name of the sheet/table.
    #[must_use]
    pub const fn sheet_name(self) -> &'static str {
        match self {
            Self::Male => "Male",
            Self::Female => "Female",
            Self::Invalid => "Invalid Records",
        }
    }

    /// File-name friendly name.
    #[must_use]
    pub const fn file_stem(self) -> &'static str {
        match self {
            Self::Male => "male",
            Self::Female => "female",
            Self::Invalid => "invalid_records",
        }
    }

    /// Map a category field to its partition, case-insensitively.
    ///
    /// Only the two category kinds are ever returned; `Invalid` is not a
    /// category.
    #[must_use]
    pub fn from_category(value: &str) -> Option<Self> {
        let value = value.trim();
        [Self::Male, Self::Female]
            .into_iter()
            .find(|kind| kind.sheet_name().eq_ignore_ascii_case(value))
    }

    /// Column names for this partition's table.
    #[must_use]
    pub fn header(self) -> Vec<&'static str> {
        let mut header = HEADER_COLUMNS.to_vec();
        if self == Self::Invalid {
            header.push(ERRORS_COLUMN);
        }
        header
    }

    const fn slot(self) -> usize {
        match self {
            Self::Male => 0,
            Self::Female => 1,
            Self::Invalid => 2,
        }
    }
}

impl fmt::Display for PartitionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.sheet_name())
    }
}

/// Append-only, capacity-bounded rows for one partition.
#[derive(Debug, Clone)]
pub struct Partition {
    kind: PartitionKind,
    capacity: usize,
    rows: Vec<Record>,
    dropped: usize,
}

impl Partition {
    #[must_use]
    pub const fn new(kind: PartitionKind, capacity: usize) -> Self {
        Self {
            kind,
            capacity,
            rows: Vec::new(),
            dropped: 0,
        }
    }

    /// Append a record, or drop it when the partition is full.
    ///
    /// Returns `false` for a dropped record. Dropping is counted, not raised.
    pub fn append(&mut self, record: Record) -> bool {
        if self.is_full() {
            self.dropped += 1;
            return false;
        }
        self.rows.push(record);
        true
    }

    #[must_use]
    pub const fn kind(&self) -> PartitionKind {
        self.kind
    }

    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    #[must_use]
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Records refused because the partition was full.
    #[must_use]
    pub const fn dropped(&self) -> usize {
        self.dropped
    }

    #[must_use]
    pub fn is_full(&self) -> bool {
        self.rows.len() >= self.capacity
    }

    #[must_use]
    pub fn records(&self) -> &[Record] {
        &self.rows
    }

    #[must_use]
    pub fn into_records(self) -> Vec<Record> {
        self.rows
    }

    /// Fixed-width rows as handed to a sink.
    ///
    /// The invalid partition adds a trailing column with the joined reasons,
    /// empty when the record was sent here for an unrecognized category.
    pub fn rows_for_sink(&self) -> impl Iterator<Item = Vec<String>> + '_ {
        let with_errors = self.kind == PartitionKind::Invalid;
        self.rows.iter().map(move |record| {
            let mut row: Vec<String> = record.fields().iter().map(|f| (*f).to_string()).collect();
            if with_errors {
                row.push(record.joined_errors());
            }
            row
        })
    }
}

/// Exactly one [`Partition`] per [`PartitionKind`].
#[derive(Debug, Clone)]
pub struct PartitionSet {
    partitions: [Partition; 3],
}

impl PartitionSet {
    /// Create empty partitions sharing the same capacity.
    #[must_use]
    pub const fn new(capacity: usize) -> Self {
        Self {
            partitions: [
                Partition::new(PartitionKind::Male, capacity),
                Partition::new(PartitionKind::Female, capacity),
                Partition::new(PartitionKind::Invalid, capacity),
            ],
        }
    }

    #[must_use]
    pub fn get(&self, kind: PartitionKind) -> &Partition {
        &self.partitions[kind.slot()]
    }

    pub fn get_mut(&mut self, kind: PartitionKind) -> &mut Partition {
        &mut self.partitions[kind.slot()]
    }

    /// Partitions in [`PartitionKind::ALL`] order.
    pub fn iter(&self) -> impl Iterator<Item = &Partition> {
        self.partitions.iter()
    }

    #[must_use]
    pub fn total_rows(&self) -> usize {
        self.iter().map(Partition::row_count).sum()
    }

    #[must_use]
    pub fn total_dropped(&self) -> usize {
        self.iter().map(Partition::dropped).sum()
    }
}

impl Default for PartitionSet {
    fn default() -> Self {
        Self::new(DEFAULT_PARTITION_CAPACITY)
    }
}

/// Persistence target for finished partitions.
///
/// The pipeline never looks at the persisted format. A sink receives each
/// partition once and is finalized after the last one.
pub trait PartitionSink {
    /// Persist one partition's rows, returning the number written.
    ///
    /// # Errors
    /// Returns an error if the rows can not be persisted.
    fn write_partition(&mut self, partition: &Partition) -> Result<usize>;

    /// Complete the output after every partition was written.
    ///
    /// # Errors
    /// Returns an error if buffered output can not be flushed.
    fn finalize(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Write every partition in [`PartitionKind::ALL`] order, then finalize.
///
/// # Errors
/// Propagates the first sink failure.
pub fn flush_all<S: PartitionSink + ?Sized>(partitions: &PartitionSet, sink: &mut S) -> Result<usize> {
    let mut written = 0;
    for partition in partitions.iter() {
        written += sink.write_partition(partition)?;
    }
    sink.finalize()?;
    Ok(written)
}
