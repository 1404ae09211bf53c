//! Splitting the record stream into fixed-size, order-preserving batches.
//!
//! Each [`Batch`] remembers its submission index and the input offset of its
//! first record, so results can be put back in input order after parallel
//! processing.

use crate::error::PipelineError;
use crate::record::Record;
use crate::validation::Validator;

/// A contiguous run of records processed as a unit by one worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Batch {
    index: usize,
    offset: usize,
    records: Vec<Record>,
}

impl Batch {
    #[must_use]
    pub const fn new(index: usize, offset: usize, records: Vec<Record>) -> Self {
        Self {
            index,
            offset,
            records,
        }
    }

    /// Submission sequence number (0-based).
    #[must_use]
    pub const fn index(&self) -> usize {
        self.index
    }

    /// Input position of the first record.
    #[must_use]
    pub const fn offset(&self) -> usize {
        self.offset
    }

    /// Input position one past the last record.
    #[must_use]
    pub fn end(&self) -> usize {
        self.offset + self.records.len()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    #[must_use]
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    #[must_use]
    pub fn into_records(self) -> Vec<Record> {
        self.records
    }

    /// Validate every record and attach its outcome, keeping record order.
    #[must_use]
    pub fn annotate_with(self, validator: &dyn Validator) -> Self {
        let records = self
            .records
            .into_iter()
            .map(|record| {
                let outcome = validator.validate(&record);
                record.annotate(outcome)
            })
            .collect();
        Self { records, ..self }
    }
}

/// Split `records` into contiguous batches of at most `batch_size`.
///
/// The final batch may be shorter. Empty input gives no batches.
///
/// # Errors
/// Returns [`PipelineError::InvalidConfig`] when `batch_size` is zero.
///
/// # Example
/// ```
/// use ironsieve::{make_batches, Record};
///
/// let records: Vec<Record> = (0..10)
///     .map(|i| Record::new(i, "", "", "", "", ""))
///     .collect();
/// let batches = make_batches(records, 4).unwrap();
/// let sizes: Vec<usize> = batches.iter().map(|b| b.len()).collect();
/// assert_eq!(sizes, vec![4, 4, 2]);
/// ```
pub fn make_batches(records: Vec<Record>, batch_size: usize) -> Result<Vec<Batch>, PipelineError> {
    if batch_size == 0 {
        return Err(PipelineError::invalid_config(
            "batch_size",
            "must be a positive integer",
        ));
    }

    let mut batches = Vec::with_capacity(records.len().div_ceil(batch_size));
    let mut offset = 0usize;
    let mut iter = records.into_iter();
    loop {
        let chunk: Vec<Record> = iter.by_ref().take(batch_size).collect();
        if chunk.is_empty() {
            break;
        }
        let len = chunk.len();
        batches.push(Batch::new(batches.len(), offset, chunk));
        offset += len;
    }
    Ok(batches)
}
