//! Merging processed batches and routing records to partitions.
//!
//! Routing runs on a single thread after the pool has returned every batch,
//! so partitions need no locking.

use crate::batch::Batch;
use crate::partition::{PartitionKind, PartitionSet};
use crate::record::Record;
use serde::Serialize;
use tracing::warn;

/// Pick the partition for an annotated record.
///
/// A record with errors always goes to [`PartitionKind::Invalid`]. Otherwise
/// the category decides, and an unrecognized category also falls back to
/// `Invalid` without adding a reason.
#[must_use]
pub fn target_for(record: &Record) -> PartitionKind {
    if record.has_errors() {
        return PartitionKind::Invalid;
    }
    PartitionKind::from_category(&record.gender).unwrap_or(PartitionKind::Invalid)
}

/// Counts produced by one [`route`] call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RouteSummary {
    /// Records appended to some partition.
    pub routed: usize,
    /// Records refused because their partition was full.
    pub dropped: usize,
    /// Valid records sent to `Invalid` because of their category.
    pub unrecognized_category: usize,
    /// Records that arrived with validation errors.
    pub failed_validation: usize,
}

/// Route every record of `batches` into `partitions`.
///
/// Batches are consumed in the order given, which must be submission order,
/// and records in their within-batch order. Appends beyond a partition's
/// capacity are dropped and counted.
pub fn route(batches: Vec<Batch>, partitions: &mut PartitionSet) -> RouteSummary {
    let mut summary = RouteSummary::default();
    let mut expected_offset = batches.first().map_or(0, Batch::offset);

    for batch in batches {
        debug_assert_eq!(
            batch.offset(),
            expected_offset,
            "batch #{} arrived out of order",
            batch.index()
        );
        expected_offset = batch.end();

        for record in batch.into_records() {
            let kind = target_for(&record);
            if record.has_errors() {
                summary.failed_validation += 1;
            } else if kind == PartitionKind::Invalid {
                summary.unrecognized_category += 1;
            }

            let position = record.position;
            let partition = partitions.get_mut(kind);
            if partition.append(record) {
                summary.routed += 1;
            } else {
                summary.dropped += 1;
                if partition.dropped() == 1 {
                    warn!(
                        partition = %kind,
                        capacity = partition.capacity(),
                        position,
                        "partition is full; further records for it are dropped"
                    );
                }
            }
        }
    }
    summary
}
