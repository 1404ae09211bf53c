//! Assertion functions for checking run outputs.
//!
//! These compare routed partitions with the input they came from and panic
//! with a detailed message on mismatch.

use crate::partition::{PartitionKind, PartitionSet};
use crate::record::Record;
use std::collections::HashMap;

/// Assert that every partition is an in-order subsequence of `input`.
///
/// Each routed record must match the input record at the same `position`
/// field for field, and positions must strictly increase within a partition.
///
/// # Panics
///
/// Panics if a record is unknown, altered, or out of order.
///
/// # Example
///
/// ```
/// use ironsieve::testing::*;
///
/// let input = generate_records(40);
/// let output = TestPipeline::new().run(input.clone()).unwrap();
/// assert_order_preserved(&output.partitions, &input);
/// ```
pub fn assert_order_preserved(partitions: &PartitionSet, input: &[Record]) {
    let by_position: HashMap<usize, &Record> = input.iter().map(|r| (r.position, r)).collect();

    for partition in partitions.iter() {
        let kind = partition.kind();
        let mut last: Option<usize> = None;
        for (i, record) in partition.records().iter().enumerate() {
            let Some(original) = by_position.get(&record.position) else {
                panic!(
                    "{kind} row {i} has position {} which is not in the input",
                    record.position
                );
            };
            assert_eq!(
                record.fields(),
                original.fields(),
                "{kind} row {i} (position {}) differs from its input record",
                record.position
            );
            if let Some(prev) = last {
                assert!(
                    record.position > prev,
                    "{kind} row {i}: position {} follows position {prev}; input order was not preserved",
                    record.position
                );
            }
            last = Some(record.position);
        }
    }
}

/// Assert that no partition holds more rows than its capacity.
///
/// # Panics
///
/// Panics if any partition exceeds its capacity.
pub fn assert_within_capacity(partitions: &PartitionSet) {
    for partition in partitions.iter() {
        assert!(
            partition.row_count() <= partition.capacity(),
            "{} holds {} rows but its capacity is {}",
            partition.kind(),
            partition.row_count(),
            partition.capacity()
        );
    }
}

/// Assert the exact input positions routed to `kind`, in order.
///
/// # Panics
///
/// Panics if the positions differ.
///
/// # Example
///
/// ```
/// use ironsieve::testing::*;
/// use ironsieve::PartitionKind;
///
/// let output = TestPipeline::new().run(sample_records()).unwrap();
/// assert_partition_positions(&output.partitions, PartitionKind::Female, &[2]);
/// ```
pub fn assert_partition_positions(partitions: &PartitionSet, kind: PartitionKind, expected: &[usize]) {
    let actual: Vec<usize> = partitions
        .get(kind)
        .records()
        .iter()
        .map(|r| r.position)
        .collect();
    assert_eq!(
        actual, expected,
        "{kind} positions mismatch:\n  Expected: {expected:?}\n  Actual: {actual:?}"
    );
}

/// Assert that every record in `records` satisfies `predicate`.
///
/// # Panics
///
/// Panics with the first offending record.
pub fn assert_all_records<F>(records: &[Record], predicate: F)
where
    F: Fn(&Record) -> bool,
{
    for (i, record) in records.iter().enumerate() {
        assert!(
            predicate(record),
            "Record at index {i} does not satisfy predicate: {record:?}"
        );
    }
}
