//! Pre-built test datasets and fixtures for common testing scenarios.

use crate::record::{Record, HEADER_COLUMNS};

/// Three rows covering a valid male, an all-invalid, and a valid female
/// record, without the header line.
pub const SAMPLE_ROWS: [&str; 3] = [
    "12345678,Jane,1234567890,jane@x.com,Male",
    "1,John,2,bad,Female",
    "87654321,Amy,9876543210,amy@y.org,Female",
];

/// [`SAMPLE_ROWS`] as records, positions 0..3.
///
/// # Example
///
/// ```
/// use ironsieve::testing::sample_records;
///
/// let records = sample_records();
/// assert_eq!(records.len(), 3);
/// assert_eq!(records[1].name, "John");
/// ```
#[must_use]
pub fn sample_records() -> Vec<Record> {
    SAMPLE_ROWS
        .iter()
        .enumerate()
        .filter_map(|(i, row)| Record::from_fields(i, &row.split(',').collect::<Vec<_>>()))
        .collect()
}

/// [`SAMPLE_ROWS`] as a complete CSV document with header line.
#[must_use]
pub fn sample_csv() -> String {
    csv_document(&SAMPLE_ROWS)
}

/// Prefix `rows` with the standard header line and join with newlines.
#[must_use]
pub fn csv_document(rows: &[&str]) -> String {
    let mut doc = HEADER_COLUMNS.join(",");
    doc.push('\n');
    for row in rows {
        doc.push_str(row);
        doc.push('\n');
    }
    doc
}

/// Deterministically generate `n` records cycling through every routing case.
///
/// The cycle (by `position % 8`) is: valid male, valid female, bad id, bad
/// phone, bad email, unrecognized category, valid upper-case `" FEMALE "`,
/// all three fields bad.
///
/// # Example
///
/// ```
/// use ironsieve::testing::generate_records;
///
/// let records = generate_records(16);
/// assert_eq!(records[0].gender, "Male");
/// assert_eq!(records[5].gender, "Other");
/// ```
#[must_use]
pub fn generate_records(n: usize) -> Vec<Record> {
    (0..n).map(generated_record).collect()
}

fn generated_record(position: usize) -> Record {
    let id = format!("{:08}", position % 100_000_000);
    let phone = format!("{:010}", position);
    let email = format!("member{position}@example.org");
    let name = format!("Member {position}");
    let (id, phone, email, gender) = match position % 8 {
        0 => (id, phone, email, "Male"),
        1 => (id, phone, email, "Female"),
        2 => (format!("{position}x"), phone, email, "Male"),
        3 => (id, "555-0100".to_string(), email, "Female"),
        4 => (id, phone, format!("member{position}.example.org"), "Male"),
        5 => (id, phone, email, "Other"),
        6 => (format!(" {id} "), phone, email, " FEMALE "),
        _ => ("1".to_string(), "2".to_string(), "bad".to_string(), "Male"),
    };
    Record::new(position, id, name, phone, email, gender)
}
