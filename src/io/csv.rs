//! Delimited-text input and per-partition CSV output.
//!
//! This module provides:
//! - **Record ingestion**: [`read_records`] / [`read_records_from`] split rows
//!   on the configured delimiter and keep only rows with the expected arity.
//! - **Partition sink**: [`CsvDirSink`] writes each partition to its own file
//!   in an output directory.
//!
//! # Design notes
//! - Rows are split on every delimiter. Quotes are ordinary text, so a quoted
//!   delimiter adds a field and a quoted value keeps its quotes.
//! - Wrong-arity rows are counted and excluded, never repaired.
//! - Rows that are not valid UTF-8 are treated the same way.
//! - The invalid partition's file carries an extra `Errors` column.

use crate::config::PipelineConfig;
use crate::io::compression::{auto_detect_reader, CompressedWriter, Compression};
use crate::partition::{Partition, PartitionKind, PartitionSink};
use crate::record::Record;
use anyhow::{anyhow, Context, Result};
use csv::{ErrorKind, ReaderBuilder, WriterBuilder};
use std::fs::{create_dir_all, File};
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Records parsed from one input, with the rows that were excluded.
#[derive(Debug, Clone, Default)]
pub struct ReadOutcome {
    /// Well-formed records in input order.
    pub records: Vec<Record>,
    /// Data rows seen (header excluded).
    pub rows_read: usize,
    /// Rows excluded for wrong field count or undecodable text.
    pub malformed: usize,
}

/// Read records from a delimited text file.
///
/// **Compression**: gzip and zstd input is detected from the extension or the
/// leading magic bytes.
///
/// # Errors
/// Returns an error if the file can not be opened or read.
pub fn read_records(path: impl AsRef<Path>, config: &PipelineConfig) -> Result<ReadOutcome> {
    let path = path.as_ref();
    let f = File::open(path).with_context(|| format!("open {}", path.display()))?;
    let rdr = auto_detect_reader(f, path)
        .with_context(|| format!("setup decompression for {}", path.display()))?;
    let outcome = read_records_from(rdr, config).with_context(|| format!("read {}", path.display()))?;
    info!(
        path = %path.display(),
        rows = outcome.rows_read,
        malformed = outcome.malformed,
        "input loaded"
    );
    Ok(outcome)
}

/// Read records from any reader.
///
/// A record's `position` is its data-row index, so excluded rows leave gaps.
///
/// # Errors
/// Returns an error on I/O failure. Malformed rows are counted, not raised.
pub fn read_records_from<R: Read>(reader: R, config: &PipelineConfig) -> Result<ReadOutcome> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(config.has_headers)
        .delimiter(config.delimiter_byte())
        .quoting(false)
        .flexible(true)
        .from_reader(reader);

    let mut out = ReadOutcome::default();
    for (i, row) in rdr.records().enumerate() {
        out.rows_read += 1;
        let row = match row {
            Ok(row) => row,
            Err(e) if matches!(e.kind(), ErrorKind::Utf8 { .. }) => {
                debug!(row = i + 1, "skipping row that is not valid UTF-8");
                out.malformed += 1;
                continue;
            }
            Err(e) => return Err(e).with_context(|| format!("parse CSV row #{}", i + 1)),
        };
        let fields: Vec<&str> = row.iter().collect();
        match Record::from_fields(i, &fields) {
            Some(record) => out.records.push(record),
            None => {
                debug!(row = i + 1, fields = fields.len(), "skipping row with wrong field count");
                out.malformed += 1;
            }
        }
    }
    Ok(out)
}

/// Writes each partition as `<dir>/<file_stem>.csv[.gz|.zst]`.
///
/// Every file starts with a header row. Directories are created on demand.
#[derive(Debug, Clone)]
pub struct CsvDirSink {
    dir: PathBuf,
    compression: Compression,
    delimiter: u8,
    written: Vec<(PartitionKind, PathBuf, usize)>,
}

impl CsvDirSink {
    pub fn new(dir: impl Into<PathBuf>, compression: Compression) -> Self {
        Self {
            dir: dir.into(),
            compression,
            delimiter: b',',
            written: Vec::new(),
        }
    }

    #[must_use]
    pub const fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Output path for a partition.
    #[must_use]
    pub fn path_for(&self, kind: PartitionKind) -> PathBuf {
        self.dir
            .join(format!("{}.csv{}", kind.file_stem(), self.compression.extension()))
    }

    /// Files written so far with their row counts (header excluded).
    #[must_use]
    pub fn written(&self) -> &[(PartitionKind, PathBuf, usize)] {
        &self.written
    }
}

impl PartitionSink for CsvDirSink {
    fn write_partition(&mut self, partition: &Partition) -> Result<usize> {
        create_dir_all(&self.dir).with_context(|| format!("mkdir -p {}", self.dir.display()))?;
        let kind = partition.kind();
        let path = self.path_for(kind);
        let f = File::create(&path).with_context(|| format!("create {}", path.display()))?;
        let w = CompressedWriter::new(f, self.compression)
            .with_context(|| format!("setup compression for {}", path.display()))?;
        let mut wtr = WriterBuilder::new()
            .delimiter(self.delimiter)
            .flexible(false)
            .from_writer(w);

        wtr.write_record(kind.header())
            .with_context(|| format!("write header of {}", path.display()))?;
        let mut rows = 0usize;
        for row in partition.rows_for_sink() {
            wtr.write_record(&row)
                .with_context(|| format!("write CSV row #{} of {}", rows + 1, path.display()))?;
            rows += 1;
        }
        wtr.flush()?;
        wtr.into_inner()
            .map_err(|e| anyhow!("flush {}: {}", path.display(), e.error()))?
            .finish()
            .with_context(|| format!("finish {}", path.display()))?;

        debug!(partition = %kind, rows, path = %path.display(), "partition written");
        self.written.push((kind, path, rows));
        Ok(rows)
    }

    fn finalize(&mut self) -> Result<()> {
        let total: usize = self.written.iter().map(|(_, _, rows)| rows).sum();
        info!(
            dir = %self.dir.display(),
            files = self.written.len(),
            rows = total,
            "partitions persisted"
        );
        Ok(())
    }
}
