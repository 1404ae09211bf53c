//! Mock I/O helpers for testing without real output files.
//!
//! [`MemorySink`] captures what a sink would persist; the temp-file wrappers
//! give tests disposable input files and output directories.

use crate::partition::{Partition, PartitionKind, PartitionSink};
use anyhow::{bail, Result};
use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::{NamedTempFile, TempDir};

/// A [`PartitionSink`] that keeps every written row in memory.
///
/// # Example
///
/// ```
/// use ironsieve::testing::*;
/// use ironsieve::{flush_all, PartitionKind};
///
/// let output = TestPipeline::new().run(sample_records()).unwrap();
/// let mut sink = MemorySink::new();
/// flush_all(&output.partitions, &mut sink).unwrap();
/// assert!(sink.is_finalized());
/// assert_eq!(sink.rows(PartitionKind::Male).len(), 1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    tables: BTreeMap<PartitionKind, (Vec<String>, Vec<Vec<String>>)>,
    finalized: bool,
}

impl MemorySink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Header written for `kind`, empty if it was never written.
    #[must_use]
    pub fn header(&self, kind: PartitionKind) -> &[String] {
        self.tables.get(&kind).map_or(&[], |(header, _)| header)
    }

    /// Data rows written for `kind`.
    #[must_use]
    pub fn rows(&self, kind: PartitionKind) -> &[Vec<String>] {
        self.tables.get(&kind).map_or(&[], |(_, rows)| rows)
    }

    /// Kinds written so far, in `PartitionKind` order.
    #[must_use]
    pub fn written_kinds(&self) -> Vec<PartitionKind> {
        self.tables.keys().copied().collect()
    }

    #[must_use]
    pub const fn is_finalized(&self) -> bool {
        self.finalized
    }
}

impl PartitionSink for MemorySink {
    fn write_partition(&mut self, partition: &Partition) -> Result<usize> {
        if self.finalized {
            bail!("sink already finalized");
        }
        let kind = partition.kind();
        let header = kind.header().into_iter().map(str::to_string).collect();
        let rows: Vec<Vec<String>> = partition.rows_for_sink().collect();
        let written = rows.len();
        self.tables.insert(kind, (header, rows));
        Ok(written)
    }

    fn finalize(&mut self) -> Result<()> {
        self.finalized = true;
        Ok(())
    }
}

/// A sink that refuses every write, for checking error propagation.
#[derive(Debug, Clone, Copy, Default)]
pub struct FailingSink;

impl PartitionSink for FailingSink {
    fn write_partition(&mut self, partition: &Partition) -> Result<usize> {
        bail!("refusing to write {}", partition.kind())
    }
}

/// A temporary file that is automatically deleted when dropped.
pub struct TempFilePath {
    #[allow(dead_code)]
    temp_file: NamedTempFile,
    path: PathBuf,
}

impl TempFilePath {
    /// Create a new temporary file with a specific extension.
    ///
    /// # Errors
    ///
    /// Returns an error if the temporary file cannot be created.
    pub fn with_extension(extension: &str) -> std::io::Result<Self> {
        let temp_file = tempfile::Builder::new()
            .suffix(&format!(".{extension}"))
            .tempfile()?;
        let path = temp_file.path().to_path_buf();
        Ok(Self { temp_file, path })
    }

    /// Get the path to the temporary file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// A temporary directory that is automatically deleted when dropped.
pub struct TempDirPath {
    #[allow(dead_code)]
    temp_dir: TempDir,
    path: PathBuf,
}

impl TempDirPath {
    /// Create a new temporary directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the temporary directory cannot be created.
    pub fn new() -> std::io::Result<Self> {
        let temp_dir = TempDir::new()?;
        let path = temp_dir.path().to_path_buf();
        Ok(Self { temp_dir, path })
    }

    /// Get the path to the temporary directory.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Create a file path within this directory.
    #[must_use]
    pub fn file_path(&self, filename: &str) -> PathBuf {
        self.path.join(filename)
    }
}

/// Write `contents` to a temporary `.csv` file.
///
/// # Errors
///
/// Returns an error if the temporary file cannot be created or written.
///
/// # Example
///
/// ```
/// use ironsieve::testing::{mock_input_file, sample_csv};
///
/// let input = mock_input_file(&sample_csv()).unwrap();
/// assert!(input.path().exists());
/// ```
pub fn mock_input_file(contents: &str) -> std::io::Result<TempFilePath> {
    let temp = TempFilePath::with_extension("csv")?;
    let mut file = std::fs::File::create(temp.path())?;
    file.write_all(contents.as_bytes())?;
    file.flush()?;
    Ok(temp)
}
