//! Transparent compression for partition output and record input.
//!
//! Input is detected by file extension first, then by magic bytes. Output
//! compression is chosen explicitly and finished with
//! [`CompressedWriter::finish`] so encoder trailers are never lost silently.
//!
//! ## Built-in codecs
//! - **Gzip** (`.gz`) via `flate2` (feature: `compression-gzip`)
//! - **Zstd** (`.zst`) via `zstd` (feature: `compression-zstd`)

use anyhow::{bail, Context, Result};
use std::fmt;
use std::io::{self, BufRead, BufReader, Read, Write};
use std::path::Path;
use std::str::FromStr;

const GZIP_MAGIC: &[u8] = &[0x1f, 0x8b];
const ZSTD_MAGIC: &[u8] = &[0x28, 0xb5, 0x2f, 0xfd];

/// Codec applied to a stream.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Compression {
    #[default]
    None,
    Gzip,
    Zstd,
}

impl Compression {
    /// File extension including the leading dot; empty for `None`.
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::None => "",
            Self::Gzip => ".gz",
            Self::Zstd => ".zst",
        }
    }

    /// Whether this build can encode and decode the codec.
    #[must_use]
    pub const fn is_available(self) -> bool {
        match self {
            Self::None => true,
            Self::Gzip => cfg!(feature = "compression-gzip"),
            Self::Zstd => cfg!(feature = "compression-zstd"),
        }
    }

    /// Detect the codec from a path's extension (case-insensitive).
    #[must_use]
    pub fn from_path(path: impl AsRef<Path>) -> Self {
        let name = path.as_ref().to_string_lossy().to_lowercase();
        if name.ends_with(".gz") || name.ends_with(".gzip") {
            Self::Gzip
        } else if name.ends_with(".zst") || name.ends_with(".zstd") {
            Self::Zstd
        } else {
            Self::None
        }
    }

    fn from_magic(buf: &[u8]) -> Self {
        if buf.starts_with(GZIP_MAGIC) {
            Self::Gzip
        } else if buf.starts_with(ZSTD_MAGIC) {
            Self::Zstd
        } else {
            Self::None
        }
    }

    fn wrap_reader(self, reader: Box<dyn Read>) -> Result<Box<dyn Read>> {
        if !self.is_available() {
            bail!("{self} input is not supported by this build");
        }
        Ok(match self {
            #[cfg(feature = "compression-gzip")]
            Self::Gzip => Box::new(flate2::read::MultiGzDecoder::new(reader)),
            #[cfg(feature = "compression-zstd")]
            Self::Zstd => Box::new(zstd::stream::read::Decoder::new(reader)?),
            _ => reader,
        })
    }
}

impl fmt::Display for Compression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::None => "none",
            Self::Gzip => "gzip",
            Self::Zstd => "zstd",
        })
    }
}

impl FromStr for Compression {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let codec = match s.to_ascii_lowercase().as_str() {
            "none" | "" => Self::None,
            "gzip" | "gz" => Self::Gzip,
            "zstd" | "zst" => Self::Zstd,
            other => bail!("unknown compression `{other}` (expected none, gzip or zstd)"),
        };
        if !codec.is_available() {
            bail!("{codec} compression is not enabled in this build");
        }
        Ok(codec)
    }
}

/// Wrap `reader` with a decompressor when the input looks compressed.
///
/// 1. The extension of `path_hint` decides if it names a codec.
/// 2. Otherwise the first bytes are matched against known signatures.
/// 3. Otherwise the stream is returned as-is (buffered).
///
/// # Errors
/// Returns an error when the detected codec is not enabled in this build or
/// the decoder can not be set up.
pub fn auto_detect_reader<R: Read + 'static>(
    reader: R,
    path_hint: impl AsRef<Path>,
) -> Result<Box<dyn Read>> {
    let by_extension = Compression::from_path(&path_hint);
    if by_extension != Compression::None {
        return by_extension
            .wrap_reader(Box::new(reader))
            .with_context(|| format!("wrap reader with {by_extension} codec"));
    }

    let mut buf_reader = BufReader::new(reader);
    let by_magic = Compression::from_magic(buf_reader.fill_buf()?);
    by_magic
        .wrap_reader(Box::new(buf_reader))
        .with_context(|| format!("wrap reader with {by_magic} codec"))
}

/// A writer that optionally compresses and must be explicitly finished.
pub enum CompressedWriter<W: Write> {
    Plain(io::BufWriter<W>),
    #[cfg(feature = "compression-gzip")]
    Gzip(flate2::write::GzEncoder<W>),
    #[cfg(feature = "compression-zstd")]
    Zstd(zstd::stream::write::Encoder<'static, W>),
}

impl<W: Write> CompressedWriter<W> {
    /// Wrap `inner` with the given codec.
    ///
    /// # Errors
    /// Returns an error if the codec is not enabled or the encoder fails to
    /// initialize.
    pub fn new(inner: W, compression: Compression) -> Result<Self> {
        Ok(match compression {
            Compression::None => Self::Plain(io::BufWriter::new(inner)),
            #[cfg(feature = "compression-gzip")]
            Compression::Gzip => Self::Gzip(flate2::write::GzEncoder::new(
                inner,
                flate2::Compression::default(),
            )),
            #[cfg(feature = "compression-zstd")]
            Compression::Zstd => Self::Zstd(zstd::stream::write::Encoder::new(inner, 0)?),
            #[allow(unreachable_patterns)]
            other => bail!("{other} output is not supported by this build"),
        })
    }

    /// Flush buffered data, write any codec trailer, and return the inner writer.
    ///
    /// # Errors
    /// Returns the underlying I/O error.
    pub fn finish(self) -> io::Result<W> {
        match self {
            Self::Plain(w) => w.into_inner().map_err(io::IntoInnerError::into_error),
            #[cfg(feature = "compression-gzip")]
            Self::Gzip(w) => w.finish(),
            #[cfg(feature = "compression-zstd")]
            Self::Zstd(w) => w.finish(),
        }
    }
}

impl<W: Write> Write for CompressedWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Self::Plain(w) => w.write(buf),
            #[cfg(feature = "compression-gzip")]
            Self::Gzip(w) => w.write(buf),
            #[cfg(feature = "compression-zstd")]
            Self::Zstd(w) => w.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Self::Plain(w) => w.flush(),
            #[cfg(feature = "compression-gzip")]
            Self::Gzip(w) => w.flush(),
            #[cfg(feature = "compression-zstd")]
            Self::Zstd(w) => w.flush(),
        }
    }
}
