//! Plan file framing.
//!
//! A plan file is the magic `SPLN`, one format-version byte, and then each
//! [`RawRecord`] as a length-prefixed canonical frame.

use crate::encoding::{CanonicalDecoder, CanonicalEncoder, DecodeError, EncodeError};
use crate::envelope::RawRecord;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;
use thiserror::Error;

/// File magic
pub const MAGIC: [u8; 4] = *b"SPLN";

/// Framing version written by this build
pub const FORMAT_VERSION: u8 = 1;

/// Plan file errors
#[derive(Debug, Error)]
pub enum StreamError {
    /// Opening or creating the file failed
    #[error("plan file I/O failed: {0}")]
    Io(#[from] std::io::Error),
    /// File does not start with the magic
    #[error("not a plan file: bad magic {found:?}")]
    InvalidMagic {
        /// Bytes found where the magic should be
        found: Vec<u8>,
    },
    /// Framing version not understood by this build
    #[error("unsupported plan file format version {found}")]
    UnsupportedFormat {
        /// Version byte found
        found: u8,
    },
    /// A record frame could not be read
    #[error("plan file record {index}: {source}")]
    Frame {
        /// Index of the record being read
        index: usize,
        /// Framing failure
        #[source]
        source: DecodeError,
    },
    /// A record could not be written
    #[error("writing plan file record {index}: {source}")]
    Encode {
        /// Index of the record being written
        index: usize,
        /// Encoding failure
        #[source]
        source: EncodeError,
    },
}

/// Writes a plan file record by record
pub struct PlanFileWriter<W: Write> {
    encoder: CanonicalEncoder<W>,
    written: usize,
}

impl<W: Write> PlanFileWriter<W> {
    /// Start a plan file, writing the file header
    ///
    /// # Errors
    ///
    /// Returns error if the header cannot be written
    pub fn new(writer: W) -> Result<Self, StreamError> {
        let mut encoder = CanonicalEncoder::new(writer);
        encoder
            .write_all(&MAGIC)
            .and_then(|()| encoder.write_all(&[FORMAT_VERSION]))
            .map_err(|source| StreamError::Encode { index: 0, source })?;
        Ok(Self {
            encoder,
            written: 0,
        })
    }

    /// Append one record
    ///
    /// # Errors
    ///
    /// Returns error if the record cannot be encoded or written
    pub fn write(&mut self, record: &RawRecord) -> Result<(), StreamError> {
        self.encoder
            .encode(record)
            .map_err(|source| StreamError::Encode {
                index: self.written,
                source,
            })?;
        self.written += 1;
        Ok(())
    }

    /// Append records in order
    ///
    /// # Errors
    ///
    /// Returns error on the first record that cannot be written
    pub fn write_all<'a>(
        &mut self,
        records: impl IntoIterator<Item = &'a RawRecord>,
    ) -> Result<(), StreamError> {
        records.into_iter().try_for_each(|record| self.write(record))
    }

    /// Records written so far
    #[must_use]
    pub fn written(&self) -> usize {
        self.written
    }

    /// Flush and return the inner writer
    ///
    /// # Errors
    ///
    /// Returns error if flushing fails
    pub fn finish(mut self) -> Result<W, StreamError> {
        self.encoder.flush()?;
        Ok(self.encoder.into_inner())
    }
}

impl PlanFileWriter<BufWriter<File>> {
    /// Write a complete plan file at `path`, replacing any existing file
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be created or written
    pub fn write_file(path: impl AsRef<Path>, records: &[RawRecord]) -> Result<(), StreamError> {
        let mut writer = Self::new(BufWriter::new(File::create(path)?))?;
        writer.write_all(records)?;
        writer.finish()?;
        Ok(())
    }
}

/// Reads a plan file record by record
pub struct PlanFileReader<R: Read> {
    decoder: CanonicalDecoder<R>,
    read: usize,
}

impl<R: Read> PlanFileReader<R> {
    /// Open a plan file, checking its header
    ///
    /// # Errors
    ///
    /// Returns error if the magic or format version is wrong
    pub fn new(reader: R) -> Result<Self, StreamError> {
        let mut decoder = CanonicalDecoder::new(reader);
        let mut header = [0u8; 5];
        let filled = decoder
            .fill(&mut header)
            .map_err(|source| StreamError::Frame { index: 0, source })?;
        if filled < MAGIC.len() || header[..4] != MAGIC {
            return Err(StreamError::InvalidMagic {
                found: header[..filled.min(MAGIC.len())].to_vec(),
            });
        }
        if filled < header.len() {
            return Err(StreamError::Frame {
                index: 0,
                source: DecodeError::Truncated,
            });
        }
        if header[4] != FORMAT_VERSION {
            return Err(StreamError::UnsupportedFormat { found: header[4] });
        }
        Ok(Self { decoder, read: 0 })
    }

    /// Read the next record, or `None` at the end of the file
    ///
    /// # Errors
    ///
    /// Returns error if the frame is truncated or malformed
    pub fn next_record(&mut self) -> Result<Option<RawRecord>, StreamError> {
        let record = self
            .decoder
            .decode::<RawRecord>()
            .map_err(|source| StreamError::Frame {
                index: self.read,
                source,
            })?;
        if record.is_some() {
            self.read += 1;
        }
        Ok(record)
    }

    /// Read every remaining record
    ///
    /// # Errors
    ///
    /// Returns error on the first frame that cannot be read
    pub fn read_all(mut self) -> Result<Vec<RawRecord>, StreamError> {
        let mut records = Vec::new();
        while let Some(record) = self.next_record()? {
            records.push(record);
        }
        Ok(records)
    }
}

impl PlanFileReader<BufReader<File>> {
    /// Read a complete plan file from `path`
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be opened or any frame is invalid
    pub fn read_file(path: impl AsRef<Path>) -> Result<Vec<RawRecord>, StreamError> {
        Self::new(BufReader::new(File::open(path)?))?.read_all()
    }
}
