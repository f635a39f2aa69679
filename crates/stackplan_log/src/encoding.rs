//! Canonical encoding for cross-platform reproducibility.
//!
//! Uses postcard for byte-stable encoding. Decoding is strict: a payload
//! must be consumed exactly, trailing bytes are an error.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::io::{self, Read, Write};

/// Upper bound on a single framed value. Anything larger is treated as a
/// corrupt length prefix rather than allocated.
pub const MAX_FRAME_LEN: usize = 64 * 1024 * 1024;

/// Trait for canonical serialization
pub trait CanonicalEncode: Serialize {
    /// Encode to canonical bytes
    ///
    /// # Errors
    ///
    /// Returns error if the value cannot be serialized
    fn encode(&self) -> Result<Vec<u8>, EncodeError> {
        postcard::to_allocvec(self).map_err(|e| EncodeError::Serialize {
            reason: e.to_string(),
        })
    }
}

/// Trait for canonical deserialization
pub trait CanonicalDecode: DeserializeOwned {
    /// Decode from canonical bytes
    ///
    /// # Errors
    ///
    /// Returns error if the bytes are not a complete canonical encoding
    fn decode(data: &[u8]) -> Result<Self, DecodeError> {
        let (value, rest) = postcard::take_from_bytes(data).map_err(|e| {
            DecodeError::InvalidEncoding {
                reason: e.to_string(),
            }
        })?;
        if !rest.is_empty() {
            return Err(DecodeError::TrailingBytes { count: rest.len() });
        }
        Ok(value)
    }
}

impl<T: DeserializeOwned> CanonicalDecode for T {}

/// Encoding errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EncodeError {
    /// Value could not be serialized
    Serialize {
        /// Serializer message
        reason: String,
    },
    /// Frame larger than [`MAX_FRAME_LEN`]
    FrameTooLarge {
        /// Encoded length
        len: usize,
    },
    /// Underlying writer failed
    Io {
        /// I/O error message
        reason: String,
    },
}

impl std::fmt::Display for EncodeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Serialize { reason } => write!(f, "Canonical encoding failed: {}", reason),
            Self::FrameTooLarge { len } => {
                write!(f, "Frame of {} bytes exceeds limit of {}", len, MAX_FRAME_LEN)
            }
            Self::Io { reason } => write!(f, "Write failed: {}", reason),
        }
    }
}

impl std::error::Error for EncodeError {}

/// Decoding errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// Invalid encoding
    InvalidEncoding {
        /// Deserializer message
        reason: String,
    },
    /// Value decoded but bytes were left over
    TrailingBytes {
        /// Number of unconsumed bytes
        count: usize,
    },
    /// Stream ended in the middle of a frame
    Truncated,
    /// Length prefix larger than [`MAX_FRAME_LEN`]
    FrameTooLarge {
        /// Declared length
        len: usize,
    },
    /// Underlying reader failed
    Io {
        /// I/O error message
        reason: String,
    },
}

impl std::fmt::Display for DecodeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidEncoding { reason } => write!(f, "Invalid canonical encoding: {}", reason),
            Self::TrailingBytes { count } => {
                write!(f, "Invalid canonical encoding: {} trailing bytes", count)
            }
            Self::Truncated => write!(f, "Stream truncated mid-frame"),
            Self::FrameTooLarge { len } => {
                write!(f, "Frame of {} bytes exceeds limit of {}", len, MAX_FRAME_LEN)
            }
            Self::Io { reason } => write!(f, "Read failed: {}", reason),
        }
    }
}

impl std::error::Error for DecodeError {}

/// Canonical encoder for streaming
///
/// Each value is written as a big-endian `u32` length followed by its
/// canonical bytes.
pub struct CanonicalEncoder<W> {
    writer: W,
}

impl<W: Write> CanonicalEncoder<W> {
    /// Create a new encoder
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Encode a value
    ///
    /// # Errors
    ///
    /// Returns error if encoding or writing fails
    pub fn encode<T: CanonicalEncode>(&mut self, value: &T) -> Result<(), EncodeError> {
        let bytes = value.encode()?;
        let len = u32::try_from(bytes.len())
            .ok()
            .filter(|&len| len as usize <= MAX_FRAME_LEN)
            .ok_or(EncodeError::FrameTooLarge { len: bytes.len() })?;
        self.write_all(&len.to_be_bytes())?;
        self.write_all(&bytes)
    }

    /// Write raw bytes without framing
    ///
    /// # Errors
    ///
    /// Returns error if writing fails
    pub fn write_all(&mut self, bytes: &[u8]) -> Result<(), EncodeError> {
        self.writer.write_all(bytes).map_err(|e| EncodeError::Io {
            reason: e.to_string(),
        })
    }

    /// Flush the writer
    pub fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }

    /// Consume and return the inner writer
    pub fn into_inner(self) -> W {
        self.writer
    }
}

/// Canonical decoder for streaming
pub struct CanonicalDecoder<R> {
    reader: R,
}

impl<R: Read> CanonicalDecoder<R> {
    /// Create a new decoder
    pub fn new(reader: R) -> Self {
        Self { reader }
    }

    /// Decode the next value, or `None` at a clean end of stream
    ///
    /// # Errors
    ///
    /// Returns error if the stream ends mid-frame or the frame is invalid
    pub fn decode<T: CanonicalDecode>(&mut self) -> Result<Option<T>, DecodeError> {
        let mut len_bytes = [0u8; 4];
        let filled = self.fill(&mut len_bytes)?;
        if filled == 0 {
            return Ok(None);
        }
        if filled < len_bytes.len() {
            return Err(DecodeError::Truncated);
        }

        let len = u32::from_be_bytes(len_bytes) as usize;
        if len > MAX_FRAME_LEN {
            return Err(DecodeError::FrameTooLarge { len });
        }
        let mut buffer = vec![0u8; len];
        if self.fill(&mut buffer)? < len {
            return Err(DecodeError::Truncated);
        }

        T::decode(&buffer).map(Some)
    }

    /// Read exactly `buf.len()` bytes unless the stream ends first.
    /// Returns the number of bytes read.
    pub fn fill(&mut self, buf: &mut [u8]) -> Result<usize, DecodeError> {
        let mut filled = 0;
        while filled < buf.len() {
            match self.reader.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    return Err(DecodeError::Io {
                        reason: e.to_string(),
                    });
                }
            }
        }
        Ok(filled)
    }

    /// Consume and return the inner reader
    pub fn into_inner(self) -> R {
        self.reader
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
    struct Sample {
        a: u64,
        b: String,
        c: Vec<u8>,
    }

    impl CanonicalEncode for Sample {}

    fn sample(a: u64) -> Sample {
        Sample {
            a,
            b: format!("sample_{}", a),
            c: vec![a as u8; 3],
        }
    }

    #[test]
    fn test_encode_deterministic() {
        let value = sample(42);
        assert_eq!(value.encode().unwrap(), value.encode().unwrap());
    }

    #[test]
    fn test_decode_rejects_trailing_bytes() {
        let mut bytes = sample(1).encode().unwrap();
        bytes.push(0);
        assert_eq!(
            Sample::decode(&bytes),
            Err(DecodeError::TrailingBytes { count: 1 })
        );
    }

    #[test]
    fn test_invalid_decode() {
        let invalid = &[0xFF, 0xFF, 0xFF];
        let result = Sample::decode(invalid);
        assert!(matches!(result, Err(DecodeError::InvalidEncoding { .. })));
    }

    #[test]
    fn test_streaming_encode_decode() {
        let values = vec![sample(1), sample(2)];

        let mut buffer = Vec::new();
        {
            let mut encoder = CanonicalEncoder::new(&mut buffer);
            for v in &values {
                encoder.encode(v).unwrap();
            }
        }

        let mut decoder = CanonicalDecoder::new(buffer.as_slice());
        let mut decoded = Vec::new();
        while let Some(v) = decoder.decode::<Sample>().unwrap() {
            decoded.push(v);
        }

        assert_eq!(values, decoded);
    }

    #[test]
    fn test_streaming_truncated() {
        let mut buffer = Vec::new();
        CanonicalEncoder::new(&mut buffer).encode(&sample(7)).unwrap();

        for cut in [2, buffer.len() - 1] {
            let mut decoder = CanonicalDecoder::new(&buffer[..cut]);
            assert_eq!(decoder.decode::<Sample>(), Err(DecodeError::Truncated));
        }
    }

    #[test]
    fn test_streaming_rejects_huge_length() {
        let bytes = u32::MAX.to_be_bytes();
        let mut decoder = CanonicalDecoder::new(&bytes[..]);
        assert!(matches!(
            decoder.decode::<Sample>(),
            Err(DecodeError::FrameTooLarge { .. })
        ));
    }

    proptest::proptest! {
        #[test]
        fn prop_streaming_roundtrip(values: Vec<u64>) {
            let samples: Vec<Sample> = values.into_iter().map(sample).collect();

            let mut buffer = Vec::new();
            {
                let mut encoder = CanonicalEncoder::new(&mut buffer);
                for v in &samples {
                    encoder.encode(v).unwrap();
                }
            }

            let mut decoder = CanonicalDecoder::new(buffer.as_slice());
            let mut decoded = Vec::new();
            while let Some(v) = decoder.decode::<Sample>().unwrap() {
                decoded.push(v);
            }

            proptest::prop_assert_eq!(samples, decoded);
        }
    }
}
