//! Self-describing record envelope.

use crate::encoding::{CanonicalEncode, EncodeError};
use crate::records::{Record, RecordMessage};
use crate::registry::{registry, RegistryError};
use serde::{Deserialize, Serialize};

/// One persisted record: a type identifier plus the canonical encoding of
/// the message it names
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RawRecord {
    /// Registered type identifier
    pub type_id: String,
    /// Canonically encoded message
    pub payload: Vec<u8>,
}

impl CanonicalEncode for RawRecord {}

impl RawRecord {
    /// Create an envelope from parts
    #[must_use]
    pub fn new(type_id: impl Into<String>, payload: Vec<u8>) -> Self {
        Self {
            type_id: type_id.into(),
            payload,
        }
    }

    /// Wrap a message
    ///
    /// # Errors
    ///
    /// Returns error if the message cannot be encoded
    pub fn pack<M: RecordMessage>(message: &M) -> Result<Self, EncodeError> {
        Ok(Self::new(M::TYPE_ID, message.encode()?))
    }

    /// Resolve against the process-wide registry
    ///
    /// # Errors
    ///
    /// Returns error if the type is unknown or the payload does not decode
    /// as the registered message
    pub fn unpack(&self) -> Result<Record, RegistryError> {
        registry().resolve(self)
    }

    /// Payload size in bytes
    #[must_use]
    pub fn len(&self) -> usize {
        self.payload.len()
    }

    /// Whether the payload is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }
}
