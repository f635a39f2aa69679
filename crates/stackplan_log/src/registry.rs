//! Registry of known record types.
//!
//! The registry maps each type identifier this build can produce to the
//! function that decodes its payload. It is built once on first use and is
//! read-only afterwards, so concurrent readers share it freely. There is
//! no fallback for unregistered types.

use crate::encoding::{CanonicalDecode, DecodeError};
use crate::envelope::RawRecord;
use crate::records::{
    PlanApplyable, PlanComponentInstance, PlanHeader, PlanResourceInstanceChangePlanned,
    PlanRootInputValue, Record, RecordMessage,
};
use indexmap::IndexMap;
use once_cell::sync::Lazy;
use thiserror::Error;

type DecodeFn = fn(&[u8]) -> Result<Record, DecodeError>;

static REGISTRY: Lazy<RecordRegistry> = Lazy::new(RecordRegistry::builtin);

/// The process-wide registry
#[must_use]
pub fn registry() -> &'static RecordRegistry {
    &REGISTRY
}

/// Errors resolving an envelope
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// Type identifier not registered
    #[error("unknown record type {type_id:?}")]
    UnknownType {
        /// The unresolved identifier
        type_id: String,
    },
    /// Payload does not decode as the registered message
    #[error("malformed {type_id} payload: {source}")]
    Malformed {
        /// Identifier the payload claimed
        type_id: String,
        /// Decoder failure
        #[source]
        source: DecodeError,
    },
}

/// Mapping from type identifier to payload decoder
#[derive(Debug)]
pub struct RecordRegistry {
    decoders: IndexMap<&'static str, DecodeFn>,
}

impl RecordRegistry {
    fn builtin() -> Self {
        let mut registry = Self {
            decoders: IndexMap::new(),
        };
        registry.register::<PlanHeader>();
        registry.register::<PlanApplyable>();
        registry.register::<PlanRootInputValue>();
        registry.register::<PlanComponentInstance>();
        registry.register::<PlanResourceInstanceChangePlanned>();
        tracing::debug!(types = registry.decoders.len(), "record registry initialized");
        registry
    }

    fn register<M: RecordMessage>(&mut self) {
        let decode: DecodeFn = |bytes| M::decode(bytes).map(RecordMessage::into_record);
        self.decoders.insert(M::TYPE_ID, decode);
    }

    /// Decode an envelope's payload as its registered message
    ///
    /// # Errors
    ///
    /// Returns error if the type is unknown or the payload is malformed
    pub fn resolve(&self, raw: &RawRecord) -> Result<Record, RegistryError> {
        let decode = self
            .decoders
            .get(raw.type_id.as_str())
            .ok_or_else(|| RegistryError::UnknownType {
                type_id: raw.type_id.clone(),
            })?;
        decode(&raw.payload).map_err(|source| RegistryError::Malformed {
            type_id: raw.type_id.clone(),
            source,
        })
    }

    /// Whether a type identifier is registered
    #[must_use]
    pub fn is_known(&self, type_id: &str) -> bool {
        self.decoders.contains_key(type_id)
    }

    /// Registered identifiers in registration order
    pub fn type_ids(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.decoders.keys().copied()
    }

    /// Number of registered types
    #[must_use]
    pub fn len(&self) -> usize {
        self.decoders.len()
    }

    /// Whether nothing is registered
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.decoders.is_empty()
    }
}
