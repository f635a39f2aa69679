//! Plan load errors.
//!
//! Every error is final. A plan that fails to load cannot be trusted and
//! must not be applied.

use crate::consistency::Inconsistency;
use stackplan_core::{AddrKind, ComponentInstanceAddr};
use stackplan_log::{DecodeError, RegistryError};
use stackplan_plans::{ChangeError, StateError, ValueError};
use thiserror::Error;

/// Why a single record was rejected
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecordError {
    /// Payload does not decode as its declared type
    #[error("malformed {type_id} record: {source}")]
    MalformedEnvelope {
        /// Declared type identifier
        type_id: String,
        /// Payload decode failure
        #[source]
        source: DecodeError,
    },
    /// Type identifier not known to this build
    #[error("unrecognized record type {type_id:?}")]
    UnknownRecordType {
        /// The identifier found
        type_id: String,
    },
    /// Plan was written by a different version
    #[error(
        "plan was created by version {recorded}, but this is version {running}; \
         a plan must be applied by the same version that created it"
    )]
    VersionMismatch {
        /// Version in the header
        recorded: String,
        /// Version of this program
        running: String,
    },
    /// A second header record
    #[error("plan has more than one header")]
    DuplicateHeader,
    /// An address field does not match its grammar
    #[error("invalid {kind} address {addr:?}: {reason}")]
    InvalidAddressSyntax {
        /// Grammar the field is parsed against
        kind: AddrKind,
        /// The field text
        addr: String,
        /// What was wrong with it
        reason: String,
    },
    /// A deposed key is not eight lowercase hex digits
    #[error("invalid deposed key {key:?}")]
    InvalidDeposedKey {
        /// The field text
        key: String,
    },
    /// A component's plan timestamp is not RFC 3339
    #[error("invalid plan timestamp {timestamp:?} for {component}: {reason}")]
    InvalidTimestamp {
        /// The field text
        timestamp: String,
        /// Component the timestamp belongs to
        component: String,
        /// Parser message
        reason: String,
    },
    /// Change recorded for a component no earlier record announced
    #[error("resource instance change for unannounced component instance {component}")]
    UnknownComponent {
        /// The component
        component: ComponentInstanceAddr,
    },
    /// Record and nested change disagree
    #[error("inconsistent change: {0}")]
    InconsistentChangeAddress(#[from] Inconsistency),
    /// Root input value does not decode
    #[error("invalid stored value for var.{name}: {source}")]
    InvalidStoredValue {
        /// Variable name
        name: String,
        /// Value decode failure
        #[source]
        source: ValueError,
    },
    /// Nested change does not decode
    #[error("invalid planned change for {object}: {source}")]
    InvalidChange {
        /// Object the record describes
        object: String,
        /// Change decode failure
        #[source]
        source: ChangeError,
    },
    /// Nested prior state does not decode
    #[error("invalid prior state for {object}: {source}")]
    InvalidPriorState {
        /// Object the record describes
        object: String,
        /// State decode failure
        #[source]
        source: StateError,
    },
}

impl From<RegistryError> for RecordError {
    fn from(err: RegistryError) -> Self {
        match err {
            RegistryError::UnknownType { type_id } => Self::UnknownRecordType { type_id },
            RegistryError::Malformed { type_id, source } => Self::MalformedEnvelope { type_id, source },
        }
    }
}

/// Why a plan could not be loaded
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoadError {
    /// A record was rejected
    #[error("invalid plan record {index}: {source}")]
    Record {
        /// Position of the record in the sequence
        index: usize,
        /// Why it was rejected
        #[source]
        source: RecordError,
    },
    /// No header record in the whole sequence
    #[error("missing plan header")]
    MissingHeader,
    /// Sequence longer than the configured limit
    #[error("plan has {count} records, more than the limit of {limit}")]
    TooManyRecords {
        /// Configured limit
        limit: usize,
        /// Records supplied
        count: usize,
    },
}

impl LoadError {
    /// Index of the rejected record, if a record was at fault
    #[must_use]
    pub fn index(&self) -> Option<usize> {
        match self {
            Self::Record { index, .. } => Some(*index),
            Self::MissingHeader | Self::TooManyRecords { .. } => None,
        }
    }

    /// The record-level cause, if a record was at fault
    #[must_use]
    pub fn record_error(&self) -> Option<&RecordError> {
        match self {
            Self::Record { source, .. } => Some(source),
            Self::MissingHeader | Self::TooManyRecords { .. } => None,
        }
    }
}
