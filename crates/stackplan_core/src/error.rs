//! Core error types for STACKPLAN.

use crate::addr::AddrKind;
use std::fmt;

/// Core result type
pub type CoreResult<T> = Result<T, CoreError>;

/// Core error type
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// An address string does not match its grammar
    InvalidAddress {
        /// Which address grammar was expected
        kind: AddrKind,
        /// The offending input
        input: String,
        /// What was wrong with it
        reason: String,
    },

    /// A deposed object key is not eight lowercase hex digits
    InvalidDeposedKey {
        /// The offending input
        input: String,
    },

    /// A timestamp is not valid RFC 3339 text
    InvalidTimestamp {
        /// The offending input
        input: String,
        /// Parser message
        reason: String,
    },

    /// Invalid version
    InvalidVersion {
        /// Parser message
        reason: String,
    },
}

impl CoreError {
    pub(crate) fn invalid_address(
        kind: AddrKind,
        input: &str,
        reason: impl Into<String>,
    ) -> Self {
        Self::InvalidAddress {
            kind,
            input: input.to_string(),
            reason: reason.into(),
        }
    }
}

impl fmt::Display for CoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidAddress {
                kind,
                input,
                reason,
            } => write!(f, "Invalid {} address {:?}: {}", kind, input, reason),
            Self::InvalidDeposedKey { input } => {
                write!(f, "Invalid deposed key {:?}: must be eight lowercase hex digits", input)
            }
            Self::InvalidTimestamp { input, reason } => {
                write!(f, "Invalid timestamp {:?}: {}", input, reason)
            }
            Self::InvalidVersion { reason } => write!(f, "Invalid version: {}", reason),
        }
    }
}

impl std::error::Error for CoreError {}
