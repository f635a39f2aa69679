//! Deposed object keys.

use crate::error::{CoreError, CoreResult};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

static DEPOSED_KEY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9a-f]{8}$").expect("static pattern"));

/// Identifies a superseded object of a resource instance that is kept
/// around while its replacement is created
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DeposedKey(String);

impl DeposedKey {
    /// Parse from string
    ///
    /// # Errors
    ///
    /// Returns error unless the string is exactly eight lowercase hex digits
    pub fn parse(s: &str) -> CoreResult<Self> {
        if DEPOSED_KEY.is_match(s) {
            Ok(Self(s.to_string()))
        } else {
            Err(CoreError::InvalidDeposedKey {
                input: s.to_string(),
            })
        }
    }

    /// Parse a key where the empty string means "not deposed"
    ///
    /// # Errors
    ///
    /// Returns error if the string is non-empty and not a valid key
    pub fn parse_optional(s: &str) -> CoreResult<Option<Self>> {
        if s.is_empty() {
            Ok(None)
        } else {
            Self::parse(s).map(Some)
        }
    }

    /// Get the key text
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DeposedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid() {
        let key = DeposedKey::parse("deadbeef").unwrap();
        assert_eq!(key.as_str(), "deadbeef");
        assert_eq!(key.to_string(), "deadbeef");
    }

    #[test]
    fn test_parse_invalid() {
        for bad in ["", "DEADBEEF", "deadbee", "deadbeef0", "deadbeeg", " eadbeef"] {
            assert!(DeposedKey::parse(bad).is_err(), "expected error for {:?}", bad);
        }
    }

    #[test]
    fn test_parse_optional() {
        assert_eq!(DeposedKey::parse_optional("").unwrap(), None);
        assert_eq!(
            DeposedKey::parse_optional("00000001").unwrap(),
            Some(DeposedKey::parse("00000001").unwrap())
        );
        assert!(matches!(
            DeposedKey::parse_optional("nope"),
            Err(CoreError::InvalidDeposedKey { .. })
        ));
    }
}
