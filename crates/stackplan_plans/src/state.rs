//! Prior state of resource instance objects.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};
use stackplan_core::{CoreError, ResourceAddr};
use stackplan_log::ResourceInstanceObjectWire;
use thiserror::Error;

/// Errors decoding a stored object
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StateError {
    /// Attributes are not valid JSON
    #[error("attributes are not valid JSON: {reason}")]
    InvalidJson {
        /// Parser message
        reason: String,
    },
    /// Attributes are JSON but not an object
    #[error("attributes must be a JSON object, found {found}")]
    NotAnObject {
        /// Kind of JSON value found
        found: &'static str,
    },
    /// Status code not known to this build
    #[error("unknown object status code {code}")]
    UnknownStatus {
        /// The code found
        code: u8,
    },
    /// A dependency is not a resource address
    #[error("dependency {index}: {source}")]
    InvalidDependency {
        /// Position in the dependency list
        index: usize,
        /// Parse failure
        #[source]
        source: CoreError,
    },
}

/// Whether an object is usable
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObjectStatus {
    /// Fully created
    #[default]
    Ready,
    /// Partially created or failed; must be replaced
    Tainted,
}

impl ObjectStatus {
    /// Decode a wire status code
    #[must_use]
    pub const fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::Ready),
            1 => Some(Self::Tainted),
            _ => None,
        }
    }
}

/// A decoded resource instance object
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceInstanceObject {
    /// Object status
    pub status: ObjectStatus,
    /// Provider schema version the attributes conform to
    pub schema_version: u64,
    /// Attribute values
    pub attrs: Map<String, JsonValue>,
    /// Resources this object depends on
    pub dependencies: Vec<ResourceAddr>,
    /// Whether replacements create before destroying
    pub create_before_destroy: bool,
    /// Provider-private data
    pub private: Vec<u8>,
}

impl ResourceInstanceObject {
    /// Decode a stored object
    ///
    /// # Errors
    ///
    /// Returns error if the attributes are not a JSON object, the status is
    /// unknown, or a dependency is not a resource address
    pub fn from_wire(wire: &ResourceInstanceObjectWire) -> Result<Self, StateError> {
        let status =
            ObjectStatus::from_code(wire.status).ok_or(StateError::UnknownStatus { code: wire.status })?;

        let attrs = match serde_json::from_slice(&wire.value_json) {
            Ok(JsonValue::Object(attrs)) => attrs,
            Ok(other) => {
                return Err(StateError::NotAnObject {
                    found: json_kind(&other),
                })
            }
            Err(e) => {
                return Err(StateError::InvalidJson {
                    reason: e.to_string(),
                })
            }
        };

        let dependencies = wire
            .dependencies
            .iter()
            .enumerate()
            .map(|(index, dep)| {
                ResourceAddr::parse(dep).map_err(|source| StateError::InvalidDependency { index, source })
            })
            .collect::<Result<_, _>>()?;

        Ok(Self {
            status,
            schema_version: wire.schema_version,
            attrs,
            dependencies,
            create_before_destroy: wire.create_before_destroy,
            private: wire.provider_specific_data.clone(),
        })
    }

    /// Look up a top-level attribute
    #[must_use]
    pub fn attr(&self, name: &str) -> Option<&JsonValue> {
        self.attrs.get(name)
    }

    /// Whether the object must be replaced
    #[must_use]
    pub fn is_tainted(&self) -> bool {
        self.status == ObjectStatus::Tainted
    }
}

const fn json_kind(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "bool",
        JsonValue::Number(_) => "number",
        JsonValue::String(_) => "string",
        JsonValue::Array(_) => "array",
        JsonValue::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wire(json: &str) -> ResourceInstanceObjectWire {
        ResourceInstanceObjectWire {
            value_json: json.as_bytes().to_vec(),
            schema_version: 2,
            dependencies: vec!["aws_vpc.main".to_string(), "module.net.aws_subnet.a".to_string()],
            ..Default::default()
        }
    }

    #[test]
    fn test_decode_object() {
        let obj = ResourceInstanceObject::from_wire(&wire(r#"{"id":"i-123","size":4}"#)).unwrap();
        assert_eq!(obj.status, ObjectStatus::Ready);
        assert!(!obj.is_tainted());
        assert_eq!(obj.schema_version, 2);
        assert_eq!(obj.attr("id"), Some(&JsonValue::from("i-123")));
        assert_eq!(obj.attr("missing"), None);
        assert_eq!(obj.dependencies.len(), 2);
        assert_eq!(obj.dependencies[0], ResourceAddr::managed("aws_vpc", "main"));
    }

    #[test]
    fn test_tainted() {
        let mut w = wire("{}");
        w.status = 1;
        assert!(ResourceInstanceObject::from_wire(&w).unwrap().is_tainted());

        w.status = 9;
        assert_eq!(
            ResourceInstanceObject::from_wire(&w),
            Err(StateError::UnknownStatus { code: 9 })
        );
    }

    #[test]
    fn test_attrs_must_be_object() {
        assert_eq!(
            ResourceInstanceObject::from_wire(&wire("[1,2]")),
            Err(StateError::NotAnObject { found: "array" })
        );
        assert!(matches!(
            ResourceInstanceObject::from_wire(&wire("{")),
            Err(StateError::InvalidJson { .. })
        ));
        assert!(matches!(
            ResourceInstanceObject::from_wire(&wire("")),
            Err(StateError::InvalidJson { .. })
        ));
    }

    #[test]
    fn test_bad_dependency() {
        let mut w = wire("{}");
        w.dependencies.push("aws_vpc.main[0]".to_string());
        assert!(matches!(
            ResourceInstanceObject::from_wire(&w),
            Err(StateError::InvalidDependency { index: 2, .. })
        ));
    }
}
