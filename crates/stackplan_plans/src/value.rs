//! Dynamic values.
//!
//! Values are stored as MessagePack. A value stored against a concrete
//! [`ValueType`] is written as-is; a value stored against
//! [`ValueType::Dynamic`] is written as the pair `[TYPE_JSON, VALUE]` so
//! that it can be decoded without knowing its type in advance.

use serde::de::{self, MapAccess, SeqAccess, Visitor};
use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Number;
use stackplan_log::DynamicValueWire;
use std::collections::BTreeMap;
use std::fmt;
use std::io::Cursor;
use thiserror::Error;

/// Errors encoding or decoding a dynamic value
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValueError {
    /// Bytes are not valid MessagePack for a value
    #[error("invalid msgpack value: {reason}")]
    Decode {
        /// Decoder message
        reason: String,
    },
    /// A value decoded but bytes were left over
    #[error("{count} trailing bytes after msgpack value")]
    TrailingBytes {
        /// Number of unconsumed bytes
        count: usize,
    },
    /// Value could not be written
    #[error("cannot encode value: {reason}")]
    Encode {
        /// Encoder message
        reason: String,
    },
    /// Type descriptor is not understood
    #[error("invalid type descriptor: {reason}")]
    InvalidType {
        /// What was wrong with it
        reason: String,
    },
    /// Value stored against the dynamic type is not a `[type, value]` pair
    #[error("dynamic value must be a [type, value] pair")]
    MalformedDynamic,
    /// Value does not conform to its type
    #[error("expected {expected}, found {found}")]
    TypeMismatch {
        /// Expected type
        expected: String,
        /// Kind of value found
        found: &'static str,
    },
}

/// A decoded value
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Value {
    /// Null, valid for every type
    #[default]
    Null,
    /// Boolean
    Bool(bool),
    /// Number
    Number(Number),
    /// String
    String(String),
    /// List of values
    List(Vec<Value>),
    /// Map from string keys to values
    Map(BTreeMap<String, Value>),
}

impl Value {
    /// Short name of this value's kind
    #[must_use]
    pub const fn kind_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Number(_) => "number",
            Self::String(_) => "string",
            Self::List(_) => "list",
            Self::Map(_) => "map",
        }
    }

    /// Whether this is null
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// The most specific type this value conforms to
    ///
    /// Collections with elements of differing types get a dynamic element
    /// type.
    #[must_use]
    pub fn infer_type(&self) -> ValueType {
        match self {
            Self::Null => ValueType::Dynamic,
            Self::Bool(_) => ValueType::Bool,
            Self::Number(_) => ValueType::Number,
            Self::String(_) => ValueType::String,
            Self::List(items) => ValueType::list(common_type(items.iter())),
            Self::Map(entries) => ValueType::map(common_type(entries.values())),
        }
    }
}

fn common_type<'a>(values: impl Iterator<Item = &'a Value>) -> ValueType {
    let mut found: Option<ValueType> = None;
    for ty in values.filter(|v| !v.is_null()).map(Value::infer_type) {
        match &found {
            None => found = Some(ty),
            Some(existing) if *existing == ty => {}
            Some(_) => return ValueType::Dynamic,
        }
    }
    found.unwrap_or(ValueType::Dynamic)
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Self::Number(n.into())
    }
}

impl From<u64> for Value {
    fn from(n: u64) -> Self {
        Self::Number(n.into())
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Null => serializer.serialize_unit(),
            Self::Bool(b) => serializer.serialize_bool(*b),
            Self::Number(n) => n.serialize(serializer),
            Self::String(s) => serializer.serialize_str(s),
            Self::List(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Self::Map(entries) => {
                let mut map = serializer.serialize_map(Some(entries.len()))?;
                for (k, v) in entries {
                    map.serialize_entry(k, v)?;
                }
                map.end()
            }
        }
    }
}

struct ValueVisitor;

impl<'de> Visitor<'de> for ValueVisitor {
    type Value = Value;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a null, bool, number, string, list, or string-keyed map")
    }

    fn visit_unit<E: de::Error>(self) -> Result<Value, E> {
        Ok(Value::Null)
    }

    fn visit_none<E: de::Error>(self) -> Result<Value, E> {
        Ok(Value::Null)
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> Result<Value, E> {
        Ok(Value::Bool(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Value, E> {
        Ok(Value::from(v))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Value, E> {
        Ok(Value::from(v))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Value, E> {
        Number::from_f64(v)
            .map(Value::Number)
            .ok_or_else(|| E::custom(format!("{} is not a finite number", v)))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Value, E> {
        Ok(Value::from(v))
    }

    fn visit_string<E: de::Error>(self, v: String) -> Result<Value, E> {
        Ok(Value::String(v))
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Value, A::Error> {
        let mut items = Vec::with_capacity(seq.size_hint().unwrap_or(0).min(1024));
        while let Some(item) = seq.next_element()? {
            items.push(item);
        }
        Ok(Value::List(items))
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Value, A::Error> {
        let mut entries = BTreeMap::new();
        while let Some((k, v)) = map.next_entry::<String, Value>()? {
            entries.insert(k, v);
        }
        Ok(Value::Map(entries))
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(ValueVisitor)
    }
}

/// Type a value is stored against
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ValueType {
    /// Any type; the concrete type is stored alongside the value
    Dynamic,
    /// Boolean
    Bool,
    /// Number
    Number,
    /// String
    String,
    /// List with a single element type
    List(Box<ValueType>),
    /// String-keyed map with a single element type
    Map(Box<ValueType>),
}

impl ValueType {
    /// List of `element`
    #[must_use]
    pub fn list(element: ValueType) -> Self {
        Self::List(Box::new(element))
    }

    /// Map of `element`
    #[must_use]
    pub fn map(element: ValueType) -> Self {
        Self::Map(Box::new(element))
    }

    /// JSON type descriptor, e.g. `"string"` or `["list","number"]`
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Self::Dynamic => "dynamic".into(),
            Self::Bool => "bool".into(),
            Self::Number => "number".into(),
            Self::String => "string".into(),
            Self::List(element) => serde_json::json!(["list", element.to_json()]),
            Self::Map(element) => serde_json::json!(["map", element.to_json()]),
        }
    }

    /// Parse a JSON type descriptor
    ///
    /// # Errors
    ///
    /// Returns error if the descriptor names an unknown type
    pub fn from_json(json: &serde_json::Value) -> Result<Self, ValueError> {
        let invalid = |reason: String| ValueError::InvalidType { reason };
        match json {
            serde_json::Value::String(name) => match name.as_str() {
                "dynamic" => Ok(Self::Dynamic),
                "bool" => Ok(Self::Bool),
                "number" => Ok(Self::Number),
                "string" => Ok(Self::String),
                other => Err(invalid(format!("unknown primitive type {:?}", other))),
            },
            serde_json::Value::Array(parts) => match parts.as_slice() {
                [serde_json::Value::String(kind), element] => {
                    let element = Self::from_json(element)?;
                    match kind.as_str() {
                        "list" => Ok(Self::list(element)),
                        "map" => Ok(Self::map(element)),
                        other => Err(invalid(format!("unknown collection kind {:?}", other))),
                    }
                }
                _ => Err(invalid("expected [KIND, ELEMENT_TYPE]".to_string())),
            },
            other => Err(invalid(format!("unexpected descriptor {}", other))),
        }
    }

    /// Parse a JSON type descriptor from text
    ///
    /// # Errors
    ///
    /// Returns error if the text is not JSON or not a known type
    pub fn parse_json(s: &str) -> Result<Self, ValueError> {
        let json: serde_json::Value = serde_json::from_str(s).map_err(|e| ValueError::InvalidType {
            reason: e.to_string(),
        })?;
        Self::from_json(&json)
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Dynamic => f.write_str("dynamic"),
            Self::Bool => f.write_str("bool"),
            Self::Number => f.write_str("number"),
            Self::String => f.write_str("string"),
            Self::List(element) => write!(f, "list({})", element),
            Self::Map(element) => write!(f, "map({})", element),
        }
    }
}

impl Serialize for ValueType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for ValueType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let json = serde_json::Value::deserialize(deserializer)?;
        Self::from_json(&json).map_err(de::Error::custom)
    }
}

fn mismatch(value: &Value, ty: &ValueType) -> ValueError {
    ValueError::TypeMismatch {
        expected: ty.to_string(),
        found: value.kind_name(),
    }
}

/// Convert a value into its stored shape, wrapping dynamic positions
fn to_stored(value: &Value, ty: &ValueType) -> Result<Value, ValueError> {
    match (value, ty) {
        (Value::Null, _) => Ok(Value::Null),
        (value, ValueType::Dynamic) => {
            let actual = value.infer_type();
            Ok(Value::List(vec![
                Value::String(actual.to_json().to_string()),
                to_stored(value, &actual)?,
            ]))
        }
        (Value::Bool(_), ValueType::Bool)
        | (Value::Number(_), ValueType::Number)
        | (Value::String(_), ValueType::String) => Ok(value.clone()),
        (Value::List(items), ValueType::List(element)) => items
            .iter()
            .map(|item| to_stored(item, element))
            .collect::<Result<_, _>>()
            .map(Value::List),
        (Value::Map(entries), ValueType::Map(element)) => entries
            .iter()
            .map(|(k, v)| Ok((k.clone(), to_stored(v, element)?)))
            .collect::<Result<_, ValueError>>()
            .map(Value::Map),
        (value, ty) => Err(mismatch(value, ty)),
    }
}

/// Check a stored value against its type, unwrapping dynamic positions
fn from_stored(stored: Value, ty: &ValueType) -> Result<Value, ValueError> {
    match (stored, ty) {
        (Value::Null, _) => Ok(Value::Null),
        (Value::List(pair), ValueType::Dynamic) if pair.len() == 2 => {
            let mut parts = pair.into_iter();
            let (Some(Value::String(type_json)), Some(inner)) = (parts.next(), parts.next()) else {
                return Err(ValueError::MalformedDynamic);
            };
            from_stored(inner, &ValueType::parse_json(&type_json)?)
        }
        (_, ValueType::Dynamic) => Err(ValueError::MalformedDynamic),
        (value @ Value::Bool(_), ValueType::Bool)
        | (value @ Value::Number(_), ValueType::Number)
        | (value @ Value::String(_), ValueType::String) => Ok(value),
        (Value::List(items), ValueType::List(element)) => items
            .into_iter()
            .map(|item| from_stored(item, element))
            .collect::<Result<_, _>>()
            .map(Value::List),
        (Value::Map(entries), ValueType::Map(element)) => entries
            .into_iter()
            .map(|(k, v)| Ok((k, from_stored(v, element)?)))
            .collect::<Result<_, ValueError>>()
            .map(Value::Map),
        (value, ty) => Err(mismatch(&value, ty)),
    }
}

/// A value in its stored MessagePack form
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DynamicValue {
    msgpack: Vec<u8>,
}

impl DynamicValue {
    /// Wrap stored bytes without decoding them
    #[must_use]
    pub fn from_msgpack(msgpack: Vec<u8>) -> Self {
        Self { msgpack }
    }

    /// Store a value against a type
    ///
    /// # Errors
    ///
    /// Returns error if the value does not conform to the type
    pub fn encode(value: &Value, ty: &ValueType) -> Result<Self, ValueError> {
        let stored = to_stored(value, ty)?;
        rmp_serde::to_vec(&stored)
            .map(Self::from_msgpack)
            .map_err(|e| ValueError::Encode {
                reason: e.to_string(),
            })
    }

    /// Decode against the type the value was stored with
    ///
    /// # Errors
    ///
    /// Returns error if the bytes are not a single MessagePack value or the
    /// value does not conform to the type
    pub fn decode(&self, ty: &ValueType) -> Result<Value, ValueError> {
        let mut cursor = Cursor::new(self.msgpack.as_slice());
        let stored: Value = rmp_serde::from_read(&mut cursor).map_err(|e| ValueError::Decode {
            reason: e.to_string(),
        })?;
        let consumed = usize::try_from(cursor.position()).unwrap_or(usize::MAX);
        if consumed < self.msgpack.len() {
            return Err(ValueError::TrailingBytes {
                count: self.msgpack.len() - consumed,
            });
        }
        from_stored(stored, ty)
    }

    /// Stored bytes
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.msgpack
    }
}

impl From<DynamicValueWire> for DynamicValue {
    fn from(wire: DynamicValueWire) -> Self {
        Self::from_msgpack(wire.msgpack)
    }
}

impl From<DynamicValue> for DynamicValueWire {
    fn from(value: DynamicValue) -> Self {
        Self {
            msgpack: value.msgpack,
        }
    }
}
