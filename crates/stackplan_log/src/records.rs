//! Record message types.
//!
//! These are the wire shapes of every record this build can emit while
//! planning. The nested change and prior-state shapes are reused from the
//! older single-configuration plan format, which is why some address data
//! appears twice in a change record.

use crate::encoding::{CanonicalDecode, CanonicalEncode, EncodeError};
use crate::envelope::RawRecord;
use serde::{Deserialize, Serialize};

/// A record payload with a registered type identifier
pub trait RecordMessage: CanonicalEncode + CanonicalDecode {
    /// Type identifier written into the envelope
    const TYPE_ID: &'static str;

    /// Wrap into the closed [`Record`] sum type
    fn into_record(self) -> Record;
}

/// Plan header, must appear exactly once
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanHeader {
    /// Version of the program that wrote the plan
    pub version: String,
    /// State snapshot the plan was computed against, opaque here
    pub prev_run_state_raw: Vec<u8>,
}

/// Whether the plan is safe to apply
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanApplyable {
    /// Applyable flag
    pub applyable: bool,
}

/// MessagePack-encoded dynamic value
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DynamicValueWire {
    /// Encoded bytes
    pub msgpack: Vec<u8>,
}

/// Value of one root input variable
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanRootInputValue {
    /// Variable name
    pub name: String,
    /// Value encoded against the dynamic pseudo-type
    pub value: DynamicValueWire,
}

/// Announces a component instance that the plan covers
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanComponentInstance {
    /// Component instance address text
    pub component_instance_addr: String,
    /// RFC 3339 plan timestamp
    pub plan_timestamp: String,
}

/// Legacy-format planned change for one resource instance object
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceInstanceChangeWire {
    /// Resource instance address text
    pub addr: String,
    /// Address in the previous run, empty if unchanged
    pub prev_run_addr: String,
    /// Deposed key, empty for the current object
    pub deposed_key: String,
    /// Provider configuration address text
    pub provider: String,
    /// Action code
    pub action: u8,
    /// Action reason code
    pub action_reason: u8,
    /// Value before the change
    pub before: Option<DynamicValueWire>,
    /// Value after the change
    pub after: Option<DynamicValueWire>,
    /// Attribute paths forcing replacement
    pub required_replace: Vec<String>,
    /// Provider-private data
    pub private: Vec<u8>,
}

/// Stored state of one resource instance object
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceInstanceObjectWire {
    /// Attribute values as a JSON object
    pub value_json: Vec<u8>,
    /// Provider schema version the attributes conform to
    pub schema_version: u64,
    /// Status code
    pub status: u8,
    /// Resource addresses this object depends on
    pub dependencies: Vec<String>,
    /// Whether replacements create before destroying
    pub create_before_destroy: bool,
    /// Provider-private data
    pub provider_specific_data: Vec<u8>,
}

/// Planned change (or refreshed state) of one resource instance object
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanResourceInstanceChangePlanned {
    /// Owning component instance address text
    pub component_instance_addr: String,
    /// Resource instance address text
    pub resource_instance_addr: String,
    /// Deposed key, empty for the current object
    pub deposed_key: String,
    /// Provider configuration address text
    pub provider_config_addr: String,
    /// Planned change, absent when only the state is refreshed
    pub change: Option<ResourceInstanceChangeWire>,
    /// Prior state, absent when there is intentionally none
    pub prior_state: Option<ResourceInstanceObjectWire>,
}

macro_rules! record_message {
    ($ty:ty, $id:literal, $variant:ident) => {
        impl CanonicalEncode for $ty {}

        impl RecordMessage for $ty {
            const TYPE_ID: &'static str = $id;

            fn into_record(self) -> Record {
                Record::$variant(self.into())
            }
        }
    };
}

record_message!(PlanHeader, "stackplan.v1.PlanHeader", Header);
record_message!(PlanApplyable, "stackplan.v1.PlanApplyable", Applyable);
record_message!(PlanRootInputValue, "stackplan.v1.PlanRootInputValue", RootInputValue);
record_message!(PlanComponentInstance, "stackplan.v1.PlanComponentInstance", ComponentInstance);
record_message!(
    PlanResourceInstanceChangePlanned,
    "stackplan.v1.PlanResourceInstanceChangePlanned",
    ResourceInstanceChangePlanned
);

/// Every record kind this build understands
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Record {
    /// [`PlanHeader`]
    Header(PlanHeader),
    /// [`PlanApplyable`]
    Applyable(PlanApplyable),
    /// [`PlanRootInputValue`]
    RootInputValue(PlanRootInputValue),
    /// [`PlanComponentInstance`]
    ComponentInstance(PlanComponentInstance),
    /// [`PlanResourceInstanceChangePlanned`]
    ResourceInstanceChangePlanned(Box<PlanResourceInstanceChangePlanned>),
}

impl Record {
    /// Type identifier of this record's message
    #[must_use]
    pub const fn type_id(&self) -> &'static str {
        match self {
            Self::Header(_) => PlanHeader::TYPE_ID,
            Self::Applyable(_) => PlanApplyable::TYPE_ID,
            Self::RootInputValue(_) => PlanRootInputValue::TYPE_ID,
            Self::ComponentInstance(_) => PlanComponentInstance::TYPE_ID,
            Self::ResourceInstanceChangePlanned(_) => PlanResourceInstanceChangePlanned::TYPE_ID,
        }
    }

    /// Short name for logs
    #[must_use]
    pub const fn kind_name(&self) -> &'static str {
        match self {
            Self::Header(_) => "header",
            Self::Applyable(_) => "applyable",
            Self::RootInputValue(_) => "root_input_value",
            Self::ComponentInstance(_) => "component_instance",
            Self::ResourceInstanceChangePlanned(_) => "resource_instance_change_planned",
        }
    }

    /// Wrap into an envelope
    ///
    /// # Errors
    ///
    /// Returns error if the payload cannot be encoded
    pub fn pack(&self) -> Result<RawRecord, EncodeError> {
        match self {
            Self::Header(m) => RawRecord::pack(m),
            Self::Applyable(m) => RawRecord::pack(m),
            Self::RootInputValue(m) => RawRecord::pack(m),
            Self::ComponentInstance(m) => RawRecord::pack(m),
            Self::ResourceInstanceChangePlanned(m) => RawRecord::pack(m.as_ref()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_type_ids_unique() {
        let ids: HashSet<&str> = [
            PlanHeader::TYPE_ID,
            PlanApplyable::TYPE_ID,
            PlanRootInputValue::TYPE_ID,
            PlanComponentInstance::TYPE_ID,
            PlanResourceInstanceChangePlanned::TYPE_ID,
        ]
        .into_iter()
        .collect();
        assert_eq!(ids.len(), 5);
    }

    #[test]
    fn test_into_record_matches_type_id() {
        let record = PlanApplyable { applyable: true }.into_record();
        assert_eq!(record.type_id(), PlanApplyable::TYPE_ID);
        assert_eq!(record.kind_name(), "applyable");

        let record = PlanResourceInstanceChangePlanned::default().into_record();
        assert!(matches!(record, Record::ResourceInstanceChangePlanned(_)));
    }

    #[test]
    fn test_record_pack_uses_message_type() {
        let record = Record::Header(PlanHeader {
            version: "1.0.0".to_string(),
            prev_run_state_raw: vec![1, 2],
        });
        let raw = record.pack().unwrap();
        assert_eq!(raw.type_id, PlanHeader::TYPE_ID);
        assert!(!raw.payload.is_empty());
    }
}
