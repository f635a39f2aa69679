//! Per-record decoders.
//!
//! Each decoder turns one resolved [`Record`] into a [`PlanEntry`]. The only
//! thing a decoder reads from the plan built so far is whether a component
//! was announced; that is checked after the addresses parse and before any
//! nested payload is decoded.

use crate::builder::PlanBuilder;
use crate::consistency::{check_change_consistency, ChangeTarget};
use crate::error::RecordError;
use stackplan_core::{
    AddrKind, ComponentInstanceAddr, CoreError, DeposedKey, InputVariable, ProviderConfigAddr,
    ResourceInstanceAddr, ResourceInstanceObjectAddr, Timestamp, Version,
};
use stackplan_log::{
    PlanComponentInstance, PlanHeader, PlanResourceInstanceChangePlanned, PlanRootInputValue,
    RawRecord, Record,
};
use stackplan_plans::{DynamicValue, ResourceInstanceChange, ResourceInstanceObject, Value, ValueType};

/// A decoded record, ready to fold into a plan
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlanEntry {
    /// The plan header
    Header {
        /// State snapshot the plan was computed against
        prev_run_state_raw: Vec<u8>,
    },
    /// Whether the plan is applyable
    Applyable(bool),
    /// A root input value
    RootInputValue {
        /// The variable
        variable: InputVariable,
        /// Its value
        value: Value,
    },
    /// A component instance announcement
    ComponentInstance {
        /// The component
        addr: ComponentInstanceAddr,
        /// When it was planned
        plan_timestamp: Timestamp,
    },
    /// A resource instance object's change and prior state
    ResourceInstance(Box<ResourceInstanceEntry>),
}

/// A decoded resource instance change record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceInstanceEntry {
    /// Owning component
    pub component: ComponentInstanceAddr,
    /// The object
    pub object: ResourceInstanceObjectAddr,
    /// Provider configuration responsible for the object
    pub provider: ProviderConfigAddr,
    /// Planned change, if any
    pub change: Option<ResourceInstanceChange>,
    /// Prior state; `None` means there is none
    pub prior_state: Option<ResourceInstanceObject>,
}

/// Resolve an envelope against the record registry
///
/// # Errors
///
/// Returns error if the type is unknown or the payload is malformed
pub fn resolve(raw: &RawRecord) -> Result<Record, RecordError> {
    raw.unpack().map_err(RecordError::from)
}

/// Decode one record
///
/// # Errors
///
/// Returns error if any field fails to decode, the header version is not
/// `running`, a resource instance record names a component `builder` has not
/// seen, or a nested change disagrees with its record
pub fn decode_record(
    record: Record,
    running: &Version,
    builder: &PlanBuilder,
) -> Result<PlanEntry, RecordError> {
    match record {
        Record::Header(header) => decode_header(header, running),
        Record::Applyable(applyable) => Ok(PlanEntry::Applyable(applyable.applyable)),
        Record::RootInputValue(input) => decode_root_input_value(input),
        Record::ComponentInstance(component) => decode_component_instance(component),
        Record::ResourceInstanceChangePlanned(change) => decode_resource_instance_change(*change, builder)
            .map(|entry| PlanEntry::ResourceInstance(Box::new(entry))),
    }
}

fn decode_header(header: PlanHeader, running: &Version) -> Result<PlanEntry, RecordError> {
    let running = running.to_string();
    if header.version != running {
        return Err(RecordError::VersionMismatch {
            recorded: header.version,
            running,
        });
    }
    Ok(PlanEntry::Header {
        prev_run_state_raw: header.prev_run_state_raw,
    })
}

fn decode_root_input_value(input: PlanRootInputValue) -> Result<PlanEntry, RecordError> {
    let value = DynamicValue::from(input.value)
        .decode(&ValueType::Dynamic)
        .map_err(|source| RecordError::InvalidStoredValue {
            name: input.name.clone(),
            source,
        })?;
    Ok(PlanEntry::RootInputValue {
        variable: InputVariable::new(input.name),
        value,
    })
}

fn decode_component_instance(component: PlanComponentInstance) -> Result<PlanEntry, RecordError> {
    let addr = ComponentInstanceAddr::parse(&component.component_instance_addr)
        .map_err(invalid_address(AddrKind::ComponentInstance, &component.component_instance_addr))?;
    let plan_timestamp = Timestamp::parse(&component.plan_timestamp).map_err(|err| {
        RecordError::InvalidTimestamp {
            timestamp: component.plan_timestamp.clone(),
            component: addr.to_string(),
            reason: reason(err),
        }
    })?;
    Ok(PlanEntry::ComponentInstance {
        addr,
        plan_timestamp,
    })
}

fn decode_resource_instance_change(
    record: PlanResourceInstanceChangePlanned,
    builder: &PlanBuilder,
) -> Result<ResourceInstanceEntry, RecordError> {
    let component = ComponentInstanceAddr::parse(&record.component_instance_addr)
        .map_err(invalid_address(AddrKind::ComponentInstance, &record.component_instance_addr))?;
    let instance = ResourceInstanceAddr::parse(&record.resource_instance_addr)
        .map_err(invalid_address(AddrKind::ResourceInstance, &record.resource_instance_addr))?;
    let deposed = DeposedKey::parse_optional(&record.deposed_key).map_err(|_| {
        RecordError::InvalidDeposedKey {
            key: record.deposed_key.clone(),
        }
    })?;
    let provider = ProviderConfigAddr::parse(&record.provider_config_addr)
        .map_err(invalid_address(AddrKind::ProviderConfig, &record.provider_config_addr))?;
    if !builder.has_component(&component) {
        return Err(RecordError::UnknownComponent { component });
    }
    let target = ChangeTarget::new(ResourceInstanceObjectAddr { instance, deposed }, provider);

    let change = record
        .change
        .as_ref()
        .map(|wire| {
            let change = ResourceInstanceChange::from_wire(wire).map_err(|source| {
                RecordError::InvalidChange {
                    object: target.object.to_string(),
                    source,
                }
            })?;
            check_change_consistency(&target, &ChangeTarget::of_change(&change))?;
            Ok::<_, RecordError>(change)
        })
        .transpose()?;

    let prior_state = record
        .prior_state
        .as_ref()
        .map(|wire| {
            ResourceInstanceObject::from_wire(wire).map_err(|source| RecordError::InvalidPriorState {
                object: target.object.to_string(),
                source,
            })
        })
        .transpose()?;

    Ok(ResourceInstanceEntry {
        component,
        object: target.object,
        provider: target.provider,
        change,
        prior_state,
    })
}

fn invalid_address(kind: AddrKind, addr: &str) -> impl FnOnce(CoreError) -> RecordError + '_ {
    move |err| RecordError::InvalidAddressSyntax {
        kind,
        addr: addr.to_string(),
        reason: reason(err),
    }
}

fn reason(err: CoreError) -> String {
    match err {
        CoreError::InvalidAddress { reason, .. } | CoreError::InvalidTimestamp { reason, .. } => reason,
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consistency::Inconsistency;
    use stackplan_core::version;
    use stackplan_log::{DynamicValueWire, ResourceInstanceChangeWire, ResourceInstanceObjectWire};

    const PROVIDER: &str = r#"provider["registry.terraform.io/hashicorp/null"]"#;

    fn running() -> Version {
        version::running()
    }

    fn announced() -> PlanBuilder {
        let mut builder = PlanBuilder::new();
        builder
            .apply(PlanEntry::ComponentInstance {
                addr: ComponentInstanceAddr::root("a"),
                plan_timestamp: Timestamp::parse("2024-01-01T00:00:00Z").unwrap(),
            })
            .unwrap();
        builder
    }

    fn change_record() -> PlanResourceInstanceChangePlanned {
        PlanResourceInstanceChangePlanned {
            component_instance_addr: "component.a".to_string(),
            resource_instance_addr: "null_resource.b".to_string(),
            deposed_key: String::new(),
            provider_config_addr: PROVIDER.to_string(),
            change: None,
            prior_state: None,
        }
    }

    fn nested_change() -> ResourceInstanceChangeWire {
        ResourceInstanceChangeWire {
            addr: "null_resource.b".to_string(),
            provider: PROVIDER.to_string(),
            action: 1,
            after: Some(DynamicValueWire { msgpack: vec![0xc0] }),
            ..Default::default()
        }
    }

    fn decode_change(record: PlanResourceInstanceChangePlanned) -> Result<ResourceInstanceEntry, RecordError> {
        match decode_record(Record::ResourceInstanceChangePlanned(Box::new(record)), &running(), &announced())? {
            PlanEntry::ResourceInstance(entry) => Ok(*entry),
            other => panic!("unexpected entry {:?}", other),
        }
    }

    #[test]
    fn test_header_version_check() {
        let header = PlanHeader {
            version: running().to_string(),
            prev_run_state_raw: vec![1],
        };
        assert_eq!(
            decode_record(Record::Header(header), &running(), &announced()).unwrap(),
            PlanEntry::Header {
                prev_run_state_raw: vec![1]
            }
        );

        let header = PlanHeader {
            version: "0.0.0".to_string(),
            prev_run_state_raw: vec![],
        };
        let err = decode_record(Record::Header(header), &Version::new(1, 2, 3), &announced()).unwrap_err();
        assert_eq!(
            err,
            RecordError::VersionMismatch {
                recorded: "0.0.0".to_string(),
                running: "1.2.3".to_string(),
            }
        );
    }

    #[test]
    fn test_header_version_is_exact_text() {
        // Same version, different spelling.
        let header = PlanHeader {
            version: "1.2.3-".to_string(),
            prev_run_state_raw: vec![],
        };
        assert!(decode_record(Record::Header(header), &Version::new(1, 2, 3), &announced()).is_err());
    }

    #[test]
    fn test_root_input_value() {
        let stored = DynamicValue::encode(&Value::from("eu-west-1"), &ValueType::Dynamic).unwrap();
        let input = PlanRootInputValue {
            name: "region".to_string(),
            value: stored.into(),
        };
        assert_eq!(
            decode_record(Record::RootInputValue(input), &running(), &announced()).unwrap(),
            PlanEntry::RootInputValue {
                variable: InputVariable::new("region"),
                value: Value::from("eu-west-1"),
            }
        );

        let input = PlanRootInputValue {
            name: "region".to_string(),
            value: DynamicValueWire { msgpack: vec![0xa1] },
        };
        let err = decode_record(Record::RootInputValue(input), &running(), &announced()).unwrap_err();
        assert!(matches!(err, RecordError::InvalidStoredValue { ref name, .. } if name == "region"));
    }

    #[test]
    fn test_component_instance() {
        let record = PlanComponentInstance {
            component_instance_addr: r#"stack.net["eu"].component.vpc"#.to_string(),
            plan_timestamp: "2024-03-04T05:06:07.5+01:00".to_string(),
        };
        let PlanEntry::ComponentInstance { addr, plan_timestamp } =
            decode_record(Record::ComponentInstance(record), &running(), &announced()).unwrap()
        else {
            panic!("expected component entry");
        };
        assert_eq!(addr.component, "vpc");
        assert_eq!(plan_timestamp.to_rfc3339(), "2024-03-04T04:06:07.500Z");
    }

    #[test]
    fn test_component_instance_errors() {
        let record = PlanComponentInstance {
            component_instance_addr: "stack.a".to_string(),
            plan_timestamp: "2024-03-04T05:06:07Z".to_string(),
        };
        assert!(matches!(
            decode_record(Record::ComponentInstance(record), &running(), &announced()),
            Err(RecordError::InvalidAddressSyntax {
                kind: AddrKind::ComponentInstance,
                ..
            })
        ));

        let record = PlanComponentInstance {
            component_instance_addr: "component.a".to_string(),
            plan_timestamp: "yesterday".to_string(),
        };
        let err = decode_record(Record::ComponentInstance(record), &running(), &announced()).unwrap_err();
        assert!(matches!(
            err,
            RecordError::InvalidTimestamp { ref timestamp, ref component, .. }
                if timestamp == "yesterday" && component == "component.a"
        ));
    }

    #[test]
    fn test_change_without_payloads() {
        let entry = decode_change(change_record()).unwrap();
        assert_eq!(entry.component, ComponentInstanceAddr::root("a"));
        assert_eq!(entry.object.to_string(), "null_resource.b");
        assert_eq!(entry.provider.to_string(), PROVIDER);
        assert_eq!(entry.change, None);
        assert_eq!(entry.prior_state, None);
    }

    #[test]
    fn test_change_with_payloads() {
        let mut record = change_record();
        record.change = Some(nested_change());
        record.prior_state = Some(ResourceInstanceObjectWire {
            value_json: br#"{"id":"1"}"#.to_vec(),
            ..Default::default()
        });
        let entry = decode_change(record).unwrap();
        assert_eq!(entry.change.map(|c| c.action), Some(stackplan_plans::Action::Create));
        assert!(entry.prior_state.is_some());
    }

    #[test]
    fn test_change_field_errors() {
        let mut record = change_record();
        record.resource_instance_addr = "b".to_string();
        assert!(matches!(
            decode_change(record),
            Err(RecordError::InvalidAddressSyntax {
                kind: AddrKind::ResourceInstance,
                ..
            })
        ));

        let mut record = change_record();
        record.deposed_key = "ZZZZZZZZ".to_string();
        assert_eq!(
            decode_change(record),
            Err(RecordError::InvalidDeposedKey {
                key: "ZZZZZZZZ".to_string()
            })
        );

        let mut record = change_record();
        record.provider_config_addr = "provider.null".to_string();
        assert!(matches!(
            decode_change(record),
            Err(RecordError::InvalidAddressSyntax {
                kind: AddrKind::ProviderConfig,
                ..
            })
        ));

        let mut record = change_record();
        record.prior_state = Some(ResourceInstanceObjectWire {
            value_json: b"null".to_vec(),
            ..Default::default()
        });
        assert!(matches!(
            decode_change(record),
            Err(RecordError::InvalidPriorState { .. })
        ));

        let mut record = change_record();
        let mut nested = nested_change();
        nested.action = 99;
        record.change = Some(nested);
        assert!(matches!(decode_change(record), Err(RecordError::InvalidChange { .. })));
    }

    #[test]
    fn test_inconsistent_nested_change() {
        let mut record = change_record();
        let mut nested = nested_change();
        nested.addr = "null_resource.c".to_string();
        record.change = Some(nested);
        assert!(matches!(
            decode_change(record),
            Err(RecordError::InconsistentChangeAddress(Inconsistency::ResourceInstance { .. }))
        ));

        let mut record = change_record();
        let mut nested = nested_change();
        nested.deposed_key = "00000001".to_string();
        record.change = Some(nested);
        assert!(matches!(
            decode_change(record),
            Err(RecordError::InconsistentChangeAddress(Inconsistency::DeposedKey { .. }))
        ));

        let mut record = change_record();
        let mut nested = nested_change();
        nested.provider = r#"provider["registry.terraform.io/hashicorp/null"].other"#.to_string();
        record.change = Some(nested);
        assert!(matches!(
            decode_change(record),
            Err(RecordError::InconsistentChangeAddress(Inconsistency::ProviderConfig { .. }))
        ));
    }

    #[test]
    fn test_unannounced_component_before_payloads() {
        let mut record = change_record();
        record.component_instance_addr = "component.x".to_string();
        let mut nested = nested_change();
        nested.addr = "null_resource.c".to_string();
        record.change = Some(nested);
        record.prior_state = Some(ResourceInstanceObjectWire {
            value_json: b"null".to_vec(),
            ..Default::default()
        });
        assert_eq!(
            decode_change(record),
            Err(RecordError::UnknownComponent {
                component: ComponentInstanceAddr::root("x")
            })
        );

        // Address syntax is still checked first.
        let mut record = change_record();
        record.component_instance_addr = "component.x".to_string();
        record.resource_instance_addr = "b".to_string();
        assert!(matches!(
            decode_change(record),
            Err(RecordError::InvalidAddressSyntax {
                kind: AddrKind::ResourceInstance,
                ..
            })
        ));
    }

    #[test]
    fn test_resolve_unknown() {
        let raw = RawRecord::new("stackplan.v1.PlanOutputValue", vec![]);
        assert_eq!(
            resolve(&raw),
            Err(RecordError::UnknownRecordType {
                type_id: "stackplan.v1.PlanOutputValue".to_string()
            })
        );
    }
}
