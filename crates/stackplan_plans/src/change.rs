//! Planned resource instance changes.
//!
//! The nested change shape predates stack plans and repeats the object's
//! address and provider configuration. Decoding here only parses it; the
//! caller is responsible for reconciling the repeated fields.

use crate::value::DynamicValue;
use serde::{Deserialize, Serialize};
use stackplan_core::{CoreError, DeposedKey, ProviderConfigAddr, ResourceInstanceAddr, ResourceInstanceObjectAddr};
use stackplan_log::ResourceInstanceChangeWire;
use std::fmt;
use thiserror::Error;

/// Errors decoding a planned change
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChangeError {
    /// An address-like field did not parse
    #[error("{field}: {source}")]
    Address {
        /// Name of the field
        field: &'static str,
        /// Parse failure
        #[source]
        source: CoreError,
    },
    /// Action code not known to this build
    #[error("unknown action code {code}")]
    UnknownAction {
        /// The code found
        code: u8,
    },
    /// Action reason code not known to this build
    #[error("unknown action reason code {code}")]
    UnknownActionReason {
        /// The code found
        code: u8,
    },
    /// The before/after values present do not fit the action
    #[error("{action} change must {rule}")]
    ValuesForAction {
        /// The decoded action
        action: Action,
        /// What the action requires
        rule: &'static str,
    },
}

/// What will happen to a resource instance object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Action {
    /// Nothing changes
    NoOp,
    /// A new object is created
    Create,
    /// A data source is read
    Read,
    /// The object is updated in place
    Update,
    /// The object is destroyed
    Delete,
    /// Destroy, then create the replacement
    DeleteThenCreate,
    /// Create the replacement, then destroy
    CreateThenDelete,
    /// Remove from state without destroying
    Forget,
}

impl Action {
    /// Decode a wire action code
    #[must_use]
    pub const fn from_code(code: u8) -> Option<Self> {
        Some(match code {
            0 => Self::NoOp,
            1 => Self::Create,
            2 => Self::Read,
            3 => Self::Update,
            4 => Self::Delete,
            5 => Self::DeleteThenCreate,
            6 => Self::CreateThenDelete,
            7 => Self::Forget,
            _ => return None,
        })
    }

    /// Wire action code
    #[must_use]
    pub const fn code(self) -> u8 {
        self as u8
    }

    /// Display name
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NoOp => "no-op",
            Self::Create => "create",
            Self::Read => "read",
            Self::Update => "update",
            Self::Delete => "delete",
            Self::DeleteThenCreate => "delete-then-create",
            Self::CreateThenDelete => "create-then-delete",
            Self::Forget => "forget",
        }
    }

    /// Whether the action replaces the object
    #[must_use]
    pub const fn is_replace(self) -> bool {
        matches!(self, Self::DeleteThenCreate | Self::CreateThenDelete)
    }

    const fn has_before(self) -> bool {
        !matches!(self, Self::Create)
    }

    const fn has_after(self) -> bool {
        !matches!(self, Self::Delete | Self::Forget)
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why an action was chosen
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ActionReason {
    /// No particular reason recorded
    #[default]
    None,
    /// Replace because the object is tainted
    ReplaceBecauseTainted,
    /// Replace because the provider cannot update in place
    ReplaceBecauseCannotUpdate,
    /// Replace because the operator asked for it
    ReplaceByRequest,
    /// Replace because a replacement trigger changed
    ReplaceByTriggers,
    /// Delete because the resource is no longer configured
    DeleteBecauseNoResourceConfig,
    /// Delete because the module instance is gone
    DeleteBecauseNoModule,
    /// Delete because the instance key is no longer declared
    DeleteBecauseWrongRepetition,
    /// Read during apply because the configuration is not yet known
    ReadBecauseConfigUnknown,
    /// Read during apply because a dependency has pending changes
    ReadBecauseDependencyPending,
}

impl ActionReason {
    /// Decode a wire reason code
    #[must_use]
    pub const fn from_code(code: u8) -> Option<Self> {
        Some(match code {
            0 => Self::None,
            1 => Self::ReplaceBecauseTainted,
            2 => Self::ReplaceBecauseCannotUpdate,
            3 => Self::ReplaceByRequest,
            4 => Self::ReplaceByTriggers,
            5 => Self::DeleteBecauseNoResourceConfig,
            6 => Self::DeleteBecauseNoModule,
            7 => Self::DeleteBecauseWrongRepetition,
            8 => Self::ReadBecauseConfigUnknown,
            9 => Self::ReadBecauseDependencyPending,
            _ => return None,
        })
    }
}

/// A decoded planned change for one resource instance object
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceInstanceChange {
    /// Resource instance the change applies to
    pub addr: ResourceInstanceAddr,
    /// Where the instance lived in the previous run
    pub prev_run_addr: ResourceInstanceAddr,
    /// Deposed object key, `None` for the current object
    pub deposed_key: Option<DeposedKey>,
    /// Provider configuration that plans and applies the change
    pub provider_addr: ProviderConfigAddr,
    /// Planned action
    pub action: Action,
    /// Why the action was chosen
    pub action_reason: ActionReason,
    /// Value before the change
    pub before: Option<DynamicValue>,
    /// Value after the change
    pub after: Option<DynamicValue>,
    /// Attribute paths that force replacement
    pub required_replace: Vec<String>,
    /// Provider-private data
    pub private: Vec<u8>,
}

impl ResourceInstanceChange {
    /// Decode the legacy nested change shape
    ///
    /// An empty previous-run address means the instance did not move.
    ///
    /// # Errors
    ///
    /// Returns error if an address or code does not decode, or the values
    /// present do not fit the action
    pub fn from_wire(wire: &ResourceInstanceChangeWire) -> Result<Self, ChangeError> {
        let address = |field: &'static str| move |source: CoreError| ChangeError::Address { field, source };

        let addr = ResourceInstanceAddr::parse(&wire.addr).map_err(address("addr"))?;
        let prev_run_addr = if wire.prev_run_addr.is_empty() {
            addr.clone()
        } else {
            ResourceInstanceAddr::parse(&wire.prev_run_addr).map_err(address("prev_run_addr"))?
        };
        let deposed_key = DeposedKey::parse_optional(&wire.deposed_key).map_err(address("deposed_key"))?;
        let provider_addr = ProviderConfigAddr::parse(&wire.provider).map_err(address("provider"))?;

        let action = Action::from_code(wire.action)
            .ok_or(ChangeError::UnknownAction { code: wire.action })?;
        let action_reason = ActionReason::from_code(wire.action_reason).ok_or(
            ChangeError::UnknownActionReason {
                code: wire.action_reason,
            },
        )?;

        if action.has_before() != wire.before.is_some() {
            let rule = if action.has_before() { "have a before value" } else { "not have a before value" };
            return Err(ChangeError::ValuesForAction { action, rule });
        }
        if action.has_after() != wire.after.is_some() {
            let rule = if action.has_after() { "have an after value" } else { "not have an after value" };
            return Err(ChangeError::ValuesForAction { action, rule });
        }

        Ok(Self {
            addr,
            prev_run_addr,
            deposed_key,
            provider_addr,
            action,
            action_reason,
            before: wire.before.clone().map(DynamicValue::from),
            after: wire.after.clone().map(DynamicValue::from),
            required_replace: wire.required_replace.clone(),
            private: wire.private.clone(),
        })
    }

    /// Address of the object this change applies to
    #[must_use]
    pub fn object_addr(&self) -> ResourceInstanceObjectAddr {
        ResourceInstanceObjectAddr {
            instance: self.addr.clone(),
            deposed: self.deposed_key.clone(),
        }
    }

    /// Whether the instance moved since the previous run
    #[must_use]
    pub fn is_moved(&self) -> bool {
        self.addr != self.prev_run_addr
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stackplan_log::DynamicValueWire;

    const PROVIDER: &str = r#"provider["registry.terraform.io/hashicorp/null"]"#;

    fn value() -> Option<DynamicValueWire> {
        Some(DynamicValueWire { msgpack: vec![0xc0] })
    }

    fn wire(action: Action) -> ResourceInstanceChangeWire {
        ResourceInstanceChangeWire {
            addr: "null_resource.a[0]".to_string(),
            provider: PROVIDER.to_string(),
            action: action.code(),
            before: if action.has_before() { value() } else { None },
            after: if action.has_after() { value() } else { None },
            ..Default::default()
        }
    }

    #[test]
    fn test_decode_update() {
        let change = ResourceInstanceChange::from_wire(&wire(Action::Update)).unwrap();
        assert_eq!(change.addr.to_string(), "null_resource.a[0]");
        assert_eq!(change.prev_run_addr, change.addr);
        assert!(!change.is_moved());
        assert_eq!(change.deposed_key, None);
        assert_eq!(change.provider_addr.to_string(), PROVIDER);
        assert_eq!(change.action, Action::Update);
        assert_eq!(change.action_reason, ActionReason::None);
        assert!(change.before.is_some() && change.after.is_some());
    }

    #[test]
    fn test_every_action_code() {
        for code in 0..=7 {
            let action = Action::from_code(code).unwrap();
            assert_eq!(action.code(), code);
            assert!(ResourceInstanceChange::from_wire(&wire(action)).is_ok(), "{}", action);
        }
        assert_eq!(Action::from_code(8), None);
    }

    #[test]
    fn test_unknown_codes() {
        let mut w = wire(Action::Update);
        w.action = 42;
        assert_eq!(
            ResourceInstanceChange::from_wire(&w),
            Err(ChangeError::UnknownAction { code: 42 })
        );

        let mut w = wire(Action::Update);
        w.action_reason = 200;
        assert_eq!(
            ResourceInstanceChange::from_wire(&w),
            Err(ChangeError::UnknownActionReason { code: 200 })
        );
    }

    #[test]
    fn test_values_must_fit_action() {
        let mut w = wire(Action::Create);
        w.before = value();
        assert!(matches!(
            ResourceInstanceChange::from_wire(&w),
            Err(ChangeError::ValuesForAction { action: Action::Create, .. })
        ));

        let mut w = wire(Action::Delete);
        w.after = value();
        assert!(matches!(
            ResourceInstanceChange::from_wire(&w),
            Err(ChangeError::ValuesForAction { action: Action::Delete, .. })
        ));

        let mut w = wire(Action::Update);
        w.after = None;
        let err = ResourceInstanceChange::from_wire(&w).unwrap_err();
        assert_eq!(err.to_string(), "update change must have an after value");
    }

    #[test]
    fn test_moved_and_deposed() {
        let mut w = wire(Action::DeleteThenCreate);
        w.prev_run_addr = "null_resource.old".to_string();
        w.deposed_key = "0000beef".to_string();
        w.action_reason = 1;
        let change = ResourceInstanceChange::from_wire(&w).unwrap();
        assert!(change.is_moved());
        assert!(change.action.is_replace());
        assert_eq!(change.action_reason, ActionReason::ReplaceBecauseTainted);
        assert!(change.object_addr().is_deposed());
        assert_eq!(
            change.object_addr().to_string(),
            "null_resource.a[0] deposed object 0000beef"
        );
    }

    #[test]
    fn test_bad_addresses_name_the_field() {
        let mut w = wire(Action::NoOp);
        w.provider = "aws".to_string();
        assert!(matches!(
            ResourceInstanceChange::from_wire(&w),
            Err(ChangeError::Address { field: "provider", .. })
        ));

        let mut w = wire(Action::NoOp);
        w.deposed_key = "x".to_string();
        assert!(matches!(
            ResourceInstanceChange::from_wire(&w),
            Err(ChangeError::Address { field: "deposed_key", .. })
        ));

        let mut w = wire(Action::NoOp);
        w.addr = "just_a_name".to_string();
        assert!(matches!(
            ResourceInstanceChange::from_wire(&w),
            Err(ChangeError::Address { field: "addr", .. })
        ));
    }
}
