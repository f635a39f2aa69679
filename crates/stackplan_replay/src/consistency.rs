//! Reconciliation of fields a change record carries twice.
//!
//! A resource instance change record names its object and provider
//! configuration, and so does the nested change it wraps. A correct writer
//! keeps both copies identical. When they differ the record is rejected;
//! neither copy is preferred.

use stackplan_core::{DeposedKey, ProviderConfigAddr, ResourceInstanceAddr, ResourceInstanceObjectAddr};
use stackplan_plans::ResourceInstanceChange;
use thiserror::Error;

/// The object and provider configuration one side of a record names
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeTarget {
    /// Resource instance object
    pub object: ResourceInstanceObjectAddr,
    /// Provider configuration responsible for it
    pub provider: ProviderConfigAddr,
}

impl ChangeTarget {
    /// Create a target
    #[must_use]
    pub fn new(object: ResourceInstanceObjectAddr, provider: ProviderConfigAddr) -> Self {
        Self { object, provider }
    }

    /// The target a nested change names
    #[must_use]
    pub fn of_change(change: &ResourceInstanceChange) -> Self {
        Self::new(change.object_addr(), change.provider_addr.clone())
    }
}

/// How the two copies disagree
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Inconsistency {
    /// Different resource instances
    #[error("planned change for {outer} describes resource instance {inner}")]
    ResourceInstance {
        /// Address on the record
        outer: ResourceInstanceAddr,
        /// Address inside the change
        inner: ResourceInstanceAddr,
    },
    /// Same instance, different objects
    #[error(
        "planned change for {instance} describes {}, but the record describes {}",
        object_name(.inner),
        object_name(.outer)
    )]
    DeposedKey {
        /// The resource instance
        instance: ResourceInstanceAddr,
        /// Deposed key on the record
        outer: Option<DeposedKey>,
        /// Deposed key inside the change
        inner: Option<DeposedKey>,
    },
    /// Different provider configurations
    #[error("planned change for {object} uses provider configuration {inner}, but the record names {outer}")]
    ProviderConfig {
        /// The object
        object: ResourceInstanceObjectAddr,
        /// Provider configuration on the record
        outer: ProviderConfigAddr,
        /// Provider configuration inside the change
        inner: ProviderConfigAddr,
    },
}

fn object_name(key: &Option<DeposedKey>) -> String {
    match key {
        Some(key) => format!("deposed object {}", key),
        None => "the current object".to_string(),
    }
}

/// Check that a record and its nested change name the same target
///
/// # Errors
///
/// Returns the first field that differs, checking the resource instance,
/// then the deposed key, then the provider configuration
pub fn check_change_consistency(outer: &ChangeTarget, inner: &ChangeTarget) -> Result<(), Inconsistency> {
    if outer.object.instance != inner.object.instance {
        return Err(Inconsistency::ResourceInstance {
            outer: outer.object.instance.clone(),
            inner: inner.object.instance.clone(),
        });
    }
    if outer.object.deposed != inner.object.deposed {
        return Err(Inconsistency::DeposedKey {
            instance: outer.object.instance.clone(),
            outer: outer.object.deposed.clone(),
            inner: inner.object.deposed.clone(),
        });
    }
    if outer.provider != inner.provider {
        return Err(Inconsistency::ProviderConfig {
            object: outer.object.clone(),
            outer: outer.provider.clone(),
            inner: inner.provider.clone(),
        });
    }
    Ok(())
}
