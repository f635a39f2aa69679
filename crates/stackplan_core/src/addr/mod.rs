//! Address grammars for stack plans.
//!
//! Every address is written as a dot-separated traversal where each name may
//! carry a bracketed instance key, for example
//! `stack.net["eu"].component.vpc[0]` or
//! `module.app.aws_instance.web["blue"]`. Each address type implements
//! `Display` so that `parse(addr.to_string()) == addr`.

mod component;
mod deposed;
mod provider;
mod resource;
mod traversal;

pub use component::{ComponentInstanceAddr, StackInstanceStep};
pub use deposed::DeposedKey;
pub use provider::{Provider, ProviderConfigAddr};
pub use resource::{
    ModuleInstance, ModuleInstanceStep, ResourceAddr, ResourceInstanceAddr,
    ResourceInstanceObjectAddr, ResourceMode,
};
pub use traversal::InstanceKey;

use serde::{Deserialize, Serialize};
use std::fmt;

/// The address grammars a string can be parsed against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AddrKind {
    /// `stack.a.component.b[0]`
    ComponentInstance,
    /// `module.m.aws_instance.x`
    Resource,
    /// `module.m[0].aws_instance.x["k"]`
    ResourceInstance,
    /// `provider["registry.example.com/ns/type"].alias`
    ProviderConfig,
}

impl AddrKind {
    /// Human-readable name of the grammar
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::ComponentInstance => "component instance",
            Self::Resource => "resource",
            Self::ResourceInstance => "resource instance",
            Self::ProviderConfig => "provider configuration",
        }
    }
}

impl fmt::Display for AddrKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A root input variable of a stack
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct InputVariable {
    /// Variable name
    pub name: String,
}

impl InputVariable {
    /// Create a new input variable address
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl fmt::Display for InputVariable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "var.{}", self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_variable_display() {
        assert_eq!(InputVariable::new("region").to_string(), "var.region");
    }

    #[test]
    fn test_addr_kind_display() {
        assert_eq!(AddrKind::ProviderConfig.to_string(), "provider configuration");
    }
}
