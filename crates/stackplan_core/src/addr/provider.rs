//! Provider configuration addresses.

use super::traversal::{is_identifier, split_segments, InstanceKey, Segment};
use super::AddrKind;
use crate::error::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Fully-qualified provider source address, `HOSTNAME/NAMESPACE/TYPE`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Provider {
    /// Registry hostname
    pub hostname: String,
    /// Registry namespace
    pub namespace: String,
    /// Provider type, e.g. `aws`
    pub type_name: String,
}

impl Provider {
    /// Create a provider source address
    #[must_use]
    pub fn new(
        hostname: impl Into<String>,
        namespace: impl Into<String>,
        type_name: impl Into<String>,
    ) -> Self {
        Self {
            hostname: hostname.into(),
            namespace: namespace.into(),
            type_name: type_name.into(),
        }
    }

    fn parse_fqn(s: &str) -> Result<Self, String> {
        let parts: Vec<&str> = s.split('/').collect();
        match parts.as_slice() {
            [hostname, namespace, type_name]
                if !hostname.is_empty()
                    && !hostname.contains(char::is_whitespace)
                    && is_identifier(namespace)
                    && is_identifier(type_name) =>
            {
                Ok(Self::new(*hostname, *namespace, *type_name))
            }
            _ => Err(format!("invalid provider source {:?}, expected HOSTNAME/NAMESPACE/TYPE", s)),
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.hostname, self.namespace, self.type_name)
    }
}

/// Absolute address of a provider configuration
///
/// Provider configurations live in modules, never in module instances, so
/// the module path carries no instance keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ProviderConfigAddr {
    /// Module path from the root module
    pub module: Vec<String>,
    /// Provider source
    pub provider: Provider,
    /// Configuration alias, `None` for the default configuration
    pub alias: Option<String>,
}

impl ProviderConfigAddr {
    /// Default configuration of a provider in the root module
    #[must_use]
    pub fn root(provider: Provider) -> Self {
        Self {
            module: Vec::new(),
            provider,
            alias: None,
        }
    }

    /// Set the alias
    #[must_use]
    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    /// Parse from string
    ///
    /// # Errors
    ///
    /// Returns error if the string is not a provider configuration address
    pub fn parse(s: &str) -> CoreResult<Self> {
        let invalid = |reason: String| CoreError::invalid_address(AddrKind::ProviderConfig, s, reason);
        let segments = split_segments(s).map_err(invalid)?;

        let mut module = Vec::new();
        let mut rest: &[Segment] = &segments;
        while let [kw, name, tail @ ..] = rest {
            if !kw.is_keyword("module") {
                break;
            }
            if name.key.is_some() {
                return Err(invalid(
                    "provider configurations cannot belong to module instances".to_string(),
                ));
            }
            module.push(name.name.clone());
            rest = tail;
        }

        let (provider_seg, alias) = match rest {
            [provider] => (provider, None),
            [provider, alias] if alias.key.is_none() => (provider, Some(alias.name.clone())),
            _ => return Err(invalid("expected provider[\"SOURCE\"] with optional .ALIAS".to_string())),
        };
        let provider = match (&provider_seg.name[..], &provider_seg.key) {
            ("provider", Some(InstanceKey::Str(fqn))) => Provider::parse_fqn(fqn).map_err(invalid)?,
            _ => return Err(invalid("expected provider[\"SOURCE\"]".to_string())),
        };

        Ok(Self {
            module,
            provider,
            alias,
        })
    }
}

impl fmt::Display for ProviderConfigAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for name in &self.module {
            write!(f, "module.{}.", name)?;
        }
        write!(f, "provider{}", InstanceKey::Str(self.provider.to_string()))?;
        if let Some(alias) = &self.alias {
            write!(f, ".{}", alias)?;
        }
        Ok(())
    }
}
