//! Module, resource, and resource instance object addresses.

use super::deposed::DeposedKey;
use super::traversal::{split_segments, InstanceKey, Segment};
use super::AddrKind;
use crate::error::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// One `module.NAME[KEY]` step
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ModuleInstanceStep {
    /// Module call name
    pub name: String,
    /// Instance key, if the call is repeated
    pub key: Option<InstanceKey>,
}

/// Path of module instances from the root module, empty for the root
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ModuleInstance(pub Vec<ModuleInstanceStep>);

impl ModuleInstance {
    /// The root module
    #[must_use]
    pub const fn root() -> Self {
        Self(Vec::new())
    }

    /// Append a child module instance
    #[must_use]
    pub fn child(mut self, name: impl Into<String>, key: Option<InstanceKey>) -> Self {
        self.0.push(ModuleInstanceStep {
            name: name.into(),
            key,
        });
        self
    }

    /// Whether this is the root module
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// Consume leading `module.NAME[KEY]` segments, returning the rest.
    pub(crate) fn take_prefix(segments: &[Segment]) -> (Self, &[Segment]) {
        let mut steps = Vec::new();
        let mut rest = segments;
        // A trailing `module.x` with nothing after it is left for the caller
        // to reject as a malformed resource.
        while let [kw, name, tail @ ..] = rest {
            if !kw.is_keyword("module") || tail.is_empty() {
                break;
            }
            steps.push(ModuleInstanceStep {
                name: name.name.clone(),
                key: name.key.clone(),
            });
            rest = tail;
        }
        (Self(steps), rest)
    }
}

impl fmt::Display for ModuleInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, step) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            write!(f, "module.{}", step.name)?;
            if let Some(key) = &step.key {
                write!(f, "{}", key)?;
            }
        }
        Ok(())
    }
}

/// Whether a resource is managed or a data source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ResourceMode {
    /// `TYPE.NAME`
    Managed,
    /// `data.TYPE.NAME`
    Data,
}

/// Absolute address of a resource (all of its instances)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ResourceAddr {
    /// Containing module instance
    pub module: ModuleInstance,
    /// Managed or data
    pub mode: ResourceMode,
    /// Resource type, e.g. `aws_instance`
    pub type_name: String,
    /// Resource name
    pub name: String,
}

impl ResourceAddr {
    /// A managed resource in the root module
    #[must_use]
    pub fn managed(type_name: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            module: ModuleInstance::root(),
            mode: ResourceMode::Managed,
            type_name: type_name.into(),
            name: name.into(),
        }
    }

    /// Place the resource in a module instance
    #[must_use]
    pub fn in_module(mut self, module: ModuleInstance) -> Self {
        self.module = module;
        self
    }

    /// Address a single instance of this resource
    #[must_use]
    pub fn instance(self, key: Option<InstanceKey>) -> ResourceInstanceAddr {
        ResourceInstanceAddr {
            resource: self,
            key,
        }
    }

    /// Parse from string
    ///
    /// # Errors
    ///
    /// Returns error if the string is not a resource address or carries an
    /// instance key on the resource name
    pub fn parse(s: &str) -> CoreResult<Self> {
        let (resource, key) = parse_resource(s, AddrKind::Resource)?;
        if key.is_some() {
            return Err(CoreError::invalid_address(
                AddrKind::Resource,
                s,
                "resource address must not have an instance key",
            ));
        }
        Ok(resource)
    }
}

impl fmt::Display for ResourceAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.module.is_root() {
            write!(f, "{}.", self.module)?;
        }
        if self.mode == ResourceMode::Data {
            f.write_str("data.")?;
        }
        write!(f, "{}.{}", self.type_name, self.name)
    }
}

/// Absolute address of one resource instance
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ResourceInstanceAddr {
    /// The resource this is an instance of
    pub resource: ResourceAddr,
    /// Instance key, if the resource is repeated
    pub key: Option<InstanceKey>,
}

impl ResourceInstanceAddr {
    /// Parse from string
    ///
    /// # Errors
    ///
    /// Returns error if the string is not a resource instance address
    pub fn parse(s: &str) -> CoreResult<Self> {
        let (resource, key) = parse_resource(s, AddrKind::ResourceInstance)?;
        Ok(Self { resource, key })
    }

    /// The current (non-deposed) object of this instance
    #[must_use]
    pub fn current_object(self) -> ResourceInstanceObjectAddr {
        ResourceInstanceObjectAddr {
            instance: self,
            deposed: None,
        }
    }

    /// A deposed object of this instance
    #[must_use]
    pub fn deposed_object(self, key: DeposedKey) -> ResourceInstanceObjectAddr {
        ResourceInstanceObjectAddr {
            instance: self,
            deposed: Some(key),
        }
    }
}

impl fmt::Display for ResourceInstanceAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.resource)?;
        if let Some(key) = &self.key {
            write!(f, "{}", key)?;
        }
        Ok(())
    }
}

fn parse_resource(s: &str, kind: AddrKind) -> CoreResult<(ResourceAddr, Option<InstanceKey>)> {
    let invalid = |reason: String| CoreError::invalid_address(kind, s, reason);
    let segments = split_segments(s).map_err(invalid)?;
    let (module, rest) = ModuleInstance::take_prefix(&segments);

    let (mode, rest) = match rest {
        [kw, tail @ ..] if kw.is_keyword("data") && tail.len() == 2 => (ResourceMode::Data, tail),
        _ => (ResourceMode::Managed, rest),
    };

    match rest {
        [type_seg, name_seg] if type_seg.key.is_none() => {
            if mode == ResourceMode::Managed && type_seg.name == "module" {
                return Err(invalid("incomplete module step".to_string()));
            }
            Ok((
                ResourceAddr {
                    module,
                    mode,
                    type_name: type_seg.name.clone(),
                    name: name_seg.name.clone(),
                },
                name_seg.key.clone(),
            ))
        }
        _ => Err(invalid("expected [module.NAME.]...[data.]TYPE.NAME".to_string())),
    }
}

/// Address of one object belonging to a resource instance: either its
/// current object or one of its deposed objects
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ResourceInstanceObjectAddr {
    /// The owning resource instance
    pub instance: ResourceInstanceAddr,
    /// Deposed key, `None` for the current object
    pub deposed: Option<DeposedKey>,
}

impl ResourceInstanceObjectAddr {
    /// Whether this is a deposed object
    #[must_use]
    pub fn is_deposed(&self) -> bool {
        self.deposed.is_some()
    }
}

impl fmt::Display for ResourceInstanceObjectAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.deposed {
            Some(key) => write!(f, "{} deposed object {}", self.instance, key),
            None => write!(f, "{}", self.instance),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_managed_instance() {
        let addr = ResourceInstanceAddr::parse("aws_instance.web").unwrap();
        assert_eq!(addr.resource, ResourceAddr::managed("aws_instance", "web"));
        assert_eq!(addr.key, None);
    }

    #[test]
    fn test_parse_data_in_module() {
        let addr = ResourceInstanceAddr::parse(r#"module.app[1].data.aws_ami.base["x"]"#).unwrap();
        assert_eq!(addr.resource.mode, ResourceMode::Data);
        assert_eq!(
            addr.resource.module,
            ModuleInstance::root().child("app", Some(InstanceKey::Int(1)))
        );
        assert_eq!(addr.resource.type_name, "aws_ami");
        assert_eq!(addr.key, Some(InstanceKey::Str("x".to_string())));
    }

    #[test]
    fn test_resource_named_data() {
        // `data.x` is a managed resource of type `data`, not a data source.
        let addr = ResourceInstanceAddr::parse("data.x").unwrap();
        assert_eq!(addr.resource.mode, ResourceMode::Managed);
        assert_eq!(addr.resource.type_name, "data");
    }

    #[test]
    fn test_display_roundtrip() {
        for s in [
            "r.b",
            "aws_instance.web[0]",
            "data.http.example",
            r#"module.a.module.b["k"].null_resource.x[3]"#,
        ] {
            assert_eq!(ResourceInstanceAddr::parse(s).unwrap().to_string(), s);
        }
    }

    #[test]
    fn test_parse_errors() {
        for bad in ["web", "a.b.c", "module.a", "module.a.b", "a[0].b", "component.a.b.c"] {
            assert!(ResourceInstanceAddr::parse(bad).is_err(), "expected error for {:?}", bad);
        }
    }

    #[test]
    fn test_resource_addr_rejects_key() {
        assert!(ResourceAddr::parse("aws_instance.web").is_ok());
        let err = ResourceAddr::parse("aws_instance.web[0]").unwrap_err();
        assert!(matches!(err, CoreError::InvalidAddress { kind: AddrKind::Resource, .. }));
    }

    #[test]
    fn test_object_addr() {
        let ri = ResourceInstanceAddr::parse("r.b").unwrap();
        let current = ri.clone().current_object();
        let deposed = ri.deposed_object(DeposedKey::parse("0badf00d").unwrap());
        assert!(!current.is_deposed());
        assert!(deposed.is_deposed());
        assert_ne!(current, deposed);
        assert_eq!(current.to_string(), "r.b");
        assert_eq!(deposed.to_string(), "r.b deposed object 0badf00d");
    }

    proptest::proptest! {
        #[test]
        fn prop_display_roundtrip(
            modules in proptest::collection::vec(("[a-z][a-z0-9_]{0,6}", proptest::option::of(0u64..9)), 0..3),
            data in proptest::bool::ANY,
            type_name in "[a-z][a-z0-9_]{0,8}",
            name in "[a-z][a-z0-9_]{0,8}",
            key in proptest::option::of("[a-z0-9 .]{0,6}"),
        ) {
            proptest::prop_assume!(type_name != "module");
            let mut module = ModuleInstance::root();
            for (m, k) in modules {
                module = module.child(m, k.map(InstanceKey::Int));
            }
            let addr = ResourceInstanceAddr {
                resource: ResourceAddr {
                    module,
                    mode: if data { ResourceMode::Data } else { ResourceMode::Managed },
                    type_name,
                    name,
                },
                key: key.map(InstanceKey::Str),
            };
            let parsed = ResourceInstanceAddr::parse(&addr.to_string()).unwrap();
            proptest::prop_assert_eq!(parsed, addr);
        }
    }
}
