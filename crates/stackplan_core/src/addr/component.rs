//! Component instance addresses.

use super::traversal::{split_segments, InstanceKey, Segment};
use super::AddrKind;
use crate::error::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// One `stack.NAME[KEY]` step leading to a nested stack instance
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StackInstanceStep {
    /// Embedded stack call name
    pub name: String,
    /// Instance key, if the call is repeated
    pub key: Option<InstanceKey>,
}

/// Absolute address of one component instance within a stack
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ComponentInstanceAddr {
    /// Path of embedded stack instances, empty for the root stack
    pub stack: Vec<StackInstanceStep>,
    /// Component name
    pub component: String,
    /// Instance key, if the component is repeated
    pub key: Option<InstanceKey>,
}

impl ComponentInstanceAddr {
    /// Address of a single-instance component in the root stack
    #[must_use]
    pub fn root(component: impl Into<String>) -> Self {
        Self {
            stack: Vec::new(),
            component: component.into(),
            key: None,
        }
    }

    /// Set the instance key
    #[must_use]
    pub fn with_key(mut self, key: InstanceKey) -> Self {
        self.key = Some(key);
        self
    }

    /// Parse from string
    ///
    /// # Errors
    ///
    /// Returns error if the string is not a component instance address
    pub fn parse(s: &str) -> CoreResult<Self> {
        let invalid = |reason: String| CoreError::invalid_address(AddrKind::ComponentInstance, s, reason);
        let segments = split_segments(s).map_err(invalid)?;

        let mut stack = Vec::new();
        let mut rest: &[Segment] = &segments;
        loop {
            match rest {
                [kw, name, tail @ ..] if kw.is_keyword("stack") => {
                    stack.push(StackInstanceStep {
                        name: name.name.clone(),
                        key: name.key.clone(),
                    });
                    rest = tail;
                }
                [kw, name] if kw.is_keyword("component") => {
                    return Ok(Self {
                        stack,
                        component: name.name.clone(),
                        key: name.key.clone(),
                    });
                }
                _ => {
                    return Err(invalid(
                        "expected stack.NAME steps followed by component.NAME".to_string(),
                    ));
                }
            }
        }
    }

    /// Whether this component belongs to the root stack
    #[must_use]
    pub fn in_root_stack(&self) -> bool {
        self.stack.is_empty()
    }
}

impl fmt::Display for ComponentInstanceAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for step in &self.stack {
            write!(f, "stack.{}", step.name)?;
            if let Some(key) = &step.key {
                write!(f, "{}", key)?;
            }
            f.write_str(".")?;
        }
        write!(f, "component.{}", self.component)?;
        if let Some(key) = &self.key {
            write!(f, "{}", key)?;
        }
        Ok(())
    }
}
