//! STACKPLAN Core Types
//!
//! This crate contains pure types and logic with no I/O: the address
//! grammars used throughout a stack plan, the running program version,
//! and plan timestamps.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod addr;
pub mod error;
pub mod time;
pub mod version;

// Re-exports
pub use addr::{
    AddrKind, ComponentInstanceAddr, DeposedKey, InputVariable, InstanceKey, ModuleInstance,
    Provider, ProviderConfigAddr, ResourceAddr, ResourceInstanceAddr, ResourceInstanceObjectAddr,
    ResourceMode,
};
pub use error::{CoreError, CoreResult};
pub use time::Timestamp;
pub use version::{Version, VersionError};
