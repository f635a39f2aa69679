//! STACKPLAN Plan Payloads
//!
//! Decoders for the nested payloads a plan record carries: dynamic values
//! in their MessagePack form, planned resource instance changes, and the
//! prior state of resource instance objects.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod change;
pub mod state;
pub mod value;

pub use change::{Action, ActionReason, ChangeError, ResourceInstanceChange};
pub use state::{ObjectStatus, ResourceInstanceObject, StateError};
pub use value::{DynamicValue, Value, ValueError, ValueType};
