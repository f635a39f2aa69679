//! STACKPLAN Plan Replay
//!
//! Reconstructs an in-memory [`Plan`] from the ordered records a planning
//! run persisted. Every record is resolved, decoded, cross-checked, and
//! folded into a [`PlanBuilder`] in a single forward pass. Any failure
//! aborts the whole load; a caller never sees a partially built plan.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod builder;
pub mod config;
pub mod consistency;
pub mod decode;
pub mod error;
pub mod loader;
pub mod plan;

pub use builder::PlanBuilder;
pub use config::LoadConfig;
pub use consistency::{check_change_consistency, ChangeTarget, Inconsistency};
pub use decode::{decode_record, resolve, PlanEntry, ResourceInstanceEntry};
pub use error::{LoadError, RecordError};
pub use loader::{load_from_records, PlanLoader};
pub use plan::{Component, Plan};
