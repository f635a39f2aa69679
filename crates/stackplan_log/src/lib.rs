//! STACKPLAN Record Log
//!
//! A persisted plan is an ordered sequence of self-describing records.
//! Each record is a [`RawRecord`] envelope: a type identifier plus a
//! canonically encoded payload. The [`registry`] resolves envelopes into
//! the closed [`Record`] sum type, and [`stream`] frames a record
//! sequence as a plan file.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod encoding;
pub mod envelope;
pub mod records;
pub mod registry;
pub mod stream;

pub use encoding::{CanonicalDecode, CanonicalEncode, DecodeError, EncodeError};
pub use envelope::RawRecord;
pub use records::{
    DynamicValueWire, PlanApplyable, PlanComponentInstance, PlanHeader,
    PlanResourceInstanceChangePlanned, PlanRootInputValue, Record, RecordMessage,
    ResourceInstanceChangeWire, ResourceInstanceObjectWire,
};
pub use registry::{registry, RecordRegistry, RegistryError};
pub use stream::{PlanFileReader, PlanFileWriter, StreamError};
