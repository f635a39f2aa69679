//! Load configuration.

use serde::{Deserialize, Serialize};
use stackplan_core::version::{self, Version};

/// Plan load configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoadConfig {
    /// Version a plan must have been created by
    pub running_version: Version,
    /// Maximum records accepted (0 = unlimited)
    pub max_records: usize,
}

impl Default for LoadConfig {
    fn default() -> Self {
        Self {
            running_version: version::running(),
            max_records: 0,
        }
    }
}

impl LoadConfig {
    /// Configuration for this build
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Accept plans created by a different version
    #[must_use]
    pub fn with_running_version(mut self, version: Version) -> Self {
        self.running_version = version;
        self
    }

    /// Limit the number of records
    #[must_use]
    pub fn with_max_records(mut self, max_records: usize) -> Self {
        self.max_records = max_records;
        self
    }

    /// Whether `count` records exceed the limit
    #[must_use]
    pub fn exceeds_limit(&self, count: usize) -> bool {
        self.max_records > 0 && count > self.max_records
    }
}
