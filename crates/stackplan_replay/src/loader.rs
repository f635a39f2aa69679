//! Plan loader.
//!
//! Replays a record sequence once, in order: resolve each envelope, decode
//! it, and fold it into a [`PlanBuilder`]. The first failure aborts the
//! load.

use crate::builder::PlanBuilder;
use crate::config::LoadConfig;
use crate::decode::{decode_record, resolve};
use crate::error::{LoadError, RecordError};
use crate::plan::Plan;
use stackplan_log::RawRecord;
use tracing::{debug, info, warn};

/// Loads plans from record sequences
#[derive(Debug, Clone, Default)]
pub struct PlanLoader {
    config: LoadConfig,
}

impl PlanLoader {
    /// Create a loader for this build
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a custom config
    #[must_use]
    pub fn with_config(mut self, config: LoadConfig) -> Self {
        self.config = config;
        self
    }

    /// Active configuration
    #[must_use]
    pub fn config(&self) -> &LoadConfig {
        &self.config
    }

    /// Reconstruct a plan
    ///
    /// # Errors
    ///
    /// Returns the first record that fails, [`LoadError::MissingHeader`] if
    /// no header was found, or [`LoadError::TooManyRecords`] if the
    /// sequence exceeds the configured limit
    pub fn load(&self, records: &[RawRecord]) -> Result<Plan, LoadError> {
        if self.config.exceeds_limit(records.len()) {
            warn!(
                count = records.len(),
                limit = self.config.max_records,
                "plan record limit exceeded"
            );
            return Err(LoadError::TooManyRecords {
                limit: self.config.max_records,
                count: records.len(),
            });
        }

        let mut builder = PlanBuilder::new();
        for (index, raw) in records.iter().enumerate() {
            self.replay_record(&mut builder, index, raw).map_err(|source| {
                warn!(index, type_id = %raw.type_id, error = %source, "plan record rejected");
                LoadError::Record { index, source }
            })?;
        }

        let plan = builder.finish().inspect_err(|_| {
            warn!(records = records.len(), "plan has no header");
        })?;
        info!(
            records = records.len(),
            components = plan.components().len(),
            applyable = plan.applyable(),
            "plan loaded"
        );
        Ok(plan)
    }

    fn replay_record(
        &self,
        builder: &mut PlanBuilder,
        index: usize,
        raw: &RawRecord,
    ) -> Result<(), RecordError> {
        let record = resolve(raw)?;
        debug!(index, kind = record.kind_name(), "replaying plan record");
        let entry = decode_record(record, &self.config.running_version, builder)?;
        builder.apply(entry)
    }
}

/// Reconstruct a plan with the default configuration
///
/// # Errors
///
/// See [`PlanLoader::load`]
pub fn load_from_records(records: &[RawRecord]) -> Result<Plan, LoadError> {
    PlanLoader::new().load(records)
}
