//! Plan builder state machine.

use crate::decode::{PlanEntry, ResourceInstanceEntry};
use crate::error::{LoadError, RecordError};
use crate::plan::{Component, Plan};
use stackplan_core::{ComponentInstanceAddr, Timestamp};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BuilderState {
    AwaitingHeader,
    HeaderSeen,
}

/// Folds decoded entries into a [`Plan`]
///
/// Records other than the header are accepted in any state; whether a
/// header was seen is only checked by [`PlanBuilder::finish`].
#[derive(Debug, Clone)]
pub struct PlanBuilder {
    state: BuilderState,
    plan: Plan,
}

impl PlanBuilder {
    /// Create an empty builder
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: BuilderState::AwaitingHeader,
            plan: Plan::default(),
        }
    }

    /// Whether the header has been applied
    #[must_use]
    pub fn header_seen(&self) -> bool {
        self.state == BuilderState::HeaderSeen
    }

    /// Whether a component instance has been announced
    #[must_use]
    pub fn has_component(&self, addr: &ComponentInstanceAddr) -> bool {
        self.plan.components.contains_key(addr)
    }

    /// Apply one decoded entry
    ///
    /// # Errors
    ///
    /// Returns error on a second header, or on a resource instance entry
    /// for a component no earlier entry announced
    pub fn apply(&mut self, entry: PlanEntry) -> Result<(), RecordError> {
        match entry {
            PlanEntry::Header { prev_run_state_raw } => {
                if self.header_seen() {
                    return Err(RecordError::DuplicateHeader);
                }
                self.plan.prev_run_state_raw = prev_run_state_raw;
                self.state = BuilderState::HeaderSeen;
            }
            PlanEntry::Applyable(applyable) => self.plan.applyable = applyable,
            PlanEntry::RootInputValue { variable, value } => {
                self.plan.root_input_values.insert(variable, value);
            }
            PlanEntry::ComponentInstance {
                addr,
                plan_timestamp,
            } => self.announce_component(addr, plan_timestamp),
            PlanEntry::ResourceInstance(entry) => self.record_resource_instance(*entry)?,
        }
        Ok(())
    }

    fn announce_component(&mut self, addr: ComponentInstanceAddr, plan_timestamp: Timestamp) {
        self.plan
            .components
            .entry(addr)
            .and_modify(|component| component.plan_timestamp = plan_timestamp)
            .or_insert_with(|| Component::new(plan_timestamp));
    }

    fn record_resource_instance(&mut self, entry: ResourceInstanceEntry) -> Result<(), RecordError> {
        let ResourceInstanceEntry {
            component,
            object,
            provider,
            change,
            prior_state,
        } = entry;
        let Some(target) = self.plan.components.get_mut(&component) else {
            return Err(RecordError::UnknownComponent { component });
        };

        target
            .resource_instance_provider_config
            .insert(object.clone(), provider);
        if let Some(change) = change {
            target.resource_instance_planned.insert(object.clone(), change);
        }
        target.resource_instance_prior_state.insert(object, prior_state);
        Ok(())
    }

    /// Finish the plan
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::MissingHeader`] if no header was applied
    pub fn finish(self) -> Result<Plan, LoadError> {
        match self.state {
            BuilderState::HeaderSeen => Ok(self.plan),
            BuilderState::AwaitingHeader => Err(LoadError::MissingHeader),
        }
    }
}

impl Default for PlanBuilder {
    fn default() -> Self {
        Self::new()
    }
}
