//! Reconstructed plan model.
//!
//! Plans are only constructed by [`crate::PlanBuilder`] and are read-only
//! afterwards.

use indexmap::IndexMap;
use stackplan_core::{ComponentInstanceAddr, InputVariable, ProviderConfigAddr, ResourceInstanceObjectAddr, Timestamp};
use stackplan_plans::{ResourceInstanceChange, ResourceInstanceObject, Value};

/// A plan covering one or more component instances
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Plan {
    pub(crate) applyable: bool,
    pub(crate) prev_run_state_raw: Vec<u8>,
    pub(crate) root_input_values: IndexMap<InputVariable, Value>,
    pub(crate) components: IndexMap<ComponentInstanceAddr, Component>,
}

impl Plan {
    /// Whether the plan is safe to apply
    #[must_use]
    pub fn applyable(&self) -> bool {
        self.applyable
    }

    /// State snapshot the plan was computed against, unparsed
    #[must_use]
    pub fn prev_run_state_raw(&self) -> &[u8] {
        &self.prev_run_state_raw
    }

    /// Root input values by variable
    #[must_use]
    pub fn root_input_values(&self) -> &IndexMap<InputVariable, Value> {
        &self.root_input_values
    }

    /// One root input value
    #[must_use]
    pub fn root_input_value(&self, variable: &InputVariable) -> Option<&Value> {
        self.root_input_values.get(variable)
    }

    /// Components in the order they were announced
    #[must_use]
    pub fn components(&self) -> &IndexMap<ComponentInstanceAddr, Component> {
        &self.components
    }

    /// One component
    #[must_use]
    pub fn component(&self, addr: &ComponentInstanceAddr) -> Option<&Component> {
        self.components.get(addr)
    }
}

/// The planned part of one component instance
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Component {
    pub(crate) plan_timestamp: Timestamp,
    pub(crate) resource_instance_planned: IndexMap<ResourceInstanceObjectAddr, ResourceInstanceChange>,
    pub(crate) resource_instance_prior_state: IndexMap<ResourceInstanceObjectAddr, Option<ResourceInstanceObject>>,
    pub(crate) resource_instance_provider_config: IndexMap<ResourceInstanceObjectAddr, ProviderConfigAddr>,
}

impl Component {
    pub(crate) fn new(plan_timestamp: Timestamp) -> Self {
        Self {
            plan_timestamp,
            resource_instance_planned: IndexMap::new(),
            resource_instance_prior_state: IndexMap::new(),
            resource_instance_provider_config: IndexMap::new(),
        }
    }

    /// When the component was planned
    #[must_use]
    pub fn plan_timestamp(&self) -> Timestamp {
        self.plan_timestamp
    }

    /// Planned changes by object
    #[must_use]
    pub fn planned_changes(&self) -> &IndexMap<ResourceInstanceObjectAddr, ResourceInstanceChange> {
        &self.resource_instance_planned
    }

    /// Planned change for one object
    #[must_use]
    pub fn planned_change(&self, object: &ResourceInstanceObjectAddr) -> Option<&ResourceInstanceChange> {
        self.resource_instance_planned.get(object)
    }

    /// Prior states by object; `None` values mean the object is known to
    /// have no prior state
    #[must_use]
    pub fn prior_states(&self) -> &IndexMap<ResourceInstanceObjectAddr, Option<ResourceInstanceObject>> {
        &self.resource_instance_prior_state
    }

    /// Prior state for one object
    ///
    /// The outer `Option` is whether the object was recorded at all, the
    /// inner one whether it has a prior state.
    #[must_use]
    pub fn prior_state(&self, object: &ResourceInstanceObjectAddr) -> Option<Option<&ResourceInstanceObject>> {
        self.resource_instance_prior_state.get(object).map(Option::as_ref)
    }

    /// Provider configurations by object
    #[must_use]
    pub fn provider_configs(&self) -> &IndexMap<ResourceInstanceObjectAddr, ProviderConfigAddr> {
        &self.resource_instance_provider_config
    }

    /// Provider configuration for one object
    #[must_use]
    pub fn provider_config(&self, object: &ResourceInstanceObjectAddr) -> Option<&ProviderConfigAddr> {
        self.resource_instance_provider_config.get(object)
    }

    /// Every object the component's records mentioned
    pub fn objects(&self) -> impl Iterator<Item = &ResourceInstanceObjectAddr> {
        self.resource_instance_provider_config.keys()
    }
}
