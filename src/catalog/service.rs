//! Service offerings and plans advertised by a broker.

// self
use crate::{
	_prelude::*,
	model::{PlanId, ServiceId},
};

/// Named tier of a service that determines capabilities and quotas.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ServicePlan {
	/// Plan identifier, unique across the catalog.
	pub id: PlanId,
	/// CLI-friendly plan name.
	pub name: String,
	/// Short description shown to platform users.
	pub description: String,
	/// Whether the plan is free of charge.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub free: Option<bool>,
	/// Opaque display metadata.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub metadata: Option<Value>,
}
impl ServicePlan {
	/// Creates a plan with no metadata.
	pub fn new(id: PlanId, name: impl Into<String>, description: impl Into<String>) -> Self {
		Self { id, name: name.into(), description: description.into(), free: None, metadata: None }
	}

	/// Marks the plan as free or paid.
	pub fn free(mut self, free: bool) -> Self {
		self.free = Some(free);

		self
	}

	/// Attaches display metadata.
	pub fn with_metadata(mut self, metadata: Value) -> Self {
		self.metadata = Some(metadata);

		self
	}
}

/// Service offering listed in the catalog.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Service {
	/// Service identifier, unique across the catalog.
	pub id: ServiceId,
	/// CLI-friendly service name.
	pub name: String,
	/// Short description shown to platform users.
	pub description: String,
	/// Whether instances of this service can be bound.
	#[serde(default)]
	pub bindable: bool,
	/// Whether instances may move between plans.
	#[serde(default)]
	pub plan_updateable: bool,
	/// Free-form tags.
	#[serde(default, skip_serializing_if = "Vec::is_empty")]
	pub tags: Vec<String>,
	/// Platform permissions the service needs (`syslog_drain`, `route_forwarding`, ...).
	#[serde(default, skip_serializing_if = "Vec::is_empty")]
	pub requires: Vec<String>,
	/// Opaque display metadata.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub metadata: Option<Value>,
	/// Plans offered for this service.
	pub plans: Vec<ServicePlan>,
}
impl Service {
	/// Permission that lets bindings declare a syslog drain.
	pub const REQUIRES_SYSLOG_DRAIN: &'static str = "syslog_drain";
	/// Permission that lets route bindings declare a route service.
	pub const REQUIRES_ROUTE_FORWARDING: &'static str = "route_forwarding";

	/// Creates a non-bindable, non-updateable service without plans.
	pub fn new(id: ServiceId, name: impl Into<String>, description: impl Into<String>) -> Self {
		Self {
			id,
			name: name.into(),
			description: description.into(),
			bindable: false,
			plan_updateable: false,
			tags: Vec::new(),
			requires: Vec::new(),
			metadata: None,
			plans: Vec::new(),
		}
	}

	/// Sets the bindable flag.
	pub fn bindable(mut self, bindable: bool) -> Self {
		self.bindable = bindable;

		self
	}

	/// Sets the plan-updateable flag.
	pub fn plan_updateable(mut self, plan_updateable: bool) -> Self {
		self.plan_updateable = plan_updateable;

		self
	}

	/// Appends a tag.
	pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
		self.tags.push(tag.into());

		self
	}

	/// Appends a required platform permission.
	pub fn with_requirement(mut self, requirement: impl Into<String>) -> Self {
		self.requires.push(requirement.into());

		self
	}

	/// Attaches display metadata.
	pub fn with_metadata(mut self, metadata: Value) -> Self {
		self.metadata = Some(metadata);

		self
	}

	/// Appends a plan.
	pub fn with_plan(mut self, plan: ServicePlan) -> Self {
		self.plans.push(plan);

		self
	}

	/// Looks up a plan of this service.
	pub fn plan(&self, id: &PlanId) -> Option<&ServicePlan> {
		self.plans.iter().find(|plan| &plan.id == id)
	}

	/// Returns `true` if the service declares the provided permission.
	pub fn requires(&self, permission: &str) -> bool {
		self.requires.iter().any(|r| r == permission)
	}
}
