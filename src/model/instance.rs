//! Request and result shapes for the instance lifecycle (provision, update, deprovision).

// self
use crate::{
	_prelude::*,
	model::{Parameters, PlanId, ServiceId},
};

/// Signals whether a mutating operation continues asynchronously.
///
/// When the flag is set, callers must poll `last_operation` until a terminal state is reported.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IsAsync(pub bool);
impl IsAsync {
	/// The operation finished before the call returned.
	pub const COMPLETED: Self = Self(false);
	/// The operation was accepted and is still running.
	pub const PENDING: Self = Self(true);

	/// Returns the raw flag.
	pub const fn get(self) -> bool {
		self.0
	}
}
impl From<bool> for IsAsync {
	fn from(value: bool) -> Self {
		Self(value)
	}
}

/// Outcome of a provision request.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProvisionedServiceSpec {
	/// Provisioning continues asynchronously; not part of the response body.
	#[serde(skip)]
	pub is_async: bool,
	/// Optional dashboard for the provisioned instance.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub dashboard_url: Option<Url>,
}

/// Typed view over the provision [`Parameters`] understood by the lifecycle broker.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProvisionDetails {
	/// Catalog service to provision.
	pub service_id: ServiceId,
	/// Catalog plan to provision.
	pub plan_id: PlanId,
	/// Platform organization that owns the instance.
	#[serde(default)]
	pub organization_guid: String,
	/// Platform space that owns the instance.
	#[serde(default)]
	pub space_guid: String,
	/// Service-specific configuration.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub parameters: Option<Parameters>,
}

/// Context supplied with a deprovision request.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeprovisionDetails {
	/// Plan the instance was provisioned with.
	pub plan_id: PlanId,
	/// Service the instance belongs to.
	pub service_id: ServiceId,
}

/// Snapshot of an instance before an update, used to compute migration deltas.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreviousValues {
	/// Plan prior to the update.
	pub plan_id: PlanId,
	/// Service prior to the update.
	pub service_id: ServiceId,
	/// Organization prior to the update.
	#[serde(rename = "organization_id", default)]
	pub org_id: String,
	/// Space prior to the update.
	#[serde(default)]
	pub space_id: String,
}

/// Typed view over the update [`Parameters`] understood by the lifecycle broker.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UpdateDetails {
	/// Service the instance belongs to.
	pub service_id: ServiceId,
	/// Target plan; `None` keeps the current plan.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub plan_id: Option<PlanId>,
	/// Service-specific configuration changes.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub parameters: Option<Parameters>,
	/// Instance values prior to the update.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub previous_values: Option<PreviousValues>,
}
