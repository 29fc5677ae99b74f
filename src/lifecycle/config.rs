//! Serde-loadable settings for the lifecycle broker.

// self
use crate::{
	_prelude::*,
	catalog::{Catalog, CatalogError},
	model::{InstanceId, PlanId, ServiceId},
};

/// How a plan completes mutating operations.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AsyncMode {
	/// Always completes before the call returns.
	#[default]
	Never,
	/// Completes asynchronously when the caller allows it, synchronously otherwise.
	Optional,
	/// Can only complete asynchronously.
	Required,
}
impl AsyncMode {
	/// Decides whether an operation runs asynchronously for the caller's capability.
	pub fn resolve(self, async_allowed: bool) -> Result<bool> {
		match self {
			Self::Never => Ok(false),
			Self::Optional => Ok(async_allowed),
			Self::Required if async_allowed => Ok(true),
			Self::Required => Err(Error::AsyncRequired),
		}
	}
}

/// Duplicate-create handling for instance and binding identifiers.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdempotencyPolicy {
	/// Every duplicate fails with the matching "already exists" error.
	#[default]
	Reject,
	/// A duplicate with identical details replays the original result.
	ReplayIdentical,
}

/// Behavior of a single catalog plan.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlanSettings {
	/// Completion mode of provision, update, and deprovision.
	pub async_mode: AsyncMode,
	/// Time an asynchronous operation takes to settle.
	#[serde(with = "duration_secs")]
	pub operation_duration: Duration,
	/// Maximum number of instances on this plan.
	pub quota: Option<usize>,
	/// When set, asynchronous operations on this plan settle as failed with this description.
	pub failure: Option<String>,
}
impl PlanSettings {
	/// Creates settings with the provided completion mode and an immediate settle time.
	pub fn new(async_mode: AsyncMode) -> Self {
		Self { async_mode, ..Default::default() }
	}

	/// Overrides the settle time; negative values clamp to zero.
	pub fn with_operation_duration(mut self, duration: Duration) -> Self {
		self.operation_duration = if duration.is_negative() { Duration::ZERO } else { duration };

		self
	}

	/// Caps the number of instances on the plan.
	pub fn with_quota(mut self, quota: usize) -> Self {
		self.quota = Some(quota);

		self
	}

	/// Makes asynchronous operations on the plan settle as failed.
	pub fn with_failure(mut self, description: impl Into<String>) -> Self {
		self.failure = Some(description.into());

		self
	}
}

/// Settings consumed by [`LifecycleBroker`](crate::lifecycle::LifecycleBroker).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LifecycleConfig {
	/// Per-plan behavior; plans without an entry use [`PlanSettings::default`].
	pub plans: HashMap<PlanId, PlanSettings>,
	/// Per-service instance ceilings.
	pub instance_limits: HashMap<ServiceId, usize>,
	/// Duplicate-create handling.
	pub idempotency: IdempotencyPolicy,
	/// How long a settled operation stays queryable after its instance is gone.
	#[serde(with = "duration_secs")]
	pub operation_retention: Duration,
	/// Base URL instance dashboards are derived from.
	pub dashboard_base: Option<Url>,
}
impl LifecycleConfig {
	const DEFAULT_OPERATION_RETENTION: Duration = Duration::minutes(5);

	/// Registers settings for a plan.
	pub fn with_plan(mut self, plan: PlanId, settings: PlanSettings) -> Self {
		self.plans.insert(plan, settings);

		self
	}

	/// Caps the number of instances of a service.
	pub fn with_instance_limit(mut self, service: ServiceId, limit: usize) -> Self {
		self.instance_limits.insert(service, limit);

		self
	}

	/// Overrides the duplicate-create handling.
	pub fn with_idempotency(mut self, policy: IdempotencyPolicy) -> Self {
		self.idempotency = policy;

		self
	}

	/// Overrides the retention of settled operations (defaults to five minutes).
	pub fn with_operation_retention(mut self, retention: Duration) -> Self {
		self.operation_retention = if retention.is_negative() { Duration::ZERO } else { retention };

		self
	}

	/// Sets the base URL instance dashboards are derived from.
	pub fn with_dashboard_base(mut self, base: Url) -> Self {
		self.dashboard_base = Some(base);

		self
	}

	/// Settings for a plan, falling back to synchronous defaults.
	pub fn plan(&self, plan: &PlanId) -> PlanSettings {
		self.plans.get(plan).cloned().unwrap_or_default()
	}

	/// Dashboard URL for an instance, if a base is configured.
	///
	/// The identifier becomes a single percent-encoded segment under `instances/`.
	pub fn dashboard_url(&self, instance: &InstanceId) -> Result<Option<Url>> {
		let Some(base) = &self.dashboard_base else {
			return Ok(None);
		};
		let mut url = base
			.join("instances/")
			.map_err(|e| Error::internal("Dashboard URL could not be derived", e))?;

		url.path_segments_mut()
			.map_err(|_| Error::Internal {
				message: format!("Dashboard base `{base}` cannot carry path segments"),
				source: None,
			})?
			.pop_if_empty()
			.push(instance);

		Ok(Some(url))
	}

	/// Ensures every configured plan and service exists in the catalog.
	pub fn validate(&self, catalog: &Catalog) -> Result<(), CatalogError> {
		for plan in self.plans.keys() {
			if !catalog.services().iter().any(|service| service.plan(plan).is_some()) {
				return Err(CatalogError::OrphanedSettings { plan: plan.to_string() });
			}
		}
		for service in self.instance_limits.keys() {
			if catalog.service(service).is_none() {
				return Err(CatalogError::UnknownService { service: service.to_string() });
			}
		}

		Ok(())
	}
}
impl Default for LifecycleConfig {
	fn default() -> Self {
		Self {
			plans: HashMap::new(),
			instance_limits: HashMap::new(),
			idempotency: IdempotencyPolicy::default(),
			operation_retention: Self::DEFAULT_OPERATION_RETENTION,
			dashboard_base: None,
		}
	}
}

mod duration_secs {
	// crates.io
	use serde::{Deserializer, Serializer};
	// self
	use crate::_prelude::*;

	pub fn serialize<S>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		serializer.serialize_i64(value.whole_seconds())
	}

	pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
	where
		D: Deserializer<'de>,
	{
		let secs = i64::deserialize(deserializer)?;

		Ok(Duration::seconds(secs.max(0)))
	}
}
