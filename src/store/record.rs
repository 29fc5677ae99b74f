//! Records persisted by [`BrokerStore`](crate::store::BrokerStore) implementations.

// self
use crate::{
	_prelude::*,
	model::{
		BindDetails, Binding, BindingId, InstanceId, LastOperation, LastOperationState, Parameters,
		PlanId, ProvisionDetails, ServiceId,
	},
};

/// Lifecycle position of a stored instance.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InstanceState {
	/// Accepted, still being created.
	Provisioning,
	/// Ready for bindings and updates.
	Active,
	/// Plan or configuration change still running.
	Updating,
	/// Deletion still running.
	Deprovisioning,
}
impl InstanceState {
	/// Returns `true` while a transition is outstanding.
	pub const fn is_transitioning(self) -> bool {
		!matches!(self, Self::Active)
	}
}

/// Stored service instance.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct InstanceRecord {
	/// Instance identifier.
	pub id: InstanceId,
	/// Service the instance belongs to.
	pub service_id: ServiceId,
	/// Current plan.
	pub plan_id: PlanId,
	/// Plan an outstanding update moves to; the instance counts against both plans meanwhile.
	#[serde(default)]
	pub pending_plan: Option<PlanId>,
	/// Owning organization.
	pub organization_guid: String,
	/// Owning space.
	pub space_guid: String,
	/// Current service-specific configuration.
	pub parameters: Option<Parameters>,
	/// Dashboard handed out on provisioning.
	pub dashboard_url: Option<Url>,
	/// Lifecycle position.
	pub state: InstanceState,
	/// Monotonic revision used for compare-and-swap.
	pub revision: u64,
	/// Creation instant.
	pub created_at: OffsetDateTime,
	/// Last mutation instant.
	pub updated_at: OffsetDateTime,
}
impl InstanceRecord {
	/// Builds a first-revision record from decoded provision details.
	pub fn from_details(
		id: InstanceId,
		details: ProvisionDetails,
		state: InstanceState,
		now: OffsetDateTime,
	) -> Self {
		Self {
			id,
			service_id: details.service_id,
			plan_id: details.plan_id,
			pending_plan: None,
			organization_guid: details.organization_guid,
			space_guid: details.space_guid,
			parameters: details.parameters,
			dashboard_url: None,
			state,
			revision: 0,
			created_at: now,
			updated_at: now,
		}
	}

	/// Returns `true` if the record was provisioned with exactly these details.
	pub fn matches(&self, details: &ProvisionDetails) -> bool {
		self.service_id == details.service_id
			&& self.plan_id == details.plan_id
			&& self.organization_guid == details.organization_guid
			&& self.space_guid == details.space_guid
			&& self.parameters == details.parameters
	}

	/// Returns `true` if the record occupies a slot on the plan, now or once its update lands.
	pub fn occupies(&self, plan: &PlanId) -> bool {
		&self.plan_id == plan || self.pending_plan.as_ref() == Some(plan)
	}

	/// Copies the record into the next revision with a new state.
	pub fn transition(&self, state: InstanceState, now: OffsetDateTime) -> Self {
		Self { state, revision: self.revision + 1, updated_at: now, ..self.clone() }
	}
}

/// Stored binding.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BindingRecord {
	/// Instance the binding belongs to.
	pub instance_id: InstanceId,
	/// Binding identifier.
	pub binding_id: BindingId,
	/// Request the binding was created from.
	pub details: BindDetails,
	/// Result handed to the platform.
	pub binding: Binding,
	/// Creation instant.
	pub created_at: OffsetDateTime,
}

/// Kind of mutating operation tracked for an instance.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
	/// Instance creation.
	Provision,
	/// Plan or configuration change.
	Update,
	/// Instance deletion.
	Deprovision,
}
impl OperationKind {
	/// Returns a stable label suitable for descriptions and logs.
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Provision => "provision",
			Self::Update => "update",
			Self::Deprovision => "deprovision",
		}
	}
}
impl Display for OperationKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Most recent operation on an instance.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OperationRecord {
	/// Instance the operation targets.
	pub instance_id: InstanceId,
	/// Operation kind.
	pub kind: OperationKind,
	/// Reported state.
	pub state: LastOperationState,
	/// Reported description.
	pub description: String,
	/// Acceptance instant.
	pub started_at: OffsetDateTime,
	/// Instant after which the operation settles.
	pub settles_at: OffsetDateTime,
	/// Terminal instant, once settled.
	pub completed_at: Option<OffsetDateTime>,
	/// Failure description the operation settles with, if it is set to fail.
	pub failure: Option<String>,
	/// Plan an update moves to.
	pub target_plan: Option<PlanId>,
	/// Configuration an update applies.
	pub target_parameters: Option<Parameters>,
}
impl OperationRecord {
	/// Records an operation that already finished successfully.
	pub fn completed(instance_id: InstanceId, kind: OperationKind, now: OffsetDateTime) -> Self {
		Self {
			instance_id,
			kind,
			state: LastOperationState::Succeeded,
			description: format!("The {kind} operation succeeded."),
			started_at: now,
			settles_at: now,
			completed_at: Some(now),
			failure: None,
			target_plan: None,
			target_parameters: None,
		}
	}

	/// Records an accepted operation that settles after `duration`.
	pub fn pending(
		instance_id: InstanceId,
		kind: OperationKind,
		now: OffsetDateTime,
		duration: Duration,
	) -> Self {
		Self {
			instance_id,
			kind,
			state: LastOperationState::InProgress,
			description: format!("The {kind} operation is in progress."),
			started_at: now,
			settles_at: now + duration,
			completed_at: None,
			failure: None,
			target_plan: None,
			target_parameters: None,
		}
	}

	/// Marks the operation to settle as failed with the provided description.
	pub fn with_failure(mut self, failure: Option<String>) -> Self {
		self.failure = failure;

		self
	}

	/// Attaches the plan and configuration an update applies on success.
	pub fn with_target(mut self, plan: Option<PlanId>, parameters: Option<Parameters>) -> Self {
		self.target_plan = plan;
		self.target_parameters = parameters;

		self
	}

	/// Returns `true` while the operation has not reached a terminal state.
	pub fn is_outstanding(&self) -> bool {
		!self.state.is_terminal()
	}

	/// Returns `true` once the clock has passed the settle instant of an outstanding operation.
	pub fn is_due_at(&self, now: OffsetDateTime) -> bool {
		self.is_outstanding() && now >= self.settles_at
	}

	/// Moves the operation into its terminal state.
	///
	/// The operation is recorded as finished at its settle instant even when it is observed later.
	pub fn settle(&mut self, now: OffsetDateTime) {
		match self.failure.as_deref() {
			Some(reason) => {
				self.state = LastOperationState::Failed;
				self.description = reason.to_owned();
			},
			None => {
				self.state = LastOperationState::Succeeded;
				self.description = format!("The {} operation succeeded.", self.kind);
			},
		}

		self.completed_at = Some(self.settles_at.min(now));
	}

	/// Returns `true` once a finished operation is older than `retention` at `now`.
	pub fn is_expired_at(&self, now: OffsetDateTime, retention: Duration) -> bool {
		self.completed_at.is_some_and(|completed_at| now - completed_at > retention)
	}

	/// Status as reported to pollers.
	pub fn last_operation(&self) -> LastOperation {
		LastOperation::new(self.state, self.description.clone())
	}
}
