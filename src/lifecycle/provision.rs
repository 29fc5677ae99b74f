//! Instance creation.

// self
use crate::{
	_prelude::*,
	lifecycle::{IdempotencyPolicy, LifecycleBroker},
	model::{self, InstanceId, Parameters, ProvisionDetails, ProvisionedServiceSpec},
	store::{InsertOutcome, InstanceRecord, InstanceState, OperationKind},
};

impl LifecycleBroker {
	pub(super) async fn provision_instance(
		&self,
		instance_id: &InstanceId,
		params: Parameters,
		async_allowed: bool,
	) -> Result<ProvisionedServiceSpec> {
		let details: ProvisionDetails = model::decode_parameters(&params)?;
		let _lock = self.lock_instance(instance_id).await;

		self.settle_due(instance_id).await?;

		if let Some(existing) = self.store.fetch_instance(instance_id).await? {
			return self.replay_provision(&existing, &details);
		}

		let (service, _) = self.catalog.resolve(&details.service_id, &details.plan_id)?;
		let settings = self.config.plan(&details.plan_id);
		let is_async = settings.async_mode.resolve(async_allowed)?;
		let state = if is_async { InstanceState::Provisioning } else { InstanceState::Active };
		let mut record =
			InstanceRecord::from_details(instance_id.clone(), details, state, self.clock.now());

		record.dashboard_url = self.config.dashboard_url(instance_id)?;

		let dashboard_url = record.dashboard_url.clone();

		// Counting and inserting must not interleave with other admissions.
		let admission = self.admission.lock().await;
		let service_count = self.store.count_instances(&service.id, None).await?;
		let service_limit = self.config.instance_limits.get(&service.id).copied();

		if service_limit.is_some_and(|limit| service_count >= limit) {
			return Err(Error::InstanceLimitMet);
		}

		let plan_count = self.store.count_instances(&service.id, Some(&record.plan_id)).await?;

		if settings.quota.is_some_and(|quota| plan_count >= quota) {
			return Err(Error::PlanQuotaExceeded);
		}
		if let InsertOutcome::Exists(_) = self.store.insert_instance(record).await? {
			return Err(Error::InstanceAlreadyExists);
		}

		drop(admission);

		self.record_operation(instance_id, OperationKind::Provision, is_async, &settings).await?;

		Ok(ProvisionedServiceSpec { is_async, dashboard_url })
	}

	/// Answers a provision request for an identifier that is already taken.
	fn replay_provision(
		&self,
		existing: &InstanceRecord,
		details: &ProvisionDetails,
	) -> Result<ProvisionedServiceSpec> {
		let replayable = self.config.idempotency == IdempotencyPolicy::ReplayIdentical
			&& matches!(existing.state, InstanceState::Provisioning | InstanceState::Active)
			&& existing.matches(details);

		if !replayable {
			return Err(Error::InstanceAlreadyExists);
		}

		Ok(ProvisionedServiceSpec {
			is_async: existing.state == InstanceState::Provisioning,
			dashboard_url: existing.dashboard_url.clone(),
		})
	}
}
