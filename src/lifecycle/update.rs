//! Plan and configuration changes.

// self
use crate::{
	_prelude::*,
	lifecycle::LifecycleBroker,
	model::{self, InstanceId, IsAsync, Parameters, UpdateDetails},
	store::{InstanceState, OperationKind, OperationRecord},
};

impl LifecycleBroker {
	pub(super) async fn update_instance(
		&self,
		instance_id: &InstanceId,
		params: Parameters,
		async_allowed: bool,
	) -> Result<IsAsync> {
		let details: UpdateDetails = model::decode_parameters(&params)?;
		let _lock = self.lock_instance(instance_id).await;

		self.settle_due(instance_id).await?;

		let Some(record) = self.store.fetch_instance(instance_id).await? else {
			return Err(Error::InstanceDoesNotExist);
		};

		// Instances never move across services.
		if details.service_id != record.service_id {
			return Err(Error::PlanChangeNotSupported);
		}
		if record.state.is_transitioning() {
			return Err(Error::OperationInProgress { instance_id: instance_id.to_string() });
		}

		let service = self.service_of(&record)?;
		let target_plan = details.plan_id.filter(|plan| plan != &record.plan_id);

		if let Some(plan) = &target_plan {
			if !service.plan_updateable {
				return Err(Error::PlanChangeNotSupported);
			}

			self.catalog.resolve(&service.id, plan)?;
		}

		let current = self.config.plan(&record.plan_id);
		let target = target_plan.as_ref().map(|plan| self.config.plan(plan));
		let mode = match &target {
			Some(target) => target.async_mode.max(current.async_mode),
			None => current.async_mode,
		};
		let is_async = mode.resolve(async_allowed)?;
		let settings = target.unwrap_or(current);

		// Counting and swapping must not interleave with other admissions.
		let admission = self.admission.lock().await;

		if let Some(plan) = &target_plan {
			let on_plan = self.store.count_instances(&service.id, Some(plan)).await?;

			if settings.quota.is_some_and(|quota| on_plan >= quota) {
				return Err(Error::PlanQuotaExceeded);
			}
		}

		let now = self.clock.now();

		if is_async {
			let mut next = record.transition(InstanceState::Updating, now);

			next.pending_plan = target_plan.clone();

			self.swap_instance(record.revision, next).await?;
			drop(admission);

			let op = OperationRecord::pending(
				instance_id.clone(),
				OperationKind::Update,
				now,
				settings.operation_duration,
			)
			.with_failure(settings.failure.clone())
			.with_target(target_plan, details.parameters);

			self.store.save_operation(op).await?;
		} else {
			let mut next = record.transition(InstanceState::Active, now);

			if let Some(plan) = target_plan {
				next.plan_id = plan;
			}
			if let Some(parameters) = details.parameters {
				next.parameters = Some(parameters);
			}

			self.swap_instance(record.revision, next).await?;
			drop(admission);
			self.record_operation(instance_id, OperationKind::Update, false, &settings).await?;
		}

		Ok(IsAsync(is_async))
	}
}

#[cfg(test)]
mod tests {
	// self
	use crate::{
		_preludet::*,
		broker::ServiceBroker,
		lifecycle::{AsyncMode, PlanSettings},
		model::{LastOperationState, Parameters, PlanId},
		store::BrokerStore,
	};

	fn update_params(plan: Option<&str>) -> Parameters {
		let mut params = Parameters::new();

		params.insert("service_id".into(), TEST_SERVICE.into());

		if let Some(plan) = plan {
			params.insert("plan_id".into(), plan.into());
		}

		params
	}

	#[tokio::test]
	async fn sync_update_moves_plan() {
		let t = build_test_broker(test_config());
		let id = instance_id("i-1");

		t.broker
			.provision(&id, provision_params(SYNC_PLAN), false)
			.await
			.expect("Provision should succeed.");

		let is_async = t
			.broker
			.update(&id, update_params(Some(OPTIONAL_ASYNC_PLAN)), false)
			.await
			.expect("Optional-async plan should update synchronously when async is not allowed.");
		let record = t
			.store
			.fetch_instance(&id)
			.await
			.expect("Fetch should succeed.")
			.expect("Instance should exist.");

		assert!(!is_async.get());
		assert_eq!(record.plan_id.as_ref(), OPTIONAL_ASYNC_PLAN);
	}

	#[tokio::test]
	async fn async_update_applies_plan_on_settle() {
		let t = build_test_broker(test_config());
		let id = instance_id("i-1");

		t.broker
			.provision(&id, provision_params(SYNC_PLAN), false)
			.await
			.expect("Provision should succeed.");

		assert!(matches!(
			t.broker.update(&id, update_params(Some(ASYNC_PLAN)), false).await,
			Err(Error::AsyncRequired)
		));
		assert!(
			t.broker
				.update(&id, update_params(Some(ASYNC_PLAN)), true)
				.await
				.expect("Update should be accepted.")
				.get()
		);
		assert_eq!(
			t.broker.last_operation(&id).await.expect("Poll should succeed.").state,
			LastOperationState::InProgress
		);

		t.clock.advance(Duration::minutes(1));

		assert_eq!(
			t.broker.last_operation(&id).await.expect("Poll should succeed.").state,
			LastOperationState::Succeeded
		);

		let record = t
			.store
			.fetch_instance(&id)
			.await
			.expect("Fetch should succeed.")
			.expect("Instance should exist.");

		assert_eq!(record.plan_id.as_ref(), ASYNC_PLAN);
	}

	#[tokio::test]
	async fn update_unknown_instance_fails() {
		let t = build_test_broker(test_config());

		assert!(matches!(
			t.broker.update(&instance_id("missing"), update_params(None), true).await,
			Err(Error::InstanceDoesNotExist)
		));
	}

	#[tokio::test]
	async fn update_without_plan_keeps_plan() {
		let t = build_test_broker(test_config());
		let id = instance_id("i-1");

		t.broker
			.provision(&id, provision_params(SYNC_PLAN), false)
			.await
			.expect("Provision should succeed.");

		let mut params = update_params(None);

		params.insert("parameters".into(), serde_json::json!({ "max_connections": 200 }));
		t.broker.update(&id, params, false).await.expect("Parameter-only update should succeed.");

		let record = t
			.store
			.fetch_instance(&id)
			.await
			.expect("Fetch should succeed.")
			.expect("Instance should exist.");

		assert_eq!(record.plan_id.as_ref(), SYNC_PLAN);
		assert_eq!(
			record.parameters.and_then(|p| p.get("max_connections").cloned()),
			Some(serde_json::json!(200))
		);
	}

	#[tokio::test]
	async fn outstanding_update_reserves_its_target_plan() {
		let plan = PlanId::new(ASYNC_PLAN).expect("Plan fixture should be valid.");
		let t = build_test_broker(test_config().with_plan(
			plan.clone(),
			PlanSettings::new(AsyncMode::Required)
				.with_operation_duration(Duration::minutes(1))
				.with_quota(1)
				.with_failure("Storage migration failed."),
		));
		let (first, second) = (instance_id("i-1"), instance_id("i-2"));

		for id in [&first, &second] {
			t.broker
				.provision(id, provision_params(SYNC_PLAN), false)
				.await
				.expect("Provision should succeed.");
		}

		t.broker
			.update(&first, update_params(Some(ASYNC_PLAN)), true)
			.await
			.expect("Update should be accepted.");

		let pending = t
			.store
			.fetch_instance(&first)
			.await
			.expect("Fetch should succeed.")
			.expect("Instance should exist.");

		assert_eq!(pending.pending_plan, Some(plan.clone()));
		assert_eq!(pending.plan_id.as_ref(), SYNC_PLAN);
		assert!(matches!(
			t.broker.update(&second, update_params(Some(ASYNC_PLAN)), true).await,
			Err(Error::PlanQuotaExceeded)
		));

		t.clock.advance(Duration::minutes(1));

		assert_eq!(
			t.broker.last_operation(&first).await.expect("Poll should succeed.").state,
			LastOperationState::Failed
		);

		let settled = t
			.store
			.fetch_instance(&first)
			.await
			.expect("Fetch should succeed.")
			.expect("Instance should survive a failed update.");

		assert_eq!(settled.pending_plan, None);

		t.broker
			.update(&second, update_params(Some(ASYNC_PLAN)), true)
			.await
			.expect("A failed update should release its reservation.");
	}
}
