//! Instance deletion.

// self
use crate::{
	_prelude::*,
	lifecycle::LifecycleBroker,
	model::{DeprovisionDetails, InstanceId, IsAsync},
	store::{InstanceState, OperationKind},
};

impl LifecycleBroker {
	pub(super) async fn deprovision_instance(
		&self,
		instance_id: &InstanceId,
		details: DeprovisionDetails,
		async_allowed: bool,
	) -> Result<IsAsync> {
		let _lock = self.lock_instance(instance_id).await;

		self.settle_due(instance_id).await?;

		let Some(record) = self.store.fetch_instance(instance_id).await? else {
			return Err(Error::InstanceDoesNotExist);
		};

		if record.state.is_transitioning() {
			return Err(Error::OperationInProgress { instance_id: instance_id.to_string() });
		}
		if record.plan_id != details.plan_id || record.service_id != details.service_id {
			crate::obs::trace_event("deprovision details disagree with the stored instance");
		}

		let settings = self.config.plan(&record.plan_id);
		let is_async = settings.async_mode.resolve(async_allowed)?;

		if is_async {
			let next = record.transition(InstanceState::Deprovisioning, self.clock.now());

			self.swap_instance(record.revision, next).await?;
		} else if self.store.remove_instance(instance_id).await?.is_none() {
			return Err(Error::InstanceDoesNotExist);
		}

		self.record_operation(instance_id, OperationKind::Deprovision, is_async, &settings).await?;

		Ok(IsAsync(is_async))
	}
}

#[cfg(test)]
mod tests {
	// self
	use crate::{
		_preludet::*,
		broker::ServiceBroker,
		model::{BindingId, LastOperationState},
	};

	#[tokio::test]
	async fn sync_deprovision_removes_instance_and_bindings() {
		let t = build_test_broker(test_config());
		let id = instance_id("i-1");
		let binding = BindingId::new("b-1").expect("Binding fixture should be valid.");

		t.broker
			.provision(&id, provision_params(SYNC_PLAN), false)
			.await
			.expect("Provision should succeed.");
		t.broker
			.bind(&id, &binding, bind_details("app-1", SYNC_PLAN))
			.await
			.expect("Bind should succeed.");

		let is_async = t
			.broker
			.deprovision(&id, deprovision_details(SYNC_PLAN), false)
			.await
			.expect("Deprovision should succeed.");

		assert!(!is_async.get());
		assert_eq!(t.store.instance_count(), 0);
		assert_eq!(t.store.binding_count(), 0);
	}

	#[tokio::test]
	async fn async_deprovision_requires_async_support() {
		let t = build_test_broker(test_config());
		let id = instance_id("i-1");

		t.broker
			.provision(&id, provision_params(ASYNC_PLAN), true)
			.await
			.expect("Provision should be accepted.");
		t.clock.advance(Duration::minutes(1));

		assert_eq!(
			t.broker.last_operation(&id).await.expect("Poll should succeed.").state,
			LastOperationState::Succeeded
		);
		assert!(matches!(
			t.broker.deprovision(&id, deprovision_details(ASYNC_PLAN), false).await,
			Err(Error::AsyncRequired)
		));
		assert_eq!(t.store.instance_count(), 1, "Rejected deprovision must not remove anything.");
	}

	#[tokio::test]
	async fn deprovision_while_provisioning_is_rejected() {
		let t = build_test_broker(test_config());
		let id = instance_id("i-1");

		t.broker
			.provision(&id, provision_params(ASYNC_PLAN), true)
			.await
			.expect("Provision should be accepted.");

		assert!(matches!(
			t.broker.deprovision(&id, deprovision_details(ASYNC_PLAN), true).await,
			Err(Error::OperationInProgress { .. })
		));
	}
}
