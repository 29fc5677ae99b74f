//! Polling of asynchronous operations.

// self
use crate::{
	_prelude::*,
	lifecycle::LifecycleBroker,
	model::{InstanceId, LastOperation, LastOperationState},
	store::OperationRecord,
};

const IDLE_DESCRIPTION: &str = "No operation is outstanding.";

impl LifecycleBroker {
	pub(super) async fn poll_operation(&self, instance_id: &InstanceId) -> Result<LastOperation> {
		let _lock = self.lock_instance(instance_id).await;
		let op = self.settle_due(instance_id).await?;
		let instance = self.store.fetch_instance(instance_id).await?;

		match (instance, op) {
			(Some(_), Some(op)) => Ok(op.last_operation()),
			(Some(_), None) => Ok(LastOperation::new(LastOperationState::Succeeded, IDLE_DESCRIPTION)),
			(None, Some(op)) if self.is_retained(&op) => Ok(op.last_operation()),
			(None, Some(_)) => {
				self.store.remove_operation(instance_id).await?;

				Err(Error::InstanceDoesNotExist)
			},
			(None, None) => Err(Error::InstanceDoesNotExist),
		}
	}

	/// Returns `true` while an operation that outlived its instance is still reported.
	fn is_retained(&self, op: &OperationRecord) -> bool {
		op.completed_at.is_some()
			&& !op.is_expired_at(self.clock.now(), self.config.operation_retention)
	}
}
