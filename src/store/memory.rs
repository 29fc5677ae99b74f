//! Thread-safe in-memory [`BrokerStore`] implementation for local development and tests.

// self
use crate::{
	_prelude::*,
	model::{BindingId, InstanceId, PlanId, ServiceId},
	store::{
		BindingRecord, BrokerStore, CompareAndSwapOutcome, InsertOutcome, InstanceRecord,
		OperationRecord, StoreFuture,
	},
};

type StoreMap = Arc<RwLock<StoreState>>;

#[derive(Debug, Default)]
struct StoreState {
	instances: HashMap<InstanceId, InstanceRecord>,
	bindings: HashMap<InstanceId, HashMap<BindingId, BindingRecord>>,
	operations: HashMap<InstanceId, OperationRecord>,
}

/// Thread-safe storage backend that keeps records in-process for tests and demos.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore(StoreMap);
impl MemoryStore {
	/// Number of stored instances.
	pub fn instance_count(&self) -> usize {
		self.0.read().instances.len()
	}

	/// Number of stored operation records, including those of removed instances.
	pub fn operation_count(&self) -> usize {
		self.0.read().operations.len()
	}

	/// Number of stored bindings across all instances.
	pub fn binding_count(&self) -> usize {
		self.0.read().bindings.values().map(HashMap::len).sum()
	}

	fn insert_instance_now(map: StoreMap, record: InstanceRecord) -> InsertOutcome<InstanceRecord> {
		let mut guard = map.write();

		if let Some(existing) = guard.instances.get(&record.id) {
			return InsertOutcome::Exists(existing.clone());
		}

		guard.instances.insert(record.id.clone(), record);

		InsertOutcome::Inserted
	}

	fn cas_now(
		map: StoreMap,
		expected_revision: u64,
		replacement: InstanceRecord,
	) -> CompareAndSwapOutcome {
		let mut guard = map.write();
		let outcome = match guard.instances.get(&replacement.id) {
			Some(existing) if existing.revision == expected_revision =>
				CompareAndSwapOutcome::Updated,
			Some(_) => CompareAndSwapOutcome::RevisionMismatch,
			None => CompareAndSwapOutcome::Missing,
		};

		if matches!(outcome, CompareAndSwapOutcome::Updated) {
			guard.instances.insert(replacement.id.clone(), replacement);
		}

		outcome
	}

	fn remove_instance_now(map: StoreMap, id: &InstanceId) -> Option<InstanceRecord> {
		let mut guard = map.write();

		guard.bindings.remove(id);
		guard.instances.remove(id)
	}

	fn count_now(map: StoreMap, service: &ServiceId, plan: Option<&PlanId>) -> usize {
		map.read()
			.instances
			.values()
			.filter(|record| &record.service_id == service)
			.filter(|record| plan.is_none_or(|plan| record.occupies(plan)))
			.count()
	}

	fn purge_now(map: StoreMap, cutoff: OffsetDateTime) -> usize {
		let mut guard = map.write();
		let StoreState { instances, operations, .. } = &mut *guard;
		let before = operations.len();

		operations.retain(|id, op| {
			instances.contains_key(id) || op.completed_at.is_none_or(|at| at >= cutoff)
		});

		before - operations.len()
	}

	fn insert_binding_now(map: StoreMap, record: BindingRecord) -> InsertOutcome<BindingRecord> {
		let mut guard = map.write();
		let bindings = guard.bindings.entry(record.instance_id.clone()).or_default();

		if let Some(existing) = bindings.get(&record.binding_id) {
			return InsertOutcome::Exists(existing.clone());
		}

		bindings.insert(record.binding_id.clone(), record);

		InsertOutcome::Inserted
	}

	fn remove_binding_now(
		map: StoreMap,
		instance: &InstanceId,
		binding: &BindingId,
	) -> Option<BindingRecord> {
		let mut guard = map.write();
		let bindings = guard.bindings.get_mut(instance)?;
		let removed = bindings.remove(binding);

		if bindings.is_empty() {
			guard.bindings.remove(instance);
		}

		removed
	}
}
impl BrokerStore for MemoryStore {
	fn insert_instance(
		&self,
		record: InstanceRecord,
	) -> StoreFuture<'_, InsertOutcome<InstanceRecord>> {
		let map = self.0.clone();

		Box::pin(async move { Ok(Self::insert_instance_now(map, record)) })
	}

	fn fetch_instance<'a>(
		&'a self,
		id: &'a InstanceId,
	) -> StoreFuture<'a, Option<InstanceRecord>> {
		let map = self.0.clone();

		Box::pin(async move { Ok(map.read().instances.get(id).cloned()) })
	}

	fn compare_and_swap_instance(
		&self,
		expected_revision: u64,
		replacement: InstanceRecord,
	) -> StoreFuture<'_, CompareAndSwapOutcome> {
		let map = self.0.clone();

		Box::pin(async move { Ok(Self::cas_now(map, expected_revision, replacement)) })
	}

	fn remove_instance<'a>(
		&'a self,
		id: &'a InstanceId,
	) -> StoreFuture<'a, Option<InstanceRecord>> {
		let map = self.0.clone();

		Box::pin(async move { Ok(Self::remove_instance_now(map, id)) })
	}

	fn count_instances<'a>(
		&'a self,
		service: &'a ServiceId,
		plan: Option<&'a PlanId>,
	) -> StoreFuture<'a, usize> {
		let map = self.0.clone();

		Box::pin(async move { Ok(Self::count_now(map, service, plan)) })
	}

	fn insert_binding(
		&self,
		record: BindingRecord,
	) -> StoreFuture<'_, InsertOutcome<BindingRecord>> {
		let map = self.0.clone();

		Box::pin(async move { Ok(Self::insert_binding_now(map, record)) })
	}

	fn fetch_binding<'a>(
		&'a self,
		instance: &'a InstanceId,
		binding: &'a BindingId,
	) -> StoreFuture<'a, Option<BindingRecord>> {
		let map = self.0.clone();

		Box::pin(async move {
			Ok(map.read().bindings.get(instance).and_then(|bindings| bindings.get(binding)).cloned())
		})
	}

	fn remove_binding<'a>(
		&'a self,
		instance: &'a InstanceId,
		binding: &'a BindingId,
	) -> StoreFuture<'a, Option<BindingRecord>> {
		let map = self.0.clone();

		Box::pin(async move { Ok(Self::remove_binding_now(map, instance, binding)) })
	}

	fn save_operation(&self, record: OperationRecord) -> StoreFuture<'_, ()> {
		let map = self.0.clone();

		Box::pin(async move {
			map.write().operations.insert(record.instance_id.clone(), record);

			Ok(())
		})
	}

	fn fetch_operation<'a>(
		&'a self,
		instance: &'a InstanceId,
	) -> StoreFuture<'a, Option<OperationRecord>> {
		let map = self.0.clone();

		Box::pin(async move { Ok(map.read().operations.get(instance).cloned()) })
	}

	fn remove_operation<'a>(
		&'a self,
		instance: &'a InstanceId,
	) -> StoreFuture<'a, Option<OperationRecord>> {
		let map = self.0.clone();

		Box::pin(async move { Ok(map.write().operations.remove(instance)) })
	}

	fn purge_operations(&self, cutoff: OffsetDateTime) -> StoreFuture<'_, usize> {
		let map = self.0.clone();

		Box::pin(async move { Ok(Self::purge_now(map, cutoff)) })
	}
}
