//! Storage contracts and the built-in in-process store for broker lifecycle records.

pub mod memory;
pub mod record;

pub use memory::MemoryStore;
pub use record::*;

// self
use crate::{
	_prelude::*,
	model::{BindingId, InstanceId, PlanId, ServiceId},
};

/// Boxed future returned by every [`BrokerStore`] operation.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + 'a + Send>>;

/// Storage backend contract for instance, binding, and operation records.
///
/// Inserts are insert-if-absent and instance replacement is a revision compare-and-swap, so two
/// writers racing on one identifier cannot both succeed even without external locking.
pub trait BrokerStore
where
	Self: Send + Sync,
{
	/// Stores the instance unless its identifier is already taken.
	fn insert_instance(
		&self,
		record: InstanceRecord,
	) -> StoreFuture<'_, InsertOutcome<InstanceRecord>>;

	/// Fetches an instance, if present.
	fn fetch_instance<'a>(
		&'a self,
		id: &'a InstanceId,
	) -> StoreFuture<'a, Option<InstanceRecord>>;

	/// Replaces an instance if its stored revision equals `expected_revision`.
	///
	/// Implementations persist `replacement` as given; callers bump its revision.
	fn compare_and_swap_instance(
		&self,
		expected_revision: u64,
		replacement: InstanceRecord,
	) -> StoreFuture<'_, CompareAndSwapOutcome>;

	/// Removes an instance together with all of its bindings.
	fn remove_instance<'a>(
		&'a self,
		id: &'a InstanceId,
	) -> StoreFuture<'a, Option<InstanceRecord>>;

	/// Counts instances of a service, optionally narrowed to one plan.
	///
	/// An instance with a pending plan change counts against both its current and target plan.
	fn count_instances<'a>(
		&'a self,
		service: &'a ServiceId,
		plan: Option<&'a PlanId>,
	) -> StoreFuture<'a, usize>;

	/// Stores the binding unless the `(instance, binding)` pair is already taken.
	fn insert_binding(
		&self,
		record: BindingRecord,
	) -> StoreFuture<'_, InsertOutcome<BindingRecord>>;

	/// Fetches a binding, if present.
	fn fetch_binding<'a>(
		&'a self,
		instance: &'a InstanceId,
		binding: &'a BindingId,
	) -> StoreFuture<'a, Option<BindingRecord>>;

	/// Removes a binding, returning it if it existed.
	fn remove_binding<'a>(
		&'a self,
		instance: &'a InstanceId,
		binding: &'a BindingId,
	) -> StoreFuture<'a, Option<BindingRecord>>;

	/// Persists or replaces the most recent operation of an instance.
	fn save_operation(&self, record: OperationRecord) -> StoreFuture<'_, ()>;

	/// Fetches the most recent operation of an instance, if any.
	fn fetch_operation<'a>(
		&'a self,
		instance: &'a InstanceId,
	) -> StoreFuture<'a, Option<OperationRecord>>;

	/// Forgets the most recent operation of an instance.
	fn remove_operation<'a>(
		&'a self,
		instance: &'a InstanceId,
	) -> StoreFuture<'a, Option<OperationRecord>>;

	/// Drops finished operations of removed instances that completed before `cutoff`.
	///
	/// Returns the number of records dropped.
	fn purge_operations(&self, cutoff: OffsetDateTime) -> StoreFuture<'_, usize>;
}

/// Result of an insert-if-absent attempt.
#[derive(Clone, Debug, PartialEq)]
pub enum InsertOutcome<T> {
	/// The record was stored.
	Inserted,
	/// A record with the same key already exists; it is returned untouched.
	Exists(T),
}

/// Result of an instance compare-and-swap attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompareAndSwapOutcome {
	/// The stored revision matched and the record was replaced.
	Updated,
	/// The record exists but its revision moved on.
	RevisionMismatch,
	/// No record matched the identifier.
	Missing,
}

/// Error type produced by [`BrokerStore`] implementations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum StoreError {
	/// Serialization failures surfaced by the backend.
	#[error("Serialization error: {message}.")]
	Serialization {
		/// Human-readable error payload.
		message: String,
	},
	/// Backend-level failure for the storage engine.
	#[error("Backend failure: {message}.")]
	Backend {
		/// Human-readable error payload.
		message: String,
	},
}
