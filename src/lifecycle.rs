//! Lifecycle broker: a concrete [`ServiceBroker`] that tracks instances, bindings, and
//! asynchronous operations in a [`BrokerStore`].
//!
//! The broker owns the catalog, store, clock, and credential minter so the per-operation modules
//! can focus on contract rules. Calls against one instance identifier are serialized through an
//! async mutex per identifier that lives only while calls on it are in flight. A broker-wide
//! admission lock keeps quota and limit counts consistent with the writes they gate. The store's
//! insert-if-absent and compare-and-swap primitives reject conflicting writers that bypass this
//! broker.
//!
//! Asynchronous operations settle lazily: whenever a call touches an instance whose outstanding
//! operation is due according to the clock, the operation is finalized first.

pub mod config;
pub mod credentials;

mod bind;
mod deprovision;
mod last_operation;
mod provision;
mod update;

pub use config::*;
pub use credentials::*;

// crates.io
use async_lock::MutexGuardArc;
// self
use crate::{
	_prelude::*,
	broker::{BrokerFuture, ServiceBroker},
	catalog::{Catalog, CatalogError, Service},
	clock::{Clock, SystemClock},
	model::{
		BindDetails, Binding, BindingId, DeprovisionDetails, InstanceId, IsAsync, LastOperation,
		LastOperationState, Parameters, ProvisionedServiceSpec, UnbindDetails,
	},
	obs::{self, BrokerOperation, OperationOutcome, OperationSpan},
	store::{
		BrokerStore, CompareAndSwapOutcome, InstanceRecord, InstanceState, MemoryStore,
		OperationKind, OperationRecord,
	},
};

/// Broker that honors every contract rule on top of a pluggable [`BrokerStore`].
#[derive(Clone)]
pub struct LifecycleBroker {
	catalog: Catalog,
	store: Arc<dyn BrokerStore>,
	clock: Arc<dyn Clock>,
	minter: Arc<dyn CredentialMinter>,
	config: LifecycleConfig,
	instance_guards: GuardTable,
	admission: Arc<AsyncMutex<()>>,
}
impl LifecycleBroker {
	/// Starts a builder for the provided catalog.
	pub fn builder(catalog: Catalog) -> LifecycleBrokerBuilder {
		LifecycleBrokerBuilder::new(catalog)
	}

	/// Catalog served by this broker.
	pub fn catalog(&self) -> &Catalog {
		&self.catalog
	}

	/// Active settings.
	pub fn config(&self) -> &LifecycleConfig {
		&self.config
	}

	/// Drops settled operations of removed instances once their retention has passed.
	///
	/// Returns the number of records dropped. Mutating calls run this on their own; call it
	/// directly to reclaim records on an otherwise idle broker.
	pub async fn purge_retired_operations(&self) -> Result<usize> {
		let cutoff = self.clock.now() - self.config.operation_retention;

		Ok(self.store.purge_operations(cutoff).await?)
	}

	/// Serializes calls against one instance until the returned lock is dropped.
	async fn lock_instance(&self, id: &InstanceId) -> InstanceLock {
		let mutex = self
			.instance_guards
			.lock()
			.entry(id.clone())
			.or_insert_with(|| Arc::new(AsyncMutex::new(())))
			.clone();
		let held = mutex.lock_arc().await;

		InstanceLock { guards: self.instance_guards.clone(), id: id.clone(), held: Some(held) }
	}

	fn service_of(&self, record: &InstanceRecord) -> Result<&Service> {
		self.catalog.service(&record.service_id).ok_or_else(|| {
			CatalogError::UnknownService { service: record.service_id.to_string() }.into()
		})
	}

	/// Finalizes the outstanding operation of an instance if the clock says it is due.
	///
	/// Returns the most recent operation record, settled or not.
	async fn settle_due(&self, id: &InstanceId) -> Result<Option<OperationRecord>> {
		let Some(mut op) = self.store.fetch_operation(id).await? else {
			return Ok(None);
		};
		let now = self.clock.now();

		if !op.is_due_at(now) {
			return Ok(Some(op));
		}

		op.settle(now);
		self.apply_settled(&op, now).await?;
		self.store.save_operation(op.clone()).await?;
		obs::trace_event(&format!("{} operation settled as {}", op.kind, op.state));

		Ok(Some(op))
	}

	/// Applies the instance-level effect of a settled operation.
	async fn apply_settled(&self, op: &OperationRecord, now: OffsetDateTime) -> Result<()> {
		let succeeded = op.state == LastOperationState::Succeeded;

		match (op.kind, succeeded) {
			(OperationKind::Provision, false) | (OperationKind::Deprovision, true) => {
				self.store.remove_instance(&op.instance_id).await?;
			},
			(kind, _) => {
				let Some(record) = self.store.fetch_instance(&op.instance_id).await? else {
					return Ok(());
				};
				let mut next = record.transition(InstanceState::Active, now);

				next.pending_plan = None;

				if kind == OperationKind::Update && succeeded {
					if let Some(plan) = op.target_plan.clone() {
						next.plan_id = plan;
					}
					if let Some(parameters) = op.target_parameters.clone() {
						next.parameters = Some(parameters);
					}
				}

				self.swap_instance(record.revision, next).await?;
			},
		}

		Ok(())
	}

	/// Writes the next revision of an instance, mapping lost races onto contract errors.
	async fn swap_instance(&self, expected_revision: u64, next: InstanceRecord) -> Result<()> {
		let id = next.id.clone();

		match self.store.compare_and_swap_instance(expected_revision, next).await? {
			CompareAndSwapOutcome::Updated => Ok(()),
			CompareAndSwapOutcome::Missing => Err(Error::InstanceDoesNotExist),
			CompareAndSwapOutcome::RevisionMismatch =>
				Err(Error::OperationInProgress { instance_id: id.to_string() }),
		}
	}

	/// Records the operation a mutating call started or finished.
	async fn record_operation(
		&self,
		id: &InstanceId,
		kind: OperationKind,
		is_async: bool,
		settings: &PlanSettings,
	) -> Result<OperationRecord> {
		let now = self.clock.now();
		let op = if is_async {
			OperationRecord::pending(id.clone(), kind, now, settings.operation_duration)
				.with_failure(settings.failure.clone())
		} else {
			OperationRecord::completed(id.clone(), kind, now)
		};

		self.store.save_operation(op.clone()).await?;
		self.purge_retired_operations().await?;

		Ok(op)
	}
}
impl Debug for LifecycleBroker {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("LifecycleBroker")
			.field("catalog", &self.catalog)
			.field("config", &self.config)
			.finish()
	}
}
impl ServiceBroker for LifecycleBroker {
	fn services(&self) -> Vec<Service> {
		self.catalog.services().to_vec()
	}

	fn provision<'a>(
		&'a self,
		instance_id: &'a InstanceId,
		details: Parameters,
		async_allowed: bool,
	) -> BrokerFuture<'a, ProvisionedServiceSpec> {
		observed(
			BrokerOperation::Provision,
			instance_id,
			self.provision_instance(instance_id, details, async_allowed),
		)
	}

	fn deprovision<'a>(
		&'a self,
		instance_id: &'a InstanceId,
		details: DeprovisionDetails,
		async_allowed: bool,
	) -> BrokerFuture<'a, IsAsync> {
		observed(
			BrokerOperation::Deprovision,
			instance_id,
			self.deprovision_instance(instance_id, details, async_allowed),
		)
	}

	fn bind<'a>(
		&'a self,
		instance_id: &'a InstanceId,
		binding_id: &'a BindingId,
		details: BindDetails,
	) -> BrokerFuture<'a, Binding> {
		observed(
			BrokerOperation::Bind,
			instance_id,
			self.bind_instance(instance_id, binding_id, details),
		)
	}

	fn unbind<'a>(
		&'a self,
		instance_id: &'a InstanceId,
		binding_id: &'a BindingId,
		details: UnbindDetails,
	) -> BrokerFuture<'a, ()> {
		observed(
			BrokerOperation::Unbind,
			instance_id,
			self.unbind_instance(instance_id, binding_id, details),
		)
	}

	fn update<'a>(
		&'a self,
		instance_id: &'a InstanceId,
		details: Parameters,
		async_allowed: bool,
	) -> BrokerFuture<'a, IsAsync> {
		observed(
			BrokerOperation::Update,
			instance_id,
			self.update_instance(instance_id, details, async_allowed),
		)
	}

	fn last_operation<'a>(&'a self, instance_id: &'a InstanceId) -> BrokerFuture<'a, LastOperation> {
		observed(BrokerOperation::LastOperation, instance_id, self.poll_operation(instance_id))
	}
}

/// Builder for [`LifecycleBroker`] values.
pub struct LifecycleBrokerBuilder {
	catalog: Catalog,
	store: Option<Arc<dyn BrokerStore>>,
	clock: Option<Arc<dyn Clock>>,
	minter: Option<Arc<dyn CredentialMinter>>,
	config: LifecycleConfig,
}
impl LifecycleBrokerBuilder {
	/// Creates a builder with an in-memory store, the system clock, and default settings.
	pub fn new(catalog: Catalog) -> Self {
		Self { catalog, store: None, clock: None, minter: None, config: LifecycleConfig::default() }
	}

	/// Overrides the record store.
	pub fn store(mut self, store: Arc<dyn BrokerStore>) -> Self {
		self.store = Some(store);

		self
	}

	/// Overrides the time source.
	pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
		self.clock = Some(clock);

		self
	}

	/// Overrides the credential minter.
	pub fn credential_minter(mut self, minter: Arc<dyn CredentialMinter>) -> Self {
		self.minter = Some(minter);

		self
	}

	/// Overrides the settings.
	pub fn config(mut self, config: LifecycleConfig) -> Self {
		self.config = config;

		self
	}

	/// Consumes the builder after checking the settings against the catalog.
	pub fn build(self) -> Result<LifecycleBroker, CatalogError> {
		self.config.validate(&self.catalog)?;

		Ok(LifecycleBroker {
			catalog: self.catalog,
			store: self.store.unwrap_or_else(|| Arc::new(MemoryStore::default())),
			clock: self.clock.unwrap_or_else(|| Arc::new(SystemClock)),
			minter: self.minter.unwrap_or_else(|| Arc::new(DefaultCredentialMinter::default())),
			config: self.config,
			admission: Default::default(),
			instance_guards: Default::default(),
		})
	}
}
impl Debug for LifecycleBrokerBuilder {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("LifecycleBrokerBuilder")
			.field("catalog", &self.catalog)
			.field("store_set", &self.store.is_some())
			.field("clock_set", &self.clock.is_some())
			.field("minter_set", &self.minter.is_some())
			.field("config", &self.config)
			.finish()
	}
}

type GuardTable = Arc<Mutex<HashMap<InstanceId, Arc<AsyncMutex<()>>>>>;

/// Held serialization guard of one instance.
///
/// Dropping it releases the guard and removes the table entry once no other call refers to it.
struct InstanceLock {
	guards: GuardTable,
	id: InstanceId,
	held: Option<MutexGuardArc<()>>,
}
impl Drop for InstanceLock {
	fn drop(&mut self) {
		let mut guards = self.guards.lock();

		drop(self.held.take());

		if guards.get(&self.id).is_some_and(|mutex| Arc::strong_count(mutex) == 1) {
			guards.remove(&self.id);
		}
	}
}

/// Wraps an operation in its span and records attempt/outcome metrics.
fn observed<'a, T, Fut>(
	operation: BrokerOperation,
	instance_id: &InstanceId,
	fut: Fut,
) -> BrokerFuture<'a, T>
where
	T: 'a + Send,
	Fut: 'a + Send + Future<Output = Result<T>>,
{
	let span = OperationSpan::new(operation, instance_id);

	obs::record_operation_outcome(operation, OperationOutcome::Attempt);

	Box::pin(span.instrument(async move {
		let result = fut.await;

		obs::record_operation_result(operation, &result);

		result
	}))
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::_preludet::*;

	async fn cycle(t: &TestBroker, id: &InstanceId) {
		t.broker
			.provision(id, provision_params(SYNC_PLAN), false)
			.await
			.expect("Provision should succeed.");
		t.broker
			.deprovision(id, deprovision_details(SYNC_PLAN), false)
			.await
			.expect("Deprovision should succeed.");
	}

	#[tokio::test]
	async fn instance_guards_live_only_while_held() {
		let t = build_test_broker(test_config());

		for i in 0..50 {
			assert!(matches!(
				t.broker.last_operation(&instance_id(&format!("missing-{i}"))).await,
				Err(Error::InstanceDoesNotExist)
			));
		}
		for i in 0..5 {
			cycle(&t, &instance_id(&format!("i-{i}"))).await;
		}

		assert!(t.broker.instance_guards.lock().is_empty());

		let id = instance_id("i-held");
		let held = t.broker.lock_instance(&id).await;

		assert_eq!(t.broker.instance_guards.lock().len(), 1);

		drop(held);

		assert!(t.broker.instance_guards.lock().is_empty());
	}

	#[tokio::test]
	async fn retired_operations_are_purged_after_retention() {
		let t = build_test_broker(test_config());

		for i in 0..10 {
			cycle(&t, &instance_id(&format!("i-{i}"))).await;
		}

		assert_eq!(t.store.operation_count(), 10);
		assert_eq!(t.broker.purge_retired_operations().await.expect("Purge should succeed."), 0);

		t.clock.advance(Duration::days(365));

		assert_eq!(t.broker.purge_retired_operations().await.expect("Purge should succeed."), 10);
		assert_eq!(t.store.operation_count(), 0);
	}

	#[tokio::test]
	async fn mutating_calls_purge_retired_operations() {
		let t = build_test_broker(test_config());

		for i in 0..3 {
			cycle(&t, &instance_id(&format!("i-{i}"))).await;
		}

		t.clock.advance(Duration::days(1));
		t.broker
			.provision(&instance_id("i-live"), provision_params(SYNC_PLAN), false)
			.await
			.expect("Provision should succeed.");

		assert_eq!(t.store.operation_count(), 1, "only the live instance keeps its operation");
	}
}
