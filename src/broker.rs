//! The Service Broker contract.
//!
//! [`ServiceBroker`] is the capability every concrete broker provides. An HTTP-facing adapter
//! maps wire requests onto these operations (instance and binding identifiers from path
//! segments, `async_allowed` from the query string) and maps results and [`Error`]s back to
//! protocol responses. Each operation surfaces errors verbatim; nothing here retries.

// self
use crate::{
	_prelude::*,
	catalog::Service,
	model::{
		BindDetails, Binding, BindingId, DeprovisionDetails, InstanceId, IsAsync, LastOperation,
		Parameters, ProvisionedServiceSpec, UnbindDetails,
	},
};

/// Boxed future returned by every fallible [`ServiceBroker`] operation.
pub type BrokerFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T>> + 'a + Send>>;

/// Operation set every concrete service broker implements.
///
/// Instance and binding identifiers are caller-supplied idempotency keys: a duplicate create
/// either replays the original result or fails with the matching "already exists" error, and any
/// operation on an unknown resource fails with the matching "does not exist" error.
///
/// Implementations must serialize (or otherwise conflict-check) calls that target the same
/// instance so concurrent mutations cannot both succeed in conflicting ways.
pub trait ServiceBroker
where
	Self: Send + Sync,
{
	/// Returns the catalog in declaration order. Never fails.
	fn services(&self) -> Vec<Service>;

	/// Creates a service instance.
	///
	/// Fails with [`Error::InstanceAlreadyExists`], [`Error::AsyncRequired`],
	/// [`Error::RawParamsInvalid`], [`Error::InstanceLimitMet`], or
	/// [`Error::PlanQuotaExceeded`].
	fn provision<'a>(
		&'a self,
		instance_id: &'a InstanceId,
		details: Parameters,
		async_allowed: bool,
	) -> BrokerFuture<'a, ProvisionedServiceSpec>;

	/// Destroys a service instance.
	///
	/// Fails with [`Error::InstanceDoesNotExist`] or [`Error::AsyncRequired`].
	fn deprovision<'a>(
		&'a self,
		instance_id: &'a InstanceId,
		details: DeprovisionDetails,
		async_allowed: bool,
	) -> BrokerFuture<'a, IsAsync>;

	/// Creates a binding between an instance and a consumer.
	///
	/// Fails with [`Error::InstanceDoesNotExist`] or [`Error::BindingAlreadyExists`].
	fn bind<'a>(
		&'a self,
		instance_id: &'a InstanceId,
		binding_id: &'a BindingId,
		details: BindDetails,
	) -> BrokerFuture<'a, Binding>;

	/// Destroys a binding.
	///
	/// Fails with [`Error::InstanceDoesNotExist`] or [`Error::BindingDoesNotExist`].
	fn unbind<'a>(
		&'a self,
		instance_id: &'a InstanceId,
		binding_id: &'a BindingId,
		details: UnbindDetails,
	) -> BrokerFuture<'a, ()>;

	/// Changes the plan or configuration of an instance.
	///
	/// Fails with [`Error::InstanceDoesNotExist`], [`Error::PlanChangeNotSupported`], or
	/// [`Error::AsyncRequired`].
	fn update<'a>(
		&'a self,
		instance_id: &'a InstanceId,
		details: Parameters,
		async_allowed: bool,
	) -> BrokerFuture<'a, IsAsync>;

	/// Polls the status of the most recent asynchronous operation on an instance.
	///
	/// Fails with [`Error::InstanceDoesNotExist`]. Callers keep polling while the state is
	/// `in progress`.
	fn last_operation<'a>(&'a self, instance_id: &'a InstanceId) -> BrokerFuture<'a, LastOperation>;
}
impl<B> ServiceBroker for Arc<B>
where
	B: ?Sized + ServiceBroker,
{
	fn services(&self) -> Vec<Service> {
		(**self).services()
	}

	fn provision<'a>(
		&'a self,
		instance_id: &'a InstanceId,
		details: Parameters,
		async_allowed: bool,
	) -> BrokerFuture<'a, ProvisionedServiceSpec> {
		(**self).provision(instance_id, details, async_allowed)
	}

	fn deprovision<'a>(
		&'a self,
		instance_id: &'a InstanceId,
		details: DeprovisionDetails,
		async_allowed: bool,
	) -> BrokerFuture<'a, IsAsync> {
		(**self).deprovision(instance_id, details, async_allowed)
	}

	fn bind<'a>(
		&'a self,
		instance_id: &'a InstanceId,
		binding_id: &'a BindingId,
		details: BindDetails,
	) -> BrokerFuture<'a, Binding> {
		(**self).bind(instance_id, binding_id, details)
	}

	fn unbind<'a>(
		&'a self,
		instance_id: &'a InstanceId,
		binding_id: &'a BindingId,
		details: UnbindDetails,
	) -> BrokerFuture<'a, ()> {
		(**self).unbind(instance_id, binding_id, details)
	}

	fn update<'a>(
		&'a self,
		instance_id: &'a InstanceId,
		details: Parameters,
		async_allowed: bool,
	) -> BrokerFuture<'a, IsAsync> {
		(**self).update(instance_id, details, async_allowed)
	}

	fn last_operation<'a>(&'a self, instance_id: &'a InstanceId) -> BrokerFuture<'a, LastOperation> {
		(**self).last_operation(instance_id)
	}
}
