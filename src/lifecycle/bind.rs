//! Binding creation and deletion.

// self
use crate::{
	_prelude::*,
	catalog::{CatalogError, Service},
	error::ParamsError,
	lifecycle::{BindContext, IdempotencyPolicy, LifecycleBroker},
	model::{BindDetails, Binding, BindingId, InstanceId, UnbindDetails},
	store::{BindingRecord, InsertOutcome, InstanceState},
};

impl LifecycleBroker {
	pub(super) async fn bind_instance(
		&self,
		instance_id: &InstanceId,
		binding_id: &BindingId,
		details: BindDetails,
	) -> Result<Binding> {
		let _lock = self.lock_instance(instance_id).await;

		self.settle_due(instance_id).await?;

		let Some(record) = self.store.fetch_instance(instance_id).await? else {
			return Err(Error::InstanceDoesNotExist);
		};
		let service = self.service_of(&record)?;

		if !service.bindable {
			return Err(CatalogError::NotBindable { service: service.id.to_string() }.into());
		}
		if matches!(record.state, InstanceState::Provisioning | InstanceState::Deprovisioning) {
			return Err(Error::OperationInProgress { instance_id: instance_id.to_string() });
		}
		if let Some(existing) = self.store.fetch_binding(instance_id, binding_id).await? {
			return self.replay_binding(existing, &details);
		}

		let credentials =
			self.minter.mint(&BindContext { instance: &record, binding_id, details: &details })?;
		let syslog_drain_url = forwarded_url(service, &details, Service::REQUIRES_SYSLOG_DRAIN)?;
		let route_service_url =
			forwarded_url(service, &details, Service::REQUIRES_ROUTE_FORWARDING)?;
		let binding = Binding { credentials, syslog_drain_url, route_service_url };
		let stored = BindingRecord {
			instance_id: instance_id.clone(),
			binding_id: binding_id.clone(),
			details,
			binding: binding.clone(),
			created_at: self.clock.now(),
		};

		match self.store.insert_binding(stored).await? {
			InsertOutcome::Inserted => Ok(binding),
			InsertOutcome::Exists(_) => Err(Error::BindingAlreadyExists),
		}
	}

	pub(super) async fn unbind_instance(
		&self,
		instance_id: &InstanceId,
		binding_id: &BindingId,
		_details: UnbindDetails,
	) -> Result<()> {
		let _lock = self.lock_instance(instance_id).await;

		self.settle_due(instance_id).await?;

		if self.store.fetch_instance(instance_id).await?.is_none() {
			return Err(Error::InstanceDoesNotExist);
		}

		match self.store.remove_binding(instance_id, binding_id).await? {
			Some(_) => Ok(()),
			None => Err(Error::BindingDoesNotExist),
		}
	}

	/// Answers a bind request for a binding identifier that is already taken.
	fn replay_binding(&self, existing: BindingRecord, details: &BindDetails) -> Result<Binding> {
		if self.config.idempotency == IdempotencyPolicy::ReplayIdentical
			&& &existing.details == details
		{
			Ok(existing.binding)
		} else {
			Err(Error::BindingAlreadyExists)
		}
	}
}

/// Reads a URL the platform should wire up, if the service holds the matching permission.
///
/// `syslog_drain` reads the `syslog_drain_url` parameter; `route_forwarding` reads
/// `route_service_url` and only applies to route bindings.
fn forwarded_url(
	service: &Service,
	details: &BindDetails,
	permission: &str,
) -> Result<Option<Url>> {
	let key = match permission {
		Service::REQUIRES_SYSLOG_DRAIN => "syslog_drain_url",
		Service::REQUIRES_ROUTE_FORWARDING if details.route().is_some() => "route_service_url",
		_ => return Ok(None),
	};

	if !service.requires(permission) {
		return Ok(None);
	}

	let Some(value) = details.parameters.as_ref().and_then(|params| params.get(key)) else {
		return Ok(None);
	};
	let path = format!("parameters.{key}");
	let raw = value.as_str().ok_or_else(|| ParamsError {
		path: path.clone(),
		message: "expected a URL string".into(),
	})?;

	Url::parse(raw).map(Some).map_err(|e| ParamsError { path, message: e.to_string() }.into())
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::{
		_preludet::*,
		broker::ServiceBroker,
		catalog::{Catalog, ServicePlan},
		lifecycle::{LifecycleConfig, PlanSettings},
		model::{BindResource, Parameters, PlanId, ServiceId},
	};

	fn binding_id(value: &str) -> BindingId {
		BindingId::new(value).expect("Binding fixture should be valid.")
	}

	fn forwarding_service() -> Service {
		Service::new(
			ServiceId::new("svc-logs").expect("Service fixture should be valid."),
			"logs",
			"Log forwarding",
		)
		.bindable(true)
		.with_requirement(Service::REQUIRES_SYSLOG_DRAIN)
		.with_requirement(Service::REQUIRES_ROUTE_FORWARDING)
		.with_plan(ServicePlan::new(
			PlanId::new("plan-logs").expect("Plan fixture should be valid."),
			"logs",
			"",
		))
	}

	fn params(value: Value) -> Parameters {
		match value {
			Value::Object(map) => map,
			_ => unreachable!("Fixture literal is an object."),
		}
	}

	#[tokio::test]
	async fn bind_mints_credentials_and_rejects_duplicates() {
		let t = build_test_broker(test_config());
		let id = instance_id("i-1");

		t.broker
			.provision(&id, provision_params(SYNC_PLAN), false)
			.await
			.expect("Provision should succeed.");

		let binding = t
			.broker
			.bind(&id, &binding_id("b-1"), bind_details("app-1", SYNC_PLAN))
			.await
			.expect("Bind should succeed.");

		assert!(binding.credentials.get("password").is_some());
		assert_eq!(binding.syslog_drain_url, None);
		assert!(matches!(
			t.broker.bind(&id, &binding_id("b-1"), bind_details("app-1", SYNC_PLAN)).await,
			Err(Error::BindingAlreadyExists)
		));
	}

	#[tokio::test]
	async fn bind_is_blocked_while_provisioning() {
		let t = build_test_broker(test_config());
		let id = instance_id("i-1");

		t.broker
			.provision(&id, provision_params(ASYNC_PLAN), true)
			.await
			.expect("Provision should be accepted.");

		assert!(matches!(
			t.broker.bind(&id, &binding_id("b-1"), bind_details("app-1", ASYNC_PLAN)).await,
			Err(Error::OperationInProgress { .. })
		));

		t.clock.advance(Duration::minutes(1));

		t.broker
			.bind(&id, &binding_id("b-1"), bind_details("app-1", ASYNC_PLAN))
			.await
			.expect("Bind should succeed once provisioning settled.");
	}

	#[test]
	fn forwarded_urls_follow_permissions() {
		let service = forwarding_service();
		let plan = PlanId::new("plan-logs").expect("Plan fixture should be valid.");
		let details = BindDetails::new(plan, service.id.clone()).with_parameters(params(
			serde_json::json!({
				"syslog_drain_url": "syslog-tls://logs.example.com:6514",
				"route_service_url": "https://proxy.example.com",
			}),
		));
		let drain = forwarded_url(&service, &details, Service::REQUIRES_SYSLOG_DRAIN)
			.expect("Drain URL should parse.")
			.expect("Drain URL should be forwarded.");

		assert_eq!(drain.scheme(), "syslog-tls");
		assert_eq!(
			forwarded_url(&service, &details, Service::REQUIRES_ROUTE_FORWARDING)
				.expect("App bindings should not fail."),
			None,
			"Route services only apply to route bindings."
		);

		let details = details.with_bind_resource(BindResource {
			app_guid: None,
			route: Some("app.example.com".into()),
		});

		assert!(
			forwarded_url(&service, &details, Service::REQUIRES_ROUTE_FORWARDING)
				.expect("Route service URL should parse.")
				.is_some()
		);
	}

	#[tokio::test]
	async fn invalid_drain_url_is_a_params_error() {
		let catalog = Catalog::new([forwarding_service()]).expect("Catalog should build.");
		let broker = LifecycleBroker::builder(catalog)
			.config(LifecycleConfig::default().with_plan(
				PlanId::new("plan-logs").expect("Plan fixture should be valid."),
				PlanSettings::default(),
			))
			.build()
			.expect("Broker should build.");
		let id = instance_id("i-logs");
		let provision =
			params(serde_json::json!({ "service_id": "svc-logs", "plan_id": "plan-logs" }));

		broker.provision(&id, provision, false).await.expect("Provision should succeed.");

		let details = BindDetails::new(
			PlanId::new("plan-logs").expect("Plan fixture should be valid."),
			ServiceId::new("svc-logs").expect("Service fixture should be valid."),
		)
		.with_parameters(params(serde_json::json!({ "syslog_drain_url": 42 })));

		match broker.bind(&id, &binding_id("b-1"), details).await {
			Err(Error::RawParamsInvalid { source: Some(source) }) =>
				assert_eq!(source.path, "parameters.syslog_drain_url"),
			other => panic!("Unexpected bind result: {other:?}"),
		}
	}
}
