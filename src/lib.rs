//! Service Broker contract for platform-as-a-service systems: provision, bind, update, and
//! deprovision backing services through one typed trait, with a lifecycle broker that honors
//! every rule of the contract.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod broker;
pub mod catalog;
pub mod clock;
pub mod error;
pub mod lifecycle;
pub mod model;
pub mod obs;
pub mod store;
#[cfg(any(test, feature = "test"))]
pub mod _preludet {
	//! Convenience re-exports and helpers for integration tests; enabled via `cfg(test)` or the
	//! `test` crate feature.

	pub use crate::_prelude::*;

	// self
	use crate::{
		catalog::{Catalog, Service, ServicePlan},
		clock::ManualClock,
		lifecycle::{AsyncMode, LifecycleBroker, LifecycleConfig, PlanSettings},
		model::{BindDetails, DeprovisionDetails, InstanceId, Parameters, PlanId, ServiceId},
		store::MemoryStore,
	};

	/// Service identifier used by the fixture catalog.
	pub const TEST_SERVICE: &str = "svc-postgres";
	/// Plan that always completes synchronously.
	pub const SYNC_PLAN: &str = "plan-small";
	/// Plan that can only complete asynchronously.
	pub const ASYNC_PLAN: &str = "plan-cluster";
	/// Plan that completes asynchronously when the caller allows it.
	pub const OPTIONAL_ASYNC_PLAN: &str = "plan-medium";
	/// Instant the manual test clock starts at.
	pub const TEST_EPOCH: OffsetDateTime = time::macros::datetime!(2025-11-10 12:00 UTC);

	/// Everything an integration test needs to drive a lifecycle broker.
	pub struct TestBroker {
		/// Broker under test.
		pub broker: LifecycleBroker,
		/// Backing store shared with the broker.
		pub store: Arc<MemoryStore>,
		/// Clock shared with the broker.
		pub clock: Arc<ManualClock>,
	}

	/// Parses an identifier fixture.
	pub fn instance_id(value: &str) -> InstanceId {
		InstanceId::new(value).expect("Instance identifier fixture should be valid.")
	}

	/// Builds the fixture catalog: one bindable, plan-updateable service with three plans.
	pub fn test_catalog() -> Catalog {
		let plan = |id: &str, name: &str| {
			ServicePlan::new(
				PlanId::new(id).expect("Plan identifier fixture should be valid."),
				name,
				format!("{name} plan"),
			)
		};
		let service = Service::new(
			ServiceId::new(TEST_SERVICE).expect("Service identifier fixture should be valid."),
			"postgres",
			"Managed PostgreSQL",
		)
		.bindable(true)
		.plan_updateable(true)
		.with_plan(plan(SYNC_PLAN, "small"))
		.with_plan(plan(OPTIONAL_ASYNC_PLAN, "medium"))
		.with_plan(plan(ASYNC_PLAN, "cluster"));

		Catalog::new([service]).expect("Fixture catalog should be valid.")
	}

	/// Configuration matching [`test_catalog`]: async plans take one minute to settle.
	pub fn test_config() -> LifecycleConfig {
		let plan_id = |id: &str| PlanId::new(id).expect("Plan identifier fixture should be valid.");

		LifecycleConfig::default()
			.with_plan(plan_id(SYNC_PLAN), PlanSettings::new(AsyncMode::Never))
			.with_plan(
				plan_id(OPTIONAL_ASYNC_PLAN),
				PlanSettings::new(AsyncMode::Optional).with_operation_duration(Duration::minutes(1)),
			)
			.with_plan(
				plan_id(ASYNC_PLAN),
				PlanSettings::new(AsyncMode::Required).with_operation_duration(Duration::minutes(1)),
			)
	}

	/// Builds a lifecycle broker over a fresh memory store and manual clock.
	pub fn build_test_broker(config: LifecycleConfig) -> TestBroker {
		let store = Arc::new(MemoryStore::default());
		let clock = Arc::new(ManualClock::new(TEST_EPOCH));
		let broker = LifecycleBroker::builder(test_catalog())
			.store(store.clone())
			.clock(clock.clone())
			.config(config)
			.build()
			.expect("Fixture configuration should match the fixture catalog.");

		TestBroker { broker, store, clock }
	}

	/// Provision parameters targeting the fixture service and the provided plan.
	pub fn provision_params(plan: &str) -> Parameters {
		let value = serde_json::json!({
			"service_id": TEST_SERVICE,
			"plan_id": plan,
			"organization_guid": "org-1",
			"space_guid": "space-1",
		});

		match value {
			serde_json::Value::Object(map) => map,
			_ => unreachable!("Fixture literal is an object."),
		}
	}

	/// Bind details targeting the fixture service and the provided plan.
	pub fn bind_details(app_guid: &str, plan: &str) -> BindDetails {
		BindDetails::new(
			PlanId::new(plan).expect("Plan identifier fixture should be valid."),
			ServiceId::new(TEST_SERVICE).expect("Service identifier fixture should be valid."),
		)
		.with_app_guid(app_guid)
	}

	/// Deprovision details targeting the fixture service and the provided plan.
	pub fn deprovision_details(plan: &str) -> DeprovisionDetails {
		DeprovisionDetails {
			plan_id: PlanId::new(plan).expect("Plan identifier fixture should be valid."),
			service_id: ServiceId::new(TEST_SERVICE)
				.expect("Service identifier fixture should be valid."),
		}
	}
}

mod _prelude {
	pub use std::{
		collections::HashMap,
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		str::FromStr,
		sync::Arc,
	};

	pub use async_lock::Mutex as AsyncMutex;
	pub use parking_lot::{Mutex, RwLock};
	pub use serde::{Deserialize, Serialize};
	pub use serde_json::Value;
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

pub use serde_json;
pub use url;
#[cfg(test)] use tokio as _;
