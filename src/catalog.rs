//! Catalog of service offerings plus validation of its invariants.
//!
//! A [`Catalog`] is validated once on construction (or deserialization) so brokers can look up
//! services and plans without re-checking uniqueness on every request.

pub mod service;

pub use service::*;

// std
use std::collections::HashSet;
// self
use crate::{
	_prelude::*,
	model::{PlanId, ServiceId},
};

/// Catalog validation and lookup failures.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum CatalogError {
	/// A service or plan has an empty name.
	#[error("The {kind} `{id}` must have a name.")]
	EmptyName {
		/// Entry kind (`service` or `plan`).
		kind: String,
		/// Entry identifier.
		id: String,
	},
	/// A service declares no plans.
	#[error("Service `{service}` must offer at least one plan.")]
	NoPlans {
		/// Offending service identifier.
		service: String,
	},
	/// Two services share an identifier.
	#[error("Service `{service}` is declared more than once.")]
	DuplicateService {
		/// Duplicated service identifier.
		service: String,
	},
	/// Two plans share an identifier.
	#[error("Plan `{plan}` is declared more than once.")]
	DuplicatePlan {
		/// Duplicated plan identifier.
		plan: String,
	},
	/// Request references a service the catalog does not offer.
	#[error("Service `{service}` is not offered by this broker.")]
	UnknownService {
		/// Requested service identifier.
		service: String,
	},
	/// Request references a plan the service does not offer.
	#[error("Plan `{plan}` is not offered by service `{service}`.")]
	UnknownPlan {
		/// Requested service identifier.
		service: String,
		/// Requested plan identifier.
		plan: String,
	},
	/// Broker settings reference a plan no service offers.
	#[error("Settings reference plan `{plan}`, which no service offers.")]
	OrphanedSettings {
		/// Orphaned plan identifier.
		plan: String,
	},
	/// Bind was requested for a service that is not bindable.
	#[error("Service `{service}` does not support bindings.")]
	NotBindable {
		/// Requested service identifier.
		service: String,
	},
}

/// Validated list of services and plans a broker offers.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawCatalog")]
pub struct Catalog {
	services: Vec<Service>,
}
impl Catalog {
	/// Validates and wraps the provided services, preserving their order.
	pub fn new<I>(services: I) -> Result<Self, CatalogError>
	where
		I: IntoIterator<Item = Service>,
	{
		let catalog = Self { services: services.into_iter().collect() };

		catalog.validate()?;

		Ok(catalog)
	}

	/// Services in declaration order.
	pub fn services(&self) -> &[Service] {
		&self.services
	}

	/// Looks up a service.
	pub fn service(&self, id: &ServiceId) -> Option<&Service> {
		self.services.iter().find(|service| &service.id == id)
	}

	/// Looks up a plan of a service.
	pub fn plan(&self, service_id: &ServiceId, plan_id: &PlanId) -> Option<&ServicePlan> {
		self.service(service_id).and_then(|service| service.plan(plan_id))
	}

	/// Resolves a `(service, plan)` pair, failing with the matching lookup error.
	pub fn resolve(
		&self,
		service_id: &ServiceId,
		plan_id: &PlanId,
	) -> Result<(&Service, &ServicePlan), CatalogError> {
		let service = self
			.service(service_id)
			.ok_or_else(|| CatalogError::UnknownService { service: service_id.to_string() })?;
		let plan = service.plan(plan_id).ok_or_else(|| CatalogError::UnknownPlan {
			service: service_id.to_string(),
			plan: plan_id.to_string(),
		})?;

		Ok((service, plan))
	}

	fn validate(&self) -> Result<(), CatalogError> {
		let mut service_ids = HashSet::new();
		let mut plan_ids = HashSet::new();

		for service in &self.services {
			if !service_ids.insert(&service.id) {
				return Err(CatalogError::DuplicateService { service: service.id.to_string() });
			}

			validate_name("service", &service.id, &service.name)?;

			if service.plans.is_empty() {
				return Err(CatalogError::NoPlans { service: service.id.to_string() });
			}

			for plan in &service.plans {
				if !plan_ids.insert(&plan.id) {
					return Err(CatalogError::DuplicatePlan { plan: plan.id.to_string() });
				}

				validate_name("plan", &plan.id, &plan.name)?;
			}
		}

		Ok(())
	}
}

#[derive(Deserialize)]
struct RawCatalog {
	services: Vec<Service>,
}
impl TryFrom<RawCatalog> for Catalog {
	type Error = CatalogError;

	fn try_from(raw: RawCatalog) -> Result<Self, Self::Error> {
		Self::new(raw.services)
	}
}

fn validate_name(kind: &str, id: &str, name: &str) -> Result<(), CatalogError> {
	if name.trim().is_empty() {
		Err(CatalogError::EmptyName { kind: kind.into(), id: id.into() })
	} else {
		Ok(())
	}
}
