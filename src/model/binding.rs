//! Request and result shapes for bindings.

// self
use crate::{
	_prelude::*,
	model::{Parameters, PlanId, ServiceId},
};

/// Context supplied with a bind request.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BindDetails {
	/// Application the binding is created for, when binding to an app.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub app_guid: Option<String>,
	/// Plan of the instance being bound.
	pub plan_id: PlanId,
	/// Service of the instance being bound.
	pub service_id: ServiceId,
	/// Resource the binding targets.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub bind_resource: Option<BindResource>,
	/// Service-specific binding configuration.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub parameters: Option<Parameters>,
}
impl BindDetails {
	/// Creates details for the provided plan and service with no consumer attached yet.
	pub fn new(plan_id: PlanId, service_id: ServiceId) -> Self {
		Self { app_guid: None, plan_id, service_id, bind_resource: None, parameters: None }
	}

	/// Sets the application GUID.
	pub fn with_app_guid(mut self, app_guid: impl Into<String>) -> Self {
		self.app_guid = Some(app_guid.into());

		self
	}

	/// Sets the bind resource.
	pub fn with_bind_resource(mut self, resource: BindResource) -> Self {
		self.bind_resource = Some(resource);

		self
	}

	/// Sets the binding parameters.
	pub fn with_parameters(mut self, parameters: Parameters) -> Self {
		self.parameters = Some(parameters);

		self
	}

	/// Route the binding targets, if any.
	pub fn route(&self) -> Option<&str> {
		self.bind_resource.as_ref().and_then(|r| r.route.as_deref())
	}
}

/// Consumer of a binding: an application, a route, or both.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BindResource {
	/// Application GUID.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub app_guid: Option<String>,
	/// Route address.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub route: Option<String>,
}

/// Context supplied with an unbind request.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnbindDetails {
	/// Plan of the bound instance.
	pub plan_id: PlanId,
	/// Service of the bound instance.
	pub service_id: ServiceId,
}

/// Result of a bind request.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Binding {
	/// Service-specific credentials payload.
	pub credentials: Value,
	/// Log drain the platform should stream application logs to.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub syslog_drain_url: Option<Url>,
	/// Route service the platform should proxy route traffic through.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub route_service_url: Option<Url>,
}
impl Binding {
	/// Creates a binding carrying only credentials.
	pub fn new(credentials: Value) -> Self {
		Self { credentials, syslog_drain_url: None, route_service_url: None }
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn binding_drops_absent_urls_on_the_wire() {
		let binding = Binding::new(serde_json::json!({ "username": "u" }));

		assert_eq!(
			serde_json::to_value(&binding).expect("Binding should serialize."),
			serde_json::json!({ "credentials": { "username": "u" } })
		);
	}

	#[test]
	fn bind_details_accept_route_only_resource() {
		let details: BindDetails = serde_json::from_value(serde_json::json!({
			"plan_id": "plan-small",
			"service_id": "svc-1",
			"bind_resource": { "route": "app.example.com" }
		}))
		.expect("Route-only bind details should decode.");

		assert_eq!(details.app_guid, None);
		assert_eq!(details.route(), Some("app.example.com"));
		assert_eq!(details.bind_resource.and_then(|r| r.app_guid), None);
	}
}
