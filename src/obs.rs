//! Optional observability helpers for broker operations.
//!
//! # Feature Flags
//!
//! - Enable `tracing` to emit structured spans named `service_broker.operation` with the
//!   `operation` and `instance_id` fields.
//! - Enable `metrics` to increment the `service_broker_operation_total` counter for every
//!   attempt/success/failure, labeled by `operation` + `outcome`, and the
//!   `service_broker_operation_error_total` counter labeled by `operation` + `error`.

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// self
use crate::_prelude::*;

/// Contract operations observed by the broker.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BrokerOperation {
	/// Instance creation.
	Provision,
	/// Instance deletion.
	Deprovision,
	/// Binding creation.
	Bind,
	/// Binding deletion.
	Unbind,
	/// Plan or configuration change.
	Update,
	/// Asynchronous operation poll.
	LastOperation,
}
impl BrokerOperation {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			BrokerOperation::Provision => "provision",
			BrokerOperation::Deprovision => "deprovision",
			BrokerOperation::Bind => "bind",
			BrokerOperation::Unbind => "unbind",
			BrokerOperation::Update => "update",
			BrokerOperation::LastOperation => "last_operation",
		}
	}
}
impl Display for BrokerOperation {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded for each call.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OperationOutcome {
	/// Entry to a broker operation.
	Attempt,
	/// Successful completion.
	Success,
	/// Failure propagated back to the caller.
	Failure,
}
impl OperationOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			OperationOutcome::Attempt => "attempt",
			OperationOutcome::Success => "success",
			OperationOutcome::Failure => "failure",
		}
	}
}
impl Display for OperationOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
