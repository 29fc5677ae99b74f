// self
use crate::{
	_prelude::*,
	obs::{BrokerOperation, OperationOutcome},
};

/// Records an operation outcome via the global metrics recorder (when enabled).
pub fn record_operation_outcome(operation: BrokerOperation, outcome: OperationOutcome) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!(
			"service_broker_operation_total",
			"operation" => operation.as_str(),
			"outcome" => outcome.as_str()
		)
		.increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = (operation, outcome);
	}
}

/// Records the error classification of a failed operation (when enabled).
pub fn record_operation_error(operation: BrokerOperation, error: &Error) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!(
			"service_broker_operation_error_total",
			"operation" => operation.as_str(),
			"error" => error.label()
		)
		.increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = (operation, error);
	}
}

/// Records the outcome of a finished call, including its error label on failure.
pub fn record_operation_result<T>(operation: BrokerOperation, result: &Result<T>) {
	match result {
		Ok(_) => record_operation_outcome(operation, OperationOutcome::Success),
		Err(e) => {
			record_operation_outcome(operation, OperationOutcome::Failure);
			record_operation_error(operation, e);
		},
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn recorders_are_noops_without_metrics() {
		record_operation_outcome(BrokerOperation::Bind, OperationOutcome::Attempt);
		record_operation_result::<()>(BrokerOperation::Unbind, &Err(Error::BindingDoesNotExist));
	}
}
