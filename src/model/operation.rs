//! Status of asynchronous operations as reported to pollers.

// self
use crate::_prelude::*;

/// State tag of the most recent operation on an instance.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LastOperationState {
	/// The operation is still running; keep polling.
	#[serde(rename = "in progress")]
	InProgress,
	/// The operation completed successfully.
	#[serde(rename = "succeeded")]
	Succeeded,
	/// The operation failed.
	#[serde(rename = "failed")]
	Failed,
}
impl LastOperationState {
	/// Returns the wire label.
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::InProgress => "in progress",
			Self::Succeeded => "succeeded",
			Self::Failed => "failed",
		}
	}

	/// Returns `true` once polling should stop.
	pub const fn is_terminal(self) -> bool {
		!matches!(self, Self::InProgress)
	}
}
impl Display for LastOperationState {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Polled status of an asynchronous operation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LastOperation {
	/// Current state.
	pub state: LastOperationState,
	/// Human-readable description.
	#[serde(default)]
	pub description: String,
}
impl LastOperation {
	/// Creates a status with the provided state and description.
	pub fn new(state: LastOperationState, description: impl Into<String>) -> Self {
		Self { state, description: description.into() }
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn states_use_protocol_labels() {
		let op = LastOperation::new(LastOperationState::InProgress, "Creating cluster.");

		assert_eq!(
			serde_json::to_value(&op).expect("Operation should serialize."),
			serde_json::json!({ "state": "in progress", "description": "Creating cluster." })
		);
		assert_eq!(
			serde_json::from_str::<LastOperationState>("\"failed\"")
				.expect("Failed label should deserialize."),
			LastOperationState::Failed
		);
		assert!(!LastOperationState::InProgress.is_terminal());
		assert!(LastOperationState::Succeeded.is_terminal());
	}
}
