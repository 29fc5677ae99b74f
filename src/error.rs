//! Broker-level error vocabulary shared by the contract, the lifecycle broker, and stores.

// self
use crate::_prelude::*;

/// Broker-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical broker error returned by every contract operation.
///
/// The first nine variants form the closed contract vocabulary; each carries a fixed message that
/// adapters may surface verbatim. The remaining variants cover implementation-specific conditions
/// the vocabulary does not describe.
#[derive(Debug, ThisError)]
pub enum Error {
	/// The instance identifier already denotes a provisioned instance.
	#[error("instance already exists")]
	InstanceAlreadyExists,
	/// The instance identifier is unknown to the broker.
	#[error("instance does not exist")]
	InstanceDoesNotExist,
	/// The service-level instance ceiling has been reached.
	#[error("instance limit for this service has been reached")]
	InstanceLimitMet,
	/// The plan-level quota has been reached.
	#[error(
		"The quota for this service plan has been exceeded. Please contact your Operator for help."
	)]
	PlanQuotaExceeded,
	/// The binding identifier already denotes a binding for the instance.
	#[error("binding already exists")]
	BindingAlreadyExists,
	/// The binding identifier is unknown for the instance.
	#[error("binding does not exist")]
	BindingDoesNotExist,
	/// The operation can only complete asynchronously but the caller did not allow it.
	#[error("This service plan requires client support for asynchronous service operations.")]
	AsyncRequired,
	/// The requested plan transition is disallowed by the service.
	#[error("The requested plan migration cannot be performed")]
	PlanChangeNotSupported,
	/// The supplied parameters could not be interpreted as structured input.
	#[error("The format of the parameters is not valid JSON")]
	RawParamsInvalid {
		/// Decoding detail, when the failure was located.
		#[source]
		source: Option<ParamsError>,
	},

	/// Storage-layer failure.
	#[error("{0}")]
	Storage(
		#[from]
		#[source]
		crate::store::StoreError,
	),
	/// Request references catalog entries the broker cannot serve.
	#[error(transparent)]
	Catalog(#[from] crate::catalog::CatalogError),
	/// Another operation is still outstanding for the instance.
	#[error("An operation is already in progress for instance {instance_id}.")]
	OperationInProgress {
		/// Instance with the outstanding operation.
		instance_id: String,
	},
	/// Implementation-specific failure outside the contract vocabulary.
	#[error("Broker failure: {message}.")]
	Internal {
		/// Human-readable summary.
		message: String,
		/// Underlying failure.
		#[source]
		source: Option<BoxError>,
	},
}
impl Error {
	/// Builds a [`Error::RawParamsInvalid`] without a located cause.
	pub fn raw_params_invalid() -> Self {
		Self::RawParamsInvalid { source: None }
	}

	/// Wraps an implementation-specific failure inside [`Error::Internal`].
	pub fn internal(message: impl Into<String>, src: impl 'static + Send + Sync + StdError) -> Self {
		Self::Internal { message: message.into(), source: Some(Box::new(src)) }
	}

	/// Returns `true` for the nine contract sentinels.
	pub fn is_contract(&self) -> bool {
		!matches!(
			self,
			Self::Storage(_)
				| Self::Catalog(_)
				| Self::OperationInProgress { .. }
				| Self::Internal { .. }
		)
	}

	/// Returns a stable label suitable for metric fields and log keys.
	pub const fn label(&self) -> &'static str {
		match self {
			Self::InstanceAlreadyExists => "instance_already_exists",
			Self::InstanceDoesNotExist => "instance_does_not_exist",
			Self::InstanceLimitMet => "instance_limit_met",
			Self::PlanQuotaExceeded => "plan_quota_exceeded",
			Self::BindingAlreadyExists => "binding_already_exists",
			Self::BindingDoesNotExist => "binding_does_not_exist",
			Self::AsyncRequired => "async_required",
			Self::PlanChangeNotSupported => "plan_change_not_supported",
			Self::RawParamsInvalid { .. } => "raw_params_invalid",
			Self::Storage(_) => "storage",
			Self::Catalog(_) => "catalog",
			Self::OperationInProgress { .. } => "operation_in_progress",
			Self::Internal { .. } => "internal",
		}
	}
}
impl From<ParamsError> for Error {
	fn from(e: ParamsError) -> Self {
		Self::RawParamsInvalid { source: Some(e) }
	}
}

/// Located failure produced while decoding request parameters.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
#[error("Invalid parameters at `{path}`: {message}.")]
pub struct ParamsError {
	/// JSON path of the offending value (`.` for the document root).
	pub path: String,
	/// Decoder message.
	pub message: String,
}
impl ParamsError {
	/// Builds an error rooted at the document itself.
	pub fn root(message: impl Into<String>) -> Self {
		Self { path: ".".into(), message: message.into() }
	}
}
impl From<serde_path_to_error::Error<serde_json::Error>> for ParamsError {
	fn from(e: serde_path_to_error::Error<serde_json::Error>) -> Self {
		Self { path: e.path().to_string(), message: e.inner().to_string() }
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::store::StoreError;

	#[test]
	fn sentinel_messages_are_fixed() {
		assert_eq!(Error::InstanceAlreadyExists.to_string(), "instance already exists");
		assert_eq!(Error::InstanceDoesNotExist.to_string(), "instance does not exist");
		assert_eq!(
			Error::InstanceLimitMet.to_string(),
			"instance limit for this service has been reached"
		);
		assert_eq!(
			Error::PlanQuotaExceeded.to_string(),
			"The quota for this service plan has been exceeded. Please contact your Operator for help."
		);
		assert_eq!(Error::BindingAlreadyExists.to_string(), "binding already exists");
		assert_eq!(Error::BindingDoesNotExist.to_string(), "binding does not exist");
		assert_eq!(
			Error::AsyncRequired.to_string(),
			"This service plan requires client support for asynchronous service operations."
		);
		assert_eq!(
			Error::PlanChangeNotSupported.to_string(),
			"The requested plan migration cannot be performed"
		);
		assert_eq!(
			Error::from(ParamsError::root("expected an object")).to_string(),
			"The format of the parameters is not valid JSON"
		);
	}

	#[test]
	fn raw_params_invalid_exposes_located_source() {
		let err = Error::from(ParamsError { path: "plan_id".into(), message: "missing".into() });
		let source = StdError::source(&err).expect("Located params error should be the source.");

		assert!(source.to_string().contains("plan_id"));
		assert!(StdError::source(&Error::raw_params_invalid()).is_none());
	}

	#[test]
	fn store_error_converts_with_source() {
		let store_error = StoreError::Backend { message: "database unreachable".into() };
		let err: Error = store_error.clone().into();

		assert!(matches!(err, Error::Storage(_)));
		assert!(!err.is_contract());
		assert_eq!(err.label(), "storage");
		assert!(err.to_string().contains("database unreachable"));
		assert_eq!(
			StdError::source(&err)
				.expect("Broker error should expose the store error as its source.")
				.to_string(),
			store_error.to_string()
		);
	}

	#[test]
	fn labels_distinguish_contract_sentinels() {
		assert!(Error::AsyncRequired.is_contract());
		assert!(Error::raw_params_invalid().is_contract());
		assert!(!Error::OperationInProgress { instance_id: "i-1".into() }.is_contract());
		assert_eq!(Error::PlanChangeNotSupported.label(), "plan_change_not_supported");
	}
}
