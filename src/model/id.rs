//! Identity of instances, bindings, and catalog entries.
//!
//! Instance and binding identifiers are chosen by the platform and double as idempotency keys, so
//! the broker treats them as opaque: any text is accepted as long as it can travel as one URL
//! path segment. Service and plan identifiers come from the catalog and follow the same rules.

// std
use std::{borrow::Borrow, ops::Deref};
// self
use crate::_prelude::*;

macro_rules! def_id {
	($name:ident, $doc:literal, $kind:literal) => {
		#[doc = $doc]
		#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
		#[serde(try_from = "String", into = "String")]
		pub struct $name(String);
		impl $name {
			/// Accepts a caller-supplied identifier.
			pub fn new(value: impl AsRef<str>) -> Result<Self, IdentifierError> {
				let value = value.as_ref();

				check_identifier($kind, value)?;

				Ok(Self(value.to_owned()))
			}
		}
		impl Deref for $name {
			type Target = str;

			fn deref(&self) -> &Self::Target {
				&self.0
			}
		}
		impl AsRef<str> for $name {
			fn as_ref(&self) -> &str {
				&self.0
			}
		}
		impl From<$name> for String {
			fn from(value: $name) -> Self {
				value.0
			}
		}
		impl TryFrom<String> for $name {
			type Error = IdentifierError;

			fn try_from(value: String) -> Result<Self, Self::Error> {
				check_identifier($kind, &value)?;

				Ok(Self(value))
			}
		}
		impl Borrow<str> for $name {
			fn borrow(&self) -> &str {
				&self.0
			}
		}
		impl Debug for $name {
			fn fmt(&self, f: &mut Formatter) -> FmtResult {
				write!(f, concat!($kind, "({})"), self.0)
			}
		}
		impl Display for $name {
			fn fmt(&self, f: &mut Formatter) -> FmtResult {
				f.write_str(&self.0)
			}
		}
		impl FromStr for $name {
			type Err = IdentifierError;

			fn from_str(s: &str) -> Result<Self, Self::Err> {
				Self::new(s)
			}
		}
	};
}

const IDENTIFIER_MAX_LEN: usize = 128;

/// Reasons an identifier cannot denote an instance, binding, service, or plan.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, ThisError)]
pub enum IdentifierError {
	/// Nothing was supplied.
	#[error("{kind} identifier cannot be empty.")]
	Empty {
		/// Instance, Binding, Service, or Plan.
		kind: &'static str,
	},
	/// `.` and `..` collapse when used as a path segment.
	#[error("{kind} identifier cannot be a dot segment.")]
	DotSegment {
		/// Instance, Binding, Service, or Plan.
		kind: &'static str,
	},
	/// Control characters cannot be carried in a request path.
	#[error("{kind} identifier contains control characters.")]
	ContainsControl {
		/// Instance, Binding, Service, or Plan.
		kind: &'static str,
	},
	/// Longer than the platform may send.
	#[error("{kind} identifier exceeds {max} bytes.")]
	TooLong {
		/// Instance, Binding, Service, or Plan.
		kind: &'static str,
		/// Maximum byte count.
		max: usize,
	},
}

def_id! { InstanceId, "Platform-chosen key of a service instance.", "Instance" }
def_id! { BindingId, "Platform-chosen key of a binding, unique within its instance.", "Binding" }
def_id! { ServiceId, "Catalog key of a service offering.", "Service" }
def_id! { PlanId, "Catalog key of a service plan.", "Plan" }

fn check_identifier(kind: &'static str, value: &str) -> Result<(), IdentifierError> {
	match value {
		"" => Err(IdentifierError::Empty { kind }),
		"." | ".." => Err(IdentifierError::DotSegment { kind }),
		_ if value.chars().any(char::is_control) => Err(IdentifierError::ContainsControl { kind }),
		_ if value.len() > IDENTIFIER_MAX_LEN =>
			Err(IdentifierError::TooLong { kind, max: IDENTIFIER_MAX_LEN }),
		_ => Ok(()),
	}
}
