//! Open-ended parameter payloads and their decoding into broker-specific shapes.

// crates.io
use serde::de::DeserializeOwned;
// self
use crate::{_prelude::*, error::ParamsError};

/// Arbitrary key-value parameters supplied with provision, update, and bind requests.
pub type Parameters = serde_json::Map<String, Value>;

/// Parses a raw request body into [`Parameters`].
///
/// An empty (or whitespace-only) body yields an empty map. Anything that is not a JSON object
/// fails with [`Error::RawParamsInvalid`].
pub fn parse_raw_parameters(raw: &[u8]) -> Result<Parameters> {
	if raw.iter().all(u8::is_ascii_whitespace) {
		return Ok(Parameters::new());
	}

	let mut deserializer = serde_json::Deserializer::from_slice(raw);
	let value: Value =
		serde_path_to_error::deserialize(&mut deserializer).map_err(ParamsError::from)?;

	deserializer.end().map_err(|e| ParamsError::root(e.to_string()))?;

	match value {
		Value::Object(map) => Ok(map),
		other => Err(ParamsError::root(format!("expected an object, found {}", kind_of(&other)))
			.into()),
	}
}

/// Decodes [`Parameters`] into a typed request, locating the first invalid field.
pub fn decode_parameters<T>(params: &Parameters) -> Result<T>
where
	T: DeserializeOwned,
{
	// Borrowing a `Map` as a deserializer requires an owned value.
	let value = Value::Object(params.clone());

	serde_path_to_error::deserialize(value).map_err(|e| ParamsError::from(e).into())
}

fn kind_of(value: &Value) -> &'static str {
	match value {
		Value::Null => "null",
		Value::Bool(_) => "a boolean",
		Value::Number(_) => "a number",
		Value::String(_) => "a string",
		Value::Array(_) => "an array",
		Value::Object(_) => "an object",
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[derive(Debug, Deserialize)]
	struct Sizing {
		#[allow(dead_code)]
		replicas: u8,
	}

	#[test]
	fn empty_body_is_an_empty_map() {
		assert!(parse_raw_parameters(b"").expect("Empty body should parse.").is_empty());
		assert!(parse_raw_parameters(b"  \n").expect("Blank body should parse.").is_empty());
	}

	#[test]
	fn non_objects_are_rejected() {
		let err = parse_raw_parameters(b"[1, 2]").expect_err("Arrays should be rejected.");

		match err {
			Error::RawParamsInvalid { source: Some(source) } => {
				assert_eq!(source.path, ".");
				assert!(source.message.contains("an array"));
			},
			other => panic!("Unexpected error: {other:?}"),
		}

		assert!(matches!(
			parse_raw_parameters(b"{\"plan\": ").expect_err("Truncated JSON should be rejected."),
			Error::RawParamsInvalid { .. }
		));
	}

	#[test]
	fn decode_reports_the_failing_path() {
		let params = parse_raw_parameters(br#"{"replicas": "three"}"#)
			.expect("Object body should parse.");
		let err = decode_parameters::<Sizing>(&params).expect_err("String replicas should fail.");

		match err {
			Error::RawParamsInvalid { source: Some(source) } => assert_eq!(source.path, "replicas"),
			other => panic!("Unexpected error: {other:?}"),
		}
	}
}
