//! Credential minting hooks invoked when a binding is created.

// crates.io
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use rand::{Rng, distr::Alphanumeric};
use sha2::{Digest, Sha256};
// self
use crate::{
	_prelude::*,
	model::{BindDetails, BindingId},
	store::InstanceRecord,
};

/// Everything a minter may inspect while producing credentials.
#[derive(Clone, Copy, Debug)]
pub struct BindContext<'a> {
	/// Instance being bound.
	pub instance: &'a InstanceRecord,
	/// Binding being created.
	pub binding_id: &'a BindingId,
	/// Bind request.
	pub details: &'a BindDetails,
}

/// Produces the service-specific credentials payload of a binding.
///
/// Implementors are required to be `Send + Sync`. The payload is opaque to the contract, so any
/// JSON shape is acceptable.
pub trait CredentialMinter: Send + Sync {
	/// Mints credentials for a new binding.
	fn mint(&self, ctx: &BindContext<'_>) -> Result<Value>;
}

/// Mints a deterministic username and a random password per binding.
#[derive(Clone, Copy, Debug)]
pub struct DefaultCredentialMinter {
	/// Length of generated passwords.
	pub password_len: usize,
}
impl DefaultCredentialMinter {
	const USERNAME_LEN: usize = 16;

	/// Username derived from the instance and binding identifiers.
	pub fn username(instance: &str, binding: &str) -> String {
		let digest = Sha256::digest(format!("{instance}:{binding}").as_bytes());
		let encoded = URL_SAFE_NO_PAD.encode(digest);

		format!("u-{}", &encoded[..Self::USERNAME_LEN])
	}

	fn password(&self) -> String {
		rand::rng().sample_iter(Alphanumeric).take(self.password_len).map(char::from).collect()
	}
}
impl Default for DefaultCredentialMinter {
	fn default() -> Self {
		Self { password_len: 32 }
	}
}
impl CredentialMinter for DefaultCredentialMinter {
	fn mint(&self, ctx: &BindContext<'_>) -> Result<Value> {
		Ok(serde_json::json!({
			"username": Self::username(&ctx.instance.id, ctx.binding_id),
			"password": self.password(),
			"instance_id": ctx.instance.id,
			"binding_id": ctx.binding_id,
			"plan_id": ctx.instance.plan_id,
		}))
	}
}
