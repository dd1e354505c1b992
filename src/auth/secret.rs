//! Redacting wrappers for bearer tokens and the process signing secret.

// crates.io
use base64::{Engine as _, engine::general_purpose::STANDARD};
use rand::RngCore;
// self
use crate::{_prelude::*, error::ConfigError};

/// Redacted bearer token wrapper keeping sensitive material out of logs.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessToken(String);
impl AccessToken {
	/// Wraps a new token string.
	pub fn new(value: impl Into<String>) -> Self {
		Self(value.into())
	}

	/// Returns the inner token value. Callers must avoid logging this string.
	pub fn expose(&self) -> &str {
		&self.0
	}
}
impl AsRef<str> for AccessToken {
	fn as_ref(&self) -> &str {
		self.expose()
	}
}
impl Debug for AccessToken {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_tuple("AccessToken").field(&"<redacted>").finish()
	}
}
impl Display for AccessToken {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("<redacted>")
	}
}

/// HMAC key used to sign and verify every token issued by the process.
#[derive(Clone)]
pub struct SigningSecret(Arc<[u8]>);
impl SigningSecret {
	/// Shortest secret accepted from configuration (the HS256 output size).
	pub const MIN_LEN: usize = 32;

	/// Wraps raw key material.
	pub fn new(bytes: impl AsRef<[u8]>) -> Self {
		Self(Arc::from(bytes.as_ref()))
	}

	/// Draws a fresh random secret; tokens signed with it die with the process.
	pub fn generate() -> Self {
		let mut bytes = [0_u8; Self::MIN_LEN];

		rand::rng().fill_bytes(&mut bytes);

		Self::new(bytes)
	}

	/// Decodes a standard base64 secret and enforces [`Self::MIN_LEN`].
	pub fn from_base64(encoded: &str) -> Result<Self, ConfigError> {
		let bytes = STANDARD.decode(encoded.trim())?;

		if bytes.len() < Self::MIN_LEN {
			return Err(ConfigError::SecretTooShort { min: Self::MIN_LEN });
		}

		Ok(Self::new(bytes))
	}

	/// Returns the raw key bytes. Callers must avoid logging them.
	pub fn expose(&self) -> &[u8] {
		&self.0
	}
}
impl Debug for SigningSecret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_tuple("SigningSecret").field(&"<redacted>").finish()
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn secret_formatters_redact() {
		let token = AccessToken::new("header.payload.signature");

		assert_eq!(format!("{token:?}"), "AccessToken(\"<redacted>\")");
		assert_eq!(format!("{token}"), "<redacted>");

		let secret = SigningSecret::new(b"key");

		assert_eq!(format!("{secret:?}"), "SigningSecret(\"<redacted>\")");
	}

	#[test]
	fn base64_secrets_enforce_minimum_length() {
		let short = STANDARD.encode([7_u8; 16]);

		assert!(matches!(
			SigningSecret::from_base64(&short),
			Err(ConfigError::SecretTooShort { min: SigningSecret::MIN_LEN })
		));
		assert!(matches!(
			SigningSecret::from_base64("not base64!"),
			Err(ConfigError::SecretEncoding(_))
		));

		let encoded = STANDARD.encode([7_u8; 48]);
		let secret = SigningSecret::from_base64(&encoded).expect("Long secret should decode.");

		assert_eq!(secret.expose(), &[7_u8; 48]);
	}

	#[test]
	fn generated_secrets_differ() {
		assert_ne!(SigningSecret::generate().expose(), SigningSecret::generate().expose());
	}
}
