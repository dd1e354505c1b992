//! Salted Argon2id password hashing for stored credentials.

// crates.io
use argon2::{
	Algorithm, Argon2, Params, Version,
	password_hash::{
		Error as HashError, PasswordHash, PasswordHasher as _, PasswordVerifier as _, SaltString,
	},
};
use rand::RngCore;
// self
use crate::_prelude::*;

const SALT_LEN: usize = 16;

/// Failures raised while configuring or running the password hasher.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum PasswordError {
	/// Argon2 rejected the configured cost parameters.
	#[error("Argon2 cost parameters were rejected: {message}.")]
	Params {
		/// Upstream description.
		message: String,
	},
	/// Hashing or parsing a stored hash failed.
	#[error("Password hashing failed: {message}.")]
	Hash {
		/// Upstream description.
		message: String,
	},
}

/// Argon2 cost knobs, deserializable from configuration.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PasswordCost {
	/// Memory cost in KiB.
	pub memory_kib: u32,
	/// Number of passes.
	pub iterations: u32,
	/// Degree of parallelism.
	pub parallelism: u32,
}
impl Default for PasswordCost {
	fn default() -> Self {
		Self {
			memory_kib: Params::DEFAULT_M_COST,
			iterations: Params::DEFAULT_T_COST,
			parallelism: Params::DEFAULT_P_COST,
		}
	}
}

/// PHC-formatted password hash as stored in a credential.
#[derive(Clone, PartialEq, Eq)]
pub struct PasswordDigest(String);
impl PasswordDigest {
	/// Wraps an existing PHC string (e.g. loaded from a seed file).
	pub fn from_phc(value: impl Into<String>) -> Self {
		Self(value.into())
	}

	/// Returns the PHC string.
	pub fn as_phc(&self) -> &str {
		&self.0
	}
}
impl Debug for PasswordDigest {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_tuple("PasswordDigest").field(&"<redacted>").finish()
	}
}

/// Hashes and verifies passwords with Argon2id.
///
/// Verification reads the cost parameters back out of the stored digest, so hashes produced
/// under an older cost keep verifying after the cost is raised.
#[derive(Clone, Debug)]
pub struct PasswordHasher {
	params: Params,
}
impl PasswordHasher {
	/// Builds a hasher with explicit Argon2 costs.
	pub fn with_cost(
		memory_kib: u32,
		iterations: u32,
		parallelism: u32,
	) -> Result<Self, PasswordError> {
		let params = Params::new(memory_kib, iterations, parallelism, None)
			.map_err(|e| PasswordError::Params { message: e.to_string() })?;

		Ok(Self { params })
	}

	/// Builds a hasher from a configuration block.
	pub fn from_cost(cost: PasswordCost) -> Result<Self, PasswordError> {
		Self::with_cost(cost.memory_kib, cost.iterations, cost.parallelism)
	}

	/// Hashes `password` under a fresh random salt.
	pub fn hash(&self, password: &str) -> Result<PasswordDigest, PasswordError> {
		let mut salt_bytes = [0_u8; SALT_LEN];

		rand::rng().fill_bytes(&mut salt_bytes);

		let salt = SaltString::encode_b64(&salt_bytes)
			.map_err(|e| PasswordError::Hash { message: e.to_string() })?;
		let phc = self
			.argon2()
			.hash_password(password.as_bytes(), &salt)
			.map_err(|e| PasswordError::Hash { message: e.to_string() })?;

		Ok(PasswordDigest(phc.to_string()))
	}

	/// Checks `password` against `digest`; `Ok(false)` means a plain mismatch.
	pub fn verify(&self, password: &str, digest: &PasswordDigest) -> Result<bool, PasswordError> {
		let parsed = PasswordHash::new(digest.as_phc())
			.map_err(|e| PasswordError::Hash { message: e.to_string() })?;

		match self.argon2().verify_password(password.as_bytes(), &parsed) {
			Ok(()) => Ok(true),
			Err(HashError::Password) => Ok(false),
			Err(e) => Err(PasswordError::Hash { message: e.to_string() }),
		}
	}

	fn argon2(&self) -> Argon2<'static> {
		Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
	}
}
impl Default for PasswordHasher {
	fn default() -> Self {
		Self { params: Params::default() }
	}
}
