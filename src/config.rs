//! JSON startup configuration for the gate.
//!
//! Parsing goes through `serde_path_to_error`, so a rejected document names the offending field
//! (for example `access./catalog.LaptopService/CreateLaptop[1]`). Semantic checks that need the
//! whole document (policy validation, TTL bounds, Argon2 bounds) run in the accessor methods.

// std
use std::{
	fs,
	path::{Path, PathBuf},
};
// crates.io
use serde::{
	Deserializer,
	de::{Error as DeError, MapAccess, Visitor},
};
// self
use crate::{
	_prelude::*,
	auth::{PasswordCost, PasswordHasher, SigningSecret},
	error::ConfigError,
	policy::{AccessPolicy, UnlistedMethods},
};

const DEFAULT_TOKEN_TTL_SECS: i64 = 15 * 60;
/// Longest token lifetime the configuration accepts.
pub const MAX_TOKEN_TTL_SECS: i64 = 24 * 60 * 60;

/// Startup configuration deserialized from JSON.
#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GateConfig {
	/// HMAC key for token signing, standard base64, at least [`SigningSecret::MIN_LEN`] bytes.
	#[serde(deserialize_with = "deserialize_secret")]
	pub secret: SigningSecret,
	/// Lifetime of issued tokens in seconds.
	#[serde(default = "default_token_ttl_secs")]
	pub token_ttl_secs: i64,
	/// Directory blob payloads are written into.
	#[serde(default = "default_blob_root")]
	pub blob_root: PathBuf,
	/// Treatment of methods with no access rule.
	#[serde(default)]
	pub unlisted_methods: UnlistedMethods,
	/// Methods reachable without a token when unlisted methods are denied.
	#[serde(default)]
	pub public_methods: Vec<String>,
	/// Methods that must have an access rule for the configuration to be accepted.
	#[serde(default)]
	pub required_methods: Vec<String>,
	/// Fully qualified method name -> allowed roles, in document order.
	#[serde(default)]
	pub access: AccessRules,
	/// Argon2 cost parameters for stored passwords.
	#[serde(default)]
	pub password_cost: PasswordCost,
}
impl GateConfig {
	/// Parses a JSON document.
	pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
		Self::from_slice(json.as_bytes())
	}

	/// Parses a JSON document from raw bytes.
	pub fn from_slice(bytes: &[u8]) -> Result<Self, ConfigError> {
		let mut de = serde_json::Deserializer::from_slice(bytes);
		let config: Self = serde_path_to_error::deserialize(&mut de)?;

		de.end().map_err(|source| ConfigError::Parse { path: ".".into(), source })?;

		Ok(config)
	}

	/// Reads and parses the JSON file at `path`.
	pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
		let bytes = fs::read(path)?;

		Self::from_slice(&bytes)
	}

	/// Token signing secret.
	pub fn signing_secret(&self) -> SigningSecret {
		self.secret.clone()
	}

	/// Token lifetime; must be positive and at most [`MAX_TOKEN_TTL_SECS`].
	pub fn token_ttl(&self) -> Result<Duration, ConfigError> {
		if self.token_ttl_secs <= 0 {
			return Err(ConfigError::NonPositiveTtl);
		}
		if self.token_ttl_secs > MAX_TOKEN_TTL_SECS {
			return Err(ConfigError::TtlTooLong { max_secs: MAX_TOKEN_TTL_SECS });
		}

		Ok(Duration::seconds(self.token_ttl_secs))
	}

	/// Builds and validates the access policy.
	pub fn access_policy(&self) -> Result<AccessPolicy, ConfigError> {
		let mut builder = AccessPolicy::builder()
			.unlisted(self.unlisted_methods)
			.require(self.required_methods.iter().cloned());

		for (method, roles) in self.access.iter() {
			builder = builder.rule(method, roles.iter().cloned());
		}
		for method in &self.public_methods {
			builder = builder.public(method);
		}

		Ok(builder.build()?)
	}

	/// Builds the password hasher from the configured cost.
	pub fn password_hasher(&self) -> Result<PasswordHasher, ConfigError> {
		Ok(PasswordHasher::from_cost(self.password_cost)?)
	}
}

/// Access rules in document order, duplicates preserved so policy validation can reject them.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AccessRules(Vec<(String, Vec<String>)>);
impl AccessRules {
	/// Iterator over `(method, roles)` pairs in document order.
	pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
		self.0.iter().map(|(method, roles)| (method.as_str(), roles.as_slice()))
	}

	/// Number of rules, duplicates included.
	pub fn len(&self) -> usize {
		self.0.len()
	}

	/// Returns true if no rule was configured.
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}
}
impl<'de> Deserialize<'de> for AccessRules {
	fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
	where
		D: Deserializer<'de>,
	{
		struct RulesVisitor;
		impl<'de> Visitor<'de> for RulesVisitor {
			type Value = AccessRules;

			fn expecting(&self, f: &mut Formatter) -> FmtResult {
				f.write_str("a map of method names to role lists")
			}

			fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
			where
				A: MapAccess<'de>,
			{
				let mut rules = Vec::with_capacity(map.size_hint().unwrap_or_default());

				while let Some(entry) = map.next_entry::<String, Vec<String>>()? {
					rules.push(entry);
				}

				Ok(AccessRules(rules))
			}
		}

		deserializer.deserialize_map(RulesVisitor)
	}
}

fn deserialize_secret<'de, D>(deserializer: D) -> Result<SigningSecret, D::Error>
where
	D: Deserializer<'de>,
{
	let encoded = <String>::deserialize(deserializer)?;

	SigningSecret::from_base64(&encoded).map_err(DeError::custom)
}

fn default_token_ttl_secs() -> i64 {
	DEFAULT_TOKEN_TTL_SECS
}

fn default_blob_root() -> PathBuf {
	PathBuf::from("img")
}
