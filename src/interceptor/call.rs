//! Transport-neutral view of an inbound call: method, metadata, deadline, verified identity.

// crates.io
use tokio::time::Instant;
// self
use crate::{
	_prelude::*,
	auth::{AccessToken, Identity},
};

/// Metadata key carrying the bearer token.
pub const AUTHORIZATION_KEY: &str = "authorization";

const BEARER_PREFIX: &str = "bearer ";

/// Per-call metadata. Keys are case-insensitive and stored lowercased; a key may repeat.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CallMetadata(HashMap<String, Vec<String>>);
impl CallMetadata {
	/// Creates empty metadata.
	pub fn new() -> Self {
		Self::default()
	}

	/// Appends `value` under `key`.
	pub fn insert(&mut self, key: impl AsRef<str>, value: impl Into<String>) {
		self.0.entry(key.as_ref().to_ascii_lowercase()).or_default().push(value.into());
	}

	/// Builder-style [`insert`](Self::insert).
	pub fn with(mut self, key: impl AsRef<str>, value: impl Into<String>) -> Self {
		self.insert(key, value);

		self
	}

	/// Attaches `token` as the bearer credential for an outbound call.
	pub fn with_bearer(self, token: &AccessToken) -> Self {
		self.with(AUTHORIZATION_KEY, format!("Bearer {}", token.expose()))
	}

	/// First value stored under `key`.
	pub fn get(&self, key: &str) -> Option<&str> {
		self.get_all(key).first().map(String::as_str)
	}

	/// Every value stored under `key`, in insertion order.
	pub fn get_all(&self, key: &str) -> &[String] {
		let values = if key.bytes().any(|b| b.is_ascii_uppercase()) {
			self.0.get(&key.to_ascii_lowercase())
		} else {
			self.0.get(key)
		};

		values.map(Vec::as_slice).unwrap_or_default()
	}

	/// Bearer token from the first `authorization` value, with any `Bearer ` prefix removed.
	///
	/// Blank values count as absent.
	pub fn bearer_token(&self) -> Option<&str> {
		let raw = self.get(AUTHORIZATION_KEY)?.trim_start();
		let token = match raw.get(..BEARER_PREFIX.len()) {
			Some(prefix) if prefix.eq_ignore_ascii_case(BEARER_PREFIX) =>
				raw[BEARER_PREFIX.len()..].trim(),
			_ => raw.trim_end(),
		};

		(!token.is_empty()).then_some(token)
	}
}

/// One inbound call as seen by the gate and then by the handler.
#[derive(Clone, Debug)]
pub struct CallContext {
	method: String,
	metadata: CallMetadata,
	deadline: Option<Instant>,
	identity: Option<Identity>,
}
impl CallContext {
	/// Creates a context for the fully qualified `method`.
	pub fn new(method: impl Into<String>) -> Self {
		Self { method: method.into(), metadata: CallMetadata::new(), deadline: None, identity: None }
	}

	/// Replaces the call metadata.
	pub fn with_metadata(mut self, metadata: CallMetadata) -> Self {
		self.metadata = metadata;

		self
	}

	/// Sets the call deadline handlers should honor for blocking work.
	pub fn with_deadline(mut self, deadline: Instant) -> Self {
		self.deadline = Some(deadline);

		self
	}

	/// Fully qualified method name.
	pub fn method(&self) -> &str {
		&self.method
	}

	/// Call metadata.
	pub fn metadata(&self) -> &CallMetadata {
		&self.metadata
	}

	/// Call deadline, if the caller set one.
	pub fn deadline(&self) -> Option<Instant> {
		self.deadline
	}

	/// Identity verified by the gate; `None` on calls that carried no valid token.
	pub fn identity(&self) -> Option<&Identity> {
		self.identity.as_ref()
	}

	pub(crate) fn set_identity(&mut self, identity: Option<Identity>) {
		self.identity = identity;
	}
}
