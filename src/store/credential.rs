//! Append-only registry of login credentials.

// std
use std::collections::hash_map::Entry;
// self
use crate::{
	_prelude::*,
	auth::{PasswordDigest, Role, Username},
	store::StoreError,
};

/// Registered login credential. Immutable once saved.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Credential {
	/// Unique login name.
	pub username: Username,
	/// Argon2 PHC hash of the password.
	pub password_hash: PasswordDigest,
	/// Role granted to every token issued for this credential.
	pub role: Role,
}
impl Credential {
	/// Bundles the credential fields.
	pub fn new(username: Username, password_hash: PasswordDigest, role: Role) -> Self {
		Self { username, password_hash, role }
	}
}

/// Thread-safe username -> credential registry.
///
/// There is no update or delete path.
#[derive(Debug, Default)]
pub struct CredentialStore(RwLock<HashMap<Username, Credential>>);
impl CredentialStore {
	/// Inserts `credential`, failing if its username is already registered.
	pub fn save(&self, credential: Credential) -> Result<(), StoreError> {
		let mut guard = self.0.write();

		match guard.entry(credential.username.clone()) {
			Entry::Occupied(_) =>
				Err(StoreError::DuplicateUser { username: credential.username.into() }),
			Entry::Vacant(slot) => {
				slot.insert(credential);

				Ok(())
			},
		}
	}

	/// Looks up the credential registered for `username`.
	pub fn find(&self, username: &str) -> Option<Credential> {
		self.0.read().get(username).cloned()
	}

	/// Number of registered credentials.
	pub fn len(&self) -> usize {
		self.0.read().len()
	}

	/// Returns true if nothing has been registered yet.
	pub fn is_empty(&self) -> bool {
		self.0.read().is_empty()
	}
}
