//! Concurrent in-process stores handed to the auth service and business handlers.
//!
//! Each store owns exactly one lock over exactly one map and exposes only its narrow operation
//! set; stores never share a lock, so unrelated stores never contend.

pub mod blob;
pub mod credential;
pub mod rating;

pub use blob::*;
pub use credential::*;
pub use rating::*;

// self
use crate::_prelude::*;

/// Error type produced by the stores.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum StoreError {
	/// A credential with the same username already exists.
	#[error("User `{username}` already exists.")]
	DuplicateUser {
		/// Conflicting username.
		username: String,
	},
	/// Durable storage rejected a write.
	#[error("Storage failure: {message}.")]
	Storage {
		/// Human-readable error payload.
		message: String,
	},
	/// The surrounding call deadline expired before the write completed.
	#[error("Storage deadline exceeded.")]
	DeadlineExceeded,
}
