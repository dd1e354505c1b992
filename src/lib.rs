//! Signed identity tokens, per-method role-based call gating, and the concurrent credential,
//! blob, and rating stores that RPC handlers lean on.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod auth;
pub mod config;
pub mod error;
pub mod gate;
pub mod interceptor;
pub mod obs;
pub mod policy;
pub mod service;
pub mod store;
pub mod token;
#[cfg(any(test, feature = "test"))]
pub mod _preludet {
	//! Convenience re-exports and helpers for integration tests; enabled via `cfg(test)` or the
	//! `test` crate feature.

	pub use crate::_prelude::*;

	// std
	use std::{env, path::PathBuf, process};
	// self
	use crate::{
		auth::{PasswordHasher, Role, SigningSecret, Username},
		policy::AccessPolicy,
		service::AuthService,
		store::CredentialStore,
		token::TokenManager,
	};

	/// Fully qualified method restricted to the `admin` role by [`test_policy`].
	pub const CREATE_METHOD: &str = "/catalog.LaptopService/CreateLaptop";
	/// Fully qualified method restricted to the `admin` role by [`test_policy`].
	pub const UPLOAD_METHOD: &str = "/catalog.LaptopService/UploadImage";
	/// Fully qualified method open to `admin` and `user` by [`test_policy`].
	pub const RATE_METHOD: &str = "/catalog.LaptopService/RateLaptop";
	/// Login method left out of [`test_policy`] so it stays reachable without a token.
	pub const LOGIN_METHOD: &str = "/auth.AuthService/Login";

	/// Fixed signing secret shared by test fixtures.
	pub fn test_secret() -> SigningSecret {
		SigningSecret::new(*b"callgate-test-secret-0123456789!")
	}

	/// Token manager keyed by [`test_secret`].
	pub fn test_token_manager() -> TokenManager {
		TokenManager::new(test_secret())
	}

	/// Argon2 hasher with the smallest permitted cost so tests stay fast.
	pub fn test_password_hasher() -> PasswordHasher {
		PasswordHasher::with_cost(8, 1, 1).expect("Minimal Argon2 cost should be accepted.")
	}

	/// Policy mirroring the catalog service rules used throughout the tests.
	pub fn test_policy() -> AccessPolicy {
		AccessPolicy::builder()
			.rule(CREATE_METHOD, ["admin"])
			.rule(UPLOAD_METHOD, ["admin"])
			.rule(RATE_METHOD, ["admin", "user"])
			.build()
			.expect("Test policy fixture should validate.")
	}

	/// Builds an [`AuthService`] seeded with `admin1`/`user1`, both using the password `secret`.
	pub fn build_seeded_auth_service() -> (AuthService, Arc<CredentialStore>, Arc<TokenManager>) {
		let credentials = Arc::new(CredentialStore::default());
		let tokens = Arc::new(test_token_manager());
		let service = AuthService::new(credentials.clone(), tokens.clone())
			.with_password_hasher(test_password_hasher());

		for (name, role) in [("admin1", "admin"), ("user1", "user")] {
			service
				.register(
					Username::new(name).expect("Username fixture should be valid."),
					"secret",
					Role::new(role).expect("Role fixture should be valid."),
				)
				.expect("Seeding fixture users should succeed.");
		}

		(service, credentials, tokens)
	}

	/// Returns a unique, not-yet-created directory under the system temp dir.
	pub fn temp_blob_root(label: &str) -> PathBuf {
		let unique = format!(
			"callgate_{label}_{}_{}",
			process::id(),
			OffsetDateTime::now_utc().unix_timestamp_nanos(),
		);

		env::temp_dir().join(unique)
	}
}

mod _prelude {
	pub use std::{
		collections::{BTreeSet, HashMap},
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		str::FromStr,
		sync::Arc,
	};

	pub use parking_lot::{Mutex, RwLock};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};

	pub use crate::error::{Error, Result};
}
