//! Login flow: credential lookup, password verification, token issuance.
//!
//! Argon2 hashing is deliberately slow and runs on the calling thread. Handlers on an async
//! worker should go through [`AuthService::login_offloaded`] and
//! [`AuthService::register_offloaded`].

// crates.io
use tokio::task;
// self
use crate::{
	_prelude::*,
	auth::{AccessToken, PasswordHasher, Role, Username},
	error::ValidationError,
	obs::{self, Op, OpOutcome, OpSpan},
	store::{Credential, CredentialStore},
	token::TokenManager,
};

/// Lifetime of tokens issued by [`AuthService`] unless overridden.
pub const DEFAULT_TOKEN_TTL: Duration = Duration::minutes(15);

/// Exchanges username/password pairs for signed access tokens.
#[derive(Clone, Debug)]
pub struct AuthService {
	credentials: Arc<CredentialStore>,
	tokens: Arc<TokenManager>,
	hasher: PasswordHasher,
	ttl: Duration,
}
impl AuthService {
	/// Creates a service over the shared credential store and token manager.
	pub fn new(credentials: Arc<CredentialStore>, tokens: Arc<TokenManager>) -> Self {
		Self { credentials, tokens, hasher: PasswordHasher::default(), ttl: DEFAULT_TOKEN_TTL }
	}

	/// Overrides the hasher used for new registrations and unknown-user login attempts.
	pub fn with_password_hasher(mut self, hasher: PasswordHasher) -> Self {
		self.hasher = hasher;

		self
	}

	/// Overrides the lifetime of issued tokens.
	pub fn with_token_ttl(mut self, ttl: Duration) -> Self {
		self.ttl = ttl;

		self
	}

	/// Lifetime of issued tokens.
	pub fn token_ttl(&self) -> Duration {
		self.ttl
	}

	/// Registers a credential, hashing `password` first. Blocks for one Argon2 hash.
	pub fn register(&self, username: Username, password: &str, role: Role) -> Result<()> {
		const OP: Op = Op::Register;

		let _guard = OpSpan::new(OP, "register").entered();

		obs::record_op_outcome(OP, OpOutcome::Attempt);

		let result = self.register_inner(username, password, role);

		match &result {
			Ok(()) => obs::record_op_outcome(OP, OpOutcome::Success),
			Err(_) => obs::record_op_outcome(OP, OpOutcome::Failure),
		}

		result
	}

	/// Verifies the credentials and issues a token carrying the stored role.
	///
	/// Unknown usernames and wrong passwords both yield [`Error::AuthenticationFailed`].
	/// Blocks for one Argon2 hash.
	pub fn login(&self, username: &str, password: &str) -> Result<AccessToken> {
		const OP: Op = Op::Login;

		let _guard = OpSpan::new(OP, "login").entered();

		obs::record_op_outcome(OP, OpOutcome::Attempt);

		let result = self.login_inner(username, password);

		match &result {
			Ok(_) => obs::record_op_outcome(OP, OpOutcome::Success),
			Err(Error::Internal { message }) => {
				obs::record_op_outcome(OP, OpOutcome::Failure);
				obs::log_internal_failure(OP, message);
			},
			Err(_) => obs::record_op_outcome(OP, OpOutcome::Failure),
		}

		result
	}

	/// [`register`](Self::register) on the blocking pool.
	pub async fn register_offloaded(
		self: Arc<Self>,
		username: Username,
		password: String,
		role: Role,
	) -> Result<()> {
		task::spawn_blocking(move || self.register(username, &password, role))
			.await
			.map_err(|e| Error::internal(format!("Register task failed: {e}")))?
	}

	/// [`login`](Self::login) on the blocking pool.
	pub async fn login_offloaded(
		self: Arc<Self>,
		username: String,
		password: String,
	) -> Result<AccessToken> {
		task::spawn_blocking(move || self.login(&username, &password))
			.await
			.map_err(|e| Error::internal(format!("Login task failed: {e}")))?
	}

	fn register_inner(&self, username: Username, password: &str, role: Role) -> Result<()> {
		if password.is_empty() {
			return Err(ValidationError::EmptyPassword.into());
		}

		let digest = self.hasher.hash(password).map_err(|e| Error::internal(e.to_string()))?;

		self.credentials.save(Credential::new(username, digest, role))?;

		Ok(())
	}

	fn login_inner(&self, username: &str, password: &str) -> Result<AccessToken> {
		let Some(credential) = self.credentials.find(username) else {
			// Burn one hash so unknown users cost the same as wrong passwords.
			let _ = self.hasher.hash(password);

			return Err(Error::AuthenticationFailed);
		};
		let matches = self
			.hasher
			.verify(password, &credential.password_hash)
			.map_err(|e| Error::internal(e.to_string()))?;

		if !matches {
			return Err(Error::AuthenticationFailed);
		}

		self.tokens
			.issue(&credential.username, &credential.role, self.ttl)
			.map_err(|e| Error::internal(e.to_string()))
	}
}
