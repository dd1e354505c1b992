//! Process object graph: every component built once from a [`GateConfig`] and shared by `Arc`.

// self
use crate::{
	_prelude::*,
	config::GateConfig,
	error::ConfigError,
	interceptor::AuthInterceptor,
	service::AuthService,
	store::{CredentialStore, DiskBlobStore, RatingAggregator},
	token::TokenManager,
};

/// Shared handles to the token manager, stores, login service, and call gate.
#[derive(Clone, Debug)]
pub struct Gate {
	tokens: Arc<TokenManager>,
	credentials: Arc<CredentialStore>,
	auth: Arc<AuthService>,
	interceptor: Arc<AuthInterceptor>,
	blobs: Arc<DiskBlobStore>,
	ratings: Arc<RatingAggregator>,
}
impl Gate {
	/// Validates `config` and builds every component. Creates the blob root if needed.
	pub fn from_config(config: &GateConfig) -> Result<Self> {
		let ttl = config.token_ttl()?;
		let policy = Arc::new(config.access_policy()?);
		let hasher = config.password_hasher()?;
		let blobs = DiskBlobStore::open(&config.blob_root).map_err(ConfigError::BlobRoot)?;
		let tokens = Arc::new(TokenManager::new(config.signing_secret()));
		let credentials = Arc::new(CredentialStore::default());
		let auth = AuthService::new(credentials.clone(), tokens.clone())
			.with_password_hasher(hasher)
			.with_token_ttl(ttl);
		let interceptor = AuthInterceptor::new(tokens.clone(), policy);

		Ok(Self {
			tokens,
			credentials,
			auth: Arc::new(auth),
			interceptor: Arc::new(interceptor),
			blobs: Arc::new(blobs),
			ratings: Arc::new(RatingAggregator::default()),
		})
	}

	/// Token manager bound to the configured secret.
	pub fn tokens(&self) -> &Arc<TokenManager> {
		&self.tokens
	}

	/// Credential registry.
	pub fn credentials(&self) -> &Arc<CredentialStore> {
		&self.credentials
	}

	/// Login service.
	pub fn auth(&self) -> &Arc<AuthService> {
		&self.auth
	}

	/// Gate every inbound call passes through.
	pub fn interceptor(&self) -> &Arc<AuthInterceptor> {
		&self.interceptor
	}

	/// Blob store rooted at the configured directory.
	pub fn blobs(&self) -> &Arc<DiskBlobStore> {
		&self.blobs
	}

	/// Rating aggregator.
	pub fn ratings(&self) -> &Arc<RatingAggregator> {
		&self.ratings
	}
}
