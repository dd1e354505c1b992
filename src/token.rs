//! Stateless HS256 token issuance and verification.
//!
//! [`TokenManager`] holds nothing but the immutable process secret, so issuing and verifying
//! are pure functions of `(token, secret, clock)` and need no locking. The expiry check is done
//! here rather than by `jsonwebtoken` so the boundary is exact: a token is expired as soon as
//! `now >= exp`, with no leeway.

// crates.io
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
// self
use crate::{
	_prelude::*,
	auth::{AccessToken, Claims, Role, SigningSecret, Username},
};

/// Failures produced by [`TokenManager`].
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum TokenError {
	/// The signing backend failed.
	#[error("Token could not be signed: {message}.")]
	Signing {
		/// Upstream description.
		message: String,
	},
	/// The token is malformed or its signature does not match.
	#[error("Token is invalid.")]
	Invalid,
	/// The token's expiry instant has passed.
	#[error("Token has expired.")]
	Expired,
	/// `issued_at + ttl` does not fit in a timestamp.
	#[error("Token lifetime is out of range.")]
	LifetimeOutOfRange,
}

/// Signs and verifies identity claims with the process-held secret.
#[derive(Clone)]
pub struct TokenManager {
	encoding: EncodingKey,
	decoding: DecodingKey,
	validation: Validation,
}
impl TokenManager {
	const ALGORITHM: Algorithm = Algorithm::HS256;

	/// Creates a manager bound to `secret`.
	pub fn new(secret: SigningSecret) -> Self {
		let mut validation = Validation::new(Self::ALGORITHM);

		validation.validate_exp = false;
		validation.validate_nbf = false;
		validation.required_spec_claims.clear();

		Self {
			encoding: EncodingKey::from_secret(secret.expose()),
			decoding: DecodingKey::from_secret(secret.expose()),
			validation,
		}
	}

	/// Issues a token for `subject` expiring `ttl` from now.
	pub fn issue(
		&self,
		subject: &Username,
		role: &Role,
		ttl: Duration,
	) -> Result<AccessToken, TokenError> {
		self.issue_at(subject, role, ttl, OffsetDateTime::now_utc())
	}

	/// Issues a token as if the current instant were `now`.
	pub fn issue_at(
		&self,
		subject: &Username,
		role: &Role,
		ttl: Duration,
		now: OffsetDateTime,
	) -> Result<AccessToken, TokenError> {
		let claims = Claims::new(subject.clone(), role.clone(), now, ttl)
			.ok_or(TokenError::LifetimeOutOfRange)?;

		jsonwebtoken::encode(&Header::new(Self::ALGORITHM), &claims, &self.encoding)
			.map(AccessToken::new)
			.map_err(|e| TokenError::Signing { message: e.to_string() })
	}

	/// Verifies `token` against the current clock.
	pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
		self.verify_at(token, OffsetDateTime::now_utc())
	}

	/// Verifies `token` as if the current instant were `now`.
	pub fn verify_at(&self, token: &str, now: OffsetDateTime) -> Result<Claims, TokenError> {
		let claims = jsonwebtoken::decode::<Claims>(token, &self.decoding, &self.validation)
			.map_err(|_| TokenError::Invalid)?
			.claims;

		if claims.is_expired_at(now) {
			return Err(TokenError::Expired);
		}

		Ok(claims)
	}
}
impl Debug for TokenManager {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("TokenManager").field("algorithm", &Self::ALGORITHM).finish()
	}
}
