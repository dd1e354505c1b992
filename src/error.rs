//! Gate-level error types shared across the token, policy, service, and store layers.

// self
use crate::{
	_prelude::*,
	auth::{IdentifierError, PasswordError},
	interceptor::{Code, Status},
	policy::PolicyError,
	store::StoreError,
};

/// Gate-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Canonical error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Caller-supplied input failed validation.
	#[error(transparent)]
	Validation(#[from] ValidationError),
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Store-layer failure (duplicate user, blob write failure).
	#[error("{0}")]
	Storage(
		#[from]
		#[source]
		StoreError,
	),

	/// Login credentials were rejected.
	///
	/// Unknown usernames and wrong passwords share this variant so callers cannot tell them
	/// apart.
	#[error("Incorrect username or password.")]
	AuthenticationFailed,
	/// A protected call carried no token, or one that failed verification.
	#[error("Access token is missing or invalid.")]
	Unauthenticated,
	/// The caller is authenticated but its role is not allowed to invoke the method.
	#[error("Caller is not permitted to invoke this method.")]
	PermissionDenied,
	/// Unexpected failure (signing, hashing).
	#[error("Internal failure: {message}.")]
	Internal {
		/// Operator-facing description; never surfaced to callers.
		message: String,
	},
}
impl Error {
	/// Wraps an unexpected failure.
	pub fn internal(message: impl Into<String>) -> Self {
		Self::Internal { message: message.into() }
	}

	/// Maps the error onto the client-visible status code.
	pub fn code(&self) -> Code {
		match self {
			Self::Validation(_) => Code::InvalidArgument,
			Self::Config(_) | Self::Internal { .. } => Code::Internal,
			Self::Storage(StoreError::DuplicateUser { .. }) => Code::AlreadyExists,
			Self::Storage(StoreError::DeadlineExceeded) => Code::DeadlineExceeded,
			Self::Storage(StoreError::Storage { .. }) => Code::Internal,
			Self::AuthenticationFailed | Self::Unauthenticated => Code::Unauthenticated,
			Self::PermissionDenied => Code::PermissionDenied,
		}
	}

	/// Converts the error into a client-visible [`Status`].
	///
	/// Internal causes are replaced with a fixed message so operator detail never reaches the
	/// caller.
	pub fn status(&self) -> Status {
		let message = match self {
			Self::Config(_) | Self::Internal { .. } | Self::Storage(StoreError::Storage { .. }) =>
				"Internal error.".to_owned(),
			other => other.to_string(),
		};

		Status::new(self.code(), message)
	}
}
impl From<Error> for Status {
	fn from(e: Error) -> Self {
		e.status()
	}
}

/// Input validation failures.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum ValidationError {
	/// An identifier (username, role, owner) is malformed.
	#[error(transparent)]
	Identifier(#[from] IdentifierError),
	/// Passwords cannot be empty.
	#[error("Password cannot be empty.")]
	EmptyPassword,
	/// Blob suffixes must be empty or a dot-prefixed extension without separators.
	#[error("Blob suffix `{suffix}` is invalid.")]
	BlobSuffix {
		/// Offending suffix.
		suffix: String,
	},
	/// Ratings must be finite numbers.
	#[error("Rating value must be finite.")]
	NonFiniteRating,
}

/// Configuration and construction failures.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// Configuration document could not be parsed.
	#[error("Configuration is invalid at `{path}`.")]
	Parse {
		/// JSON path of the offending field.
		path: String,
		/// Underlying parsing failure.
		#[source]
		source: serde_json::Error,
	},
	/// Configuration file could not be read.
	#[error("Configuration file could not be read.")]
	Read(#[from] std::io::Error),
	/// Signing secret is not valid base64.
	#[error("Signing secret is not valid base64.")]
	SecretEncoding(#[from] base64::DecodeError),
	/// Signing secret is shorter than the HMAC block the tokens rely on.
	#[error("Signing secret must be at least {min} bytes.")]
	SecretTooShort {
		/// Minimum accepted length in bytes.
		min: usize,
	},
	/// Token lifetime must be positive.
	#[error("Token TTL must be positive.")]
	NonPositiveTtl,
	/// Token lifetime exceeds the accepted maximum.
	#[error("Token TTL must not exceed {max_secs} seconds.")]
	TtlTooLong {
		/// Largest accepted TTL in seconds.
		max_secs: i64,
	},
	/// Argon2 cost parameters were rejected.
	#[error("Password hashing parameters are invalid.")]
	PasswordCost(#[from] PasswordError),
	/// Access policy failed validation.
	#[error(transparent)]
	Policy(#[from] PolicyError),
	/// Blob root could not be prepared.
	#[error("Blob root could not be prepared: {0}.")]
	BlobRoot(StoreError),
}
impl From<serde_path_to_error::Error<serde_json::Error>> for ConfigError {
	fn from(e: serde_path_to_error::Error<serde_json::Error>) -> Self {
		let path = e.path().to_string();

		Self::Parse { path, source: e.into_inner() }
	}
}

impl From<IdentifierError> for Error {
	fn from(e: IdentifierError) -> Self {
		Self::Validation(e.into())
	}
}
impl From<PolicyError> for Error {
	fn from(e: PolicyError) -> Self {
		Self::Config(e.into())
	}
}
