//! Client-visible call status, modeled on the canonical RPC status codes.

// self
use crate::_prelude::*;

/// Canonical status codes the gate and stores surface to callers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Code {
	/// The request was malformed.
	InvalidArgument,
	/// The call deadline expired before completion.
	DeadlineExceeded,
	/// The entity the caller tried to create already exists.
	AlreadyExists,
	/// The caller is authenticated but lacks the required role.
	PermissionDenied,
	/// Unexpected server-side failure.
	Internal,
	/// No valid credentials accompanied the call.
	Unauthenticated,
}
impl Code {
	/// Returns a stable label suitable for logs and wire mapping.
	pub const fn as_str(self) -> &'static str {
		match self {
			Code::InvalidArgument => "invalid_argument",
			Code::DeadlineExceeded => "deadline_exceeded",
			Code::AlreadyExists => "already_exists",
			Code::PermissionDenied => "permission_denied",
			Code::Internal => "internal",
			Code::Unauthenticated => "unauthenticated",
		}
	}
}
impl Display for Code {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Terminal outcome of a failed call: a code plus a message safe to show the caller.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
#[error("{code}: {message}")]
pub struct Status {
	code: Code,
	message: String,
}
impl Status {
	/// Creates a status with an explicit code.
	pub fn new(code: Code, message: impl Into<String>) -> Self {
		Self { code, message: message.into() }
	}

	/// Missing, invalid, or expired credentials.
	pub fn unauthenticated(message: impl Into<String>) -> Self {
		Self::new(Code::Unauthenticated, message)
	}

	/// Valid credentials with an insufficient role.
	pub fn permission_denied(message: impl Into<String>) -> Self {
		Self::new(Code::PermissionDenied, message)
	}

	/// Status code.
	pub fn code(&self) -> Code {
		self.code
	}

	/// Caller-facing message.
	pub fn message(&self) -> &str {
		&self.message
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn status_display_includes_code_and_message() {
		let status = Status::permission_denied("No permission to access this method.");

		assert_eq!(status.to_string(), "permission_denied: No permission to access this method.");
		assert_eq!(status.code(), Code::PermissionDenied);
	}
}
