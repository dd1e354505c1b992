//! Signed claim payloads and the verified identity derived from them.

// self
use crate::{
	_prelude::*,
	auth::{Role, Username},
};

/// Claims embedded in every issued token. Never stored server-side.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
	/// Subject the token was issued to.
	pub sub: Username,
	/// Role granted to the subject at issuance.
	pub role: Role,
	/// Issued-at instant, encoded as Unix seconds.
	#[serde(with = "time::serde::timestamp")]
	pub iat: OffsetDateTime,
	/// Expiry instant, encoded as Unix seconds.
	#[serde(with = "time::serde::timestamp")]
	pub exp: OffsetDateTime,
}
impl Claims {
	/// Builds claims for `subject` valid for `ttl` starting at `now`.
	///
	/// Returns `None` when `now + ttl` falls outside the representable date range.
	pub fn new(subject: Username, role: Role, now: OffsetDateTime, ttl: Duration) -> Option<Self> {
		let exp = now.checked_add(ttl)?;

		Some(Self { sub: subject, role, iat: now, exp })
	}

	/// Returns `true` once `instant` reaches the expiry instant.
	pub fn is_expired_at(&self, instant: OffsetDateTime) -> bool {
		instant >= self.exp
	}

	/// Returns the remaining lifetime at `instant`, clamped at zero.
	pub fn remaining_at(&self, instant: OffsetDateTime) -> Duration {
		let remaining = self.exp - instant;

		if remaining.is_negative() { Duration::ZERO } else { remaining }
	}

	/// Identity carried by the claims.
	pub fn identity(&self) -> Identity {
		Identity { username: self.sub.clone(), role: self.role.clone() }
	}
}

/// Verified caller identity attached to a call after the gate accepts its token.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Identity {
	/// Authenticated username.
	pub username: Username,
	/// Role the caller acts under.
	pub role: Role,
}

#[cfg(test)]
mod tests {
	// crates.io
	use time::macros;
	// self
	use super::*;

	fn claims(ttl: Duration) -> Claims {
		Claims::new(
			Username::new("user1").expect("Username fixture should be valid."),
			Role::new("user").expect("Role fixture should be valid."),
			macros::datetime!(2025-01-01 00:00 UTC),
			ttl,
		)
		.expect("Fixture lifetime should stay in range.")
	}

	#[test]
	fn expiry_boundary_is_exclusive() {
		let claims = claims(Duration::minutes(15));

		assert!(!claims.is_expired_at(macros::datetime!(2025-01-01 00:14:59 UTC)));
		assert!(claims.is_expired_at(macros::datetime!(2025-01-01 00:15 UTC)));
		assert_eq!(
			claims.remaining_at(macros::datetime!(2025-01-01 00:10 UTC)),
			Duration::minutes(5)
		);
		assert_eq!(claims.remaining_at(macros::datetime!(2025-01-01 01:00 UTC)), Duration::ZERO);
	}

	#[test]
	fn zero_ttl_claims_are_born_expired() {
		let claims = claims(Duration::ZERO);

		assert!(claims.is_expired_at(claims.iat));
	}

	#[test]
	fn unrepresentable_expiry_is_refused() {
		let build = |ttl| {
			Claims::new(
				Username::new("user1").expect("Username fixture should be valid."),
				Role::new("user").expect("Role fixture should be valid."),
				macros::datetime!(2025-01-01 00:00 UTC),
				ttl,
			)
		};

		assert!(build(Duration::MAX).is_none());
		assert!(build(Duration::days(365 * 9_000)).is_none());
		assert!(build(Duration::days(365)).is_some());
	}

	#[test]
	fn timestamps_serialize_as_unix_seconds() {
		let payload = serde_json::to_value(claims(Duration::minutes(1)))
			.expect("Claims should serialize to JSON.");

		assert_eq!(payload["iat"], 1_735_689_600_i64);
		assert_eq!(payload["exp"], 1_735_689_660_i64);
		assert_eq!(payload["sub"], "user1");
		assert_eq!(payload["role"], "user");
	}
}
