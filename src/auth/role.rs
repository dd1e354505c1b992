//! Normalized role sets used by access rules.

// std
use std::slice::Iter;
// self
use crate::{
	_prelude::*,
	auth::{IdentifierError, Role},
};

/// Deduplicated, sorted set of roles allowed to invoke a method.
///
/// Roles are kept sorted so membership checks are a binary search and two sets built from the
/// same roles in a different order compare equal.
#[derive(Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct RoleSet(Arc<[Role]>);
impl RoleSet {
	/// Builds a set from raw role names, validating each one.
	pub fn new<I, S>(roles: I) -> Result<Self, IdentifierError>
	where
		I: IntoIterator<Item = S>,
		S: AsRef<str>,
	{
		let mut set = BTreeSet::new();

		for role in roles {
			set.insert(Role::new(role)?);
		}

		Ok(Self(set.into_iter().collect()))
	}

	/// Number of distinct roles.
	pub fn len(&self) -> usize {
		self.0.len()
	}

	/// Returns true if no roles are present.
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	/// Returns true if the set allows the provided role.
	pub fn contains(&self, role: &str) -> bool {
		self.0.binary_search_by(|candidate| candidate.as_str().cmp(role)).is_ok()
	}

	/// Iterator over the roles in sorted order.
	pub fn iter(&self) -> Iter<'_, Role> {
		self.0.iter()
	}
}
impl FromIterator<Role> for RoleSet {
	fn from_iter<T: IntoIterator<Item = Role>>(iter: T) -> Self {
		let set: BTreeSet<Role> = iter.into_iter().collect();

		Self(set.into_iter().collect())
	}
}
impl<'a> IntoIterator for &'a RoleSet {
	type IntoIter = Iter<'a, Role>;
	type Item = &'a Role;

	fn into_iter(self) -> Self::IntoIter {
		self.iter()
	}
}
impl TryFrom<Vec<String>> for RoleSet {
	type Error = IdentifierError;

	fn try_from(value: Vec<String>) -> Result<Self, Self::Error> {
		Self::new(value)
	}
}
impl From<RoleSet> for Vec<String> {
	fn from(value: RoleSet) -> Self {
		value.iter().map(|role| role.to_string()).collect()
	}
}
impl Debug for RoleSet {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_set().entries(self.iter().map(Role::as_str)).finish()
	}
}
impl Display for RoleSet {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		for (idx, role) in self.iter().enumerate() {
			if idx > 0 {
				f.write_str(",")?;
			}

			f.write_str(role)?;
		}

		Ok(())
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn roles_are_deduplicated_and_sorted() {
		let set = RoleSet::new(["user", "admin", "user"]).expect("Role fixture should be valid.");

		assert_eq!(set.len(), 2);
		assert_eq!(set.to_string(), "admin,user");
		assert!(set.contains("admin"));
		assert!(set.contains("user"));
		assert!(!set.contains("guest"));
	}

	#[test]
	fn order_does_not_affect_equality() {
		let a = RoleSet::new(["admin", "user"]).expect("First role set should be valid.");
		let b = RoleSet::new(["user", "admin"]).expect("Second role set should be valid.");

		assert_eq!(a, b);
	}

	#[test]
	fn invalid_roles_are_rejected() {
		assert!(RoleSet::new(["admin", "power user"]).is_err());
		assert!(serde_json::from_str::<RoleSet>("[\"\"]").is_err());

		let parsed: RoleSet =
			serde_json::from_str("[\"user\",\"admin\"]").expect("Role list should deserialize.");

		assert_eq!(parsed.to_string(), "admin,user");
	}
}
