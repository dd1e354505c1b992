//! Immutable method -> allowed-roles table consulted on every inbound call.

// self
use crate::{
	_prelude::*,
	auth::{IdentifierError, RoleSet},
};

/// Validation failures raised while building an [`AccessPolicy`].
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum PolicyError {
	/// Method names cannot be empty or contain whitespace.
	#[error("Method name `{method}` is invalid.")]
	InvalidMethod {
		/// Offending method name.
		method: String,
	},
	/// The same method was listed more than once.
	#[error("Method `{method}` has more than one access rule.")]
	DuplicateRule {
		/// Method listed twice.
		method: String,
	},
	/// A protected method must allow at least one role.
	#[error("Method `{method}` allows no roles.")]
	EmptyRoles {
		/// Method with the empty role list.
		method: String,
	},
	/// A role name in a rule is malformed.
	#[error("Method `{method}` lists an invalid role.")]
	InvalidRole {
		/// Method owning the rule.
		method: String,
		/// Identifier validation failure.
		#[source]
		source: IdentifierError,
	},
	/// A method declared as required has no rule.
	#[error("Protected method `{method}` has no access rule.")]
	MissingRule {
		/// Required method without a rule.
		method: String,
	},
	/// A method cannot be both public and role-protected.
	#[error("Method `{method}` is both public and role-protected.")]
	PublicAndProtected {
		/// Conflicting method.
		method: String,
	},
}

/// How the gate treats methods that have no access rule.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnlistedMethods {
	/// Forward unlisted methods without authentication.
	#[default]
	Allow,
	/// Refuse unlisted methods unless they were declared public.
	Deny,
}

/// What the policy demands from a call to a given method.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Requirement<'a> {
	/// No rule applies; the call needs no token.
	Open,
	/// The caller must present a valid token whose role is in the set.
	Roles(&'a RoleSet),
	/// The method is unlisted and unlisted methods are denied.
	Denied,
}

/// Immutable access table built once at startup.
#[derive(Clone, Debug, Default)]
pub struct AccessPolicy {
	rules: HashMap<String, RoleSet>,
	public: BTreeSet<String>,
	unlisted: UnlistedMethods,
}
impl AccessPolicy {
	/// Starts a new policy builder.
	pub fn builder() -> AccessPolicyBuilder {
		AccessPolicyBuilder::default()
	}

	/// Roles allowed to invoke `method`, or `None` if the method has no rule.
	pub fn lookup(&self, method: &str) -> Option<&RoleSet> {
		self.rules.get(method)
	}

	/// Resolves what a call to `method` requires.
	pub fn requirement(&self, method: &str) -> Requirement<'_> {
		if let Some(roles) = self.rules.get(method) {
			return Requirement::Roles(roles);
		}
		if self.unlisted == UnlistedMethods::Allow || self.public.contains(method) {
			return Requirement::Open;
		}

		Requirement::Denied
	}

	/// Treatment of methods without a rule.
	pub fn unlisted(&self) -> UnlistedMethods {
		self.unlisted
	}

	/// Number of protected methods.
	pub fn len(&self) -> usize {
		self.rules.len()
	}

	/// Returns true if no method is protected.
	pub fn is_empty(&self) -> bool {
		self.rules.is_empty()
	}

	/// Iterator over protected methods and their roles, in no particular order.
	pub fn iter(&self) -> impl Iterator<Item = (&str, &RoleSet)> {
		self.rules.iter().map(|(method, roles)| (method.as_str(), roles))
	}
}

/// Builder for [`AccessPolicy`]; every check runs in [`build`](Self::build).
#[derive(Clone, Debug, Default)]
pub struct AccessPolicyBuilder {
	rules: Vec<(String, Vec<String>)>,
	public: Vec<String>,
	required: Vec<String>,
	unlisted: UnlistedMethods,
}
impl AccessPolicyBuilder {
	/// Restricts `method` to `roles`.
	pub fn rule<I, S>(mut self, method: impl Into<String>, roles: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.rules.push((method.into(), roles.into_iter().map(Into::into).collect()));

		self
	}

	/// Declares `method` reachable without a token even under [`UnlistedMethods::Deny`].
	pub fn public(mut self, method: impl Into<String>) -> Self {
		self.public.push(method.into());

		self
	}

	/// Makes [`build`](Self::build) fail unless every listed method has a rule.
	pub fn require<I, S>(mut self, methods: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.required.extend(methods.into_iter().map(Into::into));

		self
	}

	/// Sets the treatment of methods without a rule.
	pub fn unlisted(mut self, unlisted: UnlistedMethods) -> Self {
		self.unlisted = unlisted;

		self
	}

	/// Validates the collected rules and freezes them into an [`AccessPolicy`].
	pub fn build(self) -> Result<AccessPolicy, PolicyError> {
		let mut rules = HashMap::with_capacity(self.rules.len());

		for (method, roles) in self.rules {
			validate_method(&method)?;

			if rules.contains_key(&method) {
				return Err(PolicyError::DuplicateRule { method });
			}
			if roles.is_empty() {
				return Err(PolicyError::EmptyRoles { method });
			}

			let roles = match RoleSet::new(&roles) {
				Ok(roles) => roles,
				Err(source) => return Err(PolicyError::InvalidRole { method, source }),
			};

			rules.insert(method, roles);
		}

		let mut public = BTreeSet::new();

		for method in self.public {
			validate_method(&method)?;

			if rules.contains_key(&method) {
				return Err(PolicyError::PublicAndProtected { method });
			}

			public.insert(method);
		}

		if let Some(method) = self.required.into_iter().find(|method| !rules.contains_key(method))
		{
			return Err(PolicyError::MissingRule { method });
		}

		Ok(AccessPolicy { rules, public, unlisted: self.unlisted })
	}
}

fn validate_method(method: &str) -> Result<(), PolicyError> {
	if method.is_empty() || method.chars().any(char::is_whitespace) {
		return Err(PolicyError::InvalidMethod { method: method.to_owned() });
	}

	Ok(())
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	const CREATE: &str = "/catalog.LaptopService/CreateLaptop";
	const RATE: &str = "/catalog.LaptopService/RateLaptop";
	const LOGIN: &str = "/auth.AuthService/Login";

	#[test]
	fn lookup_returns_roles_for_listed_methods_only() {
		let policy = AccessPolicy::builder()
			.rule(CREATE, ["admin"])
			.rule(RATE, ["admin", "user"])
			.build()
			.expect("Policy should validate.");
		let roles = policy.lookup(RATE).expect("Rate rule should exist.");

		assert!(roles.contains("user"));
		assert!(!policy.lookup(CREATE).expect("Create rule should exist.").contains("user"));
		assert!(policy.lookup(LOGIN).is_none());
		assert_eq!(policy.requirement(LOGIN), Requirement::Open);
		assert_eq!(policy.len(), 2);
	}

	#[test]
	fn deny_mode_only_opens_public_methods() {
		let policy = AccessPolicy::builder()
			.rule(CREATE, ["admin"])
			.public(LOGIN)
			.unlisted(UnlistedMethods::Deny)
			.build()
			.expect("Policy should validate.");

		assert_eq!(policy.requirement(LOGIN), Requirement::Open);
		assert_eq!(policy.requirement("/catalog.LaptopService/SearchLaptop"), Requirement::Denied);
		assert!(matches!(policy.requirement(CREATE), Requirement::Roles(_)));
	}

	#[test]
	fn build_rejects_malformed_tables() {
		assert_eq!(
			AccessPolicy::builder().rule(CREATE, ["admin"]).rule(CREATE, ["user"]).build().err(),
			Some(PolicyError::DuplicateRule { method: CREATE.into() })
		);
		assert_eq!(
			AccessPolicy::builder().rule(CREATE, Vec::<String>::new()).build().err(),
			Some(PolicyError::EmptyRoles { method: CREATE.into() })
		);
		assert_eq!(
			AccessPolicy::builder().rule("", ["admin"]).build().err(),
			Some(PolicyError::InvalidMethod { method: String::new() })
		);
		assert!(matches!(
			AccessPolicy::builder().rule(CREATE, ["super admin"]).build(),
			Err(PolicyError::InvalidRole { .. })
		));
		assert_eq!(
			AccessPolicy::builder().rule(CREATE, ["admin"]).public(CREATE).build().err(),
			Some(PolicyError::PublicAndProtected { method: CREATE.into() })
		);
	}

	#[test]
	fn required_methods_must_have_rules() {
		let result =
			AccessPolicy::builder().rule(CREATE, ["admin"]).require([CREATE, RATE]).build();

		assert_eq!(result.err(), Some(PolicyError::MissingRule { method: RATE.into() }));
	}
}
