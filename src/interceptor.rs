//! Server-side gate that runs before every handler, unary or streaming.
//!
//! The gate consults the [`AccessPolicy`] for the called method, verifies the bearer token when
//! one is needed, and either forwards the call with the verified [`Identity`] attached or
//! rejects it with a [`Status`] before the handler is ever invoked.
//!
//! [`Identity`]: crate::auth::Identity

mod call;
mod status;

pub use call::*;
pub use status::*;

// self
use crate::{
	_prelude::*,
	auth::Identity,
	obs::{self, Op, OpOutcome, OpSpan},
	policy::{AccessPolicy, Requirement},
	token::TokenManager,
};

const MISSING_TOKEN: &str = "Authorization token is not provided.";
const INVALID_TOKEN: &str = "Access token is invalid.";
const FORBIDDEN: &str = "No permission to access this method.";
const UNAVAILABLE: &str = "Method is not available.";

/// Per-call authentication and authorization gate.
#[derive(Clone, Debug)]
pub struct AuthInterceptor {
	tokens: Arc<TokenManager>,
	policy: Arc<AccessPolicy>,
}
impl AuthInterceptor {
	/// Creates a gate over the shared token manager and the immutable policy.
	pub fn new(tokens: Arc<TokenManager>, policy: Arc<AccessPolicy>) -> Self {
		Self { tokens, policy }
	}

	/// Policy consulted on every call.
	pub fn policy(&self) -> &AccessPolicy {
		&self.policy
	}

	/// Decides whether the call may proceed and attaches the verified identity, if any.
	///
	/// Whatever identity the context carried before is replaced; only identities this gate
	/// verified ever reach a handler.
	pub fn authorize(&self, ctx: &mut CallContext) -> Result<(), Status> {
		self.authorize_at(ctx, OffsetDateTime::now_utc())
	}

	/// Same as [`authorize`](Self::authorize), verifying tokens against `now`.
	pub fn authorize_at(&self, ctx: &mut CallContext, now: OffsetDateTime) -> Result<(), Status> {
		const OP: Op = Op::Authorize;

		let _guard = OpSpan::new(OP, "authorize").with_method(ctx.method()).entered();

		obs::record_op_outcome(OP, OpOutcome::Attempt);

		match self.check(ctx, now) {
			Ok(identity) => {
				ctx.set_identity(identity);
				obs::record_op_outcome(OP, OpOutcome::Success);

				Ok(())
			},
			Err(status) => {
				ctx.set_identity(None);
				obs::record_op_outcome(OP, OpOutcome::Failure);
				obs::log_call_rejected(ctx.method(), status.code());

				Err(status)
			},
		}
	}

	/// Gates a unary call. `handler` runs only if the call is authorized.
	pub async fn intercept_unary<Req, Resp, H, Fut>(
		&self,
		mut ctx: CallContext,
		request: Req,
		handler: H,
	) -> Result<Resp, Status>
	where
		H: FnOnce(CallContext, Req) -> Fut,
		Fut: Future<Output = Result<Resp, Status>>,
	{
		self.authorize(&mut ctx)?;

		handler(ctx, request).await
	}

	/// Gates a streaming call once, before any inbound message reaches the handler.
	///
	/// On rejection the inbound stream is dropped unread and `handler` never runs.
	pub async fn intercept_stream<S, Resp, H, Fut>(
		&self,
		mut ctx: CallContext,
		inbound: S,
		handler: H,
	) -> Result<Resp, Status>
	where
		H: FnOnce(CallContext, S) -> Fut,
		Fut: Future<Output = Result<Resp, Status>>,
	{
		if let Err(status) = self.authorize(&mut ctx) {
			drop(inbound);

			return Err(status);
		}

		handler(ctx, inbound).await
	}

	fn check(&self, ctx: &CallContext, now: OffsetDateTime) -> Result<Option<Identity>, Status> {
		let roles = match self.policy.requirement(ctx.method()) {
			Requirement::Open => return Ok(self.optional_identity(ctx, now)),
			Requirement::Denied => return Err(Status::permission_denied(UNAVAILABLE)),
			Requirement::Roles(roles) => roles,
		};
		let token =
			ctx.metadata().bearer_token().ok_or_else(|| Status::unauthenticated(MISSING_TOKEN))?;
		// Invalid and expired tokens share one message.
		let claims =
			self.tokens.verify_at(token, now).map_err(|_| Status::unauthenticated(INVALID_TOKEN))?;

		if !roles.contains(claims.role.as_str()) {
			return Err(Status::permission_denied(FORBIDDEN));
		}

		Ok(Some(claims.identity()))
	}

	fn optional_identity(&self, ctx: &CallContext, now: OffsetDateTime) -> Option<Identity> {
		let token = ctx.metadata().bearer_token()?;

		match self.tokens.verify_at(token, now) {
			Ok(claims) => Some(claims.identity()),
			Err(_) => {
				obs::log_unverified_identity_ignored(ctx.method());

				None
			},
		}
	}
}
