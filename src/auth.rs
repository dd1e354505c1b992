//! Auth-domain identifiers, role sets, claims, secrets, and password hashing.

pub mod claims;
pub mod id;
pub mod password;
pub mod role;
pub mod secret;

pub use claims::*;
pub use id::*;
pub use password::*;
pub use role::*;
pub use secret::*;
