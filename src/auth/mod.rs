//! # Authentication & Authorization
//!
//! - [`Authenticator`] turns a bearer credential into an [`Identity`]
//! - [`AuthorizationGuard`] gates operations by role and ownership
//! - [`AccessSettings`] holds the durable `allow_unauthorised` flag

mod authenticator;
mod guard;
mod identity;
mod jwt;
mod role;
mod settings;

pub use authenticator::Authenticator;
pub use guard::AuthorizationGuard;
pub use identity::{Identity, IdentityProvider, ANONYMOUS_USERNAME};
pub use jwt::{JwtClaims, JwtConfig, JwtIdentityProvider};
pub use role::Role;
pub use settings::{AccessSettings, ALLOW_UNAUTHORISED};
