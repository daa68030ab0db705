//! Request identity

use serde::{Deserialize, Serialize};

use crate::errors::EngineResult;

use super::role::Role;

/// Username substituted for unauthenticated requests
pub const ANONYMOUS_USERNAME: &str = "Anonymous";

/// The acting user of one request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub username: String,
    pub role: Role,
}

impl Identity {
    pub fn new(username: impl Into<String>, role: Role) -> Self {
        Self {
            username: username.into(),
            role,
        }
    }

    /// Identity used when unauthenticated access is allowed
    pub fn anonymous() -> Self {
        Self::new(ANONYMOUS_USERNAME, Role::Anonymous)
    }

    pub fn is_anonymous(&self) -> bool {
        self.role == Role::Anonymous
    }
}

/// Resolves a bearer credential to an identity.
///
/// Credential cryptography lives behind this seam.
pub trait IdentityProvider: Send + Sync {
    /// # Errors
    ///
    /// `AuthTokenInvalid` if the credential cannot be verified.
    fn resolve(&self, credential: &str) -> EngineResult<Identity>;
}
