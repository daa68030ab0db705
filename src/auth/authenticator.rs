//! Request authentication
//!
//! A request without a credential runs as anonymous only while the
//! `allow_unauthorised` flag is set. A credential that is present is always
//! verified, even when anonymous access is allowed.

use std::sync::Arc;

use crate::errors::{EngineError, EngineResult};
use crate::observability::Event;

use super::identity::{Identity, IdentityProvider};
use super::settings::AccessSettings;

/// Resolves each request to an identity
#[derive(Clone)]
pub struct Authenticator {
    provider: Arc<dyn IdentityProvider>,
    settings: AccessSettings,
}

impl Authenticator {
    pub fn new(provider: Arc<dyn IdentityProvider>, settings: AccessSettings) -> Self {
        Self { provider, settings }
    }

    /// Resolve the acting identity from an optional bearer credential
    pub async fn authenticate(&self, credential: Option<&str>) -> EngineResult<Identity> {
        let result = match credential {
            Some(token) => self.provider.resolve(token),
            None if self.settings.allow_unauthorised().await? => Ok(Identity::anonymous()),
            None => Err(EngineError::AuthTokenInvalid(
                "jwt must be provided".to_string(),
            )),
        };

        if let Err(err) = &result {
            tracing::debug!(event = %Event::AuthenticationFailed, reason = %err, "authentication failed");
        }
        result
    }

    pub fn settings(&self) -> &AccessSettings {
        &self.settings
    }
}
