//! # JWT Identity Provider
//!
//! HS256 bearer tokens carrying `{username, role, iat, exp}`.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::errors::{EngineError, EngineResult};

use super::identity::{Identity, IdentityProvider};
use super::role::Role;

/// JWT claims
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtClaims {
    pub username: String,
    /// Role name; unknown names verify but resolve to anonymous
    pub role: String,
    /// Issued at (Unix epoch seconds)
    pub iat: i64,
    /// Expiration (Unix epoch seconds)
    pub exp: i64,
}

/// JWT configuration
#[derive(Debug, Clone)]
pub struct JwtConfig {
    /// Shared HS256 secret
    pub secret: String,
    /// Lifetime of issued tokens
    pub token_ttl: Duration,
}

impl JwtConfig {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            token_ttl: Duration::days(1),
        }
    }
}

/// Verifies and issues HS256 tokens
#[derive(Clone)]
pub struct JwtIdentityProvider {
    config: JwtConfig,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl JwtIdentityProvider {
    pub fn new(config: JwtConfig) -> Self {
        let encoding_key = EncodingKey::from_secret(config.secret.as_bytes());
        let decoding_key = DecodingKey::from_secret(config.secret.as_bytes());

        Self {
            config,
            encoding_key,
            decoding_key,
        }
    }

    /// Issue a token for `username` with `role`
    pub fn issue(&self, username: &str, role: Role) -> EngineResult<String> {
        let now = Utc::now();
        let claims = JwtClaims {
            username: username.to_string(),
            role: role.as_str().to_string(),
            iat: now.timestamp(),
            exp: (now + self.config.token_ttl).timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| EngineError::Internal(format!("token signing failed: {}", e)))
    }

    /// Verify a token and extract its claims
    pub fn verify(&self, token: &str) -> EngineResult<JwtClaims> {
        let validation = Validation::new(Algorithm::HS256);
        let data = decode::<JwtClaims>(token, &self.decoding_key, &validation).map_err(|e| {
            let reason = match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => "jwt expired",
                jsonwebtoken::errors::ErrorKind::InvalidSignature => "invalid signature",
                _ => "jwt malformed",
            };
            EngineError::AuthTokenInvalid(reason.to_string())
        })?;
        Ok(data.claims)
    }
}

impl IdentityProvider for JwtIdentityProvider {
    fn resolve(&self, credential: &str) -> EngineResult<Identity> {
        let claims = self.verify(credential)?;
        Ok(Identity::new(claims.username, Role::parse(&claims.role)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorKind;

    fn provider(secret: &str) -> JwtIdentityProvider {
        JwtIdentityProvider::new(JwtConfig::new(secret))
    }

    #[test]
    fn test_issue_and_resolve() {
        let provider = provider("test_secret");
        let token = provider.issue("alice", Role::Editor).unwrap();

        let identity = provider.resolve(&token).unwrap();
        assert_eq!(identity, Identity::new("alice", Role::Editor));
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let token = provider("one").issue("alice", Role::Author).unwrap();
        let err = provider("two").resolve(&token).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::AuthTokenInvalid);
        assert_eq!(err.status_code(), 403);
    }

    #[test]
    fn test_expired_token_rejected() {
        let provider = JwtIdentityProvider::new(JwtConfig {
            secret: "s".into(),
            token_ttl: Duration::hours(-2),
        });
        let token = provider.issue("alice", Role::Author).unwrap();
        let err = provider.resolve(&token).unwrap_err();
        assert_eq!(err.to_string(), "jwt expired");
    }

    #[test]
    fn test_garbage_rejected() {
        let err = provider("s").resolve("not.a.token").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::AuthTokenInvalid);
    }
}
