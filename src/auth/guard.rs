//! Authorization gates
//!
//! Role gates compare against the ordered [`Role`]. The ownership gate only
//! applies to authors: editors and administrators bypass it.

use std::sync::Arc;

use serde_json::{json, Value};

use crate::collections::ownership_ref;
use crate::errors::{EngineError, EngineResult};
use crate::observability::Event;
use crate::store::{DocumentStore, Filter, StoreUpdate, USERS_COLLECTION};

use super::identity::Identity;
use super::role::Role;

const MODELS_KEY: &str = "models";

/// Role and ownership gate
#[derive(Clone)]
pub struct AuthorizationGuard {
    store: Arc<dyn DocumentStore>,
}

impl AuthorizationGuard {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    pub fn to_author(&self, identity: &Identity) -> EngineResult<()> {
        require(identity, Role::Author)
    }

    pub fn to_editor(&self, identity: &Identity) -> EngineResult<()> {
        require(identity, Role::Editor)
    }

    pub fn to_administrator(&self, identity: &Identity) -> EngineResult<()> {
        require(identity, Role::Administrator)
    }

    /// Fails unless `identity` owns `slug.id` or its role bypasses ownership
    pub async fn check_ownership(
        &self,
        identity: &Identity,
        slug: &str,
        id: u64,
    ) -> EngineResult<()> {
        if identity.role.bypasses_ownership() {
            return Ok(());
        }

        let reference = ownership_ref(slug, id);
        let owned = self.owned(&identity.username).await?;
        if owned.iter().any(|r| *r == reference) {
            return Ok(());
        }

        tracing::warn!(
            event = %Event::AuthorizationDenied,
            user = %identity.username,
            resource = %reference,
            "not owner"
        );
        Err(EngineError::NotOwner(reference))
    }

    /// Add `slug.id` to a user's ownership list, creating the user record
    /// on first ownership
    pub async fn record_ownership(&self, username: &str, slug: &str, id: u64) -> EngineResult<()> {
        let filter = user_filter(username);
        if let Value::Object(fresh) = json!({"username": username, MODELS_KEY: []}) {
            self.store
                .insert_if_absent(USERS_COLLECTION, &filter, fresh)
                .await?;
        }

        let update = StoreUpdate::new().add_to_set(MODELS_KEY, ownership_ref(slug, id));
        self.store
            .update_one(USERS_COLLECTION, &filter, &update)
            .await?;
        Ok(())
    }

    /// Ownership references recorded for a user
    pub async fn owned(&self, username: &str) -> EngineResult<Vec<String>> {
        let record = self
            .store
            .find_one(USERS_COLLECTION, &user_filter(username))
            .await?;
        let models = record
            .as_ref()
            .and_then(|r| r.get(MODELS_KEY))
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();
        Ok(models)
    }
}

fn require(identity: &Identity, required: Role) -> EngineResult<()> {
    if identity.role.at_least(required) {
        return Ok(());
    }
    tracing::warn!(
        event = %Event::AuthorizationDenied,
        user = %identity.username,
        role = %identity.role,
        required = %required,
        "role too low"
    );
    Err(EngineError::Forbidden)
}

fn user_filter(username: &str) -> Filter {
    Filter::by("username", username)
}
