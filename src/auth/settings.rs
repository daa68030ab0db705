//! Process-wide access flags
//!
//! Flags live in `_configurations` as `{config_name, config_value}` records
//! and are re-read on every call.

use std::sync::Arc;

use serde_json::{json, Value};

use crate::errors::EngineResult;
use crate::store::{DocumentStore, Filter, StoreUpdate, CONFIG_COLLECTION};

/// Name of the anonymous-access flag
pub const ALLOW_UNAUTHORISED: &str = "allow_unauthorised";

/// Reader and writer for access flags
#[derive(Clone)]
pub struct AccessSettings {
    store: Arc<dyn DocumentStore>,
}

impl AccessSettings {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Whether requests without a credential run as anonymous.
    ///
    /// Only a literal `true` enables it.
    pub async fn allow_unauthorised(&self) -> EngineResult<bool> {
        let value = self.read(ALLOW_UNAUTHORISED).await?;
        Ok(value == Some(Value::Bool(true)))
    }

    pub async fn set_allow_unauthorised(&self, allowed: bool) -> EngineResult<()> {
        self.write(ALLOW_UNAUTHORISED, Value::Bool(allowed)).await
    }

    async fn read(&self, name: &str) -> EngineResult<Option<Value>> {
        let record = self
            .store
            .find_one(CONFIG_COLLECTION, &Filter::by("config_name", name))
            .await?;
        Ok(record.and_then(|mut r| r.remove("config_value")))
    }

    async fn write(&self, name: &str, value: Value) -> EngineResult<()> {
        let filter = Filter::by("config_name", name);
        let fresh = json!({"config_name": name, "config_value": value.clone()});
        let inserted = match fresh {
            Value::Object(record) => {
                self.store
                    .insert_if_absent(CONFIG_COLLECTION, &filter, record)
                    .await?
            }
            _ => false,
        };
        if !inserted {
            let update = StoreUpdate::new().set("config_value", value);
            self.store
                .update_one(CONFIG_COLLECTION, &filter, &update)
                .await?;
        }
        Ok(())
    }
}
