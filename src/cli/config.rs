//! Configuration file (`dynbase.json`)

use std::fs;
use std::path::Path;

use chrono::Duration;
use rand::distributions::Alphanumeric;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::http_server::HttpServerConfig;
use crate::observability::DEFAULT_LEVEL;
use crate::upload::{UploadLimits, DEFAULT_LINK_TTL_SECS, DEFAULT_MAX_FILE_SIZE};

use super::errors::{CliError, CliResult};

const GENERATED_SECRET_LENGTH: usize = 48;

/// Top-level configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Data directory holding the store and uploaded bytes
    #[serde(default = "default_data_dir")]
    pub data_dir: String,

    /// Log filter directive; `RUST_LOG` takes precedence
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// HS256 secret for bearer tokens (required)
    pub jwt_secret: String,

    #[serde(default)]
    pub http: HttpServerConfig,

    #[serde(default)]
    pub upload: UploadConfig,
}

/// Upload ceilings as written in the config file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadConfig {
    #[serde(default = "default_max_file_size")]
    pub max_file_size: u64,

    #[serde(default = "default_accepted_mime")]
    pub accepted_mime: Vec<String>,

    #[serde(default = "default_link_ttl_secs")]
    pub link_ttl_secs: i64,
}

fn default_data_dir() -> String {
    "./data".to_string()
}
fn default_log_level() -> String {
    DEFAULT_LEVEL.to_string()
}
fn default_max_file_size() -> u64 {
    DEFAULT_MAX_FILE_SIZE
}
fn default_accepted_mime() -> Vec<String> {
    UploadLimits::default().accepted_mime
}
fn default_link_ttl_secs() -> i64 {
    DEFAULT_LINK_TTL_SECS
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_file_size: default_max_file_size(),
            accepted_mime: default_accepted_mime(),
            link_ttl_secs: default_link_ttl_secs(),
        }
    }
}

impl Config {
    /// Defaults plus a freshly generated secret
    pub fn generate() -> Self {
        let jwt_secret = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(GENERATED_SECRET_LENGTH)
            .map(char::from)
            .collect();

        Self {
            data_dir: default_data_dir(),
            log_level: default_log_level(),
            jwt_secret,
            http: HttpServerConfig::default(),
            upload: UploadConfig::default(),
        }
    }

    /// Load configuration from file
    pub fn load(path: &Path) -> CliResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            CliError::invalid_config(format!("Failed to read config {}: {}", path.display(), e))
        })?;

        let config: Config = serde_json::from_str(&content)
            .map_err(|e| CliError::invalid_config(format!("Invalid config JSON: {}", e)))?;

        config.validate()?;

        Ok(config)
    }

    /// Write configuration as pretty JSON
    pub fn save(&self, path: &Path) -> CliResult<()> {
        let unwritable = |e: std::io::Error| {
            CliError::invalid_config(format!("Failed to write config {}: {}", path.display(), e))
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(unwritable)?;
        }
        fs::write(path, serde_json::to_string_pretty(self)?).map_err(unwritable)?;
        Ok(())
    }

    fn validate(&self) -> CliResult<()> {
        if self.data_dir.trim().is_empty() {
            return Err(CliError::invalid_config("data_dir must not be empty"));
        }

        if self.jwt_secret.is_empty() {
            return Err(CliError::invalid_config("jwt_secret must not be empty"));
        }

        if self.upload.max_file_size == 0 {
            return Err(CliError::invalid_config("upload.max_file_size must be > 0"));
        }

        if self.upload.accepted_mime.is_empty() {
            return Err(CliError::invalid_config(
                "upload.accepted_mime must list at least one type",
            ));
        }

        if self.upload.link_ttl_secs <= 0 {
            return Err(CliError::invalid_config("upload.link_ttl_secs must be > 0"));
        }

        Ok(())
    }

    pub fn data_path(&self) -> &Path {
        Path::new(&self.data_dir)
    }

    /// Upload ceilings for the broker
    pub fn to_limits(&self) -> UploadLimits {
        UploadLimits {
            max_file_size: self.upload.max_file_size,
            accepted_mime: self.upload.accepted_mime.clone(),
            link_ttl: Duration::seconds(self.upload.link_ttl_secs),
        }
    }
}
