//! CLI command implementations
//!
//! Every command loads the config, installs logging, then opens the
//! subsystems it needs against `data_dir`. Results are written to stdout as
//! one JSON line.

use std::path::Path;
use std::sync::Arc;

use serde_json::json;

use crate::api::ApiHandler;
use crate::auth::{AccessSettings, Authenticator, JwtConfig, JwtIdentityProvider, Role};
use crate::http_server::{AppState, HttpServer};
use crate::observability::{init_logging, Event};
use crate::store::{DocumentStore, FileStore};
use crate::upload::{ByteStorage, LocalBackend};

use super::args::Command;
use super::config::Config;
use super::errors::{CliError, CliResult};
use super::io::write_response;

/// Directory under `data_dir` holding redeemed bytes
pub const UPLOADS_DIR: &str = "uploads";

/// Subsystems opened against one data directory
pub struct Services {
    pub store: Arc<dyn DocumentStore>,
    pub api: ApiHandler,
    pub tokens: JwtIdentityProvider,
}

impl Services {
    /// Open the store and wire every subsystem from config
    pub async fn open(config: &Config) -> CliResult<Self> {
        let data_dir = config.data_path();
        let store: Arc<dyn DocumentStore> = Arc::new(FileStore::open(data_dir).await?);
        let bytes: Arc<dyn ByteStorage> = Arc::new(LocalBackend::new(data_dir.join(UPLOADS_DIR)));

        let api = ApiHandler::new(
            store.clone(),
            bytes,
            config.to_limits(),
            config.http.base_url(),
        );
        let tokens = JwtIdentityProvider::new(JwtConfig::new(config.jwt_secret.clone()));

        Ok(Self { store, api, tokens })
    }

    /// Request state for the HTTP surface
    pub fn app_state(&self) -> AppState {
        let authenticator = Authenticator::new(
            Arc::new(self.tokens.clone()),
            AccessSettings::new(self.store.clone()),
        );
        AppState::new(self.api.clone(), authenticator)
    }
}

/// Main CLI entry point
///
/// Parses arguments and dispatches to the appropriate command.
pub async fn run() -> CliResult<()> {
    let cli = super::args::Cli::parse_args();
    run_command(cli.command).await
}

/// Run the appropriate command based on CLI args
pub async fn run_command(cmd: Command) -> CliResult<()> {
    match cmd {
        Command::Init {
            config,
            allow_unauthorised,
        } => init(&config, allow_unauthorised).await,
        Command::Serve { config } => serve(&config).await,
        Command::Token {
            config,
            username,
            role,
        } => token(&config, &username, &role).await,
        Command::PurgeUploads { config } => purge_uploads(&config).await,
    }
}

/// Initialize a data directory.
///
/// Writes a default config (with a generated secret) if none exists at
/// `config_path`, lays out the store and seeds the `allow_unauthorised` flag.
pub async fn init(config_path: &Path, allow_unauthorised: bool) -> CliResult<()> {
    if !config_path.exists() {
        Config::generate().save(config_path)?;
    }
    let config = load(config_path)?;
    let data_dir = config.data_path();

    if FileStore::exists(data_dir) {
        return Err(CliError::data_dir_initialized(&config.data_dir));
    }

    tokio::fs::create_dir_all(data_dir.join(UPLOADS_DIR))
        .await
        .map_err(|e| {
            CliError::store_unavailable(format!(
                "Failed to create directory {}: {}",
                data_dir.display(),
                e
            ))
        })?;

    let services = Services::open(&config).await?;
    AccessSettings::new(services.store.clone())
        .set_allow_unauthorised(allow_unauthorised)
        .await?;

    tracing::info!(
        event = %Event::DataDirInitialized,
        data_dir = %config.data_dir,
        allow_unauthorised,
        "data directory initialized"
    );

    write_response(json!({
        "initialized": true,
        "data_dir": config.data_dir,
        "allow_unauthorised": allow_unauthorised,
    }))
}

/// Serve the HTTP API until Ctrl-C
pub async fn serve(config_path: &Path) -> CliResult<()> {
    let config = load_initialized(config_path)?;
    let services = Services::open(&config).await?;

    let server = HttpServer::new(config.http.clone(), services.app_state());
    server
        .start()
        .await
        .map_err(|e| CliError::serve_failed(e.to_string()))
}

/// Issue a bearer token for `username`.
///
/// Unknown role names are refused here rather than silently issuing an
/// anonymous token.
pub async fn token(config_path: &Path, username: &str, role: &str) -> CliResult<()> {
    let config = load(config_path)?;
    let parsed = Role::parse(role);
    if parsed.as_str() != role {
        return Err(CliError::unknown_role(role));
    }

    let provider = JwtIdentityProvider::new(JwtConfig::new(config.jwt_secret.clone()));
    let token = provider.issue(username, parsed)?;

    write_response(json!({
        "token": token,
        "username": username,
        "role": parsed.as_str(),
    }))
}

/// Delete pending upload records whose links have expired
pub async fn purge_uploads(config_path: &Path) -> CliResult<()> {
    let config = load_initialized(config_path)?;
    let services = Services::open(&config).await?;

    let purged = services.api.uploads().purge_expired().await?;
    write_response(json!({ "purged": purged }))
}

fn load(config_path: &Path) -> CliResult<Config> {
    let config = Config::load(config_path)?;
    init_logging(&config.log_level);
    tracing::debug!(
        event = %Event::ConfigLoaded,
        path = %config_path.display(),
        data_dir = %config.data_dir,
        "config loaded"
    );
    Ok(config)
}

fn load_initialized(config_path: &Path) -> CliResult<Config> {
    let config = load(config_path)?;
    if !FileStore::exists(config.data_path()) {
        return Err(CliError::data_dir_missing(&config.data_dir));
    }
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn config_in(dir: &TempDir) -> (std::path::PathBuf, Config) {
        let mut config = Config::generate();
        config.data_dir = dir.path().join("data").display().to_string();
        let path = dir.path().join("dynbase.json");
        config.save(&path).unwrap();
        (path, config)
    }

    #[tokio::test]
    async fn test_init_seeds_flag_and_refuses_twice() {
        let dir = TempDir::new().unwrap();
        let (path, config) = config_in(&dir);

        init(&path, true).await.unwrap();
        assert!(FileStore::exists(config.data_path()));
        assert!(config.data_path().join(UPLOADS_DIR).is_dir());

        let services = Services::open(&config).await.unwrap();
        let settings = AccessSettings::new(services.store.clone());
        assert!(settings.allow_unauthorised().await.unwrap());

        let err = init(&path, false).await.unwrap_err();
        assert_eq!(err.code_str(), "DYNBASE_CLI_ALREADY_INITIALIZED");
    }

    #[tokio::test]
    async fn test_commands_require_init() {
        let dir = TempDir::new().unwrap();
        let (path, _) = config_in(&dir);

        let err = purge_uploads(&path).await.unwrap_err();
        assert_eq!(err.code_str(), "DYNBASE_CLI_NOT_INITIALIZED");
    }

    #[tokio::test]
    async fn test_token_rejects_unknown_role() {
        let dir = TempDir::new().unwrap();
        let (path, _) = config_in(&dir);

        assert!(token(&path, "alice", "editor").await.is_ok());
        let err = token(&path, "alice", "superuser").await.unwrap_err();
        assert_eq!(err.code_str(), "DYNBASE_CLI_UNKNOWN_ROLE");
    }

    #[tokio::test]
    async fn test_purge_after_init() {
        let dir = TempDir::new().unwrap();
        let (path, _) = config_in(&dir);

        init(&path, false).await.unwrap();
        purge_uploads(&path).await.unwrap();
    }
}
