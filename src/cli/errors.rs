//! CLI error types
//!
//! A CLI error ends the command. `main` prints it to stderr and exits with
//! [`CliError::exit_code`]; stdout only ever carries success lines.

use std::fmt;
use std::io;

use crate::errors::EngineError;
use crate::store::StoreError;

/// What went wrong, as a stable machine-readable code
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CliErrorCode {
    /// Config file missing, unwritable or holding out-of-range values
    InvalidConfig,
    /// `token` was asked for a role that does not exist
    UnknownRole,
    /// `init` found a store already laid out under `data_dir`
    DataDirInitialized,
    /// A command needing a store found none under `data_dir`
    DataDirMissing,
    /// The document store could not be opened or written
    StoreUnavailable,
    /// The HTTP listener failed to bind or stopped with an error
    ServeFailed,
    /// An engine operation (purge, flag write, token signing) failed
    OperationFailed,
    /// Writing a response line to stdout failed
    OutputFailed,
}

impl CliErrorCode {
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidConfig => "DYNBASE_CLI_INVALID_CONFIG",
            Self::UnknownRole => "DYNBASE_CLI_UNKNOWN_ROLE",
            Self::DataDirInitialized => "DYNBASE_CLI_ALREADY_INITIALIZED",
            Self::DataDirMissing => "DYNBASE_CLI_NOT_INITIALIZED",
            Self::StoreUnavailable => "DYNBASE_CLI_STORE_UNAVAILABLE",
            Self::ServeFailed => "DYNBASE_CLI_SERVE_FAILED",
            Self::OperationFailed => "DYNBASE_CLI_OPERATION_FAILED",
            Self::OutputFailed => "DYNBASE_CLI_OUTPUT_FAILED",
        }
    }

    /// Process exit status: 2 for problems the operator fixes by changing
    /// the invocation or config, 1 for everything else
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::InvalidConfig
            | Self::UnknownRole
            | Self::DataDirInitialized
            | Self::DataDirMissing => 2,
            _ => 1,
        }
    }
}

/// A failed CLI command
#[derive(Debug)]
pub struct CliError {
    code: CliErrorCode,
    message: String,
}

impl CliError {
    pub fn new(code: CliErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::InvalidConfig, msg)
    }

    pub fn unknown_role(role: &str) -> Self {
        Self::new(
            CliErrorCode::UnknownRole,
            format!(
                "Unknown role '{}'; expected anonymous, author, editor or administrator",
                role
            ),
        )
    }

    pub fn data_dir_initialized(data_dir: &str) -> Self {
        Self::new(
            CliErrorCode::DataDirInitialized,
            format!("A store already exists under {}", data_dir),
        )
    }

    pub fn data_dir_missing(data_dir: &str) -> Self {
        Self::new(
            CliErrorCode::DataDirMissing,
            format!(
                "No store under {}. Run 'dynbase init' first.",
                data_dir
            ),
        )
    }

    pub fn store_unavailable(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::StoreUnavailable, msg)
    }

    pub fn serve_failed(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::ServeFailed, msg)
    }

    pub fn code(&self) -> CliErrorCode {
        self.code
    }

    pub fn code_str(&self) -> &'static str {
        self.code.code()
    }

    pub fn exit_code(&self) -> i32 {
        self.code.exit_code()
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code.code(), self.message)
    }
}

impl std::error::Error for CliError {}

impl From<io::Error> for CliError {
    fn from(e: io::Error) -> Self {
        Self::new(CliErrorCode::OutputFailed, e.to_string())
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        Self::new(CliErrorCode::OutputFailed, format!("Response encoding failed: {}", e))
    }
}

impl From<StoreError> for CliError {
    fn from(e: StoreError) -> Self {
        Self::store_unavailable(e.to_string())
    }
}

impl From<EngineError> for CliError {
    fn from(e: EngineError) -> Self {
        Self::new(
            CliErrorCode::OperationFailed,
            format!("{} ({}): {}", e.title(), e.status_code(), e),
        )
    }
}

/// CLI result type
pub type CliResult<T> = Result<T, CliError>;
