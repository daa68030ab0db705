//! CLI module for dynbase
//!
//! Provides command-line interface for:
//! - init: write config, lay out the data directory, seed access flags
//! - serve: run the HTTP API
//! - token: issue a bearer credential
//! - purge-uploads: sweep expired pending uploads

mod args;
mod commands;
mod config;
mod errors;
mod io;

pub use args::{Cli, Command};
pub use commands::{init, purge_uploads, run, run_command, serve, token, Services, UPLOADS_DIR};
pub use config::{Config, UploadConfig};
pub use errors::{CliError, CliErrorCode, CliResult};
pub use io::write_response;
