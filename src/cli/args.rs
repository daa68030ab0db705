//! CLI argument definitions using clap
//!
//! Commands:
//! - dynbase init --config <path> [--allow-unauthorised]
//! - dynbase serve --config <path>
//! - dynbase token --config <path> --username <name> --role <role>
//! - dynbase purge-uploads --config <path>

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// dynbase - schema-driven collections with one-time upload links
#[derive(Parser, Debug)]
#[command(name = "dynbase")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Initialize a data directory, writing a default config if none exists
    Init {
        /// Path to configuration file
        #[arg(long, default_value = "./dynbase.json")]
        config: PathBuf,

        /// Let requests without a credential through as anonymous
        #[arg(long)]
        allow_unauthorised: bool,
    },

    /// Serve the HTTP API
    Serve {
        /// Path to configuration file
        #[arg(long, default_value = "./dynbase.json")]
        config: PathBuf,
    },

    /// Issue a bearer token signed with the configured secret
    Token {
        /// Path to configuration file
        #[arg(long, default_value = "./dynbase.json")]
        config: PathBuf,

        #[arg(long)]
        username: String,

        /// author, editor or administrator
        #[arg(long, default_value = "author")]
        role: String,
    },

    /// Delete pending upload records whose links have expired
    PurgeUploads {
        /// Path to configuration file
        #[arg(long, default_value = "./dynbase.json")]
        config: PathBuf,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
