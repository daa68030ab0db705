//! dynbase CLI entry point
//!
//! Parses arguments, dispatches to the CLI module and exits non-zero on
//! failure with the error's exit code. All wiring lives in `cli`.

use dynbase::cli;

#[tokio::main]
async fn main() {
    if let Err(e) = cli::run().await {
        eprintln!("{}", e);
        std::process::exit(e.exit_code());
    }
}
