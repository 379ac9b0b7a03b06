//! CLI module for docvault
//!
//! Provides command-line interface for:
//! - init: Create the storage directory and record its policy
//! - serve: Run the HTTP API
//! - publish: Publish a local file
//! - versions: List published versions
//! - fetch: Copy a published artifact out

mod args;
mod commands;
mod errors;
mod io;

pub use args::{Cli, Command};
pub use commands::{fetch, init, publish, run_command, serve, versions, Config, UPLOAD_TOKEN_ENV};
pub use errors::{CliError, CliErrorCode, CliResult};
pub use io::{write_error, write_response};

use crate::observability::init_logging;

/// Parse arguments, install logging and run the selected command.
pub fn run() -> CliResult<()> {
    let cli = Cli::parse_args();
    init_logging(cli.log_format);
    run_command(cli.command)
}
