//! docvault CLI entry point
//!
//! Parses arguments, dispatches to the CLI module, and on failure reports
//! the error as JSON on stdout and exits non-zero.

use docvault::cli;

fn main() {
    if let Err(e) = cli::run() {
        let _ = cli::write_error(e.code_str(), e.message());
        eprintln!("{}", e);
        std::process::exit(1);
    }
}
