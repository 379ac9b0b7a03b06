//! CLI argument definitions using clap
//!
//! Commands:
//! - docvault init --config <path>
//! - docvault serve --config <path> [--port <port>]
//! - docvault publish --config <path> --file <path>
//! - docvault versions --config <path>
//! - docvault fetch --config <path> --selector <selector> --out <path>

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::observability::LogFormat;

/// docvault - A versioned single-document store served over HTTP
#[derive(Parser, Debug)]
#[command(name = "docvault")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Log line format: human or json
    #[arg(long, global = true, default_value = "human")]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create the storage directory and record its bump policy
    Init {
        /// Path to configuration file
        #[arg(long, default_value = "./docvault.json")]
        config: PathBuf,
    },

    /// Serve uploads and downloads over HTTP
    Serve {
        /// Path to configuration file
        #[arg(long, default_value = "./docvault.json")]
        config: PathBuf,

        /// Override the configured port
        #[arg(long)]
        port: Option<u16>,
    },

    /// Publish a local file as the next version
    Publish {
        /// Path to configuration file
        #[arg(long, default_value = "./docvault.json")]
        config: PathBuf,

        /// File to publish
        #[arg(long)]
        file: PathBuf,
    },

    /// List published versions
    Versions {
        /// Path to configuration file
        #[arg(long, default_value = "./docvault.json")]
        config: PathBuf,
    },

    /// Copy a published artifact to a local file
    Fetch {
        /// Path to configuration file
        #[arg(long, default_value = "./docvault.json")]
        config: PathBuf,

        /// `latest` or `major.minor.patch`
        #[arg(long, default_value = "latest")]
        selector: String,

        /// Destination file
        #[arg(long)]
        out: PathBuf,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_publish() {
        let cli = Cli::try_parse_from([
            "docvault", "publish", "--config", "/etc/docvault.json", "--file", "cv.pdf",
        ])
        .unwrap();

        match cli.command {
            Command::Publish { config, file } => {
                assert_eq!(config, PathBuf::from("/etc/docvault.json"));
                assert_eq!(file, PathBuf::from("cv.pdf"));
            }
            other => panic!("unexpected command: {:?}", other),
        }
        assert_eq!(cli.log_format, LogFormat::Human);
    }

    #[test]
    fn test_parse_serve_with_port_and_json_logs() {
        let cli =
            Cli::try_parse_from(["docvault", "--log-format", "json", "serve", "--port", "8080"])
                .unwrap();

        assert_eq!(cli.log_format, LogFormat::Json);
        assert!(matches!(cli.command, Command::Serve { port: Some(8080), .. }));
    }

    #[test]
    fn test_fetch_defaults_to_latest() {
        let cli = Cli::try_parse_from(["docvault", "fetch", "--out", "copy.pdf"]).unwrap();
        assert!(matches!(cli.command, Command::Fetch { ref selector, .. } if selector == "latest"));
    }
}
