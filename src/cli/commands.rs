//! CLI command implementations
//!
//! Every command loads and validates the config first, then opens the
//! store (which checks the directory's recorded bump policy) before doing
//! any work.

use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::http_server::{ArtifactState, HttpServer, HttpServerConfig};
use crate::observability::Event;
use crate::store::{ArtifactStore, StoreConfig, DEFAULT_MAX_UPLOAD_BYTES};
use crate::version::{BumpPolicy, VersionSelector};

use super::args::Command;
use super::errors::{CliError, CliErrorCode, CliResult};
use super::io::write_response;

/// Env var that overrides `upload_token` from the config file
pub const UPLOAD_TOKEN_ENV: &str = "DOCVAULT_UPLOAD_TOKEN";

/// Configuration file structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Storage directory of the lineage (required)
    pub storage_dir: String,

    /// "patch", "major" or "fixed_alias" (optional, default "patch")
    #[serde(default = "default_bump_policy")]
    pub bump_policy: String,

    /// Upload size limit in bytes (optional, default 25MB)
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: u64,

    /// Artifact file extension (optional, default "pdf")
    #[serde(default = "default_extension")]
    pub extension: String,

    /// Accepted upload type and served type (optional, default "application/pdf")
    #[serde(default = "default_content_type")]
    pub content_type: String,

    /// Public base URL for links in upload responses
    #[serde(default)]
    pub base_url: Option<String>,

    /// Bearer token for uploads; uploads are refused when unset
    #[serde(default)]
    pub upload_token: Option<String>,

    /// HTTP server settings
    #[serde(default)]
    pub http: HttpServerConfig,
}

fn default_bump_policy() -> String {
    BumpPolicy::default().as_str().to_string()
}
fn default_max_upload_bytes() -> u64 {
    DEFAULT_MAX_UPLOAD_BYTES
}
fn default_extension() -> String {
    "pdf".to_string()
}
fn default_content_type() -> String {
    "application/pdf".to_string()
}

impl Config {
    /// Load configuration from file
    pub fn load(path: &Path) -> CliResult<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| CliError::config_error(format!("Failed to read config: {}", e)))?;

        Self::from_json(&content)
    }

    /// Parse and validate configuration JSON
    pub fn from_json(content: &str) -> CliResult<Self> {
        let config: Config = serde_json::from_str(content)
            .map_err(|e| CliError::config_error(format!("Invalid config JSON: {}", e)))?;

        config.validate()?;

        Ok(config)
    }

    fn validate(&self) -> CliResult<()> {
        if self.storage_dir.trim().is_empty() {
            return Err(CliError::config_error("storage_dir must not be empty"));
        }

        self.policy()?;

        if self.max_upload_bytes == 0 {
            return Err(CliError::config_error("max_upload_bytes must be > 0"));
        }

        if self.extension.is_empty() || !self.extension.chars().all(|c| c.is_ascii_alphanumeric())
        {
            return Err(CliError::config_error(format!(
                "Invalid extension: '{}'. Use ASCII letters and digits only.",
                self.extension
            )));
        }

        if !self.content_type.contains('/') {
            return Err(CliError::config_error(format!(
                "Invalid content_type: '{}'",
                self.content_type
            )));
        }

        Ok(())
    }

    /// Parsed bump policy
    pub fn policy(&self) -> CliResult<BumpPolicy> {
        self.bump_policy.parse().map_err(CliError::config_error)
    }

    /// Get storage directory as Path
    pub fn storage_path(&self) -> &Path {
        Path::new(&self.storage_dir)
    }

    /// Upload token, with the environment taking precedence
    pub fn upload_token(&self) -> Option<String> {
        std::env::var(UPLOAD_TOKEN_ENV)
            .ok()
            .filter(|t| !t.is_empty())
            .or_else(|| self.upload_token.clone())
    }

    /// Store settings for this config
    pub fn store_config(&self) -> CliResult<StoreConfig> {
        Ok(StoreConfig {
            dir: PathBuf::from(&self.storage_dir),
            policy: self.policy()?,
            max_upload_bytes: self.max_upload_bytes,
            extension: self.extension.clone(),
        })
    }

    /// Load the config and open its store
    fn open(path: &Path) -> CliResult<(Self, ArtifactStore)> {
        let config = Self::load(path)?;
        tracing::info!(
            event = Event::ConfigLoaded.as_str(),
            path = %path.display(),
            storage_dir = %config.storage_dir,
            "configuration loaded"
        );
        let store = ArtifactStore::open(config.store_config()?)?;
        Ok((config, store))
    }
}

/// Dispatch a parsed command
pub fn run_command(command: Command) -> CliResult<()> {
    match command {
        Command::Init { config } => init(&config),
        Command::Serve { config, port } => serve(&config, port),
        Command::Publish { config, file } => publish(&config, &file),
        Command::Versions { config } => versions(&config),
        Command::Fetch {
            config,
            selector,
            out,
        } => fetch(&config, &selector, &out),
    }
}

/// Create the storage directory and record the bump policy.
pub fn init(config_path: &Path) -> CliResult<()> {
    let (_config, store) = Config::open(config_path)?;

    write_response(json!({
        "storage_dir": store.dir().display().to_string(),
        "bump_policy": store.policy().as_str(),
    }))
}

/// Serve the HTTP API until interrupted.
pub fn serve(config_path: &Path, port: Option<u16>) -> CliResult<()> {
    let (config, store) = Config::open(config_path)?;

    let mut http_config = config.http.clone();
    if let Some(port) = port {
        http_config.port = port;
    }

    let mut state = ArtifactState::new(store);
    state.content_type = config.content_type.clone();
    state.base_url = config.base_url.clone();
    state.upload_token = config.upload_token();
    if state.upload_token.is_none() {
        tracing::warn!("no upload token configured; uploads will be refused");
    }

    let server = HttpServer::new(http_config, state);

    let rt = tokio::runtime::Runtime::new()
        .map_err(|e| CliError::boot_failed(format!("Failed to create tokio runtime: {}", e)))?;

    rt.block_on(async {
        server
            .start()
            .await
            .map_err(|e| CliError::boot_failed(format!("HTTP server failed: {}", e)))
    })
}

/// Publish one local file.
pub fn publish(config_path: &Path, file: &Path) -> CliResult<()> {
    let (_config, store) = Config::open(config_path)?;

    let content = fs::read(file).map_err(|e| {
        CliError::io_error(format!("Failed to read {}: {}", file.display(), e))
    })?;
    let receipt = store.publish(&content)?;

    write_response(serde_json::to_value(&receipt)?)
}

/// Print published versions, ascending.
pub fn versions(config_path: &Path) -> CliResult<()> {
    let (_config, store) = Config::open(config_path)?;
    let versions = store.versions();

    write_response(json!({
        "total": versions.len(),
        "versions": versions,
    }))
}

/// Copy a resolved artifact to `out`.
pub fn fetch(config_path: &Path, selector: &str, out: &Path) -> CliResult<()> {
    let (_config, store) = Config::open(config_path)?;

    // An unparseable selector names nothing, as over HTTP
    let parsed = VersionSelector::parse(selector, store.naming().extension())
        .ok_or_else(|| {
            CliError::new(
                CliErrorCode::NotFound,
                format!("Artifact not found: {}", selector),
            )
        })?;
    let handle = store.resolve(parsed)?;
    let identifier = handle.identifier().to_string();

    let mut source = handle.into_file();
    let mut dest = File::create(out)
        .map_err(|e| CliError::io_error(format!("Failed to create {}: {}", out.display(), e)))?;
    let copied = io::copy(&mut source, &mut dest)?;
    dest.sync_all()?;

    write_response(json!({
        "identifier": identifier,
        "bytes": copied,
        "out": out.display().to_string(),
    }))
}
