//! # HTTP Server Module
//!
//! Axum surface over the artifact store.
//!
//! # Endpoints
//!
//! - `/health` - Health check
//! - `{mount}/upload` - Authenticated upload (publish)
//! - `{mount}/versions` - Published versions
//! - `{mount}/{selector}` - Download latest or a specific version

pub mod artifact_routes;
pub mod auth;
pub mod config;
pub mod observability_routes;
pub mod server;

pub use artifact_routes::ArtifactState;
pub use config::HttpServerConfig;
pub use server::HttpServer;
