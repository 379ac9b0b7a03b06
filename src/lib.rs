//! docvault - A versioned single-document store served over HTTP
//!
//! Uploads are published under a monotonically increasing semantic
//! version into one storage directory; readers fetch `latest` or any
//! published version.

pub mod cli;
pub mod crash_point;
pub mod http_server;
pub mod observability;
pub mod store;
pub mod version;
