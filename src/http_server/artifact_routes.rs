//! Artifact HTTP Routes
//!
//! Upload, version listing and download of the stored lineage.
//!
//! - `POST /upload` (bearer token, multipart field `file`)
//! - `GET /versions`
//! - `GET /{selector}` where selector is `latest`, `latest.pdf`, `1.0.2`
//!   or `v-1.0.2.pdf`

use std::sync::Arc;

use axum::{
    body::Body,
    extract::{DefaultBodyLimit, Multipart, Path, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use tokio_util::io::ReaderStream;

use crate::observability::Event;
use crate::store::{ArtifactStore, PublishReceipt, StoreError};
use crate::version::naming::identifier_stem;
use crate::version::{Version, VersionSelector};

use super::auth::{authorize, AuthRejection};

/// Slack on top of the artifact limit for multipart boundaries and headers
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

// ==================
// Shared State
// ==================

/// State shared across artifact handlers
pub struct ArtifactState {
    pub store: ArtifactStore,
    /// Bearer token required for uploads; `None` refuses every upload
    pub upload_token: Option<String>,
    /// Public base URL for links in upload responses
    pub base_url: Option<String>,
    /// Accepted upload type, also sent on download
    pub content_type: String,
    /// Prefix the routes are mounted under, used to build links
    pub mount_path: String,
}

impl ArtifactState {
    pub fn new(store: ArtifactStore) -> Self {
        Self {
            store,
            upload_token: None,
            base_url: None,
            content_type: "application/pdf".to_string(),
            mount_path: "/cv".to_string(),
        }
    }

    pub fn with_upload_token(mut self, token: impl Into<String>) -> Self {
        self.upload_token = Some(token.into());
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn with_mount_path(mut self, mount_path: impl Into<String>) -> Self {
        self.mount_path = mount_path.into();
        self
    }

    /// Configured base URL, else `http://` plus the request's Host header.
    ///
    /// Deployments behind a TLS proxy set `base_url`; forwarding headers
    /// are client-controlled and never consulted.
    fn public_base(&self, headers: &HeaderMap) -> String {
        if let Some(base) = &self.base_url {
            return base.trim_end_matches('/').to_string();
        }
        let host = headers
            .get(header::HOST)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("localhost");
        format!("http://{}", host)
    }

    fn link(&self, base: &str, identifier: &str) -> String {
        format!("{}{}/{}", base, self.mount_path, identifier)
    }
}

// ==================
// Request/Response Types
// ==================

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    /// Identifier without extension: `v-1.0.2`, or `latest` without history
    pub id: String,
    pub version: Option<Version>,
    /// Link to the alias
    pub url: String,
    /// Link to the immutable versioned artifact
    pub versioned_url: Option<String>,
    pub size: u64,
    pub sha256: String,
}

impl UploadResponse {
    fn from_receipt(receipt: PublishReceipt, state: &ArtifactState, base: &str) -> Self {
        let primary = receipt
            .versioned_identifier
            .as_deref()
            .unwrap_or(&receipt.latest_identifier);

        Self {
            id: identifier_stem(primary).to_string(),
            version: receipt.version,
            url: state.link(base, &receipt.latest_identifier),
            versioned_url: receipt
                .versioned_identifier
                .as_deref()
                .map(|id| state.link(base, id)),
            size: receipt.size,
            sha256: receipt.sha256,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct VersionsResponse {
    pub versions: Vec<Version>,
    pub total: usize,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: u16,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn api_error(status: StatusCode, message: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
            code: status.as_u16(),
        }),
    )
}

fn store_error(e: StoreError) -> ApiError {
    let status =
        StatusCode::from_u16(e.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    api_error(status, e.to_string())
}

fn rejected(reason: AuthRejection) -> ApiError {
    tracing::warn!(
        event = Event::UploadRejected.as_str(),
        reason = reason.message(),
        "upload refused"
    );
    api_error(reason.status_code(), reason.message())
}

// ==================
// Artifact Routes
// ==================

/// Create artifact routes
pub fn artifact_routes(state: Arc<ArtifactState>) -> Router {
    let body_limit = (state.store.max_upload_bytes() as usize)
        .saturating_add(MULTIPART_OVERHEAD_BYTES);

    Router::new()
        .route(
            "/upload",
            post(upload_handler).layer(DefaultBodyLimit::max(body_limit)),
        )
        .route("/versions", get(list_versions_handler))
        .route("/:selector", get(download_handler))
        .with_state(state)
}

// ==================
// Handlers
// ==================

async fn upload_handler(
    State(state): State<Arc<ArtifactState>>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiError> {
    authorize(&headers, state.upload_token.as_deref()).map_err(rejected)?;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| api_error(e.status(), e.body_text()))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let content_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        if !content_type.eq_ignore_ascii_case(&state.content_type) {
            tracing::warn!(
                event = Event::UploadRejected.as_str(),
                content_type = %content_type,
                "unsupported upload type"
            );
            return Err(api_error(
                StatusCode::UNSUPPORTED_MEDIA_TYPE,
                format!("Only {} uploads are accepted", state.content_type),
            ));
        }

        let data = field
            .bytes()
            .await
            .map_err(|e| api_error(e.status(), e.body_text()))?;

        tracing::info!(
            event = Event::UploadReceived.as_str(),
            size = data.len(),
            "upload received"
        );

        // A dropped request must not cancel a publish holding the directory
        // lock; the blocking task runs to completion regardless.
        let store = state.store.clone();
        let receipt = tokio::task::spawn_blocking(move || store.publish(&data))
            .await
            .map_err(|e| api_error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?
            .map_err(store_error)?;

        let base = state.public_base(&headers);
        return Ok(Json(UploadResponse::from_receipt(receipt, &state, &base)));
    }

    Err(api_error(StatusCode::BAD_REQUEST, "No file provided"))
}

async fn list_versions_handler(
    State(state): State<Arc<ArtifactState>>,
) -> Json<VersionsResponse> {
    let versions = state.store.versions();
    Json(VersionsResponse {
        total: versions.len(),
        versions,
    })
}

async fn download_handler(
    State(state): State<Arc<ArtifactState>>,
    Path(raw): Path<String>,
) -> Result<Response, ApiError> {
    let selector = VersionSelector::parse(&raw, state.store.naming().extension())
        .ok_or_else(|| store_error(StoreError::NotFound(raw.clone())))?;

    let store = state.store.clone();
    let handle = tokio::task::spawn_blocking(move || store.resolve(selector))
        .await
        .map_err(|e| api_error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?
        .map_err(store_error)?;

    let mut headers = HeaderMap::new();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_str(&state.content_type)
            .unwrap_or(HeaderValue::from_static("application/octet-stream")),
    );
    headers.insert(header::CONTENT_LENGTH, HeaderValue::from(handle.size()));
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
    if let Ok(disposition) =
        HeaderValue::from_str(&format!("inline; filename=\"{}\"", handle.identifier()))
    {
        headers.insert(header::CONTENT_DISPOSITION, disposition);
    }
    if let Some(modified) = handle.modified() {
        let http_date = modified.format("%a, %d %b %Y %H:%M:%S GMT").to_string();
        if let Ok(value) = HeaderValue::from_str(&http_date) {
            headers.insert(header::LAST_MODIFIED, value);
        }
    }
    if let Some(version) = handle.version() {
        if let Ok(value) = HeaderValue::from_str(&version.to_string()) {
            headers.insert("x-artifact-version", value);
        }
    }

    let file = tokio::fs::File::from_std(handle.into_file());
    let body = Body::from_stream(ReaderStream::new(file));

    Ok((StatusCode::OK, headers, body).into_response())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::StoreConfig;
    use tempfile::TempDir;

    fn state_in(temp: &TempDir) -> ArtifactState {
        let store = ArtifactStore::open(StoreConfig::new(temp.path())).unwrap();
        ArtifactState::new(store)
    }

    #[test]
    fn test_public_base_prefers_configured_url() {
        let temp = TempDir::new().unwrap();
        let state = state_in(&temp).with_base_url("https://files.example.com/");

        let mut headers = HeaderMap::new();
        headers.insert(header::HOST, HeaderValue::from_static("internal:3000"));

        assert_eq!(state.public_base(&headers), "https://files.example.com");
    }

    #[test]
    fn test_public_base_uses_host_and_ignores_forwarded_proto() {
        let temp = TempDir::new().unwrap();
        let state = state_in(&temp);

        let mut headers = HeaderMap::new();
        headers.insert(header::HOST, HeaderValue::from_static("cv.example.com"));
        headers.insert("x-forwarded-proto", HeaderValue::from_static("https"));

        assert_eq!(state.public_base(&headers), "http://cv.example.com");
    }

    #[test]
    fn test_upload_response_links() {
        let temp = TempDir::new().unwrap();
        let state = state_in(&temp);
        let receipt = state.store.publish(b"%PDF").unwrap();

        let response = UploadResponse::from_receipt(receipt, &state, "http://host");

        assert_eq!(response.id, "v-1.0.0");
        assert_eq!(response.url, "http://host/cv/latest.pdf");
        assert_eq!(
            response.versioned_url.as_deref(),
            Some("http://host/cv/v-1.0.0.pdf")
        );
    }

    #[test]
    fn test_store_error_status_mapping() {
        let (status, body) = store_error(StoreError::PayloadTooLarge { size: 9, max: 1 });
        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(body.code, 413);
    }
}
