//! # Upload Authentication
//!
//! A single shared bearer token gates uploads. Reads are public.

use axum::http::{header, HeaderMap, StatusCode};
use subtle::ConstantTimeEq;

/// Why an upload was refused before reaching the store
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthRejection {
    /// The server has no token configured; nothing may be uploaded
    NotConfigured,
    /// Missing, malformed or wrong bearer token
    InvalidToken,
}

impl AuthRejection {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthRejection::NotConfigured => StatusCode::INTERNAL_SERVER_ERROR,
            AuthRejection::InvalidToken => StatusCode::UNAUTHORIZED,
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            AuthRejection::NotConfigured => "Upload token not configured on the server",
            AuthRejection::InvalidToken => "Invalid token",
        }
    }
}

/// Extract the token from `Authorization: Bearer <token>`.
///
/// The scheme is case-insensitive and any run of whitespace may follow it.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let scheme = value.get(..6)?;
    let rest = value.get(6..)?;
    if !scheme.eq_ignore_ascii_case("bearer") || !rest.starts_with(char::is_whitespace) {
        return None;
    }
    let token = rest.trim_start();
    (!token.is_empty()).then_some(token)
}

/// Check the request against the configured token.
pub fn authorize(headers: &HeaderMap, configured: Option<&str>) -> Result<(), AuthRejection> {
    let expected = match configured {
        Some(token) if !token.is_empty() => token,
        _ => return Err(AuthRejection::NotConfigured),
    };

    let provided = bearer_token(headers).ok_or(AuthRejection::InvalidToken)?;

    if bool::from(provided.as_bytes().ct_eq(expected.as_bytes())) {
        Ok(())
    } else {
        Err(AuthRejection::InvalidToken)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers_with(auth: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_str(auth).unwrap());
        headers
    }

    #[test]
    fn test_bearer_token_forms() {
        assert_eq!(bearer_token(&headers_with("Bearer abc")), Some("abc"));
        assert_eq!(bearer_token(&headers_with("bearer   abc")), Some("abc"));
        assert_eq!(bearer_token(&headers_with("Bearerabc")), None);
        assert_eq!(bearer_token(&headers_with("Basic abc")), None);
        assert_eq!(bearer_token(&headers_with("Bearer ")), None);
        assert_eq!(bearer_token(&HeaderMap::new()), None);
    }

    #[test]
    fn test_authorize() {
        let headers = headers_with("Bearer s3cret");
        assert_eq!(authorize(&headers, Some("s3cret")), Ok(()));
        assert_eq!(
            authorize(&headers, Some("other")),
            Err(AuthRejection::InvalidToken)
        );
        assert_eq!(
            authorize(&headers, Some("s3cret-longer")),
            Err(AuthRejection::InvalidToken)
        );
    }

    #[test]
    fn test_unconfigured_token_refuses_everything() {
        let headers = headers_with("Bearer anything");
        assert_eq!(authorize(&headers, None), Err(AuthRejection::NotConfigured));
        assert_eq!(authorize(&headers, Some("")), Err(AuthRejection::NotConfigured));
        assert_eq!(AuthRejection::NotConfigured.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_missing_header_is_unauthorized() {
        assert_eq!(
            authorize(&HeaderMap::new(), Some("s3cret")),
            Err(AuthRejection::InvalidToken)
        );
    }
}
