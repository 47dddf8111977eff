//! Shared-secret check for pushes and admin calls

use crate::{error::ApiError, AppState};
use axum::{
    extract::{FromRequestParts, Query},
    http::{header, request::Parts, HeaderMap},
};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{error, warn};

/// Extractor that only succeeds when the request carries the shared secret
pub struct Authorized;

#[axum::async_trait]
impl FromRequestParts<Arc<AppState>> for Authorized {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let Some(expected) = state.api_key.as_deref() else {
            error!("FLOOD_API_KEY is not configured");
            return Err(ApiError::MissingSecret);
        };

        let query_key = Query::<HashMap<String, String>>::try_from_uri(&parts.uri)
            .ok()
            .and_then(|Query(mut q)| q.remove("key"));
        let presented = presented_key(&parts.headers, query_key.as_deref());

        if presented.trim() != expected.trim() {
            warn!(
                expected_hint = %hint(expected),
                received_hint = %hint(&presented),
                "auth mismatch"
            );
            return Err(ApiError::Unauthorized);
        }
        Ok(Authorized)
    }
}

/// Key from the `Authorization` header, else `x-api-key`, else the `key`
/// query parameter, with any `Bearer ` prefix removed
pub fn presented_key(headers: &HeaderMap, query_key: Option<&str>) -> String {
    let header_value = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .filter(|v| !v.is_empty())
    };

    let raw = header_value(header::AUTHORIZATION.as_str())
        .or_else(|| header_value("x-api-key"))
        .or(query_key.filter(|k| !k.is_empty()))
        .unwrap_or_default();

    raw.strip_prefix("Bearer ").unwrap_or(raw).to_string()
}

/// First three characters, enough to spot a wrong key in logs
fn hint(key: &str) -> String {
    let head: String = key.trim().chars().take(3).collect();
    if head.is_empty() {
        "(empty)".to_string()
    } else {
        format!("{head}...")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn authorization_header_wins() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer abc123"));
        headers.insert("x-api-key", HeaderValue::from_static("other"));
        assert_eq!(presented_key(&headers, Some("query")), "abc123");
    }

    #[test]
    fn falls_back_to_x_api_key_then_query() {
        let mut headers = HeaderMap::new();
        headers.insert("x-api-key", HeaderValue::from_static("from-header"));
        assert_eq!(presented_key(&headers, Some("query")), "from-header");

        let headers = HeaderMap::new();
        assert_eq!(presented_key(&headers, Some("query")), "query");
        assert_eq!(presented_key(&headers, None), "");
    }

    #[test]
    fn hint_never_leaks_whole_key() {
        assert_eq!(hint("supersecret"), "sup...");
        assert_eq!(hint(""), "(empty)");
    }
}
