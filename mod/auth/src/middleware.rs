//! Write-guard middleware.
//!
//! Mutating equipment operations (POST, PUT, DELETE) require a valid bearer
//! token; reads and the feeder endpoints stay public. Update is guarded the
//! same as create and delete.

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::{HeaderMap, Method};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use substation_core::ServiceError;

use crate::token::TokenAuthenticator;

/// Route prefixes whose mutating methods require a token.
const GUARDED_PREFIXES: &[&str] = &["/api/equipment"];

/// Token-check middleware applied to the whole router by the binary.
pub async fn write_guard(
    State(auth): State<Arc<TokenAuthenticator>>,
    mut req: Request,
    next: Next,
) -> Response {
    if !requires_token(req.method(), req.uri().path()) {
        return next.run(req).await;
    }

    let Some(token) = extract_bearer(req.headers()) else {
        return ServiceError::Unauthorized("missing authorization header".into()).into_response();
    };

    match auth.verify(token) {
        Ok(claims) => {
            // Make the operator identity available to handlers.
            req.extensions_mut().insert(claims);
            next.run(req).await
        }
        Err(e) => e.into_response(),
    }
}

/// Whether this request mutates a guarded resource.
fn requires_token(method: &Method, path: &str) -> bool {
    let mutating = matches!(*method, Method::POST | Method::PUT | Method::DELETE);
    mutating && GUARDED_PREFIXES.iter().any(|p| path.starts_with(p))
}

/// Extract the Bearer token from the Authorization header.
fn extract_bearer(headers: &HeaderMap) -> Option<&str> {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guards_equipment_writes_only() {
        assert!(requires_token(&Method::POST, "/api/equipment"));
        assert!(requires_token(&Method::PUT, "/api/equipment/abc123"));
        assert!(requires_token(&Method::DELETE, "/api/equipment/abc123"));

        assert!(!requires_token(&Method::GET, "/api/equipment"));
        assert!(!requires_token(&Method::GET, "/api/equipment/abc123"));
        assert!(!requires_token(&Method::POST, "/api/feeders/seed"));
        assert!(!requires_token(&Method::POST, "/api/auth/login"));
    }

    #[test]
    fn bearer_extraction() {
        let mut headers = HeaderMap::new();
        headers.insert("authorization", "Bearer abc.def.ghi".parse().unwrap());
        assert_eq!(extract_bearer(&headers), Some("abc.def.ghi"));

        let mut headers = HeaderMap::new();
        headers.insert("authorization", "Basic xyz".parse().unwrap());
        assert_eq!(extract_bearer(&headers), None);

        assert_eq!(extract_bearer(&HeaderMap::new()), None);
    }
}
