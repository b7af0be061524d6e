//! Per-request ambient state.
//!
//! `RequestContext` is the one handle downstream code (service clients,
//! packet handlers) uses to reach the outside world: the shared HTTP client,
//! the backend base URLs, and the request's correlation id.

use axum::extract::FromRequestParts;
use axum::http::HeaderMap;
use axum::http::request::Parts;
use std::convert::Infallible;
use uuid::Uuid;

use crate::state::{AppState, ServiceUrls};

/// Correlation id chosen by the middleware, stashed in request extensions.
#[derive(Debug, Clone)]
pub struct RequestId(pub String);

#[derive(Clone)]
pub struct RequestContext {
    pub http: reqwest::Client,
    pub services: ServiceUrls,
    pub request_id: String,
}

impl FromRequestParts<AppState> for RequestContext {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<RequestContext, Infallible> {
        let request_id = parts
            .extensions
            .get::<RequestId>()
            .map(|id| id.0.clone())
            .unwrap_or_else(|| correlation_id(&parts.headers));
        Ok(RequestContext {
            http: state.http.clone(),
            services: state.services.clone(),
            request_id,
        })
    }
}

/// `X-Request-ID` when the caller supplied one, a fresh UUID otherwise.
pub fn correlation_id(headers: &HeaderMap) -> String {
    headers
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned)
        .unwrap_or_else(|| Uuid::new_v4().to_string())
}
