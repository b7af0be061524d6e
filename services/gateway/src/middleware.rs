//! Request middleware: correlation span and `X-Process-Time`.

use axum::extract::Request;
use axum::http::HeaderValue;
use axum::middleware::Next;
use axum::response::Response;
use std::time::Instant;
use tracing::Instrument;

use crate::context::{RequestId, correlation_id};

/// Wraps every request in a span carrying the correlation id and stamps the
/// response with the wall time spent, in milliseconds.
pub async fn track_request(mut request: Request, next: Next) -> Response {
    let start = Instant::now();

    let request_id = correlation_id(request.headers());
    request
        .extensions_mut()
        .insert(RequestId(request_id.clone()));

    let span = tracing::info_span!(
        "request",
        request_id = %request_id,
        method = %request.method(),
        path = %request.uri().path(),
    );
    let mut response = next.run(request).instrument(span).await;

    let elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;
    if let Ok(value) = HeaderValue::from_str(&elapsed_ms.to_string()) {
        response.headers_mut().insert("x-process-time", value);
    }
    response
}
