//! Inbound HTTP surface.

pub mod bancho;
pub mod login;
pub mod web;

use axum::http::{HeaderValue, header};
use axum::response::{IntoResponse, Response};

/// An `application/octet-stream` response of bancho frames, HTTP 200.
pub(crate) fn bancho_frames(body: Vec<u8>) -> Response {
    (
        [(header::CONTENT_TYPE, "application/octet-stream")],
        body,
    )
        .into_response()
}

/// Same, with the `cho-token` header the client echoes back as `osu-token`.
pub(crate) fn bancho_frames_with_token(body: Vec<u8>, cho_token: &str) -> Response {
    let mut response = bancho_frames(body);
    if let Ok(value) = HeaderValue::from_str(cho_token) {
        response.headers_mut().insert("cho-token", value);
    }
    response
}
