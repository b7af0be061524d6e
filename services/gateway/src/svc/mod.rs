//! Typed clients for the backend service constellation.
//!
//! One client per service, each a thin borrow of the request context. Every
//! method returns `Result<T, ServiceError>`: a response outside 2xx or an
//! unparseable body is an error, logged here with the correlation id and
//! surfaced to the caller as the sentinel — never as a panic or an HTTP
//! failure of our own.
//!
//! Backend bodies are `{"data": ...}` envelopes. Query parameters that are
//! "no filter" are omitted from the request entirely, never sent empty.

pub mod beatmaps;
pub mod chats;
pub mod scores;
pub mod users;

pub use beatmaps::BeatmapsClient;
pub use chats::ChatsClient;
pub use scores::ScoresClient;
pub use users::UsersClient;

use reqwest::StatusCode;
use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::error;

use crate::context::RequestContext;

pub type ServiceResult<T> = Result<T, ServiceError>;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("unexpected status: {0}")]
    Status(StatusCode),
    #[error("malformed response body: {0}")]
    Malformed(#[from] serde_json::Error),
}

#[derive(serde::Deserialize)]
struct Envelope<T> {
    data: T,
}

pub(crate) async fn get<T: DeserializeOwned>(
    ctx: &RequestContext,
    url: String,
) -> ServiceResult<T> {
    let request = ctx.http.get(&url);
    send(ctx, request, &url).await
}

pub(crate) async fn get_with_query<T: DeserializeOwned, Q: Serialize + ?Sized>(
    ctx: &RequestContext,
    url: String,
    query: &Q,
) -> ServiceResult<T> {
    let request = ctx.http.get(&url).query(query);
    send(ctx, request, &url).await
}

pub(crate) async fn post_json<T: DeserializeOwned, B: Serialize + ?Sized>(
    ctx: &RequestContext,
    url: String,
    body: &B,
) -> ServiceResult<T> {
    let request = ctx.http.post(&url).json(body);
    send(ctx, request, &url).await
}

pub(crate) async fn patch_json<T: DeserializeOwned, B: Serialize + ?Sized>(
    ctx: &RequestContext,
    url: String,
    body: &B,
) -> ServiceResult<T> {
    let request = ctx.http.patch(&url).json(body);
    send(ctx, request, &url).await
}

/// POST where the caller only cares that the service accepted the request.
pub(crate) async fn post_json_unit<B: Serialize + ?Sized>(
    ctx: &RequestContext,
    url: String,
    body: &B,
) -> ServiceResult<()> {
    let request = ctx.http.post(&url).json(body);
    send_unit(ctx, request, &url).await
}

pub(crate) async fn patch_json_unit<B: Serialize + ?Sized>(
    ctx: &RequestContext,
    url: String,
    body: &B,
) -> ServiceResult<()> {
    let request = ctx.http.patch(&url).json(body);
    send_unit(ctx, request, &url).await
}

pub(crate) async fn delete_unit(ctx: &RequestContext, url: String) -> ServiceResult<()> {
    let request = ctx.http.delete(&url);
    send_unit(ctx, request, &url).await
}

async fn send<T: DeserializeOwned>(
    ctx: &RequestContext,
    request: reqwest::RequestBuilder,
    url: &str,
) -> ServiceResult<T> {
    let result = async {
        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ServiceError::Status(status));
        }
        let body = response.bytes().await?;
        let envelope: Envelope<T> = serde_json::from_slice(&body)?;
        Ok(envelope.data)
    }
    .await;

    if let Err(err) = &result {
        error!(request_id = %ctx.request_id, url, error = %err, "service call failed");
    }
    result
}

async fn send_unit(
    ctx: &RequestContext,
    request: reqwest::RequestBuilder,
    url: &str,
) -> ServiceResult<()> {
    let result = async {
        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ServiceError::Status(status));
        }
        Ok(())
    }
    .await;

    if let Err(err) = &result {
        error!(request_id = %ctx.request_id, url, error = %err, "service call failed");
    }
    result
}
