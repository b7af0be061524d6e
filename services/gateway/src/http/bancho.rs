//! The poll endpoint: `POST /v1/bancho`.
//!
//! Each poll refreshes the session's expiry, drains the inbound packet
//! stream through the dispatcher, then drains the session's queued packets
//! into the response. A session the users service no longer recognizes gets
//! told to restart, which sends the client back through login.

use axum::body::Bytes;
use axum::http::HeaderMap;
use axum::response::Response;
use chrono::{Duration, Utc};
use tracing::debug;
use uuid::Uuid;

use bancho_serial::packets::{write_notification_packet, write_server_restart_packet};

use super::bancho_frames;
use crate::context::RequestContext;
use crate::packets;
use crate::svc::UsersClient;

const SESSION_EXPIRY_MINUTES: i64 = 5;

fn restart_response() -> Response {
    let mut body = write_notification_packet("Service has restarted");
    body.extend_from_slice(&write_server_restart_packet(0));
    bancho_frames(body)
}

pub async fn bancho(ctx: RequestContext, headers: HeaderMap, body: Bytes) -> Response {
    let session_id = headers
        .get("osu-token")
        .and_then(|value| value.to_str().ok())
        .and_then(|token| Uuid::parse_str(token).ok());
    let Some(session_id) = session_id else {
        return restart_response();
    };

    let users = UsersClient::new(&ctx);

    let new_expiry = Utc::now() + Duration::minutes(SESSION_EXPIRY_MINUTES);
    let Ok(session) = users.partial_update_session(session_id, new_expiry).await else {
        // Unknown or expired session.
        return restart_response();
    };

    let mut buffer = packets::dispatch_stream(&ctx, &session, &body).await;

    let Ok(queued_packets) = users.dequeue_all_packets(session_id).await else {
        return bancho_frames(Vec::new());
    };
    for queued in queued_packets {
        buffer.extend_from_slice(&queued.data);
    }

    debug!(
        request_id = %ctx.request_id,
        session_id = %session_id,
        response_bytes = buffer.len(),
        "bancho poll complete"
    );

    bancho_frames(buffer)
}
