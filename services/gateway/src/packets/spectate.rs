//! Spectator handlers: START_SPECTATING, STOP_SPECTATING, SPECTATE_FRAMES.
//!
//! The spectator graph is a set of directed edges held by the users
//! service; the gateway reads one level at a time and never caches it.

use bancho_models::Session;
use bancho_serial::packets::{
    write_fellow_spectator_joined_packet, write_fellow_spectator_left_packet,
    write_spectate_frames_packet, write_spectator_joined_packet, write_spectator_left_packet,
};
use bancho_serial::reader::Reader;
use tracing::warn;

use super::HandlerResult;
use crate::context::RequestContext;
use crate::svc::UsersClient;

pub(super) async fn handle_start_spectating(
    ctx: &RequestContext,
    session: &Session,
    packet_data: &[u8],
) -> HandlerResult {
    let mut reader = Reader::new(packet_data);
    let host_account_id = reader.read_i32()?;

    let users = UsersClient::new(ctx);
    let host_sessions = users.get_sessions(host_account_id).await?;
    let [host] = host_sessions.as_slice() else {
        warn!(
            request_id = %ctx.request_id,
            host_account_id,
            "spectate host has no unique session"
        );
        return Ok(Vec::new());
    };

    users
        .create_spectator(host.session_id, session.session_id, session.account_id)
        .await?;

    users
        .enqueue_packet(
            host.session_id,
            &write_spectator_joined_packet(session.account_id),
        )
        .await?;

    let mut response = Vec::new();
    for fellow in users.get_spectators(host.session_id).await? {
        if fellow.session_id == session.session_id {
            continue;
        }
        response.extend_from_slice(&write_fellow_spectator_joined_packet(fellow.account_id));
        users
            .enqueue_packet(
                fellow.session_id,
                &write_fellow_spectator_joined_packet(session.account_id),
            )
            .await?;
    }

    Ok(response)
}

pub(super) async fn handle_stop_spectating(
    ctx: &RequestContext,
    session: &Session,
    _packet_data: &[u8],
) -> HandlerResult {
    let users = UsersClient::new(ctx);

    let edge = users.get_spectating(session.session_id).await?;

    users
        .delete_spectator(edge.host_session_id, session.session_id)
        .await?;

    users
        .enqueue_packet(
            edge.host_session_id,
            &write_spectator_left_packet(session.account_id),
        )
        .await?;

    let mut response = Vec::new();
    for fellow in users.get_spectators(edge.host_session_id).await? {
        if fellow.session_id == session.session_id {
            continue;
        }
        response.extend_from_slice(&write_fellow_spectator_left_packet(fellow.account_id));
        users
            .enqueue_packet(
                fellow.session_id,
                &write_fellow_spectator_left_packet(session.account_id),
            )
            .await?;
    }

    Ok(response)
}

/// Replay frames pass through uninterpreted: the client's body is wrapped
/// in a server SPECTATE_FRAMES packet and dropped on every spectator.
pub(super) async fn handle_spectate_frames(
    ctx: &RequestContext,
    session: &Session,
    packet_data: &[u8],
) -> HandlerResult {
    let users = UsersClient::new(ctx);

    let frames_data = write_spectate_frames_packet(packet_data);
    for spectator in users.get_spectators(session.session_id).await? {
        users
            .enqueue_packet(spectator.session_id, &frames_data)
            .await?;
    }

    Ok(Vec::new())
}
