//! Packet dispatch.
//!
//! `dispatch_stream` drains the frames of one `/v1/bancho` request body and
//! routes each to its handler. The opcode table is the `match` below —
//! explicit, built at compile time, no registry mutability.
//!
//! Handler contract: a handler may fail, and a failure is its own problem —
//! it is logged and contributes no bytes, but the loop keeps going. Only a
//! truncated frame ends the loop early, keeping whatever was assembled.

mod chat;
mod presence;
mod session;
mod spectate;

use bancho_models::Session;
use bancho_serial::packets::{ClientPacket, client_packet_name, write_notification_packet};
use bancho_serial::reader::{ReadError, Reader};
use std::future::Future;
use thiserror::Error;
use tracing::{error, info, warn};

use crate::context::RequestContext;
use crate::svc::ServiceError;

#[derive(Debug, Error)]
pub enum HandlerError {
    #[error(transparent)]
    Service(#[from] ServiceError),
    #[error(transparent)]
    Decode(#[from] ReadError),
}

pub type HandlerResult = Result<Vec<u8>, HandlerError>;

/// Reads `u16 id | u8 reserved | u32 length | body` frames until the request
/// body is exhausted, dispatching each in order.
pub async fn dispatch_stream(ctx: &RequestContext, session: &Session, body: &[u8]) -> Vec<u8> {
    let mut reader = Reader::new(body);
    let mut response = Vec::new();

    while !reader.stream_consumed() {
        let frame = read_frame(&mut reader);
        let Ok((packet_id, packet_data)) = frame else {
            warn!(request_id = %ctx.request_id, "truncated packet frame, dropping rest of body");
            break;
        };
        let packet_response = handle_packet_event(ctx, session, packet_id, packet_data).await;
        response.extend_from_slice(&packet_response);
    }

    response
}

fn read_frame<'a>(reader: &mut Reader<'a>) -> Result<(u16, &'a [u8]), ReadError> {
    let packet_id = reader.read_u16()?;
    let _reserved = reader.read_u8()?;
    let packet_length = reader.read_u32()?;
    let packet_data = reader.read_bytes(packet_length as usize)?;
    Ok((packet_id, packet_data))
}

async fn handle_packet_event(
    ctx: &RequestContext,
    session: &Session,
    packet_id: u16,
    packet_data: &[u8],
) -> Vec<u8> {
    let packet_name = client_packet_name(packet_id);

    let Some(handled) = dispatch(ctx, session, packet_id, packet_data).await else {
        // LOGOUT with no handler configured falls through quietly; anything
        // else gets surfaced to the user so protocol gaps are visible.
        if packet_id == ClientPacket::Logout as u16 {
            return Vec::new();
        }
        warn!(request_id = %ctx.request_id, packet = packet_name, packet_id, "unhandled packet");
        return write_notification_packet(&format!(
            "[Unhandled Packet] {packet_name} ({packet_id})"
        ));
    };

    match handled {
        Ok(response) => response,
        Err(err) => {
            error!(
                request_id = %ctx.request_id,
                packet = packet_name,
                error = %err,
                "packet handler failed"
            );
            Vec::new()
        }
    }
}

/// The opcode table. `None` means the opcode has no handler on the gateway.
async fn dispatch(
    ctx: &RequestContext,
    session: &Session,
    packet_id: u16,
    packet_data: &[u8],
) -> Option<HandlerResult> {
    let packet = ClientPacket::from_id(packet_id)?;
    let result = match packet {
        ClientPacket::Ping => {
            run(ctx, packet_id, packet_data, session::handle_ping(ctx, session, packet_data)).await
        }
        ClientPacket::Logout => {
            run(ctx, packet_id, packet_data, session::handle_logout(ctx, session, packet_data))
                .await
        }
        ClientPacket::RequestSelfStats => {
            run(
                ctx,
                packet_id,
                packet_data,
                presence::handle_request_self_stats(ctx, session, packet_data),
            )
            .await
        }
        ClientPacket::RequestAllUserStats => {
            run(
                ctx,
                packet_id,
                packet_data,
                presence::handle_request_all_user_stats(ctx, session, packet_data),
            )
            .await
        }
        ClientPacket::ChangeAction => {
            run(
                ctx,
                packet_id,
                packet_data,
                presence::handle_change_action(ctx, session, packet_data),
            )
            .await
        }
        ClientPacket::UpdatePresenceFilter => {
            run(
                ctx,
                packet_id,
                packet_data,
                presence::handle_update_presence_filter(ctx, session, packet_data),
            )
            .await
        }
        ClientPacket::SendPublicMessage => {
            run(
                ctx,
                packet_id,
                packet_data,
                chat::handle_send_public_message(ctx, session, packet_data),
            )
            .await
        }
        ClientPacket::ChannelJoin => {
            run(
                ctx,
                packet_id,
                packet_data,
                chat::handle_channel_join(ctx, session, packet_data),
            )
            .await
        }
        ClientPacket::ChannelPart => {
            run(
                ctx,
                packet_id,
                packet_data,
                chat::handle_channel_part(ctx, session, packet_data),
            )
            .await
        }
        ClientPacket::StartSpectating => {
            run(
                ctx,
                packet_id,
                packet_data,
                spectate::handle_start_spectating(ctx, session, packet_data),
            )
            .await
        }
        ClientPacket::StopSpectating => {
            run(
                ctx,
                packet_id,
                packet_data,
                spectate::handle_stop_spectating(ctx, session, packet_data),
            )
            .await
        }
        ClientPacket::SpectateFrames => {
            run(
                ctx,
                packet_id,
                packet_data,
                spectate::handle_spectate_frames(ctx, session, packet_data),
            )
            .await
        }
        _ => return None,
    };
    Some(result)
}

/// Logs the dispatch, then runs the handler. The handler future is inert
/// until awaited, so the log line lands first.
async fn run<F>(ctx: &RequestContext, packet_id: u16, packet_data: &[u8], handler: F) -> HandlerResult
where
    F: Future<Output = HandlerResult>,
{
    info!(
        request_id = %ctx.request_id,
        packet = client_packet_name(packet_id),
        length = packet_data.len(),
        "handling packet"
    );
    handler.await
}
