//! Session lifecycle handlers: PING and LOGOUT.

use bancho_models::Session;
use bancho_serial::packets::write_user_logout_packet;

use super::HandlerResult;
use crate::context::RequestContext;
use crate::svc::{ChatsClient, UsersClient};

/// PING is deliberately a no-op: an empty response makes osu! rest until
/// its next scheduled poll instead of immediately re-requesting.
pub(super) async fn handle_ping(
    _ctx: &RequestContext,
    _session: &Session,
    _packet_data: &[u8],
) -> HandlerResult {
    Ok(Vec::new())
}

/// Tears the session down: presence, then the session itself, then chat
/// memberships, then a USER_LOGOUT to every remaining peer. Strictly in
/// that order — a failure stops the sequence where it happened and the
/// rest is reconciled when the session expires downstream.
pub(super) async fn handle_logout(
    ctx: &RequestContext,
    session: &Session,
    _packet_data: &[u8],
) -> HandlerResult {
    let users = UsersClient::new(ctx);
    let chats = ChatsClient::new(ctx);

    users.delete_presence(session.session_id).await?;
    users.log_out(session.session_id).await?;

    for chat in chats.get_chats(None).await? {
        chats.leave_chat(chat.chat_id, session.session_id).await?;
    }

    let logout_data = write_user_logout_packet(session.account_id);
    for presence in users.get_all_presences(None).await? {
        if presence.session_id == session.session_id {
            continue;
        }
        users
            .enqueue_packet(presence.session_id, &logout_data)
            .await?;
    }

    Ok(Vec::new())
}
