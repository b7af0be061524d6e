//! Chat handlers: SEND_PUBLIC_MESSAGE, CHANNEL_JOIN, CHANNEL_PART.

use bancho_models::Session;
use bancho_serial::packets::{
    write_channel_info_packet, write_channel_join_success_packet, write_notification_packet,
    write_send_message_packet,
};
use bancho_serial::reader::Reader;
use tracing::warn;

use super::HandlerResult;
use crate::context::RequestContext;
use crate::svc::{ChatsClient, UsersClient};

/// Channels that exist only inside the client UI; the server must ignore
/// traffic addressed to them.
const CLIENT_ONLY_CHANNELS: &[&str] = &["#highlight", "#userlog"];

const MAX_MESSAGE_CHARS: usize = 1000;

pub(super) async fn handle_send_public_message(
    ctx: &RequestContext,
    session: &Session,
    packet_data: &[u8],
) -> HandlerResult {
    let mut reader = Reader::new(packet_data);
    let sender = reader.read_string()?;
    let message = reader.read_string()?;
    let recipient = reader.read_string()?;
    let sender_id = reader.read_i32()?;

    // The client always sends an empty sender and a zero sender id; anything
    // else means a misbehaving client.
    if !sender.is_empty() || sender_id != 0 {
        warn!(
            request_id = %ctx.request_id,
            sender = %sender,
            sender_id,
            "unexpected sender preamble in public message"
        );
    }

    let message = message.trim();
    if message.is_empty() {
        return Ok(Vec::new());
    }
    if message.chars().count() > MAX_MESSAGE_CHARS {
        return Ok(write_notification_packet(
            "Your message exceeded the 1000 character limit.",
        ));
    }

    if CLIENT_ONLY_CHANNELS.contains(&recipient.as_str()) {
        return Ok(Vec::new());
    }

    let chats = ChatsClient::new(ctx);
    let found = chats.get_chats(Some(&recipient)).await?;
    let [chat] = found.as_slice() else {
        warn!(request_id = %ctx.request_id, recipient = %recipient, "message to unknown chat");
        return Ok(Vec::new());
    };

    let members = chats.get_members(chat.chat_id).await?;
    if !members
        .iter()
        .any(|member| member.session_id == session.session_id)
    {
        warn!(request_id = %ctx.request_id, chat = %chat.name, "message to chat without membership");
        return Ok(Vec::new());
    }

    let users = UsersClient::new(ctx);
    let account = users.get_account(session.account_id).await?;

    let message_data =
        write_send_message_packet(&account.username, message, &chat.name, session.account_id);

    for member in &members {
        if member.session_id == session.session_id {
            continue;
        }
        users
            .enqueue_packet(member.session_id, &message_data)
            .await?;
    }

    Ok(Vec::new())
}

pub(super) async fn handle_channel_join(
    ctx: &RequestContext,
    session: &Session,
    packet_data: &[u8],
) -> HandlerResult {
    let mut reader = Reader::new(packet_data);
    let channel_name = reader.read_string()?;

    let chats = ChatsClient::new(ctx);
    let found = chats.get_chats(Some(&channel_name)).await?;
    let [chat] = found.as_slice() else {
        warn!(request_id = %ctx.request_id, channel_name = %channel_name, "join of unknown chat");
        return Ok(Vec::new());
    };

    let members = chats.get_members(chat.chat_id).await?;
    if members
        .iter()
        .any(|member| member.session_id == session.session_id)
    {
        warn!(request_id = %ctx.request_id, chat = %chat.name, "join while already a member");
        return Ok(Vec::new());
    }

    // TODO: gate the join on chat.read_privileges once the privilege model
    // lands; everyone passes for now.

    let users = UsersClient::new(ctx);
    let presence = users.get_presence(session.session_id).await?;

    chats
        .join_chat(
            chat.chat_id,
            session.session_id,
            session.account_id,
            &presence.username,
            presence.privileges,
        )
        .await?;

    let channel_info = write_channel_info_packet(
        &chat.name,
        &chat.topic,
        (members.len() + 1).min(usize::from(u16::MAX)) as u16,
    );
    for peer in users.get_all_presences(None).await? {
        users.enqueue_packet(peer.session_id, &channel_info).await?;
    }

    Ok(write_channel_join_success_packet(&chat.name))
}

pub(super) async fn handle_channel_part(
    ctx: &RequestContext,
    session: &Session,
    packet_data: &[u8],
) -> HandlerResult {
    let mut reader = Reader::new(packet_data);
    let channel_name = reader.read_string()?;

    let chats = ChatsClient::new(ctx);
    let found = chats.get_chats(Some(&channel_name)).await?;
    let [chat] = found.as_slice() else {
        warn!(request_id = %ctx.request_id, channel_name = %channel_name, "part of unknown chat");
        return Ok(Vec::new());
    };

    let members = chats.get_members(chat.chat_id).await?;
    if !members
        .iter()
        .any(|member| member.session_id == session.session_id)
    {
        warn!(request_id = %ctx.request_id, chat = %chat.name, "part without membership");
        return Ok(Vec::new());
    }

    chats.leave_chat(chat.chat_id, session.session_id).await?;

    let users = UsersClient::new(ctx);
    let channel_info = write_channel_info_packet(
        &chat.name,
        &chat.topic,
        members.len().saturating_sub(1).min(usize::from(u16::MAX)) as u16,
    );
    for peer in users.get_all_presences(None).await? {
        users.enqueue_packet(peer.session_id, &channel_info).await?;
    }

    Ok(Vec::new())
}
