//! Presence and stats handlers: CHANGE_ACTION, UPDATE_PRESENCE_FILTER,
//! REQUEST_SELF_STATS, REQUEST_ALL_USER_STATS.

use bancho_models::{Presence, Session, Stats};
use bancho_serial::packets::{UserStats, write_user_stats_packet};
use bancho_serial::reader::Reader;
use tracing::warn;

use super::HandlerResult;
use crate::context::RequestContext;
use crate::svc::UsersClient;
use crate::svc::users::PresenceUpdate;

/// Global rank pending a ranking backend.
const GLOBAL_RANK_UNRANKED: i32 = 0;

fn user_stats_for(presence: &Presence, stats: &Stats) -> Vec<u8> {
    write_user_stats_packet(&UserStats {
        account_id: stats.account_id,
        action: presence.action,
        info_text: &presence.info_text,
        map_md5: &presence.map_md5,
        mods: presence.mods as i32,
        mode: presence.game_mode,
        map_id: presence.map_id,
        ranked_score: stats.ranked_score,
        accuracy: stats.accuracy,
        play_count: stats.play_count,
        total_score: stats.total_score,
        global_rank: GLOBAL_RANK_UNRANKED,
        pp: stats.performance,
    })
}

/// One USER_STATS for the requesting session.
pub(super) async fn handle_request_self_stats(
    ctx: &RequestContext,
    session: &Session,
    _packet_data: &[u8],
) -> HandlerResult {
    let users = UsersClient::new(ctx);

    let presence = users.get_presence(session.session_id).await?;
    let stats = users
        .get_stats(session.account_id, presence.game_mode)
        .await?;

    Ok(user_stats_for(&presence, &stats))
}

/// USER_STATS for every other live session.
pub(super) async fn handle_request_all_user_stats(
    ctx: &RequestContext,
    session: &Session,
    _packet_data: &[u8],
) -> HandlerResult {
    let users = UsersClient::new(ctx);

    let mut response = Vec::new();
    for presence in users.get_all_presences(None).await? {
        if presence.session_id == session.session_id {
            continue;
        }
        let stats = users
            .get_stats(presence.account_id, presence.game_mode)
            .await?;
        response.extend_from_slice(&user_stats_for(&presence, &stats));
    }

    Ok(response)
}

/// Applies the client's new action to its presence and broadcasts the
/// refreshed USER_STATS to every live session via the packet queue — the
/// caller included, so everyone (self too) picks the update up on their
/// next poll. The direct response is intentionally empty.
pub(super) async fn handle_change_action(
    ctx: &RequestContext,
    session: &Session,
    packet_data: &[u8],
) -> HandlerResult {
    let mut reader = Reader::new(packet_data);
    let action = reader.read_u8()?;
    let info_text = reader.read_string()?;
    let map_md5 = reader.read_string()?;
    let mods = reader.read_u32()?;
    let game_mode = reader.read_u8()?;
    let map_id = reader.read_i32()?;

    let users = UsersClient::new(ctx);
    users
        .partial_update_presence(
            session.session_id,
            &PresenceUpdate {
                action,
                info_text: &info_text,
                map_md5: &map_md5,
                mods,
                game_mode,
                map_id,
            },
        )
        .await?;

    let stats = users.get_stats(session.account_id, game_mode).await?;

    let stats_data = write_user_stats_packet(&UserStats {
        account_id: session.account_id,
        action,
        info_text: &info_text,
        map_md5: &map_md5,
        mods: mods as i32,
        mode: game_mode,
        map_id,
        ranked_score: stats.ranked_score,
        accuracy: stats.accuracy,
        play_count: stats.play_count,
        total_score: stats.total_score,
        global_rank: GLOBAL_RANK_UNRANKED,
        pp: stats.performance,
    });

    for presence in users.get_all_presences(None).await? {
        users.enqueue_packet(presence.session_id, &stats_data).await?;
    }

    Ok(Vec::new())
}

/// Validated but not persisted: the filter endpoint does not exist
/// downstream yet.
pub(super) async fn handle_update_presence_filter(
    ctx: &RequestContext,
    _session: &Session,
    packet_data: &[u8],
) -> HandlerResult {
    let mut reader = Reader::new(packet_data);
    let filter = reader.read_u8()?;

    if filter > 2 {
        warn!(request_id = %ctx.request_id, filter, "presence filter out of range");
    }

    Ok(Vec::new())
}
