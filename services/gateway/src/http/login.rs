//! The login ceremony: `POST /v1/login`.
//!
//! The client sends a plain-text body; the gateway authenticates it against
//! the users service, bootstraps a presence, assembles the long initial
//! packet stream (channels, friends, own and peer stats), and announces the
//! newcomer to every live peer via their packet queues.
//!
//! Every failure along the way collapses to the same canonical response:
//! `ACCOUNT_ID(-1)` with `cho-token: no`, HTTP 200.

use axum::body::Bytes;
use axum::extract::State;
use axum::response::Response;
use std::time::Instant;
use tracing::info;

use bancho_serial::packets::{
    UserPresence, UserStats, write_account_id_packet, write_channel_info_end_packet,
    write_channel_info_packet, write_friends_list_packet, write_main_menu_icon_packet,
    write_notification_packet, write_privileges_packet, write_protocol_version_packet,
    write_silence_end_packet, write_user_presence_packet, write_user_stats_packet,
};

use super::bancho_frames_with_token;
use crate::context::RequestContext;
use crate::state::AppState;
use crate::svc::users::NewPresence;
use crate::svc::{ChatsClient, UsersClient};

const OSU_STABLE_PROTOCOL_VERSION: i32 = 19;

/// Privilege model pending; everyone gets everything, the client sees the
/// low byte.
const ALL_PRIVILEGES: i32 = 0x7fff_ffff;

// Geolocation backend pending; fixed coordinates for every login.
const DEFAULT_COUNTRY_CODE: u8 = 38;
const DEFAULT_LATITUDE: f32 = 48.23;
const DEFAULT_LONGITUDE: f32 = 16.37;

const GLOBAL_RANK_UNRANKED: i32 = 0;

fn to_client_privileges(privileges: i32) -> u8 {
    (privileges & 0xff) as u8
}

fn is_restricted(_privileges: i32) -> bool {
    false
}

// ---------------------------------------------------------------------------
// Login body parsing
// ---------------------------------------------------------------------------

/// The decoded plain-text login request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginData {
    pub username: String,
    pub password_md5: String,
    pub osu_version: String,
    pub utc_offset: i8,
    pub display_city: bool,
    pub pm_private: bool,
    pub osu_path_md5: String,
    pub adapters_str: String,
    pub adapters_md5: String,
    pub uninstall_md5: String,
    pub disk_signature_md5: String,
}

impl TryFrom<&str> for LoginData {
    type Error = &'static str;

    /// Body layout:
    /// `<username>\n<password_md5>\n<osu_version>|<utc_offset>|<display_city>|<client_hashes>|<pm_private>`
    /// where `<client_hashes>` is five `:`-separated md5s with a trailing
    /// separator.
    fn try_from(body: &str) -> Result<LoginData, &'static str> {
        let mut lines = body.splitn(3, '\n');
        let username = lines.next().ok_or("Missing username")?;
        let password_md5 = lines.next().ok_or("Missing password")?;
        let remainder = lines.next().ok_or("Missing client info")?;

        let mut fields = remainder.splitn(5, '|');
        let osu_version = fields.next().ok_or("Missing osu! version")?;
        let utc_offset = fields.next().ok_or("Missing utc offset")?;
        let display_city = fields.next().ok_or("Missing display_city flag")?;
        let client_hashes = fields.next().ok_or("Missing client hashes")?;
        let pm_private = fields.next().ok_or("Missing pm_private flag")?;

        let utc_offset = utc_offset
            .trim()
            .parse::<i8>()
            .map_err(|_| "Invalid utc offset")?;

        // The hash group ends with a separator; drop the empty tail segment.
        let client_hashes = client_hashes.strip_suffix(':').unwrap_or(client_hashes);
        let mut hashes = client_hashes.splitn(5, ':');
        let osu_path_md5 = hashes.next().ok_or("Missing osu! path hash")?;
        let adapters_str = hashes.next().ok_or("Missing adapters")?;
        let adapters_md5 = hashes.next().ok_or("Missing adapters hash")?;
        let uninstall_md5 = hashes.next().ok_or("Missing uninstall hash")?;
        let disk_signature_md5 = hashes.next().ok_or("Missing disk signature hash")?;

        Ok(LoginData {
            username: username.to_owned(),
            password_md5: password_md5.to_owned(),
            osu_version: osu_version.to_owned(),
            utc_offset,
            display_city: display_city.trim() == "1",
            pm_private: pm_private.trim() == "1",
            osu_path_md5: osu_path_md5.to_owned(),
            adapters_str: adapters_str.to_owned(),
            adapters_md5: adapters_md5.to_owned(),
            uninstall_md5: uninstall_md5.to_owned(),
            disk_signature_md5: disk_signature_md5.to_owned(),
        })
    }
}

// ---------------------------------------------------------------------------
// Endpoint
// ---------------------------------------------------------------------------

fn login_failure() -> Response {
    bancho_frames_with_token(write_account_id_packet(-1), "no")
}

pub async fn login(
    State(state): State<AppState>,
    ctx: RequestContext,
    body: Bytes,
) -> Response {
    let start = Instant::now();

    let Ok(body_text) = std::str::from_utf8(&body) else {
        return login_failure();
    };
    let Ok(login_data) = LoginData::try_from(body_text) else {
        return login_failure();
    };

    let users = UsersClient::new(&ctx);
    let chats_client = ChatsClient::new(&ctx);

    // An account may hold at most one live presence.
    let Ok(existing) = users.get_all_presences(Some(&login_data.username)).await else {
        return login_failure();
    };
    if !existing.is_empty() {
        let mut body = write_notification_packet("Your account is already logged in.");
        body.extend_from_slice(&write_account_id_packet(-1));
        return bancho_frames_with_token(body, "no");
    }

    let Ok(session) = users
        .log_in(&login_data.username, &login_data.password_md5, "osu!")
        .await
    else {
        return login_failure();
    };

    let mut buffer = Vec::new();
    buffer.extend_from_slice(&write_protocol_version_packet(OSU_STABLE_PROTOCOL_VERSION));
    buffer.extend_from_slice(&write_account_id_packet(session.account_id));
    buffer.extend_from_slice(&write_privileges_packet(ALL_PRIVILEGES));

    // Channel listing; #lobby is only advertised to clients inside the
    // multiplayer lobby, which the gateway does not serve.
    let Ok(chats) = chats_client.get_chats(None).await else {
        return login_failure();
    };
    for chat in &chats {
        if chat.name == "#lobby" {
            continue;
        }
        let Ok(members) = chats_client.get_members(chat.chat_id).await else {
            return login_failure();
        };
        buffer.extend_from_slice(&write_channel_info_packet(
            &chat.name,
            &chat.topic,
            members.len().min(usize::from(u16::MAX)) as u16,
        ));
    }
    buffer.extend_from_slice(&write_channel_info_end_packet());

    // Friends and silences have no backing service yet.
    buffer.extend_from_slice(&write_friends_list_packet(&[]));
    buffer.extend_from_slice(&write_silence_end_packet(0));

    if let Some(menu_icon) = &state.menu_icon {
        buffer.extend_from_slice(&write_main_menu_icon_packet(
            &menu_icon.icon_url,
            &menu_icon.onclick_url,
        ));
    }

    let Ok(presence) = users
        .create_presence(&NewPresence {
            session_id: session.session_id,
            account_id: session.account_id,
            username: &login_data.username,
            game_mode: 0,
            country_code: DEFAULT_COUNTRY_CODE,
            privileges: ALL_PRIVILEGES,
            latitude: DEFAULT_LATITUDE,
            longitude: DEFAULT_LONGITUDE,
            action: 0,
            info_text: "",
            map_md5: "",
            map_id: 0,
            mods: 0,
            osu_version: &login_data.osu_version,
            utc_offset: login_data.utc_offset,
            display_city: login_data.display_city,
            pm_private: login_data.pm_private,
        })
        .await
    else {
        return login_failure();
    };

    let Ok(stats) = users
        .get_stats(session.account_id, presence.game_mode)
        .await
    else {
        return login_failure();
    };

    let user_presence_data = write_user_presence_packet(&UserPresence {
        account_id: session.account_id,
        username: &presence.username,
        utc_offset: presence.utc_offset,
        country_code: presence.country_code,
        bancho_privileges: to_client_privileges(presence.privileges),
        mode: presence.game_mode,
        latitude: presence.latitude,
        longitude: presence.longitude,
        global_rank: GLOBAL_RANK_UNRANKED,
    });
    let user_stats_data = write_user_stats_packet(&UserStats {
        account_id: session.account_id,
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
    });

    buffer.extend_from_slice(&user_presence_data);
    buffer.extend_from_slice(&user_stats_data);

    // Mutual presence exchange: peers land in our stream, we land in their
    // packet queues.
    let mut own_announcement = user_presence_data;
    own_announcement.extend_from_slice(&user_stats_data);

    let Ok(other_presences) = users.get_all_presences(None).await else {
        return login_failure();
    };
    for other in &other_presences {
        if other.session_id == session.session_id {
            continue;
        }
        if is_restricted(other.privileges) {
            continue;
        }

        let Ok(other_stats) = users.get_stats(other.account_id, other.game_mode).await else {
            return login_failure();
        };

        buffer.extend_from_slice(&write_user_presence_packet(&UserPresence {
            account_id: other.account_id,
            username: &other.username,
            utc_offset: other.utc_offset,
            country_code: other.country_code,
            bancho_privileges: to_client_privileges(other.privileges),
            mode: other.game_mode,
            latitude: other.latitude,
            longitude: other.longitude,
            global_rank: GLOBAL_RANK_UNRANKED,
        }));
        buffer.extend_from_slice(&write_user_stats_packet(&UserStats {
            account_id: other.account_id,
            action: other.action,
            info_text: &other.info_text,
            map_md5: &other.map_md5,
            mods: other.mods as i32,
            mode: other.game_mode,
            map_id: other.map_id,
            ranked_score: other_stats.ranked_score,
            accuracy: other_stats.accuracy,
            play_count: other_stats.play_count,
            total_score: other_stats.total_score,
            global_rank: GLOBAL_RANK_UNRANKED,
            pp: other_stats.performance,
        }));

        if users
            .enqueue_packet(other.session_id, &own_announcement)
            .await
            .is_err()
        {
            return login_failure();
        }
    }

    buffer.extend_from_slice(&write_notification_packet(&state.welcome_message));
    let elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;
    buffer.extend_from_slice(&write_notification_packet(&format!(
        "Login took {elapsed_ms:.2}ms"
    )));

    info!(
        request_id = %ctx.request_id,
        username = %login_data.username,
        account_id = session.account_id,
        "login complete"
    );

    bancho_frames_with_token(buffer, &session.session_id.to_string())
}
