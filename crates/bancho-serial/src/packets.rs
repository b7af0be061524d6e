//! Opcode tables and server packet constructors.
//!
//! The client and server tables are disjoint 16-bit id spaces. The gateway
//! only handles a small subset of the client table, but the full tables are
//! kept so logs can name every packet the client is able to send.

use crate::writer::Writer;

// ---------------------------------------------------------------------------
// Client packets (client -> server)
// ---------------------------------------------------------------------------

/// Packets the osu! client sends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum ClientPacket {
    ChangeAction = 0,
    SendPublicMessage = 1,
    Logout = 2,
    RequestSelfStats = 3,
    Ping = 4,
    StartSpectating = 16,
    StopSpectating = 17,
    SpectateFrames = 18,
    ErrorReport = 20,
    CantSpectate = 21,
    SendPrivateMessage = 25,
    PartLobby = 29,
    JoinLobby = 30,
    CreateMatch = 31,
    JoinMatch = 32,
    PartMatch = 33,
    MatchChangeSlot = 38,
    MatchReady = 39,
    MatchLock = 40,
    MatchChangeSettings = 41,
    MatchStart = 44,
    MatchScoreUpdate = 47,
    MatchComplete = 49,
    MatchChangeMods = 51,
    MatchLoadComplete = 52,
    MatchNoBeatmap = 54,
    MatchNotReady = 55,
    MatchFailed = 56,
    MatchHasBeatmap = 59,
    MatchSkipRequest = 60,
    ChannelJoin = 63,
    BeatmapInfoRequest = 68,
    MatchTransferHost = 70,
    FriendAdd = 73,
    FriendRemove = 74,
    MatchChangeTeam = 77,
    ChannelPart = 78,
    UpdatePresenceFilter = 79,
    SetAwayMessage = 82,
    IrcOnly = 84,
    RequestAllUserStats = 85,
    MatchInvite = 87,
    MatchChangePassword = 90,
    TournamentMatchInfoRequest = 93,
    UserPresenceRequest = 97,
    UserPresenceRequestAll = 98,
    ToggleBlockNonFriendDms = 99,
    TournamentJoinMatchChannel = 108,
    TournamentLeaveMatchChannel = 109,
}

impl ClientPacket {
    pub fn from_id(id: u16) -> Option<ClientPacket> {
        let packet = match id {
            0 => ClientPacket::ChangeAction,
            1 => ClientPacket::SendPublicMessage,
            2 => ClientPacket::Logout,
            3 => ClientPacket::RequestSelfStats,
            4 => ClientPacket::Ping,
            16 => ClientPacket::StartSpectating,
            17 => ClientPacket::StopSpectating,
            18 => ClientPacket::SpectateFrames,
            20 => ClientPacket::ErrorReport,
            21 => ClientPacket::CantSpectate,
            25 => ClientPacket::SendPrivateMessage,
            29 => ClientPacket::PartLobby,
            30 => ClientPacket::JoinLobby,
            31 => ClientPacket::CreateMatch,
            32 => ClientPacket::JoinMatch,
            33 => ClientPacket::PartMatch,
            38 => ClientPacket::MatchChangeSlot,
            39 => ClientPacket::MatchReady,
            40 => ClientPacket::MatchLock,
            41 => ClientPacket::MatchChangeSettings,
            44 => ClientPacket::MatchStart,
            47 => ClientPacket::MatchScoreUpdate,
            49 => ClientPacket::MatchComplete,
            51 => ClientPacket::MatchChangeMods,
            52 => ClientPacket::MatchLoadComplete,
            54 => ClientPacket::MatchNoBeatmap,
            55 => ClientPacket::MatchNotReady,
            56 => ClientPacket::MatchFailed,
            59 => ClientPacket::MatchHasBeatmap,
            60 => ClientPacket::MatchSkipRequest,
            63 => ClientPacket::ChannelJoin,
            68 => ClientPacket::BeatmapInfoRequest,
            70 => ClientPacket::MatchTransferHost,
            73 => ClientPacket::FriendAdd,
            74 => ClientPacket::FriendRemove,
            77 => ClientPacket::MatchChangeTeam,
            78 => ClientPacket::ChannelPart,
            79 => ClientPacket::UpdatePresenceFilter,
            82 => ClientPacket::SetAwayMessage,
            84 => ClientPacket::IrcOnly,
            85 => ClientPacket::RequestAllUserStats,
            87 => ClientPacket::MatchInvite,
            90 => ClientPacket::MatchChangePassword,
            93 => ClientPacket::TournamentMatchInfoRequest,
            97 => ClientPacket::UserPresenceRequest,
            98 => ClientPacket::UserPresenceRequestAll,
            99 => ClientPacket::ToggleBlockNonFriendDms,
            108 => ClientPacket::TournamentJoinMatchChannel,
            109 => ClientPacket::TournamentLeaveMatchChannel,
            _ => return None,
        };
        Some(packet)
    }
}

/// Name of a client packet id, for logging. Unmapped ids are `"Unknown"`.
pub fn client_packet_name(id: u16) -> &'static str {
    match id {
        0 => "CHANGE_ACTION",
        1 => "SEND_PUBLIC_MESSAGE",
        2 => "LOGOUT",
        3 => "REQUEST_SELF_STATS",
        4 => "PING",
        16 => "START_SPECTATING",
        17 => "STOP_SPECTATING",
        18 => "SPECTATE_FRAMES",
        20 => "ERROR_REPORT",
        21 => "CANT_SPECTATE",
        25 => "SEND_PRIVATE_MESSAGE",
        29 => "PART_LOBBY",
        30 => "JOIN_LOBBY",
        31 => "CREATE_MATCH",
        32 => "JOIN_MATCH",
        33 => "PART_MATCH",
        38 => "MATCH_CHANGE_SLOT",
        39 => "MATCH_READY",
        40 => "MATCH_LOCK",
        41 => "MATCH_CHANGE_SETTINGS",
        44 => "MATCH_START",
        47 => "MATCH_SCORE_UPDATE",
        49 => "MATCH_COMPLETE",
        51 => "MATCH_CHANGE_MODS",
        52 => "MATCH_LOAD_COMPLETE",
        54 => "MATCH_NO_BEATMAP",
        55 => "MATCH_NOT_READY",
        56 => "MATCH_FAILED",
        59 => "MATCH_HAS_BEATMAP",
        60 => "MATCH_SKIP_REQUEST",
        63 => "CHANNEL_JOIN",
        68 => "BEATMAP_INFO_REQUEST",
        70 => "MATCH_TRANSFER_HOST",
        73 => "FRIEND_ADD",
        74 => "FRIEND_REMOVE",
        77 => "MATCH_CHANGE_TEAM",
        78 => "CHANNEL_PART",
        79 => "UPDATE_PRESENCE_FILTER",
        82 => "SET_AWAY_MESSAGE",
        84 => "IRC_ONLY",
        85 => "REQUEST_ALL_USER_STATS",
        87 => "MATCH_INVITE",
        90 => "MATCH_CHANGE_PASSWORD",
        93 => "TOURNAMENT_MATCH_INFO_REQUEST",
        97 => "USER_PRESENCE_REQUEST",
        98 => "USER_PRESENCE_REQUEST_ALL",
        99 => "TOGGLE_BLOCK_NON_FRIEND_DMS",
        108 => "TOURNAMENT_JOIN_MATCH_CHANNEL",
        109 => "TOURNAMENT_LEAVE_MATCH_CHANNEL",
        _ => "Unknown",
    }
}

// ---------------------------------------------------------------------------
// Server packets (server -> client)
// ---------------------------------------------------------------------------

/// Packets the server sends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum ServerPacket {
    AccountId = 5,
    SendMessage = 7,
    Pong = 8,
    HandleIrcChangeUsername = 9,
    HandleIrcQuit = 10,
    UserStats = 11,
    UserLogout = 12,
    SpectatorJoined = 13,
    SpectatorLeft = 14,
    SpectateFrames = 15,
    VersionUpdate = 19,
    SpectatorCantSpectate = 22,
    GetAttention = 23,
    Notification = 24,
    UpdateMatch = 26,
    NewMatch = 27,
    DisposeMatch = 28,
    ToggleBlockNonFriendDms = 34,
    MatchJoinSuccess = 36,
    MatchJoinFail = 37,
    FellowSpectatorJoined = 42,
    FellowSpectatorLeft = 43,
    AllPlayersLoaded = 45,
    MatchStart = 46,
    MatchScoreUpdate = 48,
    MatchTransferHost = 50,
    MatchAllPlayersLoaded = 53,
    MatchPlayerFailed = 57,
    MatchComplete = 58,
    MatchSkip = 61,
    Unauthorized = 62,
    ChannelJoinSuccess = 64,
    ChannelInfo = 65,
    ChannelKick = 66,
    ChannelAutoJoin = 67,
    BeatmapInfoReply = 69,
    Privileges = 71,
    FriendsList = 72,
    ProtocolVersion = 75,
    MainMenuIcon = 76,
    Monitor = 80,
    MatchPlayerSkipped = 81,
    UserPresence = 83,
    Restart = 86,
    MatchInvite = 88,
    ChannelInfoEnd = 89,
    MatchChangePassword = 91,
    SilenceEnd = 92,
    UserSilenced = 94,
    UserPresenceSingle = 95,
    UserPresenceBundle = 96,
    UserDmBlocked = 100,
    TargetIsSilenced = 101,
    VersionUpdateForced = 102,
    SwitchServer = 103,
    AccountRestricted = 104,
    Rtx = 105,
    MatchAbort = 106,
    SwitchTournamentServer = 107,
}

/// Name of a server packet id, for logging. Unmapped ids are `"Unknown"`.
pub fn server_packet_name(id: u16) -> &'static str {
    match id {
        5 => "ACCOUNT_ID",
        7 => "SEND_MESSAGE",
        8 => "PONG",
        9 => "HANDLE_IRC_CHANGE_USERNAME",
        10 => "HANDLE_IRC_QUIT",
        11 => "USER_STATS",
        12 => "USER_LOGOUT",
        13 => "SPECTATOR_JOINED",
        14 => "SPECTATOR_LEFT",
        15 => "SPECTATE_FRAMES",
        19 => "VERSION_UPDATE",
        22 => "SPECTATOR_CANT_SPECTATE",
        23 => "GET_ATTENTION",
        24 => "NOTIFICATION",
        26 => "UPDATE_MATCH",
        27 => "NEW_MATCH",
        28 => "DISPOSE_MATCH",
        34 => "TOGGLE_BLOCK_NON_FRIEND_DMS",
        36 => "MATCH_JOIN_SUCCESS",
        37 => "MATCH_JOIN_FAIL",
        42 => "FELLOW_SPECTATOR_JOINED",
        43 => "FELLOW_SPECTATOR_LEFT",
        45 => "ALL_PLAYERS_LOADED",
        46 => "MATCH_START",
        48 => "MATCH_SCORE_UPDATE",
        50 => "MATCH_TRANSFER_HOST",
        53 => "MATCH_ALL_PLAYERS_LOADED",
        57 => "MATCH_PLAYER_FAILED",
        58 => "MATCH_COMPLETE",
        61 => "MATCH_SKIP",
        62 => "UNAUTHORIZED",
        64 => "CHANNEL_JOIN_SUCCESS",
        65 => "CHANNEL_INFO",
        66 => "CHANNEL_KICK",
        67 => "CHANNEL_AUTO_JOIN",
        69 => "BEATMAP_INFO_REPLY",
        71 => "PRIVILEGES",
        72 => "FRIENDS_LIST",
        75 => "PROTOCOL_VERSION",
        76 => "MAIN_MENU_ICON",
        80 => "MONITOR",
        81 => "MATCH_PLAYER_SKIPPED",
        83 => "USER_PRESENCE",
        86 => "RESTART",
        88 => "MATCH_INVITE",
        89 => "CHANNEL_INFO_END",
        91 => "MATCH_CHANGE_PASSWORD",
        92 => "SILENCE_END",
        94 => "USER_SILENCED",
        95 => "USER_PRESENCE_SINGLE",
        96 => "USER_PRESENCE_BUNDLE",
        100 => "USER_DM_BLOCKED",
        101 => "TARGET_IS_SILENCED",
        102 => "VERSION_UPDATE_FORCED",
        103 => "SWITCH_SERVER",
        104 => "ACCOUNT_RESTRICTED",
        105 => "RTX",
        106 => "MATCH_ABORT",
        107 => "SWITCH_TOURNAMENT_SERVER",
        _ => "Unknown",
    }
}

// ---------------------------------------------------------------------------
// Framing
// ---------------------------------------------------------------------------

const RESERVED_BYTE: u8 = 0x00;

/// Frames a packet body: `u16 id | u8 reserved | u32 length | body`.
pub fn write_packet(packet: ServerPacket, body: &[u8]) -> Vec<u8> {
    let mut w = Writer::with_capacity(7 + body.len());
    w.write_u16(packet as u16);
    w.write_u8(RESERVED_BYTE);
    w.write_u32(body.len() as u32);
    w.write_bytes(body);
    w.into_bytes()
}

// ---------------------------------------------------------------------------
// Server packet constructors
// ---------------------------------------------------------------------------

pub fn write_account_id_packet(account_id: i32) -> Vec<u8> {
    let mut w = Writer::new();
    w.write_i32(account_id);
    write_packet(ServerPacket::AccountId, &w.into_bytes())
}

pub fn write_send_message_packet(
    sender: &str,
    message: &str,
    recipient: &str,
    sender_id: i32,
) -> Vec<u8> {
    let mut w = Writer::new();
    w.write_string(sender);
    w.write_string(message);
    w.write_string(recipient);
    w.write_i32(sender_id);
    write_packet(ServerPacket::SendMessage, &w.into_bytes())
}

pub fn write_pong_packet() -> Vec<u8> {
    write_packet(ServerPacket::Pong, &[])
}

pub fn write_protocol_version_packet(version: i32) -> Vec<u8> {
    let mut w = Writer::new();
    w.write_i32(version);
    write_packet(ServerPacket::ProtocolVersion, &w.into_bytes())
}

pub fn write_privileges_packet(privileges: i32) -> Vec<u8> {
    let mut w = Writer::new();
    w.write_i32(privileges);
    write_packet(ServerPacket::Privileges, &w.into_bytes())
}

pub fn write_channel_join_success_packet(channel: &str) -> Vec<u8> {
    let mut w = Writer::new();
    w.write_string(channel);
    write_packet(ServerPacket::ChannelJoinSuccess, &w.into_bytes())
}

pub fn write_channel_info_packet(channel: &str, topic: &str, user_count: u16) -> Vec<u8> {
    let mut w = Writer::new();
    w.write_string(channel);
    w.write_string(topic);
    w.write_u16(user_count);
    write_packet(ServerPacket::ChannelInfo, &w.into_bytes())
}

pub fn write_channel_info_end_packet() -> Vec<u8> {
    write_packet(ServerPacket::ChannelInfoEnd, &[])
}

pub fn write_main_menu_icon_packet(icon_url: &str, onclick_url: &str) -> Vec<u8> {
    let mut w = Writer::new();
    w.write_string(&format!("{icon_url}|{onclick_url}"));
    write_packet(ServerPacket::MainMenuIcon, &w.into_bytes())
}

pub fn write_friends_list_packet(friends: &[u32]) -> Vec<u8> {
    let mut w = Writer::new();
    w.write_u16(friends.len() as u16);
    for friend in friends {
        w.write_u32(*friend);
    }
    write_packet(ServerPacket::FriendsList, &w.into_bytes())
}

pub fn write_silence_end_packet(remaining_sec: i32) -> Vec<u8> {
    let mut w = Writer::new();
    w.write_i32(remaining_sec);
    write_packet(ServerPacket::SilenceEnd, &w.into_bytes())
}

pub fn write_user_logout_packet(account_id: i32) -> Vec<u8> {
    let mut w = Writer::new();
    w.write_i32(account_id);
    w.write_u8(0);
    write_packet(ServerPacket::UserLogout, &w.into_bytes())
}

/// Body of a USER_STATS packet.
///
/// `accuracy` is the raw percentage (0–100) as reported by the stats
/// service; it is scaled to 0–1 here, exactly once.
#[derive(Debug, Clone)]
pub struct UserStats<'a> {
    pub account_id: i32,
    pub action: u8,
    pub info_text: &'a str,
    pub map_md5: &'a str,
    pub mods: i32,
    pub mode: u8,
    pub map_id: i32,
    pub ranked_score: i64,
    pub accuracy: f32,
    pub play_count: i32,
    pub total_score: i64,
    pub global_rank: i32,
    pub pp: i16,
}

pub fn write_user_stats_packet(stats: &UserStats<'_>) -> Vec<u8> {
    let mut w = Writer::new();
    w.write_i32(stats.account_id);
    w.write_u8(stats.action);
    w.write_string(stats.info_text);
    w.write_string(stats.map_md5);
    w.write_i32(stats.mods);
    w.write_u8(stats.mode);
    w.write_i32(stats.map_id);
    w.write_i64(stats.ranked_score);
    w.write_f32(stats.accuracy / 100.0);
    w.write_i32(stats.play_count);
    w.write_i64(stats.total_score);
    w.write_i32(stats.global_rank);
    w.write_i16(stats.pp);
    write_packet(ServerPacket::UserStats, &w.into_bytes())
}

/// Body of a USER_PRESENCE packet.
///
/// `utc_offset` is the signed hour offset; the wire carries it biased by
/// +24. `bancho_privileges` is the client-facing mask (low byte of the
/// server privileges), packed together with the game mode.
#[derive(Debug, Clone)]
pub struct UserPresence<'a> {
    pub account_id: i32,
    pub username: &'a str,
    pub utc_offset: i8,
    pub country_code: u8,
    pub bancho_privileges: u8,
    pub mode: u8,
    pub latitude: f32,
    pub longitude: f32,
    pub global_rank: i32,
}

pub fn write_user_presence_packet(presence: &UserPresence<'_>) -> Vec<u8> {
    let mut w = Writer::new();
    w.write_i32(presence.account_id);
    w.write_string(presence.username);
    w.write_u8((presence.utc_offset + 24) as u8);
    w.write_u8(presence.country_code);
    w.write_u8(presence.bancho_privileges | (presence.mode << 5));
    w.write_f32(presence.latitude);
    w.write_f32(presence.longitude);
    w.write_i32(presence.global_rank);
    write_packet(ServerPacket::UserPresence, &w.into_bytes())
}

pub fn write_server_restart_packet(ms_until_restart: i32) -> Vec<u8> {
    let mut w = Writer::new();
    w.write_i32(ms_until_restart);
    write_packet(ServerPacket::Restart, &w.into_bytes())
}

pub fn write_notification_packet(message: &str) -> Vec<u8> {
    let mut w = Writer::new();
    w.write_string(message);
    write_packet(ServerPacket::Notification, &w.into_bytes())
}

pub fn write_spectator_joined_packet(account_id: i32) -> Vec<u8> {
    let mut w = Writer::new();
    w.write_i32(account_id);
    write_packet(ServerPacket::SpectatorJoined, &w.into_bytes())
}

pub fn write_spectator_left_packet(account_id: i32) -> Vec<u8> {
    let mut w = Writer::new();
    w.write_i32(account_id);
    write_packet(ServerPacket::SpectatorLeft, &w.into_bytes())
}

pub fn write_fellow_spectator_joined_packet(account_id: i32) -> Vec<u8> {
    let mut w = Writer::new();
    w.write_i32(account_id);
    write_packet(ServerPacket::FellowSpectatorJoined, &w.into_bytes())
}

pub fn write_fellow_spectator_left_packet(account_id: i32) -> Vec<u8> {
    let mut w = Writer::new();
    w.write_i32(account_id);
    write_packet(ServerPacket::FellowSpectatorLeft, &w.into_bytes())
}

/// Relays raw replay frames to a spectator, uninterpreted.
pub fn write_spectate_frames_packet(frames: &[u8]) -> Vec<u8> {
    write_packet(ServerPacket::SpectateFrames, frames)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_layout() {
        let packet = write_packet(ServerPacket::Notification, b"abc");
        assert_eq!(&packet[..2], &(24u16).to_le_bytes());
        assert_eq!(packet[2], 0x00);
        assert_eq!(&packet[3..7], &(3u32).to_le_bytes());
        assert_eq!(&packet[7..], b"abc");
    }

    #[test]
    fn empty_body_frame_is_seven_bytes() {
        let packet = write_packet(ServerPacket::ChannelInfoEnd, &[]);
        assert_eq!(packet.len(), 7);
        assert_eq!(&packet[..2], &(89u16).to_le_bytes());
        assert_eq!(&packet[3..7], &[0, 0, 0, 0]);
    }

    #[test]
    fn account_id_packet_body() {
        let packet = write_account_id_packet(-1);
        assert_eq!(&packet[7..], &(-1i32).to_le_bytes());
    }

    #[test]
    fn user_logout_packet_has_trailing_zero_byte() {
        let packet = write_user_logout_packet(42);
        assert_eq!(&packet[7..11], &(42i32).to_le_bytes());
        assert_eq!(packet[11], 0);
    }

    #[test]
    fn user_stats_scales_accuracy_once() {
        let packet = write_user_stats_packet(&UserStats {
            account_id: 3,
            action: 2,
            info_text: "",
            map_md5: "",
            mods: 0,
            mode: 0,
            map_id: 0,
            ranked_score: 0,
            accuracy: 98.76,
            play_count: 0,
            total_score: 0,
            global_rank: 0,
            pp: 0,
        });
        // body: i32 + u8 + "" + "" + i32 + u8 + i32 -> accuracy starts after
        // the i64 ranked_score at offset 7 + 4+1+1+1+4+1+4+8
        let acc_offset = 7 + 4 + 1 + 1 + 1 + 4 + 1 + 4 + 8;
        let acc = f32::from_le_bytes(packet[acc_offset..acc_offset + 4].try_into().unwrap());
        assert!((acc - 0.9876).abs() < 1e-6);
    }

    #[test]
    fn user_presence_biases_utc_offset_and_packs_mode() {
        let packet = write_user_presence_packet(&UserPresence {
            account_id: 7,
            username: "peppy",
            utc_offset: -5,
            country_code: 38,
            bancho_privileges: 0x1f,
            mode: 3,
            latitude: 0.0,
            longitude: 0.0,
            global_rank: 0,
        });
        // i32 account_id, then 0x0b + len + "peppy"
        let after_name = 7 + 4 + 2 + 5;
        assert_eq!(packet[after_name], (-5i8 + 24) as u8);
        assert_eq!(packet[after_name + 1], 38);
        assert_eq!(packet[after_name + 2], 0x1f | (3 << 5));
    }

    #[test]
    fn packet_names_resolve_and_unknown_falls_back() {
        assert_eq!(client_packet_name(0), "CHANGE_ACTION");
        assert_eq!(client_packet_name(85), "REQUEST_ALL_USER_STATS");
        assert_eq!(client_packet_name(9999), "Unknown");
        assert_eq!(server_packet_name(83), "USER_PRESENCE");
        assert_eq!(server_packet_name(9999), "Unknown");
    }

    #[test]
    fn client_packet_ids_round_trip_through_from_id() {
        for id in 0u16..=110 {
            if let Some(packet) = ClientPacket::from_id(id) {
                assert_eq!(packet as u16, id);
                assert_ne!(client_packet_name(id), "Unknown");
            }
        }
    }
}
