// bancho-models: typed records for the backend service JSON schemas.
//
// Every response body the gateway consumes is deserialized into one of
// these. Unknown fields are tolerated (serde's default), optional fields
// the services may omit carry `#[serde(default)]`. UUIDs serialize as
// lowercase hyphenated strings, timestamps as RFC 3339.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Sessions
// ---------------------------------------------------------------------------

/// An authenticated identity handle, issued by the users service at login
/// and carried by the client in the `osu-token` header.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub session_id: Uuid,
    pub account_id: i32,
    pub expires_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Accounts & stats
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub account_id: i32,
    pub username: String,
    #[serde(default)]
    pub country: String,
}

/// Per (account, game mode) statistics. `accuracy` is the percentage
/// (0–100) — the codec scales it for the wire, nothing else does.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Stats {
    pub account_id: i32,
    pub game_mode: u8,
    pub total_score: i64,
    pub ranked_score: i64,
    pub performance: i16,
    pub play_count: i32,
    pub accuracy: f32,
    #[serde(default)]
    pub play_time: i32,
    #[serde(default)]
    pub max_combo: i32,
    #[serde(default)]
    pub total_hits: i32,
    #[serde(default)]
    pub replay_views: i32,
}

// ---------------------------------------------------------------------------
// Presences
// ---------------------------------------------------------------------------

/// A session's live client state. At most one per session; created at
/// login, mutated by CHANGE_ACTION, destroyed at logout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Presence {
    pub session_id: Uuid,
    pub account_id: i32,
    pub username: String,
    pub game_mode: u8,
    pub country_code: u8,
    pub privileges: i32,
    pub latitude: f32,
    pub longitude: f32,
    pub action: u8,
    pub info_text: String,
    pub map_md5: String,
    pub map_id: i32,
    pub mods: u32,
    pub osu_version: String,
    pub utc_offset: i8,
    pub display_city: bool,
    pub pm_private: bool,
}

// ---------------------------------------------------------------------------
// Chats
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chat {
    pub chat_id: i64,
    /// Channel name, leading `#`.
    pub name: String,
    pub topic: String,
    pub read_privileges: i32,
    pub write_privileges: i32,
    pub auto_join: bool,
    #[serde(default)]
    pub instance: bool,
}

/// A session's membership in a chat.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Member {
    pub chat_id: i64,
    pub session_id: Uuid,
    pub account_id: i32,
    pub username: String,
    pub privileges: i32,
    pub joined_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Spectators
// ---------------------------------------------------------------------------

/// A directed spectator edge: `session_id` watches `host_session_id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Spectator {
    pub host_session_id: Uuid,
    pub session_id: Uuid,
    pub account_id: i32,
}

// ---------------------------------------------------------------------------
// Queued packets
// ---------------------------------------------------------------------------

/// An opaque byte blob addressed to a session, buffered by the users
/// service until the session's next poll.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueuedPacket {
    pub data: Vec<u8>,
    pub created_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Beatmaps
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Beatmap {
    pub beatmap_id: i32,
    pub md5_hash: String,
    pub set_id: i32,
    pub mode: String,
    pub ranked_status: i32,
    /// Difficulty name ("Insane", "Expert", ...).
    pub version: String,
    #[serde(default)]
    pub difficulty_rating: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Beatmapset {
    pub set_id: i32,
    pub artist: String,
    pub title: String,
}

// ---------------------------------------------------------------------------
// Scores
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Score {
    pub score_id: i64,
    pub beatmap_md5: String,
    pub account_id: i32,
    pub mode: String,
    pub mods: i32,
    pub score: i64,
    pub accuracy: f32,
    pub max_combo: i32,
    pub count_50s: i32,
    pub count_100s: i32,
    pub count_300s: i32,
    pub count_gekis: i32,
    pub count_katus: i32,
    pub count_misses: i32,
    pub grade: String,
    pub passed: bool,
    pub perfect: bool,
    #[serde(default)]
    pub status: String,
    pub created_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Game modes
// ---------------------------------------------------------------------------

/// Backend-facing name of a numeric game mode, `None` outside 0..=3.
pub fn game_mode_name(mode: u8) -> Option<&'static str> {
    match mode {
        0 => Some("osu"),
        1 => Some("taiko"),
        2 => Some("fruits"),
        3 => Some("mania"),
        _ => None,
    }
}
