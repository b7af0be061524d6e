//! An in-memory stand-in for the backend constellation.
//!
//! One axum server implements the REST surface of all four services over
//! shared mutable state; point every gateway base URL at
//! [`MockBackend::base_url`]. Responses use the `{"data": ...}` envelope
//! the real services speak. State handles are public so tests can seed
//! fixtures and inspect effects (queued packets, membership, edges)
//! directly.

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, patch, post};
use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use uuid::Uuid;

use bancho_models::{
    Account, Beatmap, Beatmapset, Chat, Member, Presence, QueuedPacket, Score, Session, Spectator,
    Stats,
};

#[derive(Default)]
pub struct MockState {
    pub accounts: Mutex<Vec<Account>>,
    pub stats: Mutex<Vec<Stats>>,
    pub sessions: Mutex<Vec<Session>>,
    pub presences: Mutex<Vec<Presence>>,
    pub chats: Mutex<Vec<Chat>>,
    pub members: Mutex<Vec<Member>>,
    pub spectators: Mutex<Vec<Spectator>>,
    pub queued_packets: Mutex<HashMap<Uuid, Vec<QueuedPacket>>>,
    pub beatmaps: Mutex<Vec<Beatmap>>,
    pub beatmapsets: Mutex<Vec<Beatmapset>>,
    pub scores: Mutex<Vec<Score>>,
    /// Counts POSTs to the queued-packets endpoint across all sessions.
    pub enqueue_calls: AtomicUsize,
    /// When set, session PATCHes 404 — simulates an expired session.
    pub reject_session_patch: AtomicBool,
}

pub struct MockBackend {
    pub base_url: String,
    pub state: Arc<MockState>,
}

impl MockBackend {
    /// Binds the mock constellation to an ephemeral port.
    pub async fn start() -> MockBackend {
        let state = Arc::new(MockState::default());
        let router = build_router(state.clone());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind mock backend");
        let addr = listener.local_addr().expect("mock backend addr");
        tokio::spawn(async move {
            axum::serve(listener, router).await.expect("mock backend");
        });
        MockBackend {
            base_url: format!("http://{addr}"),
            state,
        }
    }

    // ------------------------------------------------------------------
    // Seeding helpers
    // ------------------------------------------------------------------

    /// Registers an account plus default stats in every game mode.
    pub fn seed_account(&self, account_id: i32, username: &str) {
        self.state.accounts.lock().unwrap().push(Account {
            account_id,
            username: username.to_owned(),
            country: "AT".to_owned(),
        });
        let mut stats = self.state.stats.lock().unwrap();
        for game_mode in 0..4 {
            stats.push(Stats {
                account_id,
                game_mode,
                total_score: 10_000,
                ranked_score: 5_000,
                performance: 321,
                play_count: 77,
                accuracy: 98.76,
                play_time: 3600,
                max_combo: 500,
                total_hits: 12_345,
                replay_views: 3,
            });
        }
    }

    pub fn seed_chat(&self, chat_id: i64, name: &str, topic: &str) {
        self.state.chats.lock().unwrap().push(Chat {
            chat_id,
            name: name.to_owned(),
            topic: topic.to_owned(),
            read_privileges: 1,
            write_privileges: 1,
            auto_join: true,
            instance: false,
        });
    }

    pub fn seed_member(&self, chat_id: i64, session_id: Uuid, account_id: i32, username: &str) {
        self.state.members.lock().unwrap().push(Member {
            chat_id,
            session_id,
            account_id,
            username: username.to_owned(),
            privileges: 1,
            joined_at: Utc::now(),
        });
    }

    /// A live session with a default presence, as if the player had logged
    /// in earlier. Returns the session id.
    pub fn seed_player(&self, account_id: i32, username: &str) -> Uuid {
        self.seed_account(account_id, username);
        let session_id = Uuid::new_v4();
        self.state.sessions.lock().unwrap().push(Session {
            session_id,
            account_id,
            expires_at: Utc::now() + Duration::minutes(5),
        });
        self.state.presences.lock().unwrap().push(Presence {
            session_id,
            account_id,
            username: username.to_owned(),
            game_mode: 0,
            country_code: 38,
            privileges: 0x7fff_ffff,
            latitude: 48.23,
            longitude: 16.37,
            action: 0,
            info_text: String::new(),
            map_md5: String::new(),
            map_id: 0,
            mods: 0,
            osu_version: "b20211015.2".to_owned(),
            utc_offset: 0,
            display_city: true,
            pm_private: false,
        });
        session_id
    }

    // ------------------------------------------------------------------
    // Inspection helpers
    // ------------------------------------------------------------------

    pub fn enqueue_count(&self) -> usize {
        self.state.enqueue_calls.load(Ordering::SeqCst)
    }

    /// Bytes currently queued for a session, in enqueue order.
    pub fn queued_for(&self, session_id: Uuid) -> Vec<Vec<u8>> {
        self.state
            .queued_packets
            .lock()
            .unwrap()
            .get(&session_id)
            .map(|packets| packets.iter().map(|packet| packet.data.clone()).collect())
            .unwrap_or_default()
    }

    pub fn expire_sessions(&self) {
        self.state.reject_session_patch.store(true, Ordering::SeqCst);
    }
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

type Shared = Arc<MockState>;

fn build_router(state: Shared) -> axum::Router {
    axum::Router::new()
        // users: sessions
        .route("/v1/sessions", post(log_in).get(list_sessions))
        .route(
            "/v1/sessions/{session_id}",
            patch(patch_session).delete(delete_session),
        )
        // users: accounts & stats
        .route("/v1/accounts/{account_id}", get(get_account))
        .route("/v1/accounts/{account_id}/stats/{mode}", get(get_stats))
        // users: presences
        .route("/v1/presences", post(create_presence).get(list_presences))
        .route(
            "/v1/presences/{session_id}",
            get(get_presence).patch(patch_presence).delete(delete_presence),
        )
        // users: queued packets
        .route(
            "/v1/sessions/{session_id}/queued-packets",
            post(enqueue_packet).get(dequeue_packets),
        )
        // users: spectators
        .route(
            "/v1/sessions/{session_id}/spectators",
            post(create_spectator).get(list_spectators),
        )
        .route(
            "/v1/sessions/{session_id}/spectators/{spectator_session_id}",
            delete(delete_spectator),
        )
        .route("/v1/sessions/{session_id}/spectating", get(get_spectating))
        // chats
        .route("/v1/chats", get(list_chats))
        .route("/v1/chats/{chat_id}", get(get_chat))
        .route(
            "/v1/chats/{chat_id}/members",
            get(list_members).post(create_member),
        )
        .route(
            "/v1/chats/{chat_id}/members/{session_id}",
            delete(delete_member),
        )
        // beatmaps
        .route("/v1/beatmaps", get(list_beatmaps))
        .route("/v1/beatmapsets/{set_id}", get(get_beatmapset))
        // scores
        .route("/v1/scores", get(list_scores))
        .with_state(state)
}

fn data<T: serde::Serialize>(value: &T) -> Response {
    Json(json!({ "data": value })).into_response()
}

fn not_found() -> Response {
    (StatusCode::NOT_FOUND, Json(json!({ "error": "not found" }))).into_response()
}

// ---------------------------------------------------------------------------
// users: sessions
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct LoginBody {
    identifier: String,
    #[allow(dead_code)]
    passphrase: String,
    #[allow(dead_code)]
    user_agent: String,
}

async fn log_in(State(state): State<Shared>, Json(body): Json<LoginBody>) -> Response {
    let account_id = {
        let accounts = state.accounts.lock().unwrap();
        match accounts
            .iter()
            .find(|account| account.username == body.identifier)
        {
            Some(account) => account.account_id,
            None => return (StatusCode::UNAUTHORIZED, "bad credentials").into_response(),
        }
    };
    let session = Session {
        session_id: Uuid::new_v4(),
        account_id,
        expires_at: Utc::now() + Duration::minutes(5),
    };
    state.sessions.lock().unwrap().push(session.clone());
    data(&session)
}

#[derive(Deserialize)]
struct SessionsListQuery {
    account_id: Option<i32>,
}

async fn list_sessions(
    State(state): State<Shared>,
    Query(query): Query<SessionsListQuery>,
) -> Response {
    let sessions = state.sessions.lock().unwrap();
    let filtered: Vec<&Session> = sessions
        .iter()
        .filter(|session| {
            query
                .account_id
                .is_none_or(|account_id| session.account_id == account_id)
        })
        .collect();
    data(&filtered)
}

#[derive(Deserialize)]
struct SessionUpdate {
    expires_at: DateTime<Utc>,
}

async fn patch_session(
    State(state): State<Shared>,
    Path(session_id): Path<Uuid>,
    Json(body): Json<SessionUpdate>,
) -> Response {
    if state.reject_session_patch.load(Ordering::SeqCst) {
        return not_found();
    }
    let mut sessions = state.sessions.lock().unwrap();
    match sessions
        .iter_mut()
        .find(|session| session.session_id == session_id)
    {
        Some(session) => {
            session.expires_at = body.expires_at;
            data(&session.clone())
        }
        None => not_found(),
    }
}

async fn delete_session(State(state): State<Shared>, Path(session_id): Path<Uuid>) -> Response {
    let mut sessions = state.sessions.lock().unwrap();
    let before = sessions.len();
    sessions.retain(|session| session.session_id != session_id);
    if sessions.len() == before {
        return not_found();
    }
    data(&json!(null))
}

// ---------------------------------------------------------------------------
// users: accounts & stats
// ---------------------------------------------------------------------------

async fn get_account(State(state): State<Shared>, Path(account_id): Path<i32>) -> Response {
    let accounts = state.accounts.lock().unwrap();
    match accounts
        .iter()
        .find(|account| account.account_id == account_id)
    {
        Some(account) => data(account),
        None => not_found(),
    }
}

async fn get_stats(
    State(state): State<Shared>,
    Path((account_id, mode)): Path<(i32, u8)>,
) -> Response {
    let stats = state.stats.lock().unwrap();
    match stats
        .iter()
        .find(|stats| stats.account_id == account_id && stats.game_mode == mode)
    {
        Some(stats) => data(stats),
        None => not_found(),
    }
}

// ---------------------------------------------------------------------------
// users: presences
// ---------------------------------------------------------------------------

async fn create_presence(State(state): State<Shared>, Json(presence): Json<Presence>) -> Response {
    state.presences.lock().unwrap().push(presence.clone());
    data(&presence)
}

#[derive(Deserialize)]
struct PresencesListQuery {
    username: Option<String>,
}

async fn list_presences(
    State(state): State<Shared>,
    Query(query): Query<PresencesListQuery>,
) -> Response {
    let presences = state.presences.lock().unwrap();
    let filtered: Vec<&Presence> = presences
        .iter()
        .filter(|presence| {
            query
                .username
                .as_deref()
                .is_none_or(|username| presence.username == username)
        })
        .collect();
    data(&filtered)
}

async fn get_presence(State(state): State<Shared>, Path(session_id): Path<Uuid>) -> Response {
    let presences = state.presences.lock().unwrap();
    match presences
        .iter()
        .find(|presence| presence.session_id == session_id)
    {
        Some(presence) => data(presence),
        None => not_found(),
    }
}

#[derive(Deserialize)]
struct PresenceUpdate {
    action: Option<u8>,
    info_text: Option<String>,
    map_md5: Option<String>,
    mods: Option<u32>,
    game_mode: Option<u8>,
    map_id: Option<i32>,
}

async fn patch_presence(
    State(state): State<Shared>,
    Path(session_id): Path<Uuid>,
    Json(update): Json<PresenceUpdate>,
) -> Response {
    let mut presences = state.presences.lock().unwrap();
    let Some(presence) = presences
        .iter_mut()
        .find(|presence| presence.session_id == session_id)
    else {
        return not_found();
    };
    if let Some(action) = update.action {
        presence.action = action;
    }
    if let Some(info_text) = update.info_text {
        presence.info_text = info_text;
    }
    if let Some(map_md5) = update.map_md5 {
        presence.map_md5 = map_md5;
    }
    if let Some(mods) = update.mods {
        presence.mods = mods;
    }
    if let Some(game_mode) = update.game_mode {
        presence.game_mode = game_mode;
    }
    if let Some(map_id) = update.map_id {
        presence.map_id = map_id;
    }
    data(&presence.clone())
}

async fn delete_presence(State(state): State<Shared>, Path(session_id): Path<Uuid>) -> Response {
    let mut presences = state.presences.lock().unwrap();
    let before = presences.len();
    presences.retain(|presence| presence.session_id != session_id);
    if presences.len() == before {
        return not_found();
    }
    data(&json!(null))
}

// ---------------------------------------------------------------------------
// users: queued packets
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct EnqueueBody {
    data: Vec<u8>,
}

async fn enqueue_packet(
    State(state): State<Shared>,
    Path(session_id): Path<Uuid>,
    Json(body): Json<EnqueueBody>,
) -> Response {
    state.enqueue_calls.fetch_add(1, Ordering::SeqCst);
    state
        .queued_packets
        .lock()
        .unwrap()
        .entry(session_id)
        .or_default()
        .push(QueuedPacket {
            data: body.data,
            created_at: Utc::now(),
        });
    data(&json!(null))
}

async fn dequeue_packets(State(state): State<Shared>, Path(session_id): Path<Uuid>) -> Response {
    let drained = state
        .queued_packets
        .lock()
        .unwrap()
        .remove(&session_id)
        .unwrap_or_default();
    data(&drained)
}

// ---------------------------------------------------------------------------
// users: spectators
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct NewSpectator {
    session_id: Uuid,
    account_id: i32,
}

async fn create_spectator(
    State(state): State<Shared>,
    Path(host_session_id): Path<Uuid>,
    Json(body): Json<NewSpectator>,
) -> Response {
    let spectator = Spectator {
        host_session_id,
        session_id: body.session_id,
        account_id: body.account_id,
    };
    state.spectators.lock().unwrap().push(spectator.clone());
    data(&spectator)
}

async fn list_spectators(
    State(state): State<Shared>,
    Path(host_session_id): Path<Uuid>,
) -> Response {
    let spectators = state.spectators.lock().unwrap();
    let filtered: Vec<&Spectator> = spectators
        .iter()
        .filter(|spectator| spectator.host_session_id == host_session_id)
        .collect();
    data(&filtered)
}

async fn delete_spectator(
    State(state): State<Shared>,
    Path((host_session_id, spectator_session_id)): Path<(Uuid, Uuid)>,
) -> Response {
    let mut spectators = state.spectators.lock().unwrap();
    let before = spectators.len();
    spectators.retain(|spectator| {
        !(spectator.host_session_id == host_session_id
            && spectator.session_id == spectator_session_id)
    });
    if spectators.len() == before {
        return not_found();
    }
    data(&json!(null))
}

async fn get_spectating(State(state): State<Shared>, Path(session_id): Path<Uuid>) -> Response {
    let spectators = state.spectators.lock().unwrap();
    match spectators
        .iter()
        .find(|spectator| spectator.session_id == session_id)
    {
        Some(spectator) => data(spectator),
        None => not_found(),
    }
}

// ---------------------------------------------------------------------------
// chats
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct ChatsListQuery {
    name: Option<String>,
}

async fn list_chats(State(state): State<Shared>, Query(query): Query<ChatsListQuery>) -> Response {
    let chats = state.chats.lock().unwrap();
    let filtered: Vec<&Chat> = chats
        .iter()
        .filter(|chat| query.name.as_deref().is_none_or(|name| chat.name == name))
        .collect();
    data(&filtered)
}

async fn get_chat(State(state): State<Shared>, Path(chat_id): Path<i64>) -> Response {
    let chats = state.chats.lock().unwrap();
    match chats.iter().find(|chat| chat.chat_id == chat_id) {
        Some(chat) => data(chat),
        None => not_found(),
    }
}

async fn list_members(State(state): State<Shared>, Path(chat_id): Path<i64>) -> Response {
    let members = state.members.lock().unwrap();
    let filtered: Vec<&Member> = members
        .iter()
        .filter(|member| member.chat_id == chat_id)
        .collect();
    data(&filtered)
}

#[derive(Deserialize)]
struct NewMember {
    session_id: Uuid,
    account_id: i32,
    username: String,
    privileges: i32,
}

async fn create_member(
    State(state): State<Shared>,
    Path(chat_id): Path<i64>,
    Json(body): Json<NewMember>,
) -> Response {
    let member = Member {
        chat_id,
        session_id: body.session_id,
        account_id: body.account_id,
        username: body.username,
        privileges: body.privileges,
        joined_at: Utc::now(),
    };
    state.members.lock().unwrap().push(member.clone());
    data(&member)
}

async fn delete_member(
    State(state): State<Shared>,
    Path((chat_id, session_id)): Path<(i64, Uuid)>,
) -> Response {
    let mut members = state.members.lock().unwrap();
    let before = members.len();
    members.retain(|member| !(member.chat_id == chat_id && member.session_id == session_id));
    if members.len() == before {
        return not_found();
    }
    data(&json!(null))
}

// ---------------------------------------------------------------------------
// beatmaps
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct BeatmapsListQuery {
    md5_hash: Option<String>,
    mode: Option<String>,
}

async fn list_beatmaps(
    State(state): State<Shared>,
    Query(query): Query<BeatmapsListQuery>,
) -> Response {
    let beatmaps = state.beatmaps.lock().unwrap();
    let filtered: Vec<&Beatmap> = beatmaps
        .iter()
        .filter(|beatmap| {
            query
                .md5_hash
                .as_deref()
                .is_none_or(|md5| beatmap.md5_hash == md5)
                && query
                    .mode
                    .as_deref()
                    .is_none_or(|mode| beatmap.mode == mode)
        })
        .collect();
    data(&filtered)
}

async fn get_beatmapset(State(state): State<Shared>, Path(set_id): Path<i32>) -> Response {
    let beatmapsets = state.beatmapsets.lock().unwrap();
    match beatmapsets
        .iter()
        .find(|beatmapset| beatmapset.set_id == set_id)
    {
        Some(beatmapset) => data(beatmapset),
        None => not_found(),
    }
}

// ---------------------------------------------------------------------------
// scores
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct ScoresListQuery {
    beatmap_md5: Option<String>,
    mode: Option<String>,
    passed: Option<bool>,
    mods: Option<i32>,
}

async fn list_scores(
    State(state): State<Shared>,
    Query(query): Query<ScoresListQuery>,
) -> Response {
    let scores = state.scores.lock().unwrap();
    let filtered: Vec<&Score> = scores
        .iter()
        .filter(|score| {
            query
                .beatmap_md5
                .as_deref()
                .is_none_or(|md5| score.beatmap_md5 == md5)
                && query
                    .mode
                    .as_deref()
                    .is_none_or(|mode| score.mode == mode)
                && query.passed.is_none_or(|passed| score.passed == passed)
                && query.mods.is_none_or(|mods| score.mods == mods)
        })
        .collect();
    data(&filtered)
}
