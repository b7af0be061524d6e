//! Integration tests for the per-opcode handlers, driven through the real
//! poll endpoint against the mock backend.

use bancho_serial::writer::Writer;
use bancho_test_utils::{MockBackend, client_frame, parse_frames, read_packet_string};
use gateway::{AppState, ServiceUrls};
use uuid::Uuid;

const CHANGE_ACTION: u16 = 0;
const SEND_PUBLIC_MESSAGE: u16 = 1;
const LOGOUT: u16 = 2;
const START_SPECTATING: u16 = 16;
const STOP_SPECTATING: u16 = 17;
const SPECTATE_FRAMES_CLIENT: u16 = 18;
const CHANNEL_JOIN: u16 = 63;
const REQUEST_ALL_USER_STATS: u16 = 85;

const SEND_MESSAGE: u16 = 7;
const USER_STATS: u16 = 11;
const USER_LOGOUT: u16 = 12;
const SPECTATOR_JOINED: u16 = 13;
const SPECTATOR_LEFT: u16 = 14;
const SPECTATE_FRAMES_SERVER: u16 = 15;
const NOTIFICATION: u16 = 24;
const CHANNEL_JOIN_SUCCESS: u16 = 64;
const CHANNEL_INFO: u16 = 65;

async fn start_gateway(mock: &MockBackend) -> String {
    let services = ServiceUrls {
        users: mock.base_url.clone(),
        chats: mock.base_url.clone(),
        beatmaps: mock.base_url.clone(),
        scores: mock.base_url.clone(),
    };
    let state = AppState::new(services);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, gateway::build_router(state))
            .await
            .unwrap();
    });
    format!("http://{addr}")
}

async fn poll(base: &str, session_id: Uuid, body: Vec<u8>) -> reqwest::Response {
    reqwest::Client::new()
        .post(format!("{base}/v1/bancho"))
        .header("osu-token", session_id.to_string())
        .body(body)
        .send()
        .await
        .unwrap()
}

fn frame_i32(data: &[u8]) -> i32 {
    i32::from_le_bytes(data[..4].try_into().unwrap())
}

fn change_action_body(action: u8, mode: u8, map_id: i32) -> Vec<u8> {
    let mut w = Writer::new();
    w.write_u8(action);
    w.write_string("playing something");
    w.write_string("0123456789abcdef0123456789abcdef");
    w.write_u32(0);
    w.write_u8(mode);
    w.write_i32(map_id);
    w.into_bytes()
}

fn public_message_body(message: &str, recipient: &str) -> Vec<u8> {
    let mut w = Writer::new();
    w.write_string("");
    w.write_string(message);
    w.write_string(recipient);
    w.write_i32(0);
    w.into_bytes()
}

fn string_body(value: &str) -> Vec<u8> {
    let mut w = Writer::new();
    w.write_string(value);
    w.into_bytes()
}

// ---------------------------------------------------------------------------
// CHANGE_ACTION
// ---------------------------------------------------------------------------

#[tokio::test]
async fn change_action_broadcasts_stats_to_every_presence() {
    let mock = MockBackend::start().await;
    let self_session = mock.seed_player(1, "gamer");
    let peer_a = mock.seed_player(2, "peer_a");
    let peer_b = mock.seed_player(3, "peer_b");
    let base = start_gateway(&mock).await;

    let response = poll(
        &base,
        self_session,
        client_frame(CHANGE_ACTION, &change_action_body(2, 0, 42)),
    )
    .await;

    // one enqueue per live presence, caller included
    assert_eq!(mock.enqueue_count(), 3);

    // the handler's direct output is empty; the caller's own copy was
    // enqueued and drained back out by the same poll
    let frames = parse_frames(&response.bytes().await.unwrap());
    assert_eq!(frames.len(), 1);
    assert_eq!(frames[0].packet_id, USER_STATS);
    assert!(mock.queued_for(self_session).is_empty());

    for session in [peer_a, peer_b] {
        let queued = mock.queued_for(session);
        assert_eq!(queued.len(), 1);
        let frames = parse_frames(&queued[0]);
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].packet_id, USER_STATS);
        assert_eq!(frame_i32(&frames[0].data), 1, "stats are the caller's");
        assert_eq!(frames[0].data[4], 2, "action matches the request");
    }

    // the presence itself was patched
    let presences = mock.state.presences.lock().unwrap();
    let own = presences
        .iter()
        .find(|presence| presence.session_id == self_session)
        .unwrap();
    assert_eq!(own.action, 2);
    assert_eq!(own.map_id, 42);
}

// ---------------------------------------------------------------------------
// SEND_PUBLIC_MESSAGE
// ---------------------------------------------------------------------------

#[tokio::test]
async fn oversized_message_is_rejected_with_zero_enqueues() {
    let mock = MockBackend::start().await;
    let self_session = mock.seed_player(1, "gamer");
    mock.seed_chat(1, "#osu", "main channel");
    mock.seed_member(1, self_session, 1, "gamer");
    let base = start_gateway(&mock).await;

    let message = "a".repeat(1001);
    let response = poll(
        &base,
        self_session,
        client_frame(SEND_PUBLIC_MESSAGE, &public_message_body(&message, "#osu")),
    )
    .await;

    let frames = parse_frames(&response.bytes().await.unwrap());
    assert_eq!(frames.len(), 1);
    assert_eq!(frames[0].packet_id, NOTIFICATION);
    assert!(read_packet_string(&frames[0].data).contains("1000 character limit"));
    assert_eq!(mock.enqueue_count(), 0);
}

#[tokio::test]
async fn message_reaches_every_member_but_the_sender() {
    let mock = MockBackend::start().await;
    let self_session = mock.seed_player(1, "gamer");
    let peer_session = mock.seed_player(2, "peer");
    mock.seed_chat(1, "#osu", "main channel");
    mock.seed_member(1, self_session, 1, "gamer");
    mock.seed_member(1, peer_session, 2, "peer");
    let base = start_gateway(&mock).await;

    let response = poll(
        &base,
        self_session,
        client_frame(SEND_PUBLIC_MESSAGE, &public_message_body("hello", "#osu")),
    )
    .await;

    assert!(response.bytes().await.unwrap().is_empty());
    assert_eq!(mock.enqueue_count(), 1);
    assert!(mock.queued_for(self_session).is_empty());

    let queued = mock.queued_for(peer_session);
    assert_eq!(queued.len(), 1);
    let frames = parse_frames(&queued[0]);
    assert_eq!(frames[0].packet_id, SEND_MESSAGE);
    assert_eq!(read_packet_string(&frames[0].data), "gamer");
}

#[tokio::test]
async fn client_only_channels_are_dropped_silently() {
    let mock = MockBackend::start().await;
    let self_session = mock.seed_player(1, "gamer");
    let base = start_gateway(&mock).await;

    let response = poll(
        &base,
        self_session,
        client_frame(
            SEND_PUBLIC_MESSAGE,
            &public_message_body("hi", "#highlight"),
        ),
    )
    .await;

    assert!(response.bytes().await.unwrap().is_empty());
    assert_eq!(mock.enqueue_count(), 0);
}

// ---------------------------------------------------------------------------
// CHANNEL_JOIN / CHANNEL_PART
// ---------------------------------------------------------------------------

#[tokio::test]
async fn channel_join_creates_membership_and_broadcasts_the_new_count() {
    let mock = MockBackend::start().await;
    let self_session = mock.seed_player(1, "gamer");
    mock.seed_chat(1, "#osu", "main channel");
    let base = start_gateway(&mock).await;

    let response = poll(
        &base,
        self_session,
        client_frame(CHANNEL_JOIN, &string_body("#osu")),
    )
    .await;

    // join success from the handler, then the refreshed channel info that
    // was broadcast to our own queue and drained by the same poll
    let frames = parse_frames(&response.bytes().await.unwrap());
    assert_eq!(frames.len(), 2);
    assert_eq!(frames[0].packet_id, CHANNEL_JOIN_SUCCESS);
    assert_eq!(read_packet_string(&frames[0].data), "#osu");
    assert_eq!(frames[1].packet_id, CHANNEL_INFO);

    let members = mock.state.members.lock().unwrap();
    assert!(
        members
            .iter()
            .any(|member| member.chat_id == 1 && member.session_id == self_session)
    );
}

#[tokio::test]
async fn joining_a_channel_twice_is_refused() {
    let mock = MockBackend::start().await;
    let self_session = mock.seed_player(1, "gamer");
    mock.seed_chat(1, "#osu", "main channel");
    mock.seed_member(1, self_session, 1, "gamer");
    let base = start_gateway(&mock).await;

    let response = poll(
        &base,
        self_session,
        client_frame(CHANNEL_JOIN, &string_body("#osu")),
    )
    .await;

    assert!(response.bytes().await.unwrap().is_empty());
    let members = mock.state.members.lock().unwrap();
    assert_eq!(members.len(), 1, "no duplicate membership");
}

// ---------------------------------------------------------------------------
// LOGOUT
// ---------------------------------------------------------------------------

#[tokio::test]
async fn logout_tears_down_state_and_informs_peers() {
    let mock = MockBackend::start().await;
    let self_session = mock.seed_player(1, "gamer");
    let peer_session = mock.seed_player(2, "peer");
    mock.seed_chat(1, "#osu", "main channel");
    mock.seed_member(1, self_session, 1, "gamer");
    let base = start_gateway(&mock).await;

    let response = poll(&base, self_session, client_frame(LOGOUT, &[])).await;
    assert_eq!(response.status(), 200);

    assert!(
        !mock
            .state
            .presences
            .lock()
            .unwrap()
            .iter()
            .any(|presence| presence.session_id == self_session)
    );
    assert!(
        !mock
            .state
            .sessions
            .lock()
            .unwrap()
            .iter()
            .any(|session| session.session_id == self_session)
    );
    assert!(mock.state.members.lock().unwrap().is_empty());

    let queued = mock.queued_for(peer_session);
    assert_eq!(queued.len(), 1);
    let frames = parse_frames(&queued[0]);
    assert_eq!(frames[0].packet_id, USER_LOGOUT);
    assert_eq!(frame_i32(&frames[0].data), 1);
}

// ---------------------------------------------------------------------------
// Stats requests
// ---------------------------------------------------------------------------

#[tokio::test]
async fn request_all_user_stats_skips_self() {
    let mock = MockBackend::start().await;
    let self_session = mock.seed_player(1, "gamer");
    mock.seed_player(2, "peer_a");
    mock.seed_player(3, "peer_b");
    let base = start_gateway(&mock).await;

    let response = poll(
        &base,
        self_session,
        client_frame(REQUEST_ALL_USER_STATS, &[]),
    )
    .await;

    let frames = parse_frames(&response.bytes().await.unwrap());
    let stats_frames: Vec<_> = frames
        .iter()
        .filter(|frame| frame.packet_id == USER_STATS)
        .collect();
    assert_eq!(stats_frames.len(), 2);
    let ids: Vec<i32> = stats_frames
        .iter()
        .map(|frame| frame_i32(&frame.data))
        .collect();
    assert!(ids.contains(&2));
    assert!(ids.contains(&3));
    assert!(!ids.contains(&1));
}

// ---------------------------------------------------------------------------
// Spectating
// ---------------------------------------------------------------------------

#[tokio::test]
async fn spectate_lifecycle_updates_the_edge_and_both_queues() {
    let mock = MockBackend::start().await;
    let host_session = mock.seed_player(1, "host");
    let self_session = mock.seed_player(2, "watcher");
    let base = start_gateway(&mock).await;

    // start
    let response = poll(
        &base,
        self_session,
        client_frame(START_SPECTATING, &1i32.to_le_bytes()),
    )
    .await;
    assert!(response.bytes().await.unwrap().is_empty());

    assert_eq!(mock.state.spectators.lock().unwrap().len(), 1);
    let queued = mock.queued_for(host_session);
    assert_eq!(queued.len(), 1);
    let frames = parse_frames(&queued[0]);
    assert_eq!(frames[0].packet_id, SPECTATOR_JOINED);
    assert_eq!(frame_i32(&frames[0].data), 2);

    // frames from the host reach the spectator verbatim
    let replay_bytes = vec![0xde, 0xad, 0xbe, 0xef];
    poll(
        &base,
        host_session,
        client_frame(SPECTATE_FRAMES_CLIENT, &replay_bytes),
    )
    .await;
    let queued = mock.queued_for(self_session);
    assert_eq!(queued.len(), 1);
    let frames = parse_frames(&queued[0]);
    assert_eq!(frames[0].packet_id, SPECTATE_FRAMES_SERVER);
    assert_eq!(frames[0].data, replay_bytes);

    // stop
    poll(&base, self_session, client_frame(STOP_SPECTATING, &[])).await;
    assert!(mock.state.spectators.lock().unwrap().is_empty());
    let queued = mock.queued_for(host_session);
    assert_eq!(queued.len(), 1);
    let frames = parse_frames(&queued[0]);
    assert_eq!(frames[0].packet_id, SPECTATOR_LEFT);
    assert_eq!(frame_i32(&frames[0].data), 2);
}

// ---------------------------------------------------------------------------
// Handler failures stay contained
// ---------------------------------------------------------------------------

#[tokio::test]
async fn failing_handler_does_not_abort_the_loop() {
    let mock = MockBackend::start().await;
    let self_session = mock.seed_player(1, "gamer");
    let base = start_gateway(&mock).await;

    // STOP_SPECTATING with no edge fails inside the handler; the unknown
    // opcode after it must still be dispatched.
    let mut body = client_frame(STOP_SPECTATING, &[]);
    body.extend_from_slice(&client_frame(9999, &[]));

    let response = poll(&base, self_session, body).await;
    let frames = parse_frames(&response.bytes().await.unwrap());
    assert_eq!(frames.len(), 1);
    assert_eq!(frames[0].packet_id, NOTIFICATION);
    assert_eq!(
        read_packet_string(&frames[0].data),
        "[Unhandled Packet] Unknown (9999)"
    );
}
