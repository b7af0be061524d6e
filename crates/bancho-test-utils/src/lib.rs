//! Test support for the bancho gateway.
//!
//! [`MockBackend`] stands in for the whole backend constellation (users,
//! chats, beatmaps, scores) as a single in-memory axum server, so gateway
//! integration tests can drive the real router end to end. The `wire`
//! module has small helpers for building client frames and picking apart
//! server responses.

pub mod mock_backend;
pub mod wire;

pub use mock_backend::MockBackend;
pub use wire::{Frame, client_frame, parse_frames, read_packet_string};
