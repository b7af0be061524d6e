//! Frame helpers for tests.

use bancho_serial::reader::Reader;
use bancho_serial::writer::Writer;

/// One parsed `id | reserved | length | body` frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub packet_id: u16,
    pub data: Vec<u8>,
}

/// Splits a response body into frames. Panics on truncation — a malformed
/// server response is a test failure.
pub fn parse_frames(bytes: &[u8]) -> Vec<Frame> {
    let mut reader = Reader::new(bytes);
    let mut frames = Vec::new();
    while !reader.stream_consumed() {
        let packet_id = reader.read_u16().expect("frame id");
        let _reserved = reader.read_u8().expect("reserved byte");
        let length = reader.read_u32().expect("frame length");
        let data = reader
            .read_bytes(length as usize)
            .expect("frame body")
            .to_vec();
        frames.push(Frame { packet_id, data });
    }
    frames
}

/// Builds a client-side frame around a raw body.
pub fn client_frame(packet_id: u16, body: &[u8]) -> Vec<u8> {
    let mut w = Writer::with_capacity(7 + body.len());
    w.write_u16(packet_id);
    w.write_u8(0x00);
    w.write_u32(body.len() as u32);
    w.write_bytes(body);
    w.into_bytes()
}

/// Reads the leading bancho string out of a packet body (e.g. a
/// NOTIFICATION's message).
pub fn read_packet_string(data: &[u8]) -> String {
    Reader::new(data).read_string().expect("packet string")
}
