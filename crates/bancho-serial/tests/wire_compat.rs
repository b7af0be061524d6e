//! Wire-format conformance tests.
//!
//! These pin the codec to the bancho wire format as the osu! client expects
//! it: little-endian primitives, ULEB128 string prefixes, and the
//! seven-byte frame header with a reserved byte the reader must tolerate
//! being non-zero.

use bancho_serial::packets::{self, ServerPacket};
use bancho_serial::reader::Reader;
use bancho_serial::writer::Writer;

// ---------------------------------------------------------------------------
// Primitive round trips
// ---------------------------------------------------------------------------

#[test]
fn integer_extremes_round_trip() {
    let mut w = Writer::new();
    w.write_u8(u8::MIN);
    w.write_u8(u8::MAX);
    w.write_u16(u16::MAX);
    w.write_u32(u32::MAX);
    w.write_u64(u64::MAX);
    w.write_i8(i8::MIN);
    w.write_i16(i16::MIN);
    w.write_i32(i32::MIN);
    w.write_i64(i64::MIN);
    let bytes = w.into_bytes();

    let mut r = Reader::new(&bytes);
    assert_eq!(r.read_u8().unwrap(), u8::MIN);
    assert_eq!(r.read_u8().unwrap(), u8::MAX);
    assert_eq!(r.read_u16().unwrap(), u16::MAX);
    assert_eq!(r.read_u32().unwrap(), u32::MAX);
    assert_eq!(r.read_u64().unwrap(), u64::MAX);
    assert_eq!(r.read_i8().unwrap(), i8::MIN);
    assert_eq!(r.read_i16().unwrap(), i16::MIN);
    assert_eq!(r.read_i32().unwrap(), i32::MIN);
    assert_eq!(r.read_i64().unwrap(), i64::MIN);
    assert!(r.stream_consumed());
}

#[test]
fn float_values_round_trip() {
    let mut w = Writer::new();
    w.write_f32(f32::MAX);
    w.write_f32(-0.0);
    w.write_f64(f64::MIN_POSITIVE);
    let bytes = w.into_bytes();

    let mut r = Reader::new(&bytes);
    assert_eq!(r.read_f32().unwrap(), f32::MAX);
    assert_eq!(r.read_f32().unwrap(), -0.0);
    assert_eq!(r.read_f64().unwrap(), f64::MIN_POSITIVE);
}

// ---------------------------------------------------------------------------
// ULEB128 boundaries
// ---------------------------------------------------------------------------

/// Lengths straddling each ULEB128 byte-count boundary.
const ULEB_BOUNDARY_LENGTHS: &[usize] = &[0, 1, 127, 128, 16_383, 16_384, 2_097_151, 2_097_152];

#[test]
fn uleb128_boundary_lengths_round_trip() {
    for &len in ULEB_BOUNDARY_LENGTHS {
        let original = "x".repeat(len);
        let mut w = Writer::new();
        w.write_string(&original);
        let bytes = w.into_bytes();

        let mut r = Reader::new(&bytes);
        let decoded = r.read_string().unwrap();
        assert_eq!(decoded.len(), len, "length {len} did not round trip");
        assert_eq!(decoded, original);
        assert!(r.stream_consumed(), "length {len} left trailing bytes");
    }
}

#[test]
fn uleb128_prefix_byte_counts() {
    let cases: &[(usize, usize)] = &[
        (1, 1),
        (127, 1),
        (128, 2),
        (16_383, 2),
        (16_384, 3),
        (2_097_151, 3),
        (2_097_152, 4),
    ];
    for &(len, prefix_bytes) in cases {
        let mut w = Writer::new();
        w.write_string(&"x".repeat(len));
        let bytes = w.into_bytes();
        assert_eq!(
            bytes.len(),
            1 + prefix_bytes + len,
            "length {len} should use {prefix_bytes} prefix byte(s)"
        );
    }
}

// ---------------------------------------------------------------------------
// Framing
// ---------------------------------------------------------------------------

#[test]
fn frame_is_id_reserved_length_body() {
    let body = vec![0xaa; 300];
    let packet = packets::write_packet(ServerPacket::SpectateFrames, &body);

    let mut expected = Vec::new();
    expected.extend_from_slice(&(15u16).to_le_bytes());
    expected.push(0x00);
    expected.extend_from_slice(&(300u32).to_le_bytes());
    expected.extend_from_slice(&body);
    assert_eq!(packet, expected);
}

#[test]
fn reader_tolerates_nonzero_reserved_byte() {
    let mut frame = Vec::new();
    frame.extend_from_slice(&(4u16).to_le_bytes());
    frame.push(0xff); // writers always emit 0; readers must not care
    frame.extend_from_slice(&(2u32).to_le_bytes());
    frame.extend_from_slice(&[0x01, 0x02]);

    let mut r = Reader::new(&frame);
    assert_eq!(r.read_u16().unwrap(), 4);
    let _reserved = r.read_u8().unwrap();
    let len = r.read_u32().unwrap();
    assert_eq!(r.read_bytes(len as usize).unwrap(), &[0x01, 0x02]);
    assert!(r.stream_consumed());
}

#[test]
fn consecutive_frames_parse_in_order() {
    let mut stream = Vec::new();
    stream.extend_from_slice(&packets::write_notification_packet("one"));
    stream.extend_from_slice(&packets::write_pong_packet());
    stream.extend_from_slice(&packets::write_account_id_packet(5));

    let mut r = Reader::new(&stream);
    let mut ids = Vec::new();
    while !r.stream_consumed() {
        let id = r.read_u16().unwrap();
        let _ = r.read_u8().unwrap();
        let len = r.read_u32().unwrap();
        let _ = r.read_bytes(len as usize).unwrap();
        ids.push(id);
    }
    assert_eq!(ids, vec![24, 8, 5]);
}
