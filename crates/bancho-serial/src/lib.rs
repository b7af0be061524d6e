//! Bancho wire codec.
//!
//! The osu! client speaks a little-endian binary framing: each packet is
//! `u16 packet id | u8 reserved | u32 body length | body`. Strings inside
//! packet bodies are ULEB128-length-prefixed UTF-8. This crate contains the
//! primitive readers and writers, the client/server opcode tables, and one
//! constructor per server packet the gateway emits.
//!
//! No I/O happens here; everything operates on in-memory byte slices.

pub mod packets;
pub mod reader;
pub mod writer;

pub use packets::{
    ClientPacket, ServerPacket, client_packet_name, server_packet_name, write_packet,
};
pub use reader::{ReadError, Reader};
pub use writer::Writer;
