//! Constants and magic numbers for the frame format

/// Frame magic: "DFR1"
pub const FRAME_MAGIC: [u8; 4] = [0x44, 0x46, 0x52, 0x31]; // "DFR1"

/// Burst magic: "DBS1"
pub const BURST_MAGIC: [u8; 4] = [0x44, 0x42, 0x53, 0x31]; // "DBS1"

/// Size of a record magic in bytes.
pub const MAGIC_LEN: usize = 4;

/// Size of the trailing CRC32C in bytes.
pub const CRC_LEN: usize = 4;

/// Payload tag for a frame with no value.
pub const PAYLOAD_EMPTY: u8 = 0;
/// Payload tag for an unsigned integer value.
pub const PAYLOAD_NUMBER: u8 = 1;
/// Payload tag for a 64-bit float value.
pub const PAYLOAD_REAL: u8 = 2;
/// Payload tag for a UTF-8 text value.
pub const PAYLOAD_TEXT: u8 = 3;
/// Payload tag for an opaque byte string.
pub const PAYLOAD_BINARY: u8 = 4;
