//! BCL SysEx frame encoding and decoding.
//!
//! Every line of a BCL script travels in its own System-Exclusive message:
//!
//! ```text
//! F0 00 20 32 <device 7F> <type 15> <cmd 20> <pos hi> <pos lo> <text...> F7
//! ```
//!
//! - `00 20 32`: Behringer manufacturer ID
//! - `7F`: device number (any device)
//! - `15`: device type (BCR2000 family)
//! - `20`: "send BCL message" command
//! - position: index of the line inside its block, `hi = idx / 256`, `lo = idx % 256`
//! - text: the script line as UTF-8
//! - `F7`: end of exclusive

use crate::error::{Error, Result};
use crate::limits;

/// Start-of-exclusive status byte.
pub const SYSEX_START: u8 = 0xF0;
/// End-of-exclusive status byte.
pub const SYSEX_END: u8 = 0xF7;

/// Behringer manufacturer ID.
pub const MANUFACTURER_ID: [u8; 3] = [0x00, 0x20, 0x32];
/// Device number addressing any unit on the port.
pub const DEVICE_NUMBER: u8 = 0x7F;
/// Device type for the BCR2000 family.
pub const DEVICE_TYPE: u8 = 0x15;
/// Command code for a BCL text line.
pub const CMD_BCL_MESSAGE: u8 = 0x20;

/// Fixed 7-byte preamble preceding the position bytes.
pub const PREAMBLE: [u8; 7] = [
    SYSEX_START,
    MANUFACTURER_ID[0],
    MANUFACTURER_ID[1],
    MANUFACTURER_ID[2],
    DEVICE_NUMBER,
    DEVICE_TYPE,
    CMD_BCL_MESSAGE,
];

/// Preamble plus the two position bytes.
pub const HEADER_LEN: usize = PREAMBLE.len() + 2;

/// One encoded BCL line ready for the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    bytes: Vec<u8>,
}

impl Frame {
    /// Raw SysEx bytes, including envelope.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Parse a raw SysEx message back into its position and text.
    pub fn decode(data: &[u8]) -> Result<DecodedFrame> {
        if data.len() < HEADER_LEN + 1 {
            return Err(malformed(format!(
                "frame too short: {} bytes (minimum {})",
                data.len(),
                HEADER_LEN + 1
            )));
        }
        if data[..PREAMBLE.len()] != PREAMBLE {
            return Err(malformed(format!(
                "unexpected preamble {:02X?}",
                &data[..PREAMBLE.len()]
            )));
        }
        if data[data.len() - 1] != SYSEX_END {
            return Err(malformed(format!(
                "missing terminator, last byte 0x{:02X}",
                data[data.len() - 1]
            )));
        }

        let high = data[PREAMBLE.len()] as u16;
        let low = data[PREAMBLE.len() + 1] as u16;
        let text = std::str::from_utf8(&data[HEADER_LEN..data.len() - 1])
            .map_err(|e| malformed(format!("payload is not UTF-8: {e}")))?;

        Ok(DecodedFrame {
            block_index: (high << 8) | low,
            text: text.to_string(),
        })
    }
}

impl AsRef<[u8]> for Frame {
    fn as_ref(&self) -> &[u8] {
        &self.bytes
    }
}

/// Position and text recovered from a frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedFrame {
    pub block_index: u16,
    pub text: String,
}

fn malformed(reason: String) -> Error {
    Error::MalformedFrame(reason)
}

/// Encode one script line at position `block_index` within its block.
pub fn encode_line(text: &str, block_index: usize) -> Result<Frame> {
    let index = limits::validate_block_index(block_index)?;

    let mut bytes = Vec::with_capacity(HEADER_LEN + text.len() + 1);
    bytes.extend_from_slice(&PREAMBLE);
    bytes.push((index / 256) as u8);
    bytes.push((index % 256) as u8);
    bytes.extend_from_slice(text.as_bytes());
    bytes.push(SYSEX_END);

    Ok(Frame { bytes })
}
