//! Validation layer: checks every value against what the BCR2000 accepts
//! before anything is sent.
//!
//! # Limits
//!
//! ## Block addressing
//! - **Line position**: 0 – 65,535 (two single-byte position fields)
//! - **Block length**: at most 16,384 lines per block
//!
//! ## Controls
//! - **MIDI channel**: 1 – 16
//! - **Physical id**: 1 – 127 (`$button N` / `$encoder N`)
//! - **CC number** (buttons): 0 – 127
//! - **NRPN number** (encoders): 0 – 16,383
//!
//! All validation happens before any MIDI traffic, so a rejected block never
//! leaves the device half-written.

use crate::catalog::ControlRole;
use crate::error::{Error, Result};

/// Maximum number of lines in one block.
pub const MAX_BLOCK_LINES: usize = 16384;

/// Highest line position the two position bytes can carry.
pub const MAX_BLOCK_INDEX: usize = u16::MAX as usize;

pub const CHANNEL_MIN: u8 = 1;
pub const CHANNEL_MAX: u8 = 16;

pub const PHYSICAL_ID_MIN: u16 = 1;
pub const PHYSICAL_ID_MAX: u16 = 127;

pub const CC_MAX: u16 = 127;
pub const NRPN_MAX: u16 = 16383;

/// Validate a line position within a block.
pub fn validate_block_index(index: usize) -> Result<u16> {
    if index > MAX_BLOCK_INDEX {
        return Err(Error::OutOfRange {
            field: "block_index",
            value: u32::try_from(index).unwrap_or(u32::MAX),
            min: 0,
            max: MAX_BLOCK_INDEX as u32,
        });
    }
    Ok(index as u16)
}

/// Validate the number of lines in a block.
pub fn validate_block_len(lines: usize) -> Result<()> {
    if lines > MAX_BLOCK_LINES {
        return Err(Error::BlockTooLarge {
            lines,
            max: MAX_BLOCK_LINES,
        });
    }
    Ok(())
}

/// Validate a MIDI channel (1-based).
pub fn validate_channel(channel: u8) -> Result<()> {
    if !(CHANNEL_MIN..=CHANNEL_MAX).contains(&channel) {
        return Err(Error::OutOfRange {
            field: "channel",
            value: channel as u32,
            min: CHANNEL_MIN as u32,
            max: CHANNEL_MAX as u32,
        });
    }
    Ok(())
}

/// Validate a physical control slot.
pub fn validate_physical_id(physical_id: u16) -> Result<()> {
    if !(PHYSICAL_ID_MIN..=PHYSICAL_ID_MAX).contains(&physical_id) {
        return Err(Error::OutOfRange {
            field: "physical_id",
            value: physical_id as u32,
            min: PHYSICAL_ID_MIN as u32,
            max: PHYSICAL_ID_MAX as u32,
        });
    }
    Ok(())
}

/// Validate a parameter number for the message type the role binds.
pub fn validate_parameter_id(role: ControlRole, parameter_id: u16) -> Result<()> {
    let max = match role {
        ControlRole::Pot => NRPN_MAX,
        ControlRole::ToggleButton | ControlRole::MomentaryButton => CC_MAX,
    };
    if parameter_id > max {
        return Err(Error::OutOfRange {
            field: "parameter_id",
            value: parameter_id as u32,
            min: 0,
            max: max as u32,
        });
    }
    Ok(())
}
