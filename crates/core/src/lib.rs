//! bcr-programmer-core: BCL SysEx encoding, paced block transmission, and
//! control programming.
//!
//! This crate programs the buttons and encoders of Behringer BCR2000
//! controllers by sending BCL (Behringer Control Language) scripts wrapped in
//! SysEx messages.

pub mod catalog;
pub mod device;
pub mod error;
pub mod limits;
pub mod pacing;
pub mod script;
pub mod session;
pub mod sysex;
pub mod transmitter;
pub mod transport;
