//! MIDI output abstraction for device communication.
//!
//! Provides a trait-based transport layer so that real MIDI ports and mock
//! devices share the same interface. Only the sending direction exists: the
//! BCR2000 does not acknowledge BCL lines.

use crate::error::Result;
use crate::sysex::Frame;
use tracing::trace;

/// Abstraction over a raw MIDI output.
pub trait MidiTransport {
    /// Send one complete MIDI message.
    fn send(&mut self, data: &[u8]) -> Result<()>;
}

impl<T: MidiTransport + ?Sized> MidiTransport for &mut T {
    fn send(&mut self, data: &[u8]) -> Result<()> {
        (**self).send(data)
    }
}

impl<T: MidiTransport + ?Sized> MidiTransport for Box<T> {
    fn send(&mut self, data: &[u8]) -> Result<()> {
        (**self).send(data)
    }
}

/// Send an encoded frame, tracing its bytes.
pub fn send_frame(transport: &mut dyn MidiTransport, frame: &Frame) -> Result<()> {
    trace!(
        len = frame.len(),
        frame_hex = format_args!("{:02X?}", frame.as_bytes()),
        "SysEx TX"
    );
    transport.send(frame.as_bytes())
}

/// A mock MIDI transport for testing.
///
/// Records every message and can be told to fail on a given send.
#[cfg(test)]
pub mod mock {
    use super::*;
    use crate::error::Error;
    use crate::sysex::{DecodedFrame, Frame};

    /// Mock transport that stores sent messages.
    #[derive(Default)]
    pub struct MockTransport {
        sent: Vec<Vec<u8>>,
        fail_on: Option<usize>,
    }

    impl MockTransport {
        pub fn new() -> Self {
            Self::default()
        }

        /// Fail the send with this zero-based sequence number, and every one after.
        pub fn failing_at(send_number: usize) -> Self {
            Self {
                sent: Vec::new(),
                fail_on: Some(send_number),
            }
        }

        pub fn sent(&self) -> &[Vec<u8>] {
            &self.sent
        }

        pub fn decoded(&self) -> Vec<DecodedFrame> {
            self.sent
                .iter()
                .map(|bytes| Frame::decode(bytes).unwrap())
                .collect()
        }

        /// Group decoded frames into blocks; a block starts at position 0.
        pub fn blocks(&self) -> Vec<Vec<String>> {
            let mut blocks: Vec<Vec<String>> = Vec::new();
            for frame in self.decoded() {
                if frame.block_index == 0 || blocks.is_empty() {
                    blocks.push(Vec::new());
                }
                if let Some(block) = blocks.last_mut() {
                    block.push(frame.text);
                }
            }
            blocks
        }
    }

    impl MidiTransport for MockTransport {
        fn send(&mut self, data: &[u8]) -> Result<()> {
            if self.fail_on.is_some_and(|n| self.sent.len() >= n) {
                return Err(Error::DeviceUnavailable(
                    "mock: output port disconnected".into(),
                ));
            }
            self.sent.push(data.to_vec());
            Ok(())
        }
    }
}
