//! Block transmission: one BCL block at a time, line by line, with pacing.

use crate::error::{Error, Result};
use crate::limits;
use crate::pacing::{Delay, PacingPolicy, PacingState};
use crate::sysex;
use crate::transport::{send_frame, MidiTransport};
use tracing::debug;

/// Sends script blocks to one device.
///
/// Owns the device's output and the pacing counter, so each device gets its
/// own transmitter.
pub struct BlockTransmitter<T, D> {
    transport: T,
    delay: D,
    policy: PacingPolicy,
    pacing: PacingState,
    blocks_sent: usize,
}

impl<T: MidiTransport, D: Delay> BlockTransmitter<T, D> {
    pub fn new(transport: T, delay: D) -> Self {
        Self::with_policy(transport, delay, PacingPolicy::default())
    }

    pub fn with_policy(transport: T, delay: D, policy: PacingPolicy) -> Self {
        Self {
            transport,
            delay,
            policy,
            pacing: PacingState::new(),
            blocks_sent: 0,
        }
    }

    /// Send `lines` as one block, line `i` at position `i`, then pace.
    ///
    /// The length check happens before anything is sent. A failed send stops
    /// the block; lines already sent stay sent.
    pub fn send_block<S: AsRef<str>>(&mut self, lines: &[S]) -> Result<()> {
        self.transmit_block(lines)?;
        self.pace()
    }

    /// Send the block's lines without the pacing step.
    ///
    /// Returning `Ok` means every line is on the wire.
    pub fn transmit_block<S: AsRef<str>>(&mut self, lines: &[S]) -> Result<()> {
        limits::validate_block_len(lines.len())?;
        if self.delay.is_cancelled() {
            return Err(Error::Cancelled);
        }

        for (index, line) in lines.iter().enumerate() {
            let frame = sysex::encode_line(line.as_ref(), index)?;
            send_frame(&mut self.transport, &frame).map_err(|e| Error::Transmission {
                line: index,
                reason: e.to_string(),
            })?;
        }

        self.blocks_sent += 1;
        debug!(
            lines = lines.len(),
            blocks_sent = self.blocks_sent,
            "Block sent"
        );
        Ok(())
    }

    /// Count a delivered block and pause if the run has reached the threshold.
    pub fn pace(&mut self) -> Result<()> {
        if self.pacing.record_block(&self.policy) {
            self.delay.pause(self.policy.pause)?;
        }
        Ok(())
    }

    /// Blocks fully sent so far.
    pub fn blocks_sent(&self) -> usize {
        self.blocks_sent
    }

    pub fn pacing(&self) -> &PacingState {
        &self.pacing
    }

    pub fn policy(&self) -> &PacingPolicy {
        &self.policy
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn delay(&self) -> &D {
        &self.delay
    }

    /// Give back the device output, closing nothing.
    pub fn into_parts(self) -> (T, D) {
        (self.transport, self.delay)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pacing::mock::RecordingDelay;
    use crate::sysex::Frame;
    use crate::transport::mock::MockTransport;
    use std::time::Duration;

    /// Delay whose every pause is interrupted.
    struct RefusingDelay;

    impl Delay for RefusingDelay {
        fn pause(&mut self, _duration: Duration) -> Result<()> {
            Err(Error::Cancelled)
        }
    }

    fn transmitter() -> BlockTransmitter<MockTransport, RecordingDelay> {
        BlockTransmitter::new(MockTransport::new(), RecordingDelay::new())
    }

    #[test]
    fn lines_sent_in_order_with_positions() {
        let mut tx = transmitter();
        tx.send_block(&["$rev R1", "$preset", "$end"]).unwrap();

        let frames = tx.transport().decoded();
        assert_eq!(frames.len(), 3);
        for (i, frame) in frames.iter().enumerate() {
            assert_eq!(frame.block_index as usize, i);
        }
        assert_eq!(frames[1].text, "$preset");
        assert_eq!(tx.blocks_sent(), 1);
    }

    #[test]
    fn positions_restart_per_block() {
        let mut tx = transmitter();
        tx.send_block(&["a", "b"]).unwrap();
        tx.send_block(&["c"]).unwrap();
        let positions: Vec<u16> = tx
            .transport()
            .decoded()
            .iter()
            .map(|f| f.block_index)
            .collect();
        assert_eq!(positions, vec![0, 1, 0]);
    }

    #[test]
    fn oversized_block_sends_nothing() {
        let mut tx = transmitter();
        let lines = vec!["  .showvalue on".to_string(); 16385];
        let err = tx.send_block(&lines).unwrap_err();
        assert!(matches!(
            err,
            Error::BlockTooLarge {
                lines: 16385,
                max: 16384
            }
        ));
        assert!(tx.transport().sent().is_empty());
        assert_eq!(tx.blocks_sent(), 0);
        assert_eq!(tx.pacing().blocks_without_pause(), 0);
    }

    #[test]
    fn largest_legal_block_goes_out() {
        let mut tx = transmitter();
        let lines = vec!["x".to_string(); 16384];
        tx.send_block(&lines).unwrap();
        let sent = tx.transport().sent();
        assert_eq!(sent.len(), 16384);
        let last = Frame::decode(&sent[16383]).unwrap();
        assert_eq!(last.block_index, 16383);
    }

    #[test]
    fn one_pause_in_seventeen_blocks() {
        let mut tx = transmitter();
        for i in 0..17 {
            tx.send_block(&["$end"]).unwrap();
            let expected = if i < 16 { 0 } else { 1 };
            assert_eq!(tx.delay().pauses.len(), expected, "after block {}", i + 1);
        }
        assert_eq!(tx.delay().pauses, vec![Duration::from_millis(500)]);
        assert_eq!(tx.pacing().blocks_without_pause(), 0);

        // Counter restarted: the next pause needs another full run.
        for _ in 0..16 {
            tx.send_block(&["$end"]).unwrap();
        }
        assert_eq!(tx.delay().pauses.len(), 1);
        tx.send_block(&["$end"]).unwrap();
        assert_eq!(tx.delay().pauses.len(), 2);
    }

    #[test]
    fn custom_policy_applies() {
        let policy = PacingPolicy {
            pause_every: 1,
            pause: Duration::from_millis(20),
        };
        let mut tx = BlockTransmitter::with_policy(MockTransport::new(), RecordingDelay::new(), policy);
        for _ in 0..4 {
            tx.send_block(&["$end"]).unwrap();
        }
        assert_eq!(tx.delay().pauses, vec![Duration::from_millis(20); 2]);
    }

    #[test]
    fn send_failure_reports_line() {
        let mut tx = BlockTransmitter::new(MockTransport::failing_at(2), RecordingDelay::new());
        let err = tx.send_block(&["a", "b", "c", "d"]).unwrap_err();
        assert!(matches!(err, Error::Transmission { line: 2, .. }));
        assert_eq!(tx.transport().sent().len(), 2);
        assert_eq!(tx.blocks_sent(), 0);
    }

    #[test]
    fn cancelled_delay_stops_before_sending() {
        let mut delay = RecordingDelay::new();
        delay.cancelled = true;
        let mut tx = BlockTransmitter::new(MockTransport::new(), delay);
        assert!(matches!(tx.send_block(&["$rev R1"]), Err(Error::Cancelled)));
        assert!(tx.transport().sent().is_empty());
    }

    #[test]
    fn failed_pause_comes_after_delivery() {
        let policy = PacingPolicy {
            pause_every: 0,
            pause: Duration::from_millis(500),
        };
        let mut tx = BlockTransmitter::with_policy(MockTransport::new(), RefusingDelay, policy);
        tx.transmit_block(&["$rev R1", "$end"]).unwrap();
        assert_eq!(tx.blocks_sent(), 1);
        assert!(matches!(tx.pace(), Err(Error::Cancelled)));
        assert_eq!(tx.transport().sent().len(), 2);
    }

    #[test]
    fn empty_block_counts_for_pacing() {
        let mut tx = transmitter();
        let empty: [&str; 0] = [];
        tx.send_block(&empty).unwrap();
        assert!(tx.transport().sent().is_empty());
        assert_eq!(tx.pacing().blocks_without_pause(), 1);
    }
}
