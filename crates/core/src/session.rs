//! Device session: programs a full catalog into one connected device.

use crate::catalog::ControlCatalog;
use crate::error::{Error, Result};
use crate::pacing::{Delay, PacingPolicy};
use crate::script;
use crate::transmitter::BlockTransmitter;
use crate::transport::MidiTransport;
use tracing::{debug, info, warn};

/// Outcome of a completed configuration run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConfigureReport {
    /// Blocks sent, init block included.
    pub blocks_sent: usize,
    pub controls_configured: usize,
}

/// One open device plus the state needed to program it.
pub struct DeviceSession<T, D> {
    transmitter: BlockTransmitter<T, D>,
}

impl<T: MidiTransport, D: Delay> DeviceSession<T, D> {
    pub fn new(transport: T, delay: D) -> Self {
        Self {
            transmitter: BlockTransmitter::new(transport, delay),
        }
    }

    pub fn with_policy(transport: T, delay: D, policy: PacingPolicy) -> Self {
        Self {
            transmitter: BlockTransmitter::with_policy(transport, delay, policy),
        }
    }

    /// Send the init block, then one block per control in catalog order.
    ///
    /// On failure nothing is rolled back. The error is
    /// [`Error::ConfigurationAborted`] carrying the catalog index of the last
    /// control whose block was fully sent, even when the run stops in the
    /// pacing pause that follows it.
    pub fn configure(&mut self, catalog: &ControlCatalog) -> Result<ConfigureReport> {
        info!(
            catalog = catalog.name(),
            controls = catalog.len(),
            "Configuring device"
        );

        if let Err(e) = self.transmitter.transmit_block(script::init_script().lines()) {
            return Err(self.abort(None, e));
        }
        debug!("Init block sent");
        if let Err(e) = self.transmitter.pace() {
            return Err(self.abort(None, e));
        }

        let mut last_completed = None;
        for (index, control) in catalog.iter().enumerate() {
            let block = script::script_for(control);
            if let Err(e) = self.transmitter.transmit_block(block.lines()) {
                return Err(self.abort(last_completed, e));
            }
            last_completed = Some(index);
            debug!(
                index,
                label = control.label(),
                role = %control.role(),
                physical_id = control.physical_id(),
                parameter_id = control.parameter_id(),
                "Control configured"
            );
            if let Err(e) = self.transmitter.pace() {
                return Err(self.abort(last_completed, e));
            }
        }

        let report = ConfigureReport {
            blocks_sent: catalog.len() + 1,
            controls_configured: catalog.len(),
        };
        info!(
            blocks = report.blocks_sent,
            total_blocks_sent = self.transmitter.blocks_sent(),
            "Device configured"
        );
        Ok(report)
    }

    fn abort(&self, last_completed: Option<usize>, source: Error) -> Error {
        warn!(
            last_completed = ?last_completed,
            error = %source,
            "Configuration aborted"
        );
        Error::ConfigurationAborted {
            last_completed,
            source: Box::new(source),
        }
    }

    pub fn transmitter(&self) -> &BlockTransmitter<T, D> {
        &self.transmitter
    }

    /// End the session, handing back the device output.
    pub fn into_parts(self) -> (T, D) {
        self.transmitter.into_parts()
    }
}
