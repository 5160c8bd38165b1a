//! Device directory: discovery and connection over the host MIDI subsystem.

use crate::catalog::DeviceModel;
use crate::error::{Error, Result};
use crate::transport::MidiTransport;
use midir::{MidiOutput, MidiOutputConnection};
use tracing::{debug, info, warn};

/// Client name shown to the host MIDI subsystem.
pub const CLIENT_NAME: &str = "bcr-programmer";

/// A MIDI output port belonging to a supported model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceInfo {
    pub model: DeviceModel,
    /// Port name as reported by the host.
    pub name: String,
    /// Position of the port in the host's port list at discovery time.
    pub port_index: usize,
}

fn midi_output() -> Result<MidiOutput> {
    MidiOutput::new(CLIENT_NAME).map_err(|e| Error::DeviceUnavailable(e.to_string()))
}

/// Discover all output ports whose name matches `model`.
///
/// Ports whose name cannot be read are skipped.
pub fn discover_devices(model: DeviceModel) -> Result<Vec<DeviceInfo>> {
    debug!("Starting MIDI output enumeration");
    let output = midi_output()?;

    let mut devices = Vec::new();
    for (port_index, port) in output.ports().iter().enumerate() {
        let name = match output.port_name(port) {
            Ok(name) => name,
            Err(e) => {
                debug!(port_index, error = %e, "Skipping unreadable MIDI port");
                continue;
            }
        };
        if !model.matches_port(&name) {
            continue;
        }

        info!(
            model = model.name(),
            port = %name,
            port_index,
            "Found controller"
        );
        devices.push(DeviceInfo {
            model,
            name,
            port_index,
        });
    }

    debug!(count = devices.len(), "Device enumeration complete");
    Ok(devices)
}

/// Open a fresh output connection to a discovered device.
///
/// The port list is re-read, so the port must still be present under the
/// same name.
pub fn open_device(info: &DeviceInfo) -> Result<MidirTransport> {
    let output = midi_output()?;
    let ports = output.ports();

    let port = ports
        .iter()
        .enumerate()
        .filter(|(_, port)| output.port_name(port).ok().as_deref() == Some(info.name.as_str()))
        .min_by_key(|(index, _)| index.abs_diff(info.port_index))
        .map(|(_, port)| port.clone())
        .ok_or_else(|| {
            Error::DeviceUnavailable(format!("port '{}' is no longer present", info.name))
        })?;

    let connection = output
        .connect(&port, CLIENT_NAME)
        .map_err(|e| Error::DeviceUnavailable(format!("connect '{}': {e}", info.name)))?;
    debug!(port = %info.name, "Output connection opened");

    Ok(MidirTransport {
        name: info.name.clone(),
        connection: Some(connection),
    })
}

/// Output connection to one device, closed on drop.
pub struct MidirTransport {
    name: String,
    connection: Option<MidiOutputConnection>,
}

impl MidirTransport {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Close the connection. Further sends fail.
    pub fn close(&mut self) {
        if let Some(connection) = self.connection.take() {
            let _ = connection.close();
            debug!(port = %self.name, "Output connection closed");
        }
    }
}

impl MidiTransport for MidirTransport {
    fn send(&mut self, data: &[u8]) -> Result<()> {
        let connection = self.connection.as_mut().ok_or_else(|| {
            Error::DeviceUnavailable(format!("port '{}' is closed", self.name))
        })?;
        connection.send(data).map_err(|e| {
            warn!(port = %self.name, error = %e, "MIDI send failed");
            Error::DeviceUnavailable(format!("send to '{}': {e}", self.name))
        })
    }
}

impl Drop for MidirTransport {
    fn drop(&mut self) {
        self.close();
    }
}
