//! Control catalogs: which physical controls a model has and what each one
//! should send.

use crate::error::{Error, Result};
use crate::limits;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// What a control does once programmed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ControlRole {
    /// Encoder sending a 14-bit absolute NRPN value.
    Pot,
    /// Button latching between 0 and 127 on each press.
    ToggleButton,
    /// Button sending 127 while held.
    MomentaryButton,
}

/// BCL addressing scope a control lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ControlScope {
    Button,
    Encoder,
}

impl ControlScope {
    /// Scope-opening keyword used in BCL scripts.
    pub fn keyword(&self) -> &'static str {
        match self {
            Self::Button => "$button",
            Self::Encoder => "$encoder",
        }
    }
}

impl ControlRole {
    /// All available roles.
    pub const ALL: &'static [ControlRole] = &[
        ControlRole::Pot,
        ControlRole::ToggleButton,
        ControlRole::MomentaryButton,
    ];

    /// Human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Pot => "Pot",
            Self::ToggleButton => "Toggle Button",
            Self::MomentaryButton => "Momentary Button",
        }
    }

    pub fn scope(&self) -> ControlScope {
        match self {
            Self::Pot => ControlScope::Encoder,
            Self::ToggleButton | Self::MomentaryButton => ControlScope::Button,
        }
    }
}

impl std::fmt::Display for ControlRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// One physical control on the device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Control {
    physical_id: u16,
    channel: u8,
    parameter_id: u16,
    label: String,
    role: ControlRole,
}

impl Control {
    pub fn new(
        role: ControlRole,
        physical_id: u16,
        channel: u8,
        parameter_id: u16,
        label: impl Into<String>,
    ) -> Self {
        Self {
            physical_id,
            channel,
            parameter_id,
            label: label.into(),
            role,
        }
    }

    /// Device-assigned slot (`$button N` / `$encoder N`).
    pub fn physical_id(&self) -> u16 {
        self.physical_id
    }

    /// MIDI channel, 1-based.
    pub fn channel(&self) -> u8 {
        self.channel
    }

    /// CC or NRPN number the control sends.
    pub fn parameter_id(&self) -> u16 {
        self.parameter_id
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn role(&self) -> ControlRole {
        self.role
    }

    /// Check the control's values against device limits.
    pub fn validate(&self) -> Result<()> {
        limits::validate_physical_id(self.physical_id)?;
        limits::validate_channel(self.channel)?;
        limits::validate_parameter_id(self.role, self.parameter_id)
    }
}

/// Ordered, validated list of a model's controls.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawCatalog")]
pub struct ControlCatalog {
    name: String,
    controls: Vec<Control>,
}

#[derive(Deserialize)]
struct RawCatalog {
    name: String,
    controls: Vec<Control>,
}

impl TryFrom<RawCatalog> for ControlCatalog {
    type Error = Error;

    fn try_from(raw: RawCatalog) -> Result<Self> {
        ControlCatalog::new(raw.name, raw.controls)
    }
}

impl ControlCatalog {
    /// Build a catalog, rejecting out-of-range values and id collisions.
    ///
    /// Physical ids only have to be unique within a scope: `$button 1` and
    /// `$encoder 1` are different controls. Parameter ids are unique across
    /// the whole catalog.
    pub fn new(name: impl Into<String>, controls: Vec<Control>) -> Result<Self> {
        let mut physical = HashSet::new();
        let mut parameters = HashSet::new();

        for control in &controls {
            control.validate().map_err(|e| {
                Error::Catalog(format!("control '{}': {e}", control.label()))
            })?;

            if !physical.insert((control.role().scope(), control.physical_id())) {
                return Err(Error::Catalog(format!(
                    "duplicate physical id {} {} (control '{}')",
                    control.role().scope().keyword(),
                    control.physical_id(),
                    control.label()
                )));
            }
            if !parameters.insert(control.parameter_id()) {
                return Err(Error::Catalog(format!(
                    "duplicate parameter id {} (control '{}')",
                    control.parameter_id(),
                    control.label()
                )));
            }
        }

        Ok(Self {
            name: name.into(),
            controls,
        })
    }

    /// Parse and validate a catalog from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| Error::Catalog(e.to_string()))
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| Error::Catalog(e.to_string()))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn controls(&self) -> &[Control] {
        &self.controls
    }

    pub fn len(&self) -> usize {
        self.controls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.controls.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Control> {
        self.controls.iter()
    }
}

impl<'a> IntoIterator for &'a ControlCatalog {
    type Item = &'a Control;
    type IntoIter = std::slice::Iter<'a, Control>;

    fn into_iter(self) -> Self::IntoIter {
        self.controls.iter()
    }
}

/// Supported controller models.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceModel {
    Bcr2000,
}

impl DeviceModel {
    /// Human-readable name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Bcr2000 => "Behringer BCR2000",
        }
    }

    /// Prefix of the MIDI port name the host reports for this model.
    pub fn port_prefix(&self) -> &'static str {
        match self {
            Self::Bcr2000 => "BCR2000",
        }
    }

    pub fn matches_port(&self, port_name: &str) -> bool {
        port_name.starts_with(self.port_prefix())
    }

    /// Built-in control layout for this model.
    pub fn catalog(&self) -> Result<ControlCatalog> {
        match self {
            Self::Bcr2000 => bcr2000_catalog(),
        }
    }
}

/// Append `count` controls whose physical and parameter ids advance together.
fn push_run(
    controls: &mut Vec<Control>,
    role: ControlRole,
    count: u16,
    first_physical: u16,
    first_parameter: u16,
    prefix: &str,
) {
    controls.extend((0..count).map(|i| {
        Control::new(
            role,
            first_physical + i,
            1,
            first_parameter + i,
            format!("{prefix}_{}", i + 1),
        )
    }));
}

fn bcr2000_catalog() -> Result<ControlCatalog> {
    use ControlRole::{MomentaryButton, Pot, ToggleButton};

    let mut controls = Vec::with_capacity(70);
    // Encoder push buttons
    push_run(&mut controls, ToggleButton, 8, 1, 1, "KPU");
    // Button rows
    push_run(&mut controls, ToggleButton, 8, 33, 11, "KU");
    push_run(&mut controls, ToggleButton, 8, 41, 21, "KL");
    // User keys, bottom right
    push_run(&mut controls, ToggleButton, 4, 49, 31, "KLR");
    push_run(&mut controls, ToggleButton, 4, 53, 41, "KFU");
    push_run(&mut controls, ToggleButton, 4, 57, 51, "KEG");
    // Preset up/down
    push_run(&mut controls, MomentaryButton, 2, 63, 61, "KPR");
    // Push encoders, then the three encoder rows
    push_run(&mut controls, Pot, 8, 1, 71, "PU");
    push_run(&mut controls, Pot, 8, 33, 81, "P1");
    push_run(&mut controls, Pot, 8, 41, 91, "P2");
    push_run(&mut controls, Pot, 8, 49, 101, "P3");

    ControlCatalog::new(DeviceModel::Bcr2000.name(), controls)
}
