//! BCL script generation.
//!
//! Every block is self-contained: it opens with `$rev R1` and closes with
//! `$end`. Directives inside a scope are indented two spaces, the way the
//! BCR2000 echoes them back in its own dumps.
//!
//! `.easypar` arguments, in order:
//!   - message type (`CC` or `NRPN`)
//!   - MIDI channel
//!   - controller / parameter number
//!   - minimum value
//!   - maximum value
//!   - mode (`toggleon`, `down`, `absolute/14`, ...)

use crate::catalog::{Control, ControlRole};
use std::fmt;

/// Revision marker opening every block.
pub const REVISION: &str = "$rev R1";
/// Scope closer ending every block.
pub const END: &str = "$end";

/// Value range of a 7-bit CC.
const CC_RANGE: (u16, u16) = (0, 127);
/// Value range of a 14-bit NRPN.
const NRPN_RANGE: (u16, u16) = (0, 16383);
/// Encoder acceleration tiers, slowest first.
const POT_RESOLUTION: [u16; 4] = [100, 1000, 10000, 16383];

/// Ordered lines of one BCL block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigBlock {
    lines: Vec<String>,
}

impl ConfigBlock {
    /// Start a block with the revision marker and the given scope opener.
    fn opened(scope: String) -> Self {
        Self {
            lines: vec![REVISION.to_string(), scope],
        }
    }

    /// Add an indented directive line.
    fn directive(&mut self, args: fmt::Arguments<'_>) {
        self.lines.push(format!("  {args}"));
    }

    fn close(mut self) -> Self {
        self.lines.push(END.to_string());
        self
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Whether the block is wrapped in `$rev R1` ... `$end`.
    pub fn is_bracketed(&self) -> bool {
        self.lines.first().map(String::as_str) == Some(REVISION)
            && self.lines.last().map(String::as_str) == Some(END)
    }
}

impl fmt::Display for ConfigBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for line in &self.lines {
            writeln!(f, "{line}")?;
        }
        Ok(())
    }
}

/// Device-wide setup: enter preset edit, one encoder group, function keys
/// off, edit lock on.
pub fn init_script() -> ConfigBlock {
    let mut block = ConfigBlock::opened("$preset".to_string());
    block.directive(format_args!(".init"));
    block.directive(format_args!(".egroups 1"));
    block.directive(format_args!(".fkeys off"));
    block.directive(format_args!(".lock on"));
    block.close()
}

/// Script binding one control to its parameter.
pub fn script_for(control: &Control) -> ConfigBlock {
    let scope = control.role().scope();
    let mut block = ConfigBlock::opened(format!("{} {}", scope.keyword(), control.physical_id()));
    let channel = control.channel();
    let parameter = control.parameter_id();

    match control.role() {
        ControlRole::ToggleButton => {
            let (min, max) = CC_RANGE;
            block.directive(format_args!(
                ".easypar CC {channel} {parameter} {min} {max} toggleon"
            ));
            block.directive(format_args!(".showvalue on"));
        }
        ControlRole::MomentaryButton => {
            let (min, max) = CC_RANGE;
            block.directive(format_args!(
                ".easypar CC {channel} {parameter} {min} {max} down"
            ));
            block.directive(format_args!(".showvalue off"));
        }
        ControlRole::Pot => {
            let (min, max) = NRPN_RANGE;
            block.directive(format_args!(
                ".easypar NRPN {channel} {parameter} {min} {max} absolute/14"
            ));
            block.directive(format_args!(".mode 1dot"));
            block.directive(format_args!(".showvalue on"));
            let [slow, medium, fast, fastest] = POT_RESOLUTION;
            block.directive(format_args!(
                ".resolution {slow} {medium} {fast} {fastest}"
            ));
        }
    }

    block.close()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trimmed(block: &ConfigBlock) -> Vec<&str> {
        block.lines().iter().map(|l| l.trim()).collect()
    }

    #[test]
    fn init_script_verbatim() {
        let block = init_script();
        assert_eq!(
            block.lines(),
            &[
                "$rev R1",
                "$preset",
                "  .init",
                "  .egroups 1",
                "  .fkeys off",
                "  .lock on",
                "$end",
            ]
        );
    }

    #[test]
    fn toggle_button_script() {
        let control = Control::new(ControlRole::ToggleButton, 33, 1, 11, "KU_1");
        assert_eq!(
            script_for(&control).lines(),
            &[
                "$rev R1",
                "$button 33",
                "  .easypar CC 1 11 0 127 toggleon",
                "  .showvalue on",
                "$end",
            ]
        );
    }

    #[test]
    fn momentary_button_script() {
        let control = Control::new(ControlRole::MomentaryButton, 63, 1, 61, "KPR_1");
        assert_eq!(
            script_for(&control).lines(),
            &[
                "$rev R1",
                "$button 63",
                "  .easypar CC 1 61 0 127 down",
                "  .showvalue off",
                "$end",
            ]
        );
    }

    #[test]
    fn pot_script() {
        let control = Control::new(ControlRole::Pot, 1, 1, 71, "PU_1");
        let block = script_for(&control);
        assert!(trimmed(&block).contains(&".easypar NRPN 1 71 0 16383 absolute/14"));
        assert_eq!(
            block.lines(),
            &[
                "$rev R1",
                "$encoder 1",
                "  .easypar NRPN 1 71 0 16383 absolute/14",
                "  .mode 1dot",
                "  .showvalue on",
                "  .resolution 100 1000 10000 16383",
                "$end",
            ]
        );
    }

    #[test]
    fn channel_flows_into_easypar() {
        let control = Control::new(ControlRole::ToggleButton, 2, 10, 99, "ch10");
        assert!(trimmed(&script_for(&control)).contains(&".easypar CC 10 99 0 127 toggleon"));
    }

    #[test]
    fn every_script_is_bracketed() {
        assert!(init_script().is_bracketed());
        for role in ControlRole::ALL {
            let control = Control::new(*role, 5, 1, 5, "x");
            assert!(script_for(&control).is_bracketed(), "{role} not bracketed");
        }
    }

    #[test]
    fn display_joins_lines() {
        let text = init_script().to_string();
        assert!(text.starts_with("$rev R1\n$preset\n"));
        assert!(text.ends_with("$end\n"));
    }
}
