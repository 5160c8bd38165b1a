//! Error types for bcr-programmer-core.

use thiserror::Error;

/// Core library error type.
#[derive(Debug, Error)]
pub enum Error {
    /// A block holds more lines than one transmission unit can address.
    #[error("block too large: {lines} lines (maximum {max})")]
    BlockTooLarge { lines: usize, max: usize },

    /// Device cannot be opened or has no usable output port.
    #[error("device unavailable: {0}")]
    DeviceUnavailable(String),

    /// Sending a frame failed part-way through a block.
    #[error("transmission failed at block line {line}: {reason}")]
    Transmission { line: usize, reason: String },

    /// Value out of the range the device accepts.
    #[error("value out of range: {field} = {value} (allowed {min}..={max})")]
    OutOfRange {
        field: &'static str,
        value: u32,
        min: u32,
        max: u32,
    },

    /// Bytes that do not form a BCL SysEx frame.
    #[error("malformed frame: {0}")]
    MalformedFrame(String),

    /// Control catalog is inconsistent or could not be parsed.
    #[error("catalog error: {0}")]
    Catalog(String),

    /// The caller cancelled the run while it was waiting.
    #[error("cancelled")]
    Cancelled,

    /// A configuration run stopped before every control was programmed.
    ///
    /// `last_completed` is the catalog index of the last control whose block
    /// went out in full, or `None` if no control block went out.
    #[error("configuration aborted {}: {source}", describe_progress(.last_completed))]
    ConfigurationAborted {
        last_completed: Option<usize>,
        #[source]
        source: Box<Error>,
    },
}

fn describe_progress(last_completed: &Option<usize>) -> String {
    match last_completed {
        Some(index) => format!("after control #{index}"),
        None => "before any control".to_string(),
    }
}

impl Error {
    /// Underlying failure, looking through [`Error::ConfigurationAborted`].
    pub fn root(&self) -> &Error {
        match self {
            Self::ConfigurationAborted { source, .. } => source.root(),
            other => other,
        }
    }
}

/// Convenience Result alias.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aborted_message_names_progress() {
        let err = Error::ConfigurationAborted {
            last_completed: Some(4),
            source: Box::new(Error::Cancelled),
        };
        assert_eq!(err.to_string(), "configuration aborted after control #4: cancelled");

        let err = Error::ConfigurationAborted {
            last_completed: None,
            source: Box::new(Error::DeviceUnavailable("gone".into())),
        };
        assert!(err.to_string().contains("before any control"));
    }

    #[test]
    fn root_unwraps_abort() {
        let err = Error::ConfigurationAborted {
            last_completed: None,
            source: Box::new(Error::Transmission {
                line: 2,
                reason: "port closed".into(),
            }),
        };
        assert!(matches!(err.root(), Error::Transmission { line: 2, .. }));
    }
}
