//! Error types for model construction, stepping and configuration loading

use std::fmt;

/// Errors surfaced by the transport model and its configuration layer
#[derive(Debug, Clone, PartialEq)]
pub enum TransportError {
    /// Invalid domain bounds, resolution, physical parameters or scenario sections
    Configuration(String),
    /// An emission profile failed while the model was stepping
    SourceEvaluation {
        /// Source label, or `source #<index>` for unnamed sources
        source: String,
        /// Message reported by the profile
        message: String,
    },
    /// Configuration file could not be read
    Io(String),
}

impl TransportError {
    pub(crate) fn configuration(message: impl Into<String>) -> Self {
        TransportError::Configuration(message.into())
    }
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportError::Configuration(msg) => write!(f, "Invalid configuration: {msg}"),
            TransportError::SourceEvaluation { source, message } => {
                write!(f, "Emission profile of {source} failed: {message}")
            }
            TransportError::Io(msg) => write!(f, "Failed to read configuration: {msg}"),
        }
    }
}

impl std::error::Error for TransportError {}

/// Failure reported by an [`EmissionProfile`](crate::EmissionProfile)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmissionError(pub String);

impl EmissionError {
    /// Create an error from any message
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

impl fmt::Display for EmissionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for EmissionError {}
