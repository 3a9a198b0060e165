//! Error types for Loopscope.

use thiserror::Error;

/// Main error type for Loopscope operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LoopscopeError {
    /// The request violates a precondition (bad bin width, empty channel, ...).
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A channel's MIDI notes are out of order or have negative length.
    #[error("Malformed note list on channel {channel}: {reason}")]
    MalformedNoteList { channel: String, reason: String },

    #[error("Serialization error: {0}")]
    Serialization(String),

    /// The display worker shut down before the request could be answered.
    #[error("Display worker is closed")]
    WorkerClosed,

    #[error("Worker error: {0}")]
    Worker(String),
}

impl LoopscopeError {
    /// Whether the error stems from a malformed request rather than the transport.
    pub fn is_precondition(&self) -> bool {
        matches!(self, Self::InvalidInput(_) | Self::MalformedNoteList { .. })
    }
}

/// Result type alias for Loopscope operations.
pub type Result<T> = std::result::Result<T, LoopscopeError>;
