//! Error types for the playback engine and its collaborators.

use thiserror::Error;

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, EngineError>;

/// Errors surfaced by the session coordinator and its components.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Automation playback requested without a usable track.
    #[error("No automation track recorded for script '{script_id}'")]
    NoAutomationTrack { script_id: String },

    /// Transition not allowed from the current mode.
    #[error("Cannot {action} while in {mode} mode")]
    InvalidTransition { action: &'static str, mode: String },

    /// Speed multiplier must be finite and positive.
    #[error("Invalid speed multiplier {0}: must be finite and > 0")]
    InvalidSpeed(f64),

    /// Focal position must lie strictly between 0 and 1.
    #[error("Invalid focal position {0}: must be within (0, 1)")]
    InvalidFocalPosition(f64),

    /// Persistence failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Errors from a key-value store or the codec layered on top of it.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Store I/O failed for key '{key}': {source}")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to encode or decode value for key '{key}': {source}")]
    Codec {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid store key '{0}'")]
    InvalidKey(String),
}

/// Errors raised by a media element when it cannot honour a request.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MediaError {
    /// The element has no data loaded yet.
    #[error("Media element is not ready")]
    NotReady,

    /// The element rejected the request.
    #[error("Media element rejected request: {0}")]
    Rejected(String),
}
