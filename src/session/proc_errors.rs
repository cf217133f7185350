use thiserror::Error;

use crate::engine::EngineError;

/// Session lifecycle error type.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The engine could not be started or connected within the timeout.
    #[error("- Could not launch the {method} engine:\n{source}")]
    Launch {
        method: String,
        source: EngineError,
    },
    /// The requested launch configuration is not supported.
    #[error("- Resource unavailable: {0}")]
    ResourceUnavailable(String),
    /// The session was already released.
    #[error("- The engine session has already been released")]
    Released,
}

/// Result type for the `session` module.
pub type ProcResult<T> = std::result::Result<T, SessionError>;
