use thiserror::Error;

/// Engine-side error type.
/// Returned by engine providers and sessions.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    /// The engine could not be started or did not answer in time.
    #[error("- Engine launch failed: {0}")]
    Launch(String),
    /// The launch configuration is not supported by the engine.
    #[error("- Unsupported launch configuration: {0}")]
    Unsupported(String),
    /// Lookup of a task name failed.
    #[error("- No task named \"{0}\"")]
    TaskNotFound(String),
    /// The engine rejected or failed a request.
    #[error("- Engine rejected the request: {0}")]
    Rejected(String),
    /// The connection to the engine broke.
    #[error("- Engine transport error: {0}")]
    Transport(String),
    /// The session has already been shut down.
    #[error("- The engine session is closed")]
    Closed,
}

/// Result type for the `engine` module.
pub type ProcResult<T> = std::result::Result<T, EngineError>;
