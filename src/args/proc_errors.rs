use thiserror::Error;

/// Argument and config error type.
#[derive(Debug, Error)]
pub enum ArgError {
    /// IO error.
    #[error("- IO Error:\n{0}")]
    IoError(#[from] crate::io::IoError),
    /// StringOnly error.
    #[error("- {0}")]
    StringOnly(String),
}

/// Result type for the `args` module.
pub type ProcResult<T> = std::result::Result<T, ArgError>;

/// Create a `ArgError::StringOnly` from a string.
pub fn err_str<T>(error_str: &str) -> ProcResult<T> {
    Err(ArgError::StringOnly(error_str.to_string()))
}
