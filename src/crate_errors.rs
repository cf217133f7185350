use thiserror::Error;

use crate::{
    args,
    io,
    session,
    workflow,
};

/// Error-type enum for the `meshdriver` crate.
/// Wraps the errors of the argument, io, session and workflow modules.
#[derive(Debug, Error)]
pub enum DriverError {
    #[error("! ARGUMENT ERROR:\n{0}")]
    ArgError(#[from] args::ArgError),
    #[error("! FILE ERROR:\n{0}")]
    IoError(#[from] io::IoError),
    #[error("! SESSION ERROR:\n{0}")]
    SessionError(#[from] session::SessionError),
    #[error("! WORKFLOW ERROR:\n{0}")]
    WorkflowError(#[from] workflow::WorkflowError),
}
impl DriverError {
    /// True if the input geometry was missing.
    pub fn is_file_not_found(&self) -> bool {
        matches!(self, DriverError::IoError(error) if error.is_not_found())
    }
}

/// Result type for the `meshdriver` crate.
pub type DriverResult<T> = std::result::Result<T, DriverError>;
