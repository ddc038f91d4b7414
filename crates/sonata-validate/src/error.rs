//! Error types for sonata-validate
//!
//! Problems with the validated descriptors are never errors here; they are
//! recorded as events. An `Err` from a validation run means the run itself
//! could not complete.

use thiserror::Error;

/// Result type alias using sonata-validate's Error type
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// Error raised by the core layers (event catalog, schema resolver, reader)
    #[error(transparent)]
    Core(#[from] sonata_core::Error),

    /// Package archive could not be opened or extracted
    #[error("Package archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    /// Inconsistent in-memory state
    #[error("Internal error: {message}")]
    Internal { message: String },

    /// The run was cancelled at a suspension point
    #[error("Validation cancelled")]
    Cancelled,

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }
}
