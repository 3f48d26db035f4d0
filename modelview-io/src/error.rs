//! Error types for I/O operations

use thiserror::Error;

/// Errors that can occur while reading a model
#[derive(Error, Debug)]
pub enum IoError {
    #[error("File not found: {path}")]
    FileNotFound { path: String },

    #[error("Invalid file format: {format}")]
    InvalidFormat { format: String },

    #[error("Parse error: {message}")]
    ParseError { message: String },

    #[error("glTF error: {0}")]
    Gltf(#[from] gltf::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<IoError> for modelview_core::Error {
    fn from(e: IoError) -> Self {
        match e {
            IoError::Io(e) => modelview_core::Error::Io(e),
            IoError::InvalidFormat { format } => modelview_core::Error::UnsupportedFormat(format),
            other => modelview_core::Error::InvalidData(other.to_string()),
        }
    }
}
