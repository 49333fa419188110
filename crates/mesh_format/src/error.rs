//! This module contains all errors that can be returned by functions in this crate.

use thiserror::Error;

pub type Result<T> = ::std::result::Result<T, MeshError>;

/// Every failure of parsing, validating, writing or encoding a mesh.
///
/// All variants are fatal: no partially parsed mesh is ever returned.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum MeshError {
    /// The input ended before a mandatory block was complete
    #[error("Unexpected end of file.")]
    UnexpectedEndOfInput,
    /// A mandatory directive is missing, malformed or the input is not UTF-8
    #[error("Invalid header: {0}")]
    InvalidHeader(String),
    /// A data line (vertex, triangle, metadata or submesh entry) is malformed
    #[error("Line {line}: {message}")]
    InvalidToken { line: usize, message: String },
    /// A declared element count is missing, not an integer or negative
    #[error("Line {line}: {message}")]
    InvalidCount { line: usize, message: String },
    /// A cross-referential invariant does not hold on a structurally valid mesh
    #[error("Validation failed: {0}")]
    ValidationFailed(String),
    /// A value can not be expressed in the text format
    #[error("Unrepresentable value: {0}")]
    Unrepresentable(String),
    #[error("IO Error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization Error: {0}")]
    Serialization(#[from] Box<bincode::ErrorKind>),
    #[error("Formatting Error: {0}")]
    Fmt(#[from] std::fmt::Error),
}

impl MeshError {
    /// The 1-based source line the error points at, if it has one.
    pub fn line(&self) -> Option<usize> {
        match self {
            MeshError::InvalidToken { line, .. } | MeshError::InvalidCount { line, .. } => {
                Some(*line)
            }
            _ => None,
        }
    }

    pub(crate) fn token(line: usize, message: impl Into<String>) -> Self {
        MeshError::InvalidToken {
            line,
            message: message.into(),
        }
    }

    pub(crate) fn count(line: usize, message: impl Into<String>) -> Self {
        MeshError::InvalidCount {
            line,
            message: message.into(),
        }
    }
}
