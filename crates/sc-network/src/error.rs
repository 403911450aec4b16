//! Network-model error type.

use thiserror::Error;

use sc_core::CoreError;

/// Errors produced while building or loading a corridor.
#[derive(Debug, Error)]
pub enum NetworkError {
    #[error("invalid configuration for intersection {intersection:?}, field `{field}`: {reason}")]
    InvalidIntersectionConfig {
        intersection: String,
        field:        String,
        reason:       String,
    },

    #[error("lane {0:?} is declared more than once")]
    DuplicateLane(String),

    #[error("intersection {0:?} is declared more than once")]
    DuplicateIntersection(String),

    #[error("network parse error: {0}")]
    Parse(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Core(#[from] CoreError),
}

impl NetworkError {
    pub(crate) fn invalid(
        intersection: &str,
        field: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        NetworkError::InvalidIntersectionConfig {
            intersection: intersection.to_owned(),
            field:        field.into(),
            reason:       reason.into(),
        }
    }
}

pub type NetworkResult<T> = Result<T, NetworkError>;
