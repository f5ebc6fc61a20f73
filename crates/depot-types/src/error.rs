use thiserror::Error;

/// Errors produced by type construction and validation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid {field} {value:?}: {reason}")]
    InvalidCoordinate {
        field: &'static str,
        value: String,
        reason: String,
    },

    #[error("serialization error: {0}")]
    Serialization(String),
}
