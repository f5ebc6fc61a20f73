use thiserror::Error;

/// Request documents that are well-formed JSON but not acceptable.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("data type is {found:?}, expected {expected:?}")]
    UnexpectedType { expected: &'static str, found: String },

    #[error("attribute {name:?} {reason}")]
    InvalidAttribute { name: &'static str, reason: String },
}

pub type ProtocolResult<T> = Result<T, ProtocolError>;
