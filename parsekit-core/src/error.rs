use thiserror::Error;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum TagError {
    #[error("invalid type: {0}")]
    UnrecognizedWireType(String),
    #[error("malformed date field: {0}")]
    MalformedDateField(String),
    #[error("encode failure: {0}")]
    EncodeFailure(String),
    #[error("decode failure: {0}")]
    DecodeFailure(String),
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ConstraintError {
    #[error("field name cannot be empty")]
    EmptyFieldName,
    #[error("limit must be -1 (unset) or greater, got {0}")]
    InvalidLimit(i64),
    #[error("skip must be 0 or greater, got {0}")]
    InvalidSkip(i64),
}
