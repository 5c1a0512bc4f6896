use parsekit_core::{ConstraintError, TagError};
use thiserror::Error;

/// Where a failure originated.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorDomain {
    /// The backend answered with an error status.
    Parse,
    /// A body could not be encoded or decoded.
    Json,
    /// The request never produced a response.
    Network,
    /// Misuse or misconfiguration on the client side.
    Client,
}

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("invalid configuration: application_id is required")]
    MissingApplicationId,
    #[error("invalid configuration: api_key is required")]
    MissingApiKey,
    #[error("invalid configuration: invalid base_url: {0}")]
    InvalidBaseUrl(String),
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("a request is already in flight for this {0}")]
    Busy(&'static str),
    #[error("object has no objectId; save it first")]
    MissingObjectId,
    #[error(transparent)]
    Tag(#[from] TagError),
    #[error(transparent)]
    Constraint(#[from] ConstraintError),
    #[error("json error: {0}")]
    Json(String),
    #[error("request to parse failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("parse returned HTTP {status} (code {code}): {message}")]
    Api {
        status: u16,
        code: i64,
        message: String,
    },
    #[error("invalid parse response: {0}")]
    InvalidResponse(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl ParseError {
    pub fn domain(&self) -> ErrorDomain {
        match self {
            ParseError::Api { .. } => ErrorDomain::Parse,
            ParseError::Json(_) | ParseError::InvalidResponse(_) => ErrorDomain::Json,
            ParseError::Request(_) => ErrorDomain::Network,
            _ => ErrorDomain::Client,
        }
    }

    /// Backend error code, e.g. 101 for "object not found".
    pub fn code(&self) -> Option<i64> {
        match self {
            ParseError::Api { code, .. } => Some(*code),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for ParseError {
    fn from(value: serde_json::Error) -> Self {
        ParseError::Json(value.to_string())
    }
}
