use std::fmt;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ShopdeskError {
    // Remote taxonomy
    #[error("network error: {0}")]
    Network(String),

    #[error("server error ({status}): {message}")]
    Server { status: u16, message: String },

    #[error("session expired, sign in again")]
    AuthExpired,

    #[error("access denied: {0}")]
    Forbidden(String),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("unexpected response from server: {0}")]
    Decode(String),

    // Local errors
    #[error("configuration error: {0}")]
    Config(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    YamlParse(#[from] serde_yaml_ng::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, ShopdeskError>;

/// Coarse classification of an error, cheap to copy into view state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Network,
    Server,
    AuthExpired,
    Forbidden,
    Validation,
    Local,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::Network => "network",
            ErrorKind::Server => "server",
            ErrorKind::AuthExpired => "auth_expired",
            ErrorKind::Forbidden => "forbidden",
            ErrorKind::Validation => "validation",
            ErrorKind::Local => "local",
        };
        write!(f, "{name}")
    }
}

impl ShopdeskError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ShopdeskError::Network(_) => ErrorKind::Network,
            ShopdeskError::Server { .. } | ShopdeskError::Decode(_) => ErrorKind::Server,
            ShopdeskError::AuthExpired => ErrorKind::AuthExpired,
            ShopdeskError::Forbidden(_) => ErrorKind::Forbidden,
            ShopdeskError::Validation(_) => ErrorKind::Validation,
            _ => ErrorKind::Local,
        }
    }

    /// HTTP status carried by the error, if the server answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            ShopdeskError::Server { status, .. } => Some(*status),
            ShopdeskError::AuthExpired => Some(401),
            ShopdeskError::Forbidden(_) => Some(403),
            _ => None,
        }
    }
}

/// Snapshot of an error kept in view state after the original error is gone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorInfo {
    pub kind: ErrorKind,
    pub status: Option<u16>,
    pub message: String,
}

impl From<&ShopdeskError> for ErrorInfo {
    fn from(err: &ShopdeskError) -> Self {
        Self {
            kind: err.kind(),
            status: err.status(),
            message: err.to_string(),
        }
    }
}

impl fmt::Display for ErrorInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}
