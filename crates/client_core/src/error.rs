use shared::error::ErrorCode;
use thiserror::Error;

/// A form field that failed client-side checks before any request was sent.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {reason}")]
pub struct ValidationError {
    pub field: &'static str,
    pub reason: String,
}

impl ValidationError {
    pub fn new(field: &'static str, reason: impl Into<String>) -> Self {
        Self {
            field,
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("not logged in")]
    NotLoggedIn,
    #[error("session expired, please log in again")]
    SessionExpired,
    #[error("invalid input: {0}")]
    Validation(#[from] ValidationError),
    #[error("server rejected request ({status}): {message}")]
    Api {
        status: u16,
        code: ErrorCode,
        message: String,
    },
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("invalid server url: {0}")]
    Url(#[from] url::ParseError),
    #[error("i/o error on {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("session store error: {0}")]
    Session(String),
    #[error("csv import rejected: {0}")]
    CsvImport(String),
    #[error("{kind} {id} not found")]
    NotFound { kind: &'static str, id: i64 },
}

impl ClientError {
    pub fn io(path: impl AsRef<std::path::Path>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.as_ref().display().to_string(),
            source,
        }
    }

    /// The backend classification, when the failure came from the backend.
    pub fn code(&self) -> Option<ErrorCode> {
        match self {
            Self::Api { code, .. } => Some(*code),
            Self::NotLoggedIn | Self::SessionExpired => Some(ErrorCode::Unauthorized),
            Self::Validation(_) | Self::CsvImport(_) => Some(ErrorCode::Validation),
            Self::NotFound { .. } => Some(ErrorCode::NotFound),
            _ => None,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        self.code() == Some(ErrorCode::Unauthorized)
    }
}

pub type Result<T> = std::result::Result<T, ClientError>;
