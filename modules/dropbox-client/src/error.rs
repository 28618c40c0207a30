use thiserror::Error;

pub type Result<T> = std::result::Result<T, DropboxError>;

#[derive(Debug, Error)]
pub enum DropboxError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("API error (status {status} {reason}): {message}")]
    Api {
        status: u16,
        reason: String,
        message: String,
    },

    #[error("Path not found: {0}")]
    PathNotFound(String),

    #[error("Path conflict: {0}")]
    Conflict(String),

    #[error("Parse error: {0}")]
    Parse(String),
}

impl DropboxError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, DropboxError::PathNotFound(_))
    }
}

impl From<reqwest::Error> for DropboxError {
    fn from(err: reqwest::Error) -> Self {
        DropboxError::Network(err.to_string())
    }
}

impl From<serde_json::Error> for DropboxError {
    fn from(err: serde_json::Error) -> Self {
        DropboxError::Parse(err.to_string())
    }
}
