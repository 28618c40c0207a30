use thiserror::Error;

pub type Result<T> = std::result::Result<T, VoyagerError>;

/// User-facing hint for transport failures that never reached the server.
pub const NETWORK_HINT: &str =
    "Network error or invalid URL. Please check the URL and your connection.";

#[derive(Error, Debug)]
pub enum VoyagerError {
    /// Missing or malformed configuration; fatal to the whole operation.
    #[error("{0}")]
    Config(String),

    #[error("{0}")]
    Network(String),

    #[error("Failed to fetch URL: {status} {reason}")]
    Upstream {
        status: u16,
        reason: String,
        body: String,
    },

    #[error("Invalid URL: {0}")]
    Validation(String),

    #[error("Unexpected response body: {0}")]
    Parse(String),

    #[error("Could not find captcha in the response")]
    MissingCaptcha,

    #[error("Extraction error: {0}")]
    Extraction(String),

    /// A rejected or failed upload, already phrased for the user.
    #[error("{0}")]
    Storage(String),
}

impl VoyagerError {
    pub fn missing_token() -> Self {
        VoyagerError::Config(
            "Dropbox access token is not configured. Please set DROPBOX_ACCESS_TOKEN in your .env file."
                .to_string(),
        )
    }

    pub fn is_config(&self) -> bool {
        matches!(self, VoyagerError::Config(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upstream_display_carries_status_and_reason() {
        let err = VoyagerError::Upstream {
            status: 503,
            reason: "Service Unavailable".into(),
            body: "down".into(),
        };
        assert_eq!(err.to_string(), "Failed to fetch URL: 503 Service Unavailable");
    }

    #[test]
    fn missing_token_is_config_error() {
        let err = VoyagerError::missing_token();
        assert!(err.is_config());
        assert!(err.to_string().contains("DROPBOX_ACCESS_TOKEN"));
    }
}
