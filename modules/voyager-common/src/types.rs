use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Prefix the UI puts in front of captcha bytes to render them inline.
pub const JPEG_DATA_URL_PREFIX: &str = "data:image/jpeg;base64,";

// --- Fetch ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    Json,
    Html,
    Text,
    /// Non-text body, carried base64-encoded.
    Binary,
}

impl std::fmt::Display for ContentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            ContentKind::Json => "json",
            ContentKind::Html => "html",
            ContentKind::Text => "text",
            ContentKind::Binary => "binary",
        };
        f.write_str(label)
    }
}

/// Body of a generic URL fetch, normalized for display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FetchResult {
    pub content: String,
    pub kind: ContentKind,
}

/// A captcha image held in memory between fetch and upload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaptchaAsset {
    /// Base64-encoded JPEG, without a data-URL prefix.
    pub image_base64: String,
    pub fetched_at: DateTime<Utc>,
}

impl CaptchaAsset {
    pub fn new(image_base64: impl Into<String>) -> Self {
        Self {
            image_base64: image_base64.into(),
            fetched_at: Utc::now(),
        }
    }

    pub fn data_url(&self) -> String {
        format!("{JPEG_DATA_URL_PREFIX}{}", self.image_base64)
    }
}

// --- Storage ---

/// A numbered upload folder as seen in one listing of the storage root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StorageFolder {
    pub path: String,
    /// 0 for the bare `<suffix>` folder, `n` for `<n>-<suffix>`.
    pub ordinal: u32,
    pub file_count: usize,
}

/// Outcome of one upload attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UploadRecord {
    pub destination: String,
    pub success: bool,
    pub error: Option<String>,
}

impl UploadRecord {
    pub fn stored(destination: impl Into<String>) -> Self {
        Self {
            destination: destination.into(),
            success: true,
            error: None,
        }
    }

    pub fn failed(destination: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            destination: destination.into(),
            success: false,
            error: Some(error.into()),
        }
    }
}

/// Aggregated log of one batch run; lines are in completion order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchReport {
    pub folder: String,
    pub lines: Vec<String>,
    pub succeeded: usize,
}

impl BatchReport {
    pub fn attempted(&self) -> usize {
        self.lines.len()
    }

    pub fn failed(&self) -> usize {
        self.attempted() - self.succeeded
    }
}

// --- UI state ---

/// Result of a server action as consumed by the UI: either data or an error string.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ActionState {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub captcha: Option<CaptchaAsset>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<FetchResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub urls: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub storage_success: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub batch: Option<BatchReport>,
}

impl ActionState {
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            error: Some(message.into()),
            ..Default::default()
        }
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}
