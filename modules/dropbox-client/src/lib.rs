pub mod error;
pub mod types;

pub use error::{DropboxError, Result};
pub use types::{
    CreateFolderArg, FileMetadata, FolderMetadata, ListFolderArg, ListFolderContinueArg,
    ListFolderResult, Metadata, UploadArg, WriteMode,
};

use serde::de::DeserializeOwned;
use serde::Serialize;
use types::{ApiErrorBody, CreateFolderResult};

const API_URL: &str = "https://api.dropboxapi.com/2";
const CONTENT_URL: &str = "https://content.dropboxapi.com/2";

/// Dropbox accepts `limit` in 1..=2000 for list_folder.
const MAX_LIST_LIMIT: u32 = 2000;

pub struct DropboxClient {
    client: reqwest::Client,
    token: String,
    api_url: String,
    content_url: String,
}

impl DropboxClient {
    pub fn new(token: impl Into<String>) -> Self {
        Self::with_http(reqwest::Client::new(), token)
    }

    pub fn with_http(client: reqwest::Client, token: impl Into<String>) -> Self {
        Self {
            client,
            token: token.into(),
            api_url: API_URL.to_string(),
            content_url: CONTENT_URL.to_string(),
        }
    }

    /// Point both the RPC and content hosts at `base` (used against mock servers).
    pub fn with_base_url(mut self, base: &str) -> Self {
        let base = base.trim_end_matches('/');
        self.api_url = base.to_string();
        self.content_url = base.to_string();
        self
    }

    /// List one page of `path`. The Dropbox root is the empty string.
    ///
    /// `limit` caps the page size, not the folder; follow `cursor` while
    /// `has_more` is set.
    pub async fn list_folder(&self, path: &str, limit: Option<u32>) -> Result<ListFolderResult> {
        let arg = ListFolderArg {
            path: path.to_string(),
            recursive: false,
            limit: limit.map(|l| l.clamp(1, MAX_LIST_LIMIT)),
        };

        let result: ListFolderResult = self.rpc("files/list_folder", &arg, path).await?;
        tracing::debug!(path, count = result.entries.len(), has_more = result.has_more, "Listed folder");
        Ok(result)
    }

    /// Next page of a listing started by [`list_folder`](Self::list_folder).
    pub async fn list_folder_continue(&self, cursor: &str) -> Result<ListFolderResult> {
        let arg = ListFolderContinueArg {
            cursor: cursor.to_string(),
        };

        let result: ListFolderResult = self.rpc("files/list_folder/continue", &arg, "").await?;
        tracing::debug!(count = result.entries.len(), has_more = result.has_more, "Listed next page");
        Ok(result)
    }

    /// List `path` across pages until `limit` entries are collected or the
    /// folder is exhausted. `None` reads the whole folder.
    pub async fn list_folder_entries(&self, path: &str, limit: Option<u32>) -> Result<Vec<Metadata>> {
        let wanted = limit.map(|l| l as usize);
        let mut page = self.list_folder(path, limit).await?;
        let mut entries = std::mem::take(&mut page.entries);

        while page.has_more && wanted.map_or(true, |w| entries.len() < w) {
            page = self.list_folder_continue(&page.cursor).await?;
            entries.append(&mut page.entries);
        }

        if let Some(w) = wanted {
            entries.truncate(w);
        }
        Ok(entries)
    }

    /// Create a folder. An existing folder at `path` yields [`DropboxError::Conflict`].
    pub async fn create_folder(&self, path: &str) -> Result<FolderMetadata> {
        let arg = CreateFolderArg {
            path: path.to_string(),
            autorename: false,
        };

        let result: CreateFolderResult = self.rpc("files/create_folder_v2", &arg, path).await?;
        tracing::info!(path, "Created folder");
        Ok(result.metadata)
    }

    /// Upload `bytes` as a single request (files up to 150 MB).
    ///
    /// Errors carry the raw status and body; 409s are not reclassified here.
    pub async fn upload(&self, arg: &UploadArg, bytes: Vec<u8>) -> Result<FileMetadata> {
        let url = format!("{}/files/upload", self.content_url);
        let resp = self
            .client
            .post(&url)
            .bearer_auth(&self.token)
            .header("Dropbox-API-Arg", serde_json::to_string(arg)?)
            .header("Content-Type", "application/octet-stream")
            .body(bytes)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            tracing::warn!(path = %arg.path, status = status.as_u16(), "Dropbox upload rejected");
            return Err(DropboxError::Api {
                status: status.as_u16(),
                reason: status.canonical_reason().unwrap_or_default().to_string(),
                message,
            });
        }

        let meta: FileMetadata = resp.json().await?;
        tracing::info!(path = ?meta.path_display, size = meta.size, "Uploaded file");
        Ok(meta)
    }

    async fn rpc<A: Serialize, T: DeserializeOwned>(
        &self,
        endpoint: &str,
        arg: &A,
        path: &str,
    ) -> Result<T> {
        let url = format!("{}/{}", self.api_url, endpoint);
        let resp = self
            .client
            .post(&url)
            .bearer_auth(&self.token)
            .json(arg)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(classify_error(status, body, path));
        }

        Ok(resp.json().await?)
    }
}

/// Map an RPC failure onto the error variants callers branch on.
fn classify_error(status: reqwest::StatusCode, body: String, path: &str) -> DropboxError {
    if status == reqwest::StatusCode::CONFLICT {
        if let Ok(parsed) = serde_json::from_str::<ApiErrorBody>(&body) {
            let summary = parsed.error_summary;
            if summary.starts_with("path/not_found") {
                return DropboxError::PathNotFound(path.to_string());
            }
            if summary.starts_with("path/conflict") {
                return DropboxError::Conflict(path.to_string());
            }
        }
    }

    DropboxError::Api {
        status: status.as_u16(),
        reason: status.canonical_reason().unwrap_or_default().to_string(),
        message: body,
    }
}
