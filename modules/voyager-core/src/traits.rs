// Trait seams for the three outbound dependencies.
//
// ContentFetcher wraps the captcha service and arbitrary page fetches.
// FolderStore wraps the storage provider's list / create / upload calls.
// UrlExtractor wraps the model call that pulls URLs out of text.
//
// Actions, rotation and batch code only see these traits, so tests run
// against the in-memory mocks in `testing` with no network.

use anyhow::Result;
use async_trait::async_trait;

use dropbox_client::{DropboxClient, FileMetadata, Metadata, UploadArg};
use voyager_common::{CaptchaAsset, FetchResult, VoyagerError};

// ---------------------------------------------------------------------------
// ContentFetcher
// ---------------------------------------------------------------------------

#[async_trait]
pub trait ContentFetcher: Send + Sync {
    /// Fetch a fresh captcha from the configured captcha service.
    async fn fetch_captcha(&self) -> Result<CaptchaAsset, VoyagerError>;

    /// Fetch an arbitrary user-supplied URL and classify its body.
    async fn fetch_url(&self, url: &str) -> Result<FetchResult, VoyagerError>;
}

// ---------------------------------------------------------------------------
// FolderStore
// ---------------------------------------------------------------------------

#[async_trait]
pub trait FolderStore: Send + Sync {
    /// One level of `path`, at most `limit` entries when given. Implementations
    /// follow pagination until the limit is met or the folder is exhausted.
    async fn list_folder(
        &self,
        path: &str,
        limit: Option<u32>,
    ) -> dropbox_client::Result<Vec<Metadata>>;

    async fn create_folder(&self, path: &str) -> dropbox_client::Result<()>;

    async fn upload(&self, arg: &UploadArg, bytes: Vec<u8>)
        -> dropbox_client::Result<FileMetadata>;
}

#[async_trait]
impl FolderStore for DropboxClient {
    async fn list_folder(
        &self,
        path: &str,
        limit: Option<u32>,
    ) -> dropbox_client::Result<Vec<Metadata>> {
        self.list_folder_entries(path, limit).await
    }

    async fn create_folder(&self, path: &str) -> dropbox_client::Result<()> {
        DropboxClient::create_folder(self, path).await.map(|_| ())
    }

    async fn upload(
        &self,
        arg: &UploadArg,
        bytes: Vec<u8>,
    ) -> dropbox_client::Result<FileMetadata> {
        DropboxClient::upload(self, arg, bytes).await
    }
}

// ---------------------------------------------------------------------------
// UrlExtractor
// ---------------------------------------------------------------------------

#[async_trait]
pub trait UrlExtractor: Send + Sync {
    /// URLs the model finds in `fetched_data`, passed through unvalidated.
    async fn extract_urls(&self, fetched_data: &str) -> Result<Vec<String>>;
}
