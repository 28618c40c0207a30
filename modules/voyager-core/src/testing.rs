// Test mocks for the three trait seams.
//
// - MockFetcher (ContentFetcher): scripted captcha responses + URL→FetchResult map
// - MockFolderStore (FolderStore): stateful in-memory folder tree
// - MockExtractor (UrlExtractor): fixed URL list or failure

use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};
use std::sync::Mutex;

use anyhow::{bail, Result};
use async_trait::async_trait;

use dropbox_client::{DropboxError, FileMetadata, FolderMetadata, Metadata, UploadArg};
use voyager_common::{CaptchaAsset, FetchResult, VoyagerError};

use crate::traits::{ContentFetcher, FolderStore, UrlExtractor};

/// Base64 of a tiny JPEG header, good enough as a captcha payload.
pub const SAMPLE_CAPTCHA: &str = "/9j/4AAQSkZJRg==";

// ---------------------------------------------------------------------------
// MockFetcher
// ---------------------------------------------------------------------------

/// Captcha calls pop scripted responses in call order; once the script is
/// exhausted every call returns [`SAMPLE_CAPTCHA`]. URL fetches look up a map
/// and fail for unregistered URLs.
pub struct MockFetcher {
    captchas: Mutex<VecDeque<Result<CaptchaAsset, VoyagerError>>>,
    pages: HashMap<String, FetchResult>,
    captcha_calls: Mutex<usize>,
}

impl Default for MockFetcher {
    fn default() -> Self {
        Self::new()
    }
}

impl MockFetcher {
    pub fn new() -> Self {
        Self {
            captchas: Mutex::new(VecDeque::new()),
            pages: HashMap::new(),
            captcha_calls: Mutex::new(0),
        }
    }

    pub fn on_captcha(self, image_base64: &str) -> Self {
        self.push(Ok(CaptchaAsset::new(image_base64)))
    }

    pub fn on_captcha_error(self, error: VoyagerError) -> Self {
        self.push(Err(error))
    }

    pub fn on_page(mut self, url: &str, result: FetchResult) -> Self {
        self.pages.insert(url.to_string(), result);
        self
    }

    pub fn captcha_calls(&self) -> usize {
        *self.captcha_calls.lock().unwrap()
    }

    fn push(self, response: Result<CaptchaAsset, VoyagerError>) -> Self {
        self.captchas.lock().unwrap().push_back(response);
        self
    }
}

#[async_trait]
impl ContentFetcher for MockFetcher {
    async fn fetch_captcha(&self) -> Result<CaptchaAsset, VoyagerError> {
        *self.captcha_calls.lock().unwrap() += 1;
        self.captchas
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(CaptchaAsset::new(SAMPLE_CAPTCHA)))
    }

    async fn fetch_url(&self, url: &str) -> Result<FetchResult, VoyagerError> {
        crate::fetch::validate_url(url)?;
        self.pages.get(url).cloned().ok_or_else(|| VoyagerError::Upstream {
            status: 404,
            reason: "Not Found".to_string(),
            body: format!("MockFetcher: no page registered for {url}"),
        })
    }
}

// ---------------------------------------------------------------------------
// MockFolderStore
// ---------------------------------------------------------------------------

/// One recorded upload.
#[derive(Debug, Clone)]
pub struct RecordedUpload {
    pub arg: serde_json::Value,
    pub bytes: Vec<u8>,
}

#[derive(Default)]
struct StoreState {
    /// folder path → file names
    folders: BTreeMap<String, Vec<String>>,
    created: Vec<String>,
    uploads: Vec<RecordedUpload>,
    list_calls: Vec<(String, Option<u32>)>,
}

/// In-memory folder tree. Folders are keyed by full path; the parent of a
/// folder is everything before its last `/`, with `""` as the root.
#[derive(Default)]
pub struct MockFolderStore {
    state: Mutex<StoreState>,
    failing_lists: HashSet<String>,
    failing_creates: bool,
    failing_uploads: bool,
}

impl MockFolderStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a folder holding `files` files.
    pub fn with_folder(self, path: &str, files: usize) -> Self {
        let names = (0..files).map(|i| format!("{i}.jpg")).collect();
        self.state
            .lock()
            .unwrap()
            .folders
            .insert(path.to_string(), names);
        self
    }

    /// Listing `path` fails with a non-404 API error.
    pub fn failing_list(mut self, path: &str) -> Self {
        self.failing_lists.insert(path.to_string());
        self
    }

    /// Every folder creation fails with a conflict, as if another allocator won the race.
    pub fn failing_creates(mut self) -> Self {
        self.failing_creates = true;
        self
    }

    pub fn failing_uploads(mut self) -> Self {
        self.failing_uploads = true;
        self
    }

    pub fn created(&self) -> Vec<String> {
        self.state.lock().unwrap().created.clone()
    }

    pub fn uploads(&self) -> Vec<RecordedUpload> {
        self.state.lock().unwrap().uploads.clone()
    }

    pub fn list_calls(&self) -> Vec<(String, Option<u32>)> {
        self.state.lock().unwrap().list_calls.clone()
    }

    pub fn file_count(&self, folder: &str) -> usize {
        self.state
            .lock()
            .unwrap()
            .folders
            .get(folder)
            .map(Vec::len)
            .unwrap_or(0)
    }
}

fn parent_of(path: &str) -> &str {
    path.rfind('/').map(|i| &path[..i]).unwrap_or("")
}

fn name_of(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

#[async_trait]
impl FolderStore for MockFolderStore {
    async fn list_folder(
        &self,
        path: &str,
        limit: Option<u32>,
    ) -> dropbox_client::Result<Vec<Metadata>> {
        let mut state = self.state.lock().unwrap();
        state.list_calls.push((path.to_string(), limit));

        if self.failing_lists.contains(path) {
            return Err(DropboxError::Api {
                status: 500,
                reason: "Internal Server Error".to_string(),
                message: "MockFolderStore: listing failed".to_string(),
            });
        }

        if !path.is_empty() && !state.folders.contains_key(path) {
            return Err(DropboxError::PathNotFound(path.to_string()));
        }

        let mut entries: Vec<Metadata> = state
            .folders
            .keys()
            .filter(|f| parent_of(f) == path)
            .map(|f| {
                Metadata::Folder(FolderMetadata {
                    name: name_of(f).to_string(),
                    id: format!("id:{f}"),
                    path_display: Some(f.clone()),
                    path_lower: Some(f.to_lowercase()),
                })
            })
            .collect();

        if let Some(files) = state.folders.get(path) {
            entries.extend(files.iter().map(|name| {
                Metadata::File(FileMetadata {
                    name: name.clone(),
                    id: format!("id:{path}/{name}"),
                    path_display: Some(format!("{path}/{name}")),
                    path_lower: None,
                    size: 0,
                })
            }));
        }

        if let Some(limit) = limit {
            entries.truncate(limit as usize);
        }
        Ok(entries)
    }

    async fn create_folder(&self, path: &str) -> dropbox_client::Result<()> {
        let mut state = self.state.lock().unwrap();
        state.created.push(path.to_string());

        if self.failing_creates || state.folders.contains_key(path) {
            return Err(DropboxError::Conflict(path.to_string()));
        }
        state.folders.insert(path.to_string(), Vec::new());
        Ok(())
    }

    async fn upload(
        &self,
        arg: &UploadArg,
        bytes: Vec<u8>,
    ) -> dropbox_client::Result<FileMetadata> {
        let mut state = self.state.lock().unwrap();
        state.uploads.push(RecordedUpload {
            arg: serde_json::to_value(arg)?,
            bytes: bytes.clone(),
        });

        if self.failing_uploads {
            return Err(DropboxError::Api {
                status: 507,
                reason: "Insufficient Storage".to_string(),
                message: r#"{"error_summary":"path/insufficient_space/"}"#.to_string(),
            });
        }

        let folder = parent_of(&arg.path).to_string();
        let name = name_of(&arg.path).to_string();
        let files = state.folders.entry(folder).or_default();
        if files.contains(&name) {
            return Err(DropboxError::Api {
                status: 409,
                reason: "Conflict".to_string(),
                message: r#"{"error_summary":"path/conflict/file/"}"#.to_string(),
            });
        }
        files.push(name.clone());

        Ok(FileMetadata {
            name,
            id: format!("id:{}", arg.path),
            path_display: Some(arg.path.clone()),
            path_lower: Some(arg.path.to_lowercase()),
            size: bytes.len() as u64,
        })
    }
}

// ---------------------------------------------------------------------------
// MockExtractor
// ---------------------------------------------------------------------------

pub struct MockExtractor {
    urls: Option<Vec<String>>,
}

impl MockExtractor {
    pub fn returning(urls: &[&str]) -> Self {
        Self {
            urls: Some(urls.iter().map(|u| u.to_string()).collect()),
        }
    }

    pub fn failing() -> Self {
        Self { urls: None }
    }
}

#[async_trait]
impl UrlExtractor for MockExtractor {
    async fn extract_urls(&self, _fetched_data: &str) -> Result<Vec<String>> {
        match self.urls {
            Some(ref urls) => Ok(urls.clone()),
            None => bail!("MockExtractor: model unavailable"),
        }
    }
}
