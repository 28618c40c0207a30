//! Server actions behind the UI.
//!
//! Every action returns an [`ActionState`]; errors are folded into its
//! `error` field and never escape as `Err`.

use std::sync::Arc;

use anyhow::Result;
use tracing::{info, warn};

use ai_client::OpenAi;
use dropbox_client::DropboxClient;
use voyager_common::{ActionState, Config, VoyagerError};

use crate::batch::{log_line, BatchRunner};
use crate::extract::OpenAiUrlExtractor;
use crate::fetch::HttpFetcher;
use crate::rotation::{FolderAllocator, FolderLayout};
use crate::traits::{ContentFetcher, FolderStore, UrlExtractor};
use crate::upload::upload_captcha;

/// Dependency container for all actions. Cheap to clone.
#[derive(Clone)]
pub struct Voyager {
    fetcher: Arc<dyn ContentFetcher>,
    store: Option<Arc<dyn FolderStore>>,
    extractor: Option<Arc<dyn UrlExtractor>>,
    layout: FolderLayout,
    batch_size: usize,
}

impl Voyager {
    pub fn new(fetcher: Arc<dyn ContentFetcher>, layout: FolderLayout) -> Self {
        Self {
            fetcher,
            store: None,
            extractor: None,
            layout,
            batch_size: 10,
        }
    }

    /// Wire real clients from config. The store and extractor stay unset when
    /// their credentials are missing; actions needing them report it.
    pub fn from_config(config: &Config) -> Result<Self> {
        let http = reqwest::Client::new();
        let fetcher = Arc::new(HttpFetcher::from_config(config)?);

        let mut voyager = Self::new(fetcher, FolderLayout::from_config(config))
            .with_batch_size(config.batch_size);

        if let Some(ref token) = config.dropbox_access_token {
            voyager = voyager.with_store(Arc::new(DropboxClient::with_http(http, token.clone())));
        } else {
            warn!("DROPBOX_ACCESS_TOKEN not set; uploads are disabled");
        }

        if let Some(ref key) = config.openai_api_key {
            let ai = OpenAi::new(key.clone(), config.openai_model.clone());
            voyager = voyager.with_extractor(Arc::new(OpenAiUrlExtractor::new(ai)));
        } else {
            warn!("OPENAI_API_KEY not set; URL extraction is disabled");
        }

        Ok(voyager)
    }

    pub fn with_store(mut self, store: Arc<dyn FolderStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn with_extractor(mut self, extractor: Arc<dyn UrlExtractor>) -> Self {
        self.extractor = Some(extractor);
        self
    }

    pub fn with_batch_size(mut self, size: usize) -> Self {
        self.batch_size = size;
        self
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    pub fn uploads_enabled(&self) -> bool {
        self.store.is_some()
    }

    pub fn extraction_enabled(&self) -> bool {
        self.extractor.is_some()
    }

    fn require_store(&self) -> Result<&Arc<dyn FolderStore>, VoyagerError> {
        self.store.as_ref().ok_or_else(VoyagerError::missing_token)
    }

    // --- Actions ---

    pub async fn fetch_captcha(&self) -> ActionState {
        match self.fetcher.fetch_captcha().await {
            Ok(captcha) => ActionState {
                captcha: Some(captcha),
                ..Default::default()
            },
            Err(e) => ActionState::error(e.to_string()),
        }
    }

    /// Fetch `url` and, when `extract` is set, ask the model for the URLs in it.
    /// A failed extraction keeps the fetched content and reports the error.
    pub async fn fetch_url(&self, url: &str, extract: bool) -> ActionState {
        let content = match self.fetcher.fetch_url(url).await {
            Ok(content) => content,
            Err(e) => return ActionState::error(e.to_string()),
        };

        let mut state = ActionState::default();

        if extract {
            match self.extractor {
                Some(ref extractor) => match extractor.extract_urls(&content.content).await {
                    Ok(urls) => state.urls = Some(urls),
                    Err(e) => {
                        warn!(error = %e, "URL extraction failed");
                        state.error = Some(VoyagerError::Extraction(e.to_string()).to_string());
                    }
                },
                None => {
                    state.error = Some(
                        VoyagerError::Config(
                            "OpenAI API key is not configured. Please set OPENAI_API_KEY in your .env file."
                                .to_string(),
                        )
                        .to_string(),
                    )
                }
            }
        }

        state.content = Some(content);
        state
    }

    /// Upload a captcha (base64 or `data:image/jpeg;base64,` URL) into the active folder.
    pub async fn send_to_storage(&self, captcha: &str) -> ActionState {
        let store = match self.require_store() {
            Ok(store) => store,
            Err(e) => return ActionState::error(e.to_string()),
        };

        if captcha.trim().is_empty() {
            return ActionState::error("No captcha image to upload.");
        }

        let folder = FolderAllocator::new(store.as_ref(), &self.layout).allocate().await;
        let record = upload_captcha(store.as_ref(), &folder.path, captcha, None).await;

        match record.error {
            None => ActionState {
                storage_success: Some(format!(
                    "Image uploaded successfully to Dropbox as {}",
                    record.destination
                )),
                ..Default::default()
            },
            Some(err) => ActionState::error(err),
        }
    }

    /// One fetch followed by one upload, summarized as a log line.
    pub async fn fetch_and_send(&self) -> ActionState {
        let fetched = self.fetch_captcha().await;
        let captcha = match fetched.captcha {
            Some(ref c) if fetched.error.is_none() => c.clone(),
            _ => {
                let reason = fetched.error.unwrap_or_else(|| "No captcha data".to_string());
                return ActionState {
                    log_message: Some(log_line(&format!("Fetch failed: {reason}"))),
                    error: Some(reason),
                    ..Default::default()
                };
            }
        };

        let sent = self.send_to_storage(&captcha.data_url()).await;
        if let Some(err) = sent.error {
            return ActionState {
                log_message: Some(log_line(&format!("Upload failed: {err}"))),
                error: Some(err),
                ..Default::default()
            };
        }

        ActionState {
            log_message: sent.storage_success.as_deref().map(log_line),
            storage_success: sent.storage_success,
            captcha: Some(captcha),
            ..Default::default()
        }
    }

    /// Allocate one folder, then run `batch_size` concurrent fetch+upload cycles into it.
    pub async fn run_batch(&self) -> ActionState {
        let store = match self.require_store() {
            Ok(store) => store.clone(),
            Err(e) => return ActionState::error(e.to_string()),
        };

        let folder = FolderAllocator::new(store.as_ref(), &self.layout).allocate().await;
        info!(folder = %folder.path, files = folder.file_count, "Batch destination allocated");

        let report = BatchRunner::new(self.fetcher.clone(), store, self.batch_size)
            .run(&folder.path)
            .await;

        ActionState {
            storage_success: Some(format!(
                "Uploaded {} of {} captchas to {}",
                report.succeeded,
                report.attempted(),
                report.folder
            )),
            batch: Some(report),
            ..Default::default()
        }
    }
}
