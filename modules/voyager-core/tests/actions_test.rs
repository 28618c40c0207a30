//! Server actions: every outcome is an ActionState, never an Err.

use std::sync::Arc;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use voyager_common::{ContentKind, FetchResult, VoyagerError};
use voyager_core::testing::{MockExtractor, MockFetcher, MockFolderStore, SAMPLE_CAPTCHA};
use voyager_core::{FolderLayout, Voyager};

fn layout() -> FolderLayout {
    FolderLayout::new("", "captcha", 1000)
}

fn voyager(fetcher: MockFetcher) -> Voyager {
    Voyager::new(Arc::new(fetcher), layout())
}

#[tokio::test]
async fn fetch_captcha_returns_asset() {
    let state = voyager(MockFetcher::new().on_captcha("QUJD")).fetch_captcha().await;

    assert!(!state.is_error());
    assert_eq!(state.captcha.unwrap().image_base64, "QUJD");
}

#[tokio::test]
async fn fetch_captcha_reports_missing_field() {
    let state = voyager(MockFetcher::new().on_captcha_error(VoyagerError::MissingCaptcha))
        .fetch_captcha()
        .await;

    assert_eq!(state.error.as_deref(), Some("Could not find captcha in the response"));
    assert!(state.captcha.is_none());
}

#[tokio::test]
async fn send_without_token_is_a_config_error() {
    let state = voyager(MockFetcher::new()).send_to_storage(SAMPLE_CAPTCHA).await;

    assert!(state.error.unwrap().contains("DROPBOX_ACCESS_TOKEN"));
}

#[tokio::test]
async fn send_rejects_empty_payload() {
    let store = Arc::new(MockFolderStore::new());
    let state = voyager(MockFetcher::new())
        .with_store(store.clone())
        .send_to_storage("")
        .await;

    assert_eq!(state.error.as_deref(), Some("No captcha image to upload."));
    assert!(store.uploads().is_empty());
}

#[tokio::test]
async fn send_strips_data_url_and_uploads_in_add_mode() {
    let store = Arc::new(MockFolderStore::new().with_folder("/captcha", 0));
    let payload = format!("data:image/jpeg;base64,{SAMPLE_CAPTCHA}");

    let state = voyager(MockFetcher::new())
        .with_store(store.clone())
        .send_to_storage(&payload)
        .await;

    assert!(!state.is_error(), "{:?}", state.error);
    assert!(state
        .storage_success
        .unwrap()
        .starts_with("Image uploaded successfully to Dropbox as /captcha/"));

    let uploads = store.uploads();
    assert_eq!(uploads.len(), 1);
    assert_eq!(uploads[0].bytes, STANDARD.decode(SAMPLE_CAPTCHA).unwrap());
    assert_eq!(uploads[0].arg["mode"], "add");
    assert_eq!(uploads[0].arg["autorename"], false);
    assert_eq!(uploads[0].arg["mute"], false);
    assert!(uploads[0].arg["path"].as_str().unwrap().ends_with(".jpg"));
}

#[tokio::test]
async fn send_surfaces_status_and_body_on_failure() {
    let store = Arc::new(MockFolderStore::new().failing_uploads());
    let state = voyager(MockFetcher::new())
        .with_store(store)
        .send_to_storage(SAMPLE_CAPTCHA)
        .await;

    let err = state.error.unwrap();
    assert!(err.contains("507"));
    assert!(err.contains("insufficient_space"));
}

#[tokio::test]
async fn fetch_and_send_skips_upload_when_fetch_fails() {
    let store = Arc::new(MockFolderStore::new());
    let state = voyager(MockFetcher::new().on_captcha_error(VoyagerError::Upstream {
        status: 500,
        reason: "Internal Server Error".into(),
        body: String::new(),
    }))
    .with_store(store.clone())
    .fetch_and_send()
    .await;

    assert_eq!(
        state.error.as_deref(),
        Some("Failed to fetch URL: 500 Internal Server Error")
    );
    assert!(state.log_message.unwrap().contains("Fetch failed: Failed to fetch URL: 500"));
    assert!(store.uploads().is_empty());
    assert!(store.created().is_empty());
}

#[tokio::test]
async fn fetch_and_send_logs_success() {
    let store = Arc::new(MockFolderStore::new());
    let state = voyager(MockFetcher::new())
        .with_store(store.clone())
        .fetch_and_send()
        .await;

    assert!(!state.is_error());
    assert!(state
        .log_message
        .unwrap()
        .contains("Image uploaded successfully to Dropbox as /captcha/"));
    assert_eq!(store.file_count("/captcha"), 1);
}

#[tokio::test]
async fn run_batch_without_token_launches_nothing() {
    let fetcher = Arc::new(MockFetcher::new());
    let state = Voyager::new(fetcher.clone(), layout()).run_batch().await;

    assert!(state.error.unwrap().contains("DROPBOX_ACCESS_TOKEN"));
    assert!(state.batch.is_none());
    assert_eq!(fetcher.captcha_calls(), 0);
}

#[tokio::test]
async fn run_batch_allocates_once_and_reports() {
    let store = Arc::new(MockFolderStore::new().with_folder("/captcha", 999));
    let state = voyager(MockFetcher::new())
        .with_store(store.clone())
        .with_batch_size(3)
        .run_batch()
        .await;

    let report = state.batch.unwrap();
    assert_eq!(report.folder, "/captcha");
    assert_eq!(report.succeeded, 3);
    // Capacity is checked once per batch, so the folder overshoots.
    assert_eq!(store.file_count("/captcha"), 1002);
    assert_eq!(state.storage_success.as_deref(), Some("Uploaded 3 of 3 captchas to /captcha"));
}

#[tokio::test]
async fn fetch_url_rejects_malformed_url_before_fetching() {
    let state = voyager(MockFetcher::new()).fetch_url("not a url", false).await;

    assert!(state.error.unwrap().starts_with("Invalid URL"));
    assert!(state.content.is_none());
}

#[tokio::test]
async fn fetch_url_with_extraction_returns_urls() {
    let page = FetchResult {
        content: "see https://a.example and https://b.example".into(),
        kind: ContentKind::Text,
    };
    let state = voyager(MockFetcher::new().on_page("https://src.example/", page.clone()))
        .with_extractor(Arc::new(MockExtractor::returning(&[
            "https://a.example",
            "https://b.example",
        ])))
        .fetch_url("https://src.example/", true)
        .await;

    assert!(!state.is_error());
    assert_eq!(state.content, Some(page));
    assert_eq!(
        state.urls.unwrap(),
        vec!["https://a.example".to_string(), "https://b.example".to_string()]
    );
}

#[tokio::test]
async fn fetch_url_keeps_content_when_extraction_fails() {
    let page = FetchResult {
        content: "{}".into(),
        kind: ContentKind::Json,
    };
    let state = voyager(MockFetcher::new().on_page("https://src.example/", page))
        .with_extractor(Arc::new(MockExtractor::failing()))
        .fetch_url("https://src.example/", true)
        .await;

    assert!(state.content.is_some());
    assert!(state.urls.is_none());
    assert!(state.error.unwrap().starts_with("Extraction error"));
}

#[tokio::test]
async fn fetch_url_without_extraction_never_calls_model() {
    let page = FetchResult {
        content: "plain".into(),
        kind: ContentKind::Text,
    };
    let state = voyager(MockFetcher::new().on_page("https://src.example/", page))
        .with_extractor(Arc::new(MockExtractor::failing()))
        .fetch_url("https://src.example/", false)
        .await;

    assert!(!state.is_error());
    assert!(state.urls.is_none());
}
