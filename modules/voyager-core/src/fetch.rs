use anyhow::Result;
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use reqwest::header::CONTENT_TYPE;
use tracing::{debug, info, warn};
use url::Url;

use voyager_common::error::NETWORK_HINT;
use voyager_common::{CaptchaAsset, Config, ContentKind, FetchResult, VoyagerError};

use crate::traits::ContentFetcher;

/// Plain reqwest fetcher for the captcha service and user-supplied URLs.
///
/// Sends a browser User-Agent and follows redirects (reqwest's default policy).
pub struct HttpFetcher {
    client: reqwest::Client,
    captcha_url: String,
}

impl HttpFetcher {
    pub fn new(captcha_url: impl Into<String>, user_agent: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()?;

        Ok(Self {
            client,
            captcha_url: captcha_url.into(),
        })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(&config.captcha_url, &config.user_agent)
    }

    async fn get(&self, url: &str) -> Result<reqwest::Response, VoyagerError> {
        let resp = self.client.get(url).send().await.map_err(transport_error)?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            warn!(url, status = status.as_u16(), "Upstream returned non-success status");
            return Err(VoyagerError::Upstream {
                status: status.as_u16(),
                reason: status.canonical_reason().unwrap_or_default().to_string(),
                body,
            });
        }

        Ok(resp)
    }
}

#[async_trait]
impl ContentFetcher for HttpFetcher {
    async fn fetch_captcha(&self) -> Result<CaptchaAsset, VoyagerError> {
        let resp = self.get(&self.captcha_url).await?;
        let body = resp.bytes().await.map_err(transport_error)?;

        let value: serde_json::Value =
            serde_json::from_slice(&body).map_err(|e| VoyagerError::Parse(e.to_string()))?;

        let captcha = value
            .get("captcha")
            .and_then(|c| c.as_str())
            .filter(|c| !c.is_empty())
            .ok_or(VoyagerError::MissingCaptcha)?;

        debug!(bytes = captcha.len(), "Captcha fetched");
        Ok(CaptchaAsset::new(captcha))
    }

    async fn fetch_url(&self, url: &str) -> Result<FetchResult, VoyagerError> {
        let url = validate_url(url)?;
        let resp = self.get(url.as_str()).await?;

        let content_type = resp
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_ascii_lowercase);
        let body = resp.bytes().await.map_err(transport_error)?;

        let result = classify(content_type.as_deref(), &body);
        info!(url = %url, kind = %result.kind, bytes = body.len(), "Fetched URL");
        Ok(result)
    }
}

/// Reject anything that is not an absolute http(s) URL before touching the network.
pub fn validate_url(raw: &str) -> Result<Url, VoyagerError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(VoyagerError::Validation("URL is required".to_string()));
    }

    let url = Url::parse(trimmed).map_err(|e| VoyagerError::Validation(format!("{trimmed}: {e}")))?;
    match url.scheme() {
        "http" | "https" if url.host().is_some() => Ok(url),
        "http" | "https" => Err(VoyagerError::Validation(format!("{trimmed}: missing host"))),
        other => Err(VoyagerError::Validation(format!(
            "{trimmed}: unsupported scheme {other}"
        ))),
    }
}

/// Classify a response body by Content-Type, sniffing when the header is
/// absent or generic. JSON comes back pretty-printed, binary as base64.
pub fn classify(content_type: Option<&str>, body: &[u8]) -> FetchResult {
    let ct = content_type.unwrap_or_default();

    if ct.starts_with("image/") || ct.starts_with("application/octet-stream") || ct.starts_with("application/pdf") {
        return binary(body);
    }

    let Ok(text) = std::str::from_utf8(body) else {
        return binary(body);
    };

    if ct.contains("json") {
        if let Some(pretty) = pretty_json(text) {
            return FetchResult {
                content: pretty,
                kind: ContentKind::Json,
            };
        }
        return FetchResult {
            content: text.to_string(),
            kind: ContentKind::Text,
        };
    }

    if ct.contains("html") || (ct.is_empty() && looks_like_html(text)) {
        return FetchResult {
            content: text.to_string(),
            kind: ContentKind::Html,
        };
    }

    let trimmed = text.trim_start();
    if trimmed.starts_with('{') || trimmed.starts_with('[') {
        if let Some(pretty) = pretty_json(text) {
            return FetchResult {
                content: pretty,
                kind: ContentKind::Json,
            };
        }
    }

    FetchResult {
        content: text.to_string(),
        kind: ContentKind::Text,
    }
}

fn pretty_json(text: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(text).ok()?;
    serde_json::to_string_pretty(&value).ok()
}

fn looks_like_html(text: &str) -> bool {
    let head: String = text.trim_start().chars().take(256).collect::<String>().to_ascii_lowercase();
    head.starts_with("<!doctype html") || head.starts_with("<html") || head.contains("<head")
}

fn binary(body: &[u8]) -> FetchResult {
    FetchResult {
        content: STANDARD.encode(body),
        kind: ContentKind::Binary,
    }
}

/// Connection-level failures get a user-facing hint; everything else is verbatim.
fn transport_error(e: reqwest::Error) -> VoyagerError {
    if e.is_connect() || e.is_builder() {
        warn!(error = %e, "Fetch failed before reaching the server");
        VoyagerError::Network(NETWORK_HINT.to_string())
    } else {
        VoyagerError::Network(e.to_string())
    }
}
