use std::env;

use anyhow::{Context, Result};

pub const DEFAULT_CAPTCHA_URL: &str =
    "https://gateway-voters.eci.gov.in/api/v1/captcha-service/generateCaptcha/EROLL";

pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

/// Application configuration loaded from environment variables.
///
/// Credentials are optional at load time. Operations that need them report
/// a configuration error when they are absent.
#[derive(Debug, Clone)]
pub struct Config {
    // Credentials
    pub dropbox_access_token: Option<String>,
    pub openai_api_key: Option<String>,
    pub openai_model: String,

    // Captcha service
    pub captcha_url: String,
    pub user_agent: String,

    // Storage layout
    pub storage_root: String,
    pub folder_suffix: String,
    pub folder_capacity: usize,

    // Batch
    pub batch_size: usize,

    // Web server
    pub web_host: String,
    pub web_port: u16,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            dropbox_access_token: None,
            openai_api_key: None,
            openai_model: "gpt-4o".to_string(),
            captcha_url: DEFAULT_CAPTCHA_URL.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            storage_root: String::new(),
            folder_suffix: "captcha".to_string(),
            folder_capacity: 1000,
            batch_size: 10,
            web_host: "0.0.0.0".to_string(),
            web_port: 3000,
        }
    }
}

impl Config {
    /// Load configuration from the environment, reading `.env` first if present.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let defaults = Self::default();

        Ok(Self {
            dropbox_access_token: optional_env("DROPBOX_ACCESS_TOKEN"),
            openai_api_key: optional_env("OPENAI_API_KEY"),
            openai_model: env::var("OPENAI_MODEL").unwrap_or(defaults.openai_model),
            captcha_url: env::var("CAPTCHA_URL").unwrap_or(defaults.captcha_url),
            user_agent: env::var("USER_AGENT").unwrap_or(defaults.user_agent),
            storage_root: normalize_root(&env::var("STORAGE_ROOT").unwrap_or_default()),
            folder_suffix: env::var("FOLDER_SUFFIX").unwrap_or(defaults.folder_suffix),
            folder_capacity: parsed_env("FOLDER_CAPACITY", defaults.folder_capacity)?,
            batch_size: parsed_env("BATCH_SIZE", defaults.batch_size)?,
            web_host: env::var("WEB_HOST").unwrap_or(defaults.web_host),
            web_port: parsed_env("WEB_PORT", defaults.web_port)?,
        })
    }
}

/// Dropbox paths are absolute with no trailing slash; the root is `""`.
pub fn normalize_root(root: &str) -> String {
    let trimmed = root.trim().trim_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("/{trimmed}")
    }
}

fn optional_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parsed_env<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{key} must be a number, got {raw:?}")),
        Err(_) => Ok(default),
    }
}
