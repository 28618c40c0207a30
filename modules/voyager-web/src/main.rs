use std::sync::Arc;

use anyhow::Result;
use axum::{
    extract::{Form, State},
    http::{header, HeaderValue},
    response::{Html, IntoResponse, Json},
    routing::{get, post},
    Router,
};
use clap::Parser;
use serde::Deserialize;
use tower_http::set_header::SetResponseHeaderLayer;
use tracing::info;
use tracing_subscriber::EnvFilter;

use voyager_common::{ActionState, Config};
use voyager_core::Voyager;

mod templates;
use templates::*;

#[derive(Parser)]
#[command(name = "web", about = "DataVoyager web UI")]
struct Cli {
    /// Interface to bind (overrides WEB_HOST)
    #[arg(long)]
    host: Option<String>,

    /// Port to listen on (overrides WEB_PORT)
    #[arg(long)]
    port: Option<u16>,
}

// --- App State ---

struct AppState {
    voyager: Voyager,
}

// --- Main ---

#[tokio::main]
async fn main() -> Result<()> {
    let filter = log_filter(EnvFilter::from_default_env())?;

    if std::env::var("LOG_FORMAT").as_deref() == Ok("json") {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    let cli = Cli::parse();
    let mut config = Config::from_env()?;
    if let Some(host) = cli.host {
        config.web_host = host;
    }
    if let Some(port) = cli.port {
        config.web_port = port;
    }

    let state = Arc::new(AppState {
        voyager: Voyager::from_config(&config)?,
    });

    let addr = format!("{}:{}", config.web_host, config.web_port);
    info!("DataVoyager web server starting on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app(state)).await?;

    Ok(())
}

/// Crate targets logged at info by default. `voyager` matches every `voyager_*` crate.
const LOG_TARGETS: &[&str] = &["voyager", "dropbox_client", "ai_client", "tower_http"];

fn log_filter(base: EnvFilter) -> Result<EnvFilter> {
    LOG_TARGETS
        .iter()
        .try_fold(base, |filter, target| -> Result<EnvFilter> {
            Ok(filter.add_directive(format!("{target}=info").parse()?))
        })
}

fn app(state: Arc<AppState>) -> Router {
    Router::new()
        // Page routes (form posts render the full page)
        .route("/", get(home_page))
        .route("/fetch", post(fetch_page))
        .route("/fetch-url", post(fetch_url_page))
        .route("/upload", post(upload_page))
        .route("/fetch-and-send", post(fetch_and_send_page))
        .route("/batch", post(batch_page))
        // JSON API
        .route("/api/fetch", post(api_fetch))
        .route("/api/fetch-url", post(api_fetch_url))
        .route("/api/upload", post(api_upload))
        .route("/api/fetch-and-send", post(api_fetch_and_send))
        .route("/api/batch", post(api_batch))
        .route("/health", get(|| async { "ok" }))
        .with_state(state)
        // Captchas are single-use; never cache responses
        .layer(SetResponseHeaderLayer::overriding(
            header::CACHE_CONTROL,
            HeaderValue::from_static("no-store"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::PRAGMA,
            HeaderValue::from_static("no-cache"),
        ))
        // Method and path only; form bodies carry captcha payloads
        .layer(
            tower_http::trace::TraceLayer::new_for_http().make_span_with(
                |request: &axum::http::Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        path = %request.uri().path(),
                    )
                },
            ),
        )
}

// --- Page Handlers ---

fn page(state: &AppState, result: ActionState, url: String) -> Html<String> {
    let captcha_data_url = result.captcha.as_ref().map(|c| c.data_url());
    page_with_captcha(state, result, url, captcha_data_url)
}

fn page_with_captcha(
    state: &AppState,
    result: ActionState,
    url: String,
    captcha_data_url: Option<String>,
) -> Html<String> {
    let view = PageView {
        state: result,
        captcha_data_url,
        url,
        uploads_enabled: state.voyager.uploads_enabled(),
        extraction_enabled: state.voyager.extraction_enabled(),
        batch_size: state.voyager.batch_size(),
    };
    Html(render_home(&view))
}

async fn home_page(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    page(&state, ActionState::default(), String::new())
}

async fn fetch_page(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let result = state.voyager.fetch_captcha().await;
    page(&state, result, String::new())
}

#[derive(Deserialize)]
struct FetchUrlForm {
    url: String,
    extract: Option<String>,
}

impl FetchUrlForm {
    fn wants_extraction(&self) -> bool {
        matches!(self.extract.as_deref(), Some("on" | "true" | "1"))
    }
}

async fn fetch_url_page(
    State(state): State<Arc<AppState>>,
    Form(form): Form<FetchUrlForm>,
) -> impl IntoResponse {
    let result = state
        .voyager
        .fetch_url(form.url.trim(), form.wants_extraction())
        .await;
    page(&state, result, form.url)
}

#[derive(Deserialize)]
struct UploadForm {
    captcha: String,
}

async fn upload_page(
    State(state): State<Arc<AppState>>,
    Form(form): Form<UploadForm>,
) -> impl IntoResponse {
    let result = state.voyager.send_to_storage(&form.captcha).await;
    // Keep the image on screen so a failed upload can be retried.
    let shown = (!form.captcha.is_empty()).then(|| form.captcha.clone());
    page_with_captcha(&state, result, String::new(), shown)
}

async fn fetch_and_send_page(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let result = state.voyager.fetch_and_send().await;
    page(&state, result, String::new())
}

async fn batch_page(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let result = state.voyager.run_batch().await;
    page(&state, result, String::new())
}

// --- API Handlers ---

async fn api_fetch(State(state): State<Arc<AppState>>) -> Json<ActionState> {
    Json(state.voyager.fetch_captcha().await)
}

#[derive(Deserialize)]
struct FetchUrlRequest {
    url: String,
    #[serde(default)]
    extract: bool,
}

async fn api_fetch_url(
    State(state): State<Arc<AppState>>,
    Json(req): Json<FetchUrlRequest>,
) -> Json<ActionState> {
    Json(state.voyager.fetch_url(req.url.trim(), req.extract).await)
}

#[derive(Deserialize)]
struct UploadRequest {
    captcha: String,
}

async fn api_upload(
    State(state): State<Arc<AppState>>,
    Json(req): Json<UploadRequest>,
) -> Json<ActionState> {
    Json(state.voyager.send_to_storage(&req.captcha).await)
}

async fn api_fetch_and_send(State(state): State<Arc<AppState>>) -> Json<ActionState> {
    Json(state.voyager.fetch_and_send().await)
}

async fn api_batch(State(state): State<Arc<AppState>>) -> Json<ActionState> {
    Json(state.voyager.run_batch().await)
}
