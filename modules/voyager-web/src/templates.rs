use voyager_common::{ActionState, BatchReport, ContentKind, FetchResult};
use voyager_core::fetch::validate_url;

/// Everything the single page needs to render one action's outcome.
#[derive(Default)]
pub struct PageView {
    pub state: ActionState,
    /// Captcha currently on screen, as a data URL. Kept across the upload post.
    pub captcha_data_url: Option<String>,
    /// Last URL typed into the fetch form.
    pub url: String,
    pub uploads_enabled: bool,
    pub extraction_enabled: bool,
    pub batch_size: usize,
}

/// Render the DataVoyager page.
pub fn render_home(view: &PageView) -> String {
    let mut sections = String::new();

    sections.push_str(&render_controls(view));

    if let Some(ref err) = view.state.error {
        sections.push_str(&render_error(err));
    }

    if let Some(ref data_url) = view.captcha_data_url {
        sections.push_str(&render_captcha(data_url, view.uploads_enabled));
    }

    if let Some(ref content) = view.state.content {
        sections.push_str(&render_content(content));
    }

    if let Some(ref urls) = view.state.urls {
        sections.push_str(&render_urls(urls));
    }

    if view.state.storage_success.is_some()
        || view.state.log_message.is_some()
        || view.state.batch.is_some()
    {
        sections.push_str(&render_status(&view.state));
    }

    let content = format!(r#"<div class="container">{sections}</div>"#);
    build_page("DataVoyager", &content)
}

fn render_controls(view: &PageView) -> String {
    let upload_disabled = if view.uploads_enabled { "" } else { " disabled" };
    let extract_disabled = if view.extraction_enabled { "" } else { " disabled" };

    format!(
        r#"<div class="card">
    <h2>DataVoyager</h2>
    <p class="muted">Fetch a captcha from the permanent URL, or inspect any page.</p>
    <div class="actions">
        <form method="post" action="/fetch"><button type="submit">Fetch Captcha</button></form>
        <form method="post" action="/fetch-and-send"><button type="submit"{upload_disabled}>Fetch &amp; Send</button></form>
        <form method="post" action="/batch"><button type="submit"{upload_disabled}>Run Batch ({batch_size})</button></form>
    </div>
    <form method="post" action="/fetch-url" class="url-form">
        <input type="url" name="url" placeholder="https://example.com" value="{url}" required>
        <label><input type="checkbox" name="extract" value="on"{extract_disabled}> Extract URLs</label>
        <button type="submit">Fetch URL</button>
    </form>
</div>"#,
        batch_size = view.batch_size,
        url = html_escape(&view.url),
    )
}

fn render_error(err: &str) -> String {
    format!(
        r#"<div class="card error">
    <h3>Error</h3>
    <textarea readonly>{}</textarea>
</div>"#,
        html_escape(err)
    )
}

fn render_captcha(data_url: &str, uploads_enabled: bool) -> String {
    let upload = if uploads_enabled {
        format!(
            r#"<form method="post" action="/upload">
        <input type="hidden" name="captcha" value="{}">
        <button type="submit">Send to Dropbox</button>
    </form>"#,
            html_escape(data_url)
        )
    } else {
        r#"<p class="muted">Set DROPBOX_ACCESS_TOKEN to enable uploads.</p>"#.to_string()
    };

    format!(
        r#"<div class="card center">
    <h3>Fetched Captcha</h3>
    <div class="captcha"><img src="{src}" alt="Fetched Captcha" width="200" height="70"></div>
    {upload}
</div>"#,
        src = html_escape(data_url),
    )
}

fn render_content(result: &FetchResult) -> String {
    let body = match result.kind {
        ContentKind::Binary => format!(
            "{} bytes of binary content (base64)\n\n{}",
            result.content.len() * 3 / 4,
            truncate(&result.content, 2000)
        ),
        _ => result.content.clone(),
    };

    format!(
        r#"<div class="card">
    <h3>Fetched Content <span class="badge">{kind}</span></h3>
    <pre>{body}</pre>
</div>"#,
        kind = result.kind,
        body = html_escape(&body),
    )
}

fn render_urls(urls: &[String]) -> String {
    let items = if urls.is_empty() {
        r#"<li class="muted">No URLs found.</li>"#.to_string()
    } else {
        urls.iter()
            .map(|u| {
                let escaped = html_escape(u);
                // Model output is untrusted; only web URLs become links.
                if validate_url(u).is_ok() {
                    format!(r#"<li><a href="{escaped}" target="_blank" rel="noopener noreferrer">{escaped}</a></li>"#)
                } else {
                    format!("<li><code>{escaped}</code></li>")
                }
            })
            .collect::<Vec<_>>()
            .join("")
    };

    format!(
        r#"<div class="card">
    <h3>Extracted URLs ({count})</h3>
    <ul class="urls">{items}</ul>
</div>"#,
        count = urls.len(),
    )
}

fn render_status(state: &ActionState) -> String {
    let success = state
        .storage_success
        .as_ref()
        .map(|s| format!(r#"<p class="success">{}</p>"#, html_escape(s)))
        .unwrap_or_default();

    let log = state
        .log_message
        .as_ref()
        .map(|l| format!(r#"<pre class="log">{}</pre>"#, html_escape(l)))
        .unwrap_or_default();

    let batch = state.batch.as_ref().map(render_batch).unwrap_or_default();

    format!(
        r#"<div class="card">
    <h3>Upload Status</h3>
    {success}{log}{batch}
</div>"#
    )
}

fn render_batch(report: &BatchReport) -> String {
    let lines = report
        .lines
        .iter()
        .map(|l| html_escape(l))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        r#"<p class="muted">Folder {folder}: {ok} succeeded, {failed} failed</p>
    <pre class="log">{lines}</pre>"#,
        folder = html_escape(&report.folder),
        ok = report.succeeded,
        failed = report.failed(),
    )
}

// --- Helpers ---

fn truncate(s: &str, max_chars: usize) -> String {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}…", &s[..idx]),
        None => s.to_string(),
    }
}

fn build_page(title: &str, content: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>{title}</title>
<style>
*{{margin:0;padding:0;box-sizing:border-box;}}
body{{font-family:-apple-system,BlinkMacSystemFont,"Segoe UI",Roboto,sans-serif;color:#1a1a1a;background:#fafafa;}}
.container{{max-width:860px;margin:0 auto;padding:24px;display:flex;flex-direction:column;gap:16px;}}
.card{{background:#fff;border:1px solid #e0e0e0;border-radius:8px;padding:16px;}}
.card h2{{font-size:28px;margin-bottom:4px;}}
.card h3{{font-size:16px;margin-bottom:10px;}}
.center{{text-align:center;}}
.muted{{color:#888;font-size:13px;}}
.actions{{display:flex;gap:8px;margin:12px 0;}}
.url-form{{display:flex;gap:8px;align-items:center;}}
.url-form input[type=url]{{flex:1;padding:6px 10px;border:1px solid #ccc;border-radius:4px;}}
button{{padding:6px 16px;background:#0066cc;color:#fff;border:none;border-radius:4px;font-size:13px;cursor:pointer;}}
button:disabled{{background:#9bb;cursor:not-allowed;}}
.captcha{{display:inline-block;margin:8px 0 12px;padding:12px;border:1px solid #ddd;border-radius:6px;background:#f5f5f5;}}
pre{{white-space:pre-wrap;word-break:break-all;font-size:12px;background:#f5f5f5;padding:12px;border-radius:4px;max-height:420px;overflow:auto;}}
.log{{margin-top:8px;}}
.badge{{display:inline-block;padding:2px 8px;border-radius:12px;font-size:11px;font-weight:600;text-transform:uppercase;background:#e3f2fd;color:#1565c0;}}
.urls li{{margin:4px 0 4px 18px;font-size:13px;}}
.urls a{{color:#0066cc;}}
.success{{color:#2e7d32;font-size:14px;}}
.error{{border-color:#c62828;background:#fce4ec;}}
.error h3{{color:#c62828;}}
.error textarea{{width:100%;height:120px;font-family:monospace;font-size:12px;border:1px solid #c62828;background:#fff5f7;padding:8px;}}
</style>
</head>
<body>
{content}
</body>
</html>"#,
        title = html_escape(title),
    )
}

fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}
