//! HTTP shell: start a scrape, poll its progress, download the CSV.

use axum::{
    Form, Json, Router,
    extract::{Path, State},
    http::{StatusCode, header},
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
};
use serde::Deserialize;
use serde_json::json;
use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::config::ScraperConfig;
use crate::jobs::{JobStatus, ScrapeJobs, run_job};
use crate::scraper::ProfileScraper;
use crate::session::AttachRequest;
use crate::types::parse_max_posts;
use crate::webdriver::Browser;

const DEFAULT_MAX_POSTS: usize = 50;

/// How long finished jobs stay queryable and downloadable
pub const FINISHED_JOB_TTL: Duration = Duration::from_secs(60 * 60);

/// How the server obtains its browser and where it writes exports
#[derive(Debug, Clone)]
pub struct ServeSettings {
    pub config: ScraperConfig,
    pub output_dir: PathBuf,
    pub user_data_dir: Option<PathBuf>,
    pub attach: AttachRequest,
}

/// Shared between handlers and background jobs
#[derive(Clone)]
pub struct AppState {
    jobs: ScrapeJobs,
    // One browser for all jobs; the lock serializes them
    session: Arc<Mutex<Option<ProfileScraper<Browser>>>>,
    settings: Arc<ServeSettings>,
}

impl AppState {
    pub fn new(settings: ServeSettings) -> Self {
        Self {
            jobs: ScrapeJobs::new(),
            session: Arc::new(Mutex::new(None)),
            settings: Arc::new(settings),
        }
    }

    pub fn jobs(&self) -> &ScrapeJobs {
        &self.jobs
    }

    /// Close the shared browser, waiting for a running job to finish first
    pub async fn shutdown(&self) {
        if let Some(scraper) = self.session.lock().await.take() {
            scraper.shutdown().await;
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(home_page))
        .route("/start_scrape", post(start_scrape))
        .route("/scrape_status/:id", get(status_page))
        .route("/api/status/:id", get(api_status))
        .route("/download/:id", get(download))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(Debug, Deserialize)]
struct StartForm {
    #[serde(default)]
    profile_url: String,
    max_posts: Option<String>,
}

async fn home_page() -> Html<&'static str> {
    Html(
        r#"<!DOCTYPE html>
<html>
<head><title>postscrape</title></head>
<body>
    <h1>Profile post scraper</h1>
    <form method="post" action="/start_scrape">
        <label>Profile URL <input type="url" name="profile_url" required></label>
        <label>Maximum posts <input type="number" name="max_posts" value="50" min="1"></label>
        <button type="submit">Start scraping</button>
    </form>
</body>
</html>
"#,
    )
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

fn error_page(status: StatusCode, message: &str) -> Response {
    let body = format!(
        "<!DOCTYPE html>\n<html>\n<head><title>Error</title></head>\n<body>\n    <h1>Error</h1>\n    <p id=\"error\">{}</p>\n    <a href=\"/\">Back</a>\n</body>\n</html>\n",
        escape_html(message)
    );
    (status, Html(body)).into_response()
}

fn parse_start_form(form: &StartForm) -> Result<(String, NonZeroUsize), String> {
    let profile_url = form.profile_url.trim();
    if profile_url.is_empty() {
        return Err("Profile URL is required".to_string());
    }

    let requested = match form.max_posts.as_deref().map(str::trim) {
        None | Some("") => DEFAULT_MAX_POSTS,
        Some(raw) => raw
            .parse::<usize>()
            .map_err(|_| format!("Invalid maximum number of posts: {}", raw))?,
    };
    let max_posts = parse_max_posts(requested).map_err(|e| e.to_string())?;

    Ok((profile_url.to_string(), max_posts))
}

async fn start_scrape(State(state): State<AppState>, Form(form): Form<StartForm>) -> Response {
    let (profile_url, max_posts) = match parse_start_form(&form) {
        Ok(parsed) => parsed,
        Err(message) => return error_page(StatusCode::BAD_REQUEST, &message),
    };

    let expired = state.jobs.expire_finished(FINISHED_JOB_TTL);
    if expired > 0 {
        info!("Expired {} finished jobs", expired);
    }

    let id = state.jobs.create();
    info!("Job {} started for {} ({} posts)", id, profile_url, max_posts);

    let task_state = state.clone();
    let task_id = id.clone();
    tokio::spawn(async move {
        run_scrape_job(task_state, task_id, profile_url, max_posts).await;
    });

    Redirect::to(&format!("/scrape_status/{}", id)).into_response()
}

async fn run_scrape_job(state: AppState, id: String, profile_url: String, max_posts: NonZeroUsize) {
    let mut session = state.session.lock().await;

    if session.is_none() {
        state.jobs.update(
            &id,
            JobStatus::Initializing,
            "Starting browser...",
            0,
        );
        let settings = &state.settings;
        let endpoint = settings.attach.clone().resolve().await;
        match ProfileScraper::connect(
            settings.config.clone(),
            endpoint.as_deref(),
            settings.user_data_dir.clone(),
        )
        .await
        {
            Ok(scraper) => *session = Some(scraper),
            Err(e) => {
                error!("Job {}: {}", id, e);
                state
                    .jobs
                    .update(&id, JobStatus::Error, format!("Error: {}", e), 0);
                return;
            }
        }
    }

    if let Some(scraper) = session.as_ref() {
        run_job(
            &state.jobs,
            &id,
            scraper,
            &profile_url,
            max_posts,
            &state.settings.output_dir,
        )
        .await;
    }
}

async fn status_page(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    let Some(progress) = state.jobs.status(&id) else {
        return error_page(StatusCode::NOT_FOUND, "Invalid session ID");
    };

    let id = escape_html(&id);
    let download = if progress.status == JobStatus::Complete {
        format!("<a id=\"download\" href=\"/download/{}\">Download CSV</a>", id)
    } else {
        String::new()
    };

    let body = format!(
        r#"<!DOCTYPE html>
<html>
<head><title>Scrape status</title></head>
<body>
    <h1>Scrape {id}</h1>
    <p>Status: <span id="status">{status}</span></p>
    <p id="message">{message}</p>
    <progress id="progress" max="100" value="{progress}">{progress}%</progress>
    {download}
    <script>
        const poll = async () => {{
            const res = await fetch("/api/status/{id}");
            if (!res.ok) return;
            const data = await res.json();
            document.getElementById("status").textContent = data.status;
            document.getElementById("message").textContent = data.message;
            document.getElementById("progress").value = data.progress;
            if (data.status === "complete" || data.status === "error") {{
                window.location.reload();
            }} else {{
                setTimeout(poll, 2000);
            }}
        }};
        if ("{status}" !== "complete" && "{status}" !== "error") setTimeout(poll, 2000);
    </script>
</body>
</html>
"#,
        id = id,
        status = progress.status,
        message = escape_html(&progress.message),
        progress = progress.progress,
        download = download,
    );
    Html(body).into_response()
}

async fn api_status(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    match state.jobs.status(&id) {
        Some(progress) => Json(progress).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "Invalid session ID" })),
        )
            .into_response(),
    }
}

async fn download(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    let Some(path) = state.jobs.output(&id) else {
        return error_page(StatusCode::NOT_FOUND, "Results not available");
    };

    let bytes = match tokio::fs::read(&path).await {
        Ok(bytes) => bytes,
        Err(e) => {
            error!("Failed to read export {}: {}", path.display(), e);
            return error_page(StatusCode::NOT_FOUND, "Results not available");
        }
    };

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().replace('"', "_"))
        .unwrap_or_else(|| "posts.csv".to_string());

    state.jobs.discard(&id);
    info!("Job {} downloaded and discarded", id);

    (
        [
            (header::CONTENT_TYPE, "text/csv".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", file_name),
            ),
        ],
        bytes,
    )
        .into_response()
}

#[cfg(test)]
#[path = "server_test.rs"]
mod server_test;
