//! Portfolio pages and the agent demo endpoint.
//!
//! Routes:
//! - GET /                          - landing page
//! - GET /project/:slug             - project pages
//! - POST /api/run/instagram-agent  - caption + images + upload, no posting

use std::path::PathBuf;
use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use serde_json::json;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use crate::args::ServeArgs;
use crate::caption::CaptionGenerator;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::media::{MediaGenerator, remove_local_files};
use crate::stage::Stage;
use crate::storage::{GcsUploader, ObjectStore};

pub const DEMO_DISABLED_MESSAGE: &str = "Demo mode is currently disabled in this deployment.";
pub const UPLOAD_FAILED_MESSAGE: &str = "Failed to upload generated images to cloud.";
pub const DEMO_KEY_PREFIX: &str = "website_demo";

pub const PROJECT_SLUGS: [&str; 6] = [
    "instagram-agent",
    "youtube-vibe",
    "shiok-scout",
    "wrap-me-up",
    "hawkersense",
    "log-cake-protocol",
];

/// Static HTML pages with the owner's name filled in.
pub struct Pages {
    dir: PathBuf,
    owner: String,
}

impl Pages {
    pub fn new(dir: impl Into<PathBuf>, owner: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            owner: owner.into(),
        }
    }

    pub async fn render(&self, template: &str) -> Result<Html<String>> {
        let path = self.dir.join(template);
        let source = tokio::fs::read_to_string(&path)
            .await
            .map_err(|_| Error::NotFound(template.to_string()))?;
        Ok(Html(source.replace("{{ name }}", &self.owner)))
    }
}

#[derive(Debug, Serialize)]
pub struct DemoRun {
    pub status: &'static str,
    pub story: String,
    pub images: Vec<String>,
    pub logs: Vec<String>,
}

/// Caption, images and upload, with publishing left out.
pub struct DemoAgent {
    caption: CaptionGenerator,
    media: MediaGenerator,
    store: Option<Arc<dyn ObjectStore>>,
    text_model: String,
}

impl DemoAgent {
    pub fn new(
        caption: CaptionGenerator,
        media: MediaGenerator,
        store: Option<Arc<dyn ObjectStore>>,
        text_model: impl Into<String>,
    ) -> Self {
        Self {
            caption,
            media,
            store,
            text_model: text_model.into(),
        }
    }

    /// `None` when there is no Gemini API key to write captions with.
    pub fn from_config(config: &Config) -> Option<Self> {
        if config.google_api_key().is_none() {
            warn!("GOOGLE_API_KEY not set, agent demo is unavailable");
            return None;
        }
        let http = reqwest::Client::new();
        let store = GcsUploader::from_config(http.clone(), config)
            .ok()
            .map(|s| Arc::new(s) as Arc<dyn ObjectStore>);
        Some(Self::new(
            CaptionGenerator::from_config(http.clone(), config),
            MediaGenerator::from_config(http, config),
            store,
            &config.text_model,
        ))
    }

    pub async fn run(&self) -> Result<DemoRun> {
        let story = self.caption.generate(false).await?;
        let mut logs = vec![format!("✅ {}: Generated story context.", self.text_model)];

        let media = match self.media.generate(&story, false).await? {
            Stage::Done(media) => {
                logs.push(format!(
                    "✅ {}: Generated {} photorealistic images.",
                    self.media.image_model_name().unwrap_or("Imagen"),
                    media.images.len()
                ));
                media
            }
            Stage::Skipped(reason) => {
                logs.push(format!("⚠️ Image generation skipped: {reason}"));
                Default::default()
            }
        };

        let uploaded = self.upload_all(&media.images).await;
        let produced = media.items();
        remove_local_files(produced.iter().map(|item| item.path.as_path()));
        let images = uploaded?;

        if images.is_empty() {
            logs.push("⚠️ Google Cloud Storage: No images to upload.".to_string());
        } else {
            logs.push("✅ Google Cloud Storage: Images uploaded to public bucket.".to_string());
        }
        logs.push("⚠️ Instagram Graph API: Posting disabled for demo mode.".to_string());

        Ok(DemoRun {
            status: "success",
            story,
            images,
            logs,
        })
    }

    async fn upload_all(&self, images: &[PathBuf]) -> Result<Vec<String>> {
        let mut urls = Vec::new();
        for path in images.iter().filter(|p| p.is_file()) {
            let Some(store) = &self.store else {
                error!("Cloud Storage is not configured");
                return Err(anyhow::anyhow!(UPLOAD_FAILED_MESSAGE).into());
            };
            match store.upload(path, DEMO_KEY_PREFIX).await {
                Ok(url) => urls.push(url),
                Err(e) => {
                    error!("Cloud Storage upload failed: {}", e);
                    return Err(anyhow::anyhow!(UPLOAD_FAILED_MESSAGE).into());
                }
            }
        }
        Ok(urls)
    }
}

#[derive(Clone)]
pub struct AppState {
    pub agent: Option<Arc<DemoAgent>>,
    pub pages: Arc<Pages>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/project/:slug", get(project))
        .route("/api/run/instagram-agent", post(run_agent))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn index(State(state): State<AppState>) -> Result<Html<String>> {
    state.pages.render("index.html").await
}

async fn project(State(state): State<AppState>, Path(slug): Path<String>) -> Result<Html<String>> {
    if !PROJECT_SLUGS.contains(&slug.as_str()) {
        return Err(Error::NotFound(format!("project {slug}")));
    }
    let template = format!("project_{}.html", slug.replace('-', "_"));
    state.pages.render(&template).await
}

fn error_body(status: StatusCode, message: String) -> Response {
    (status, Json(json!({ "status": "error", "message": message }))).into_response()
}

async fn run_agent(State(state): State<AppState>) -> Response {
    let Some(agent) = &state.agent else {
        return error_body(
            StatusCode::SERVICE_UNAVAILABLE,
            DEMO_DISABLED_MESSAGE.to_string(),
        );
    };

    match agent.run().await {
        Ok(run) => {
            info!("Demo run finished with {} images", run.images.len());
            Json(run).into_response()
        }
        Err(e) => {
            error!("Demo run failed: {}", e);
            error_body(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        }
    }
}

pub async fn serve(config: &Config, args: &ServeArgs) -> anyhow::Result<()> {
    let agent = if args.demo_disabled {
        None
    } else {
        DemoAgent::from_config(config).map(Arc::new)
    };
    let state = AppState {
        agent,
        pages: Arc::new(Pages::new(&args.templates, &args.owner)),
    };

    let addr = format!("{}:{}", args.host, args.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Listening on {}", addr);
    axum::serve(listener, router(state)).await?;
    Ok(())
}
