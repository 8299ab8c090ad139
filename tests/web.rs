use std::io::Cursor;
use std::path::Path;
use std::sync::Arc;

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use carousel_agent::Config;
use carousel_agent::web::{AppState, DemoAgent, Pages, router};
use image::{DynamicImage, ImageOutputFormat, Rgba, RgbaImage};
use serde_json::{Value, json};
use tower::ServiceExt;
use wiremock::matchers::{method, path, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn pages() -> Arc<Pages> {
    let dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("templates");
    Arc::new(Pages::new(dir, "Ada Example"))
}

fn app(agent: Option<DemoAgent>) -> Router {
    router(AppState {
        agent: agent.map(Arc::new),
        pages: pages(),
    })
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, String) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, String::from_utf8(bytes.to_vec()).unwrap())
}

fn run_request() -> Request<Body> {
    Request::post("/api/run/instagram-agent")
        .body(Body::empty())
        .unwrap()
}

fn png_base64() -> String {
    let img = RgbaImage::from_pixel(4, 4, Rgba([255, 255, 255, 200]));
    let mut out = Cursor::new(Vec::new());
    DynamicImage::ImageRgba8(img)
        .write_to(&mut out, ImageOutputFormat::Png)
        .unwrap();
    STANDARD.encode(out.into_inner())
}

/// Gemini, Imagen and Veo on one mock server; Cloud Storage answers `gcs_status`.
async fn google_mocks(gcs_status: u16, image_calls: u64) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1beta/models/gemini-1.5-flash:generateContent"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{ "content": { "parts": [{ "text": "  Picnic on the ice! 🧺 " }] } }]
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path_regex(r"/models/imagen-3\.0-generate-001:predict$"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "predictions": [{ "bytesBase64Encoded": png_base64(), "mimeType": "image/png" }]
        })))
        .expect(image_calls)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path_regex(r"/models/veo-1\.0-generate-001:generateContent$"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/upload/storage/v1/b/boboandstella-instagram/o"))
        .respond_with(ResponseTemplate::new(gcs_status).set_body_string("{}"))
        .mount(&server)
        .await;
    server
}

fn config_for(server: &MockServer, work_dir: &Path) -> Config {
    Config {
        google_api_key: Some("key".into()),
        cloud_project: Some("bobo".into()),
        cloud_access_token: Some("token".into()),
        gemini_api_base: server.uri(),
        vertex_api_base: Some(server.uri()),
        gcs_api_base: server.uri(),
        work_dir: work_dir.to_path_buf(),
        ..Config::default()
    }
}

#[tokio::test]
async fn demo_without_agent_is_unavailable() {
    let (status, body) = send(app(None), run_request()).await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    let body: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(
        body,
        json!({
            "status": "error",
            "message": "Demo mode is currently disabled in this deployment."
        })
    );
}

#[test]
fn agent_needs_an_api_key() {
    assert!(DemoAgent::from_config(&Config::default()).is_none());
}

#[tokio::test]
async fn index_page_names_the_owner() {
    let request = Request::get("/").body(Body::empty()).unwrap();
    let (status, body) = send(app(None), request).await;

    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Ada Example"));
    assert!(!body.contains("{{ name }}"));
}

#[tokio::test]
async fn known_project_pages_render_and_unknown_ones_do_not() {
    for slug in carousel_agent::web::PROJECT_SLUGS {
        let request = Request::get(format!("/project/{slug}"))
            .body(Body::empty())
            .unwrap();
        let (status, _) = send(app(None), request).await;
        assert_eq!(status, StatusCode::OK, "{slug}");
    }

    let request = Request::get("/project/secret-plans")
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(app(None), request).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn demo_run_returns_story_urls_and_logs() {
    let server = google_mocks(200, 2).await;
    let work = tempfile::tempdir().unwrap();
    let agent = DemoAgent::from_config(&config_for(&server, work.path())).unwrap();

    let (status, body) = send(app(Some(agent)), run_request()).await;

    assert_eq!(status, StatusCode::OK, "{body}");
    let body: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(body["status"], "success");
    assert_eq!(body["story"], "Picnic on the ice! 🧺");

    let images = body["images"].as_array().unwrap();
    assert_eq!(images.len(), 2);
    for url in images {
        let url = url.as_str().unwrap();
        let prefix = "https://storage.googleapis.com/boboandstella-instagram/website_demo/";
        assert!(url.starts_with(prefix));
        assert!(url.ends_with(".jpg"));
    }

    let logs: Vec<&str> = body["logs"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(Value::as_str)
        .collect();
    assert!(logs[0].contains("gemini-1.5-flash"));
    assert!(logs.iter().any(|l| l.contains("Posting disabled")));

    assert_eq!(std::fs::read_dir(work.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn failed_upload_is_a_structured_error() {
    let server = google_mocks(500, 2).await;
    let work = tempfile::tempdir().unwrap();
    let agent = DemoAgent::from_config(&config_for(&server, work.path())).unwrap();

    let (status, body) = send(app(Some(agent)), run_request()).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(
        body,
        json!({ "status": "error", "message": "Failed to upload generated images to cloud." })
    );
    assert_eq!(std::fs::read_dir(work.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn demo_without_cloud_project_succeeds_with_no_images() {
    let server = google_mocks(200, 0).await;
    let work = tempfile::tempdir().unwrap();
    let config = Config {
        cloud_project: None,
        ..config_for(&server, work.path())
    };
    let agent = DemoAgent::from_config(&config).unwrap();

    let (status, body) = send(app(Some(agent)), run_request()).await;

    assert_eq!(status, StatusCode::OK);
    let body: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(body["images"], json!([]));
}
