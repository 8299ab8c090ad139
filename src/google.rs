//! Google model clients.
//!
//! Text comes from the Gemini API (API key auth). Images and the video
//! description come from Vertex AI, which is addressed per cloud project and
//! authenticated with an OAuth bearer token.

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use crate::config::Config;
use crate::error::{Error, Result};

#[async_trait]
pub trait TextModel: Send + Sync {
    fn name(&self) -> &str;

    async fn generate_text(&self, prompt: &str) -> Result<String>;
}

#[async_trait]
pub trait ImageModel: Send + Sync {
    fn name(&self) -> &str;

    /// Requests one square image. `Ok(None)` means the model answered
    /// without an image (e.g. everything was filtered).
    async fn generate_image(&self, prompt: &str) -> Result<Option<Vec<u8>>>;
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    text: Option<String>,
}

impl GenerateContentResponse {
    fn text(&self) -> String {
        self.candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .map(|content| {
                content
                    .parts
                    .iter()
                    .filter_map(|p| p.text.as_deref())
                    .collect::<String>()
            })
            .unwrap_or_default()
    }
}

#[derive(Debug, Deserialize)]
struct PredictResponse {
    #[serde(default)]
    predictions: Vec<Prediction>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Prediction {
    bytes_base64_encoded: Option<String>,
}

fn user_prompt(prompt: &str) -> serde_json::Value {
    json!({
        "contents": [{ "role": "user", "parts": [{ "text": prompt }] }]
    })
}

async fn read_json<T: serde::de::DeserializeOwned>(
    service: &'static str,
    response: reqwest::Response,
) -> Result<T> {
    let status = response.status();
    let body = response.text().await?;
    if !status.is_success() {
        return Err(Error::upstream(service, format!("{status}: {body}")));
    }
    debug!("{} response: {:.200}", service, body);
    Ok(serde_json::from_str(&body)?)
}

/// Gemini API text generation.
#[derive(Clone)]
pub struct GeminiText {
    http: reqwest::Client,
    base: String,
    api_key: String,
    model: String,
}

impl GeminiText {
    pub fn new(http: reqwest::Client, config: &Config) -> Result<Self> {
        let api_key = config
            .google_api_key()
            .ok_or(Error::NotConfigured("GOOGLE_API_KEY"))?;
        Ok(Self {
            http,
            base: config.gemini_api_base.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            model: config.text_model.clone(),
        })
    }
}

#[async_trait]
impl TextModel for GeminiText {
    fn name(&self) -> &str {
        &self.model
    }

    async fn generate_text(&self, prompt: &str) -> Result<String> {
        let url = format!("{}/v1beta/models/{}:generateContent", self.base, self.model);
        let response = self
            .http
            .post(&url)
            .query(&[("key", &self.api_key)])
            .json(&user_prompt(prompt))
            .send()
            .await?;
        let parsed: GenerateContentResponse = read_json("Gemini", response).await?;
        Ok(parsed.text())
    }
}

/// Shared addressing for Vertex AI publisher models.
#[derive(Clone)]
struct Vertex {
    http: reqwest::Client,
    base: String,
    project: String,
    location: String,
    token: Option<String>,
}

impl Vertex {
    fn new(http: reqwest::Client, config: &Config, project: &str) -> Self {
        Self {
            http,
            base: config.vertex_api_base().trim_end_matches('/').to_string(),
            project: project.to_string(),
            location: config.cloud_location.clone(),
            token: config.cloud_access_token().map(str::to_string),
        }
    }

    fn model_url(&self, model: &str, method: &str) -> String {
        format!(
            "{}/v1/projects/{}/locations/{}/publishers/google/models/{}:{}",
            self.base, self.project, self.location, model, method
        )
    }

    fn post(&self, url: &str) -> reqwest::RequestBuilder {
        let request = self.http.post(url);
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }
}

/// Imagen on Vertex AI.
#[derive(Clone)]
pub struct VertexImagen {
    vertex: Vertex,
    model: String,
}

impl VertexImagen {
    pub fn new(http: reqwest::Client, config: &Config, project: &str) -> Self {
        Self {
            vertex: Vertex::new(http, config, project),
            model: config.image_model.clone(),
        }
    }
}

#[async_trait]
impl ImageModel for VertexImagen {
    fn name(&self) -> &str {
        &self.model
    }

    async fn generate_image(&self, prompt: &str) -> Result<Option<Vec<u8>>> {
        let body = json!({
            "instances": [{ "prompt": prompt }],
            "parameters": {
                "sampleCount": 1,
                "aspectRatio": "1:1",
                "safetySetting": "block_some",
                "personGeneration": "allow_adult",
            }
        });
        let url = self.vertex.model_url(&self.model, "predict");
        let response = self.vertex.post(&url).json(&body).send().await?;
        let parsed: PredictResponse = read_json("Imagen", response).await?;

        let Some(encoded) = parsed
            .predictions
            .into_iter()
            .find_map(|p| p.bytes_base64_encoded)
        else {
            return Ok(None);
        };
        let bytes = STANDARD
            .decode(encoded)
            .map_err(|e| Error::upstream("Imagen", format!("bad image payload: {e}")))?;
        Ok(Some(bytes))
    }
}

/// A Vertex AI model driven through `generateContent`; used for the video
/// model, whose answer is a text description.
#[derive(Clone)]
pub struct VertexText {
    vertex: Vertex,
    model: String,
}

impl VertexText {
    pub fn new(http: reqwest::Client, config: &Config, project: &str, model: &str) -> Self {
        Self {
            vertex: Vertex::new(http, config, project),
            model: model.to_string(),
        }
    }
}

#[async_trait]
impl TextModel for VertexText {
    fn name(&self) -> &str {
        &self.model
    }

    async fn generate_text(&self, prompt: &str) -> Result<String> {
        let url = self.vertex.model_url(&self.model, "generateContent");
        let response = self
            .vertex
            .post(&url)
            .json(&user_prompt(prompt))
            .send()
            .await?;
        let parsed: GenerateContentResponse = read_json("Vertex AI", response).await?;
        Ok(parsed.text())
    }
}
