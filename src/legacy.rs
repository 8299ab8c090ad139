//! Album upload through a stored Instagram web session.
//!
//! Used only when Graph API credentials are missing. The session id and the
//! user it belongs to are kept in a JSON file between runs.

use std::fs;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use reqwest::header::COOKIE;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{debug, info};

use crate::error::{Error, Result};

#[async_trait]
pub trait AlbumUploader: Send + Sync {
    /// Logs in with `session_id` and posts `photos` as one album. Returns the media id.
    async fn album_upload(
        &self,
        session_id: &str,
        photos: &[PathBuf],
        caption: &str,
    ) -> Result<String>;
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSettings {
    pub session_id: Option<String>,
    pub user_id: Option<String>,
}

pub fn load_settings(path: &Path) -> Result<SessionSettings> {
    if !path.exists() {
        return Ok(SessionSettings::default());
    }
    let data = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&data)?)
}

pub fn save_settings(path: &Path, settings: &SessionSettings) -> Result<()> {
    let data = serde_json::to_string_pretty(settings)?;
    fs::write(path, data)?;
    Ok(())
}

/// Instagram ids arrive as numbers or strings.
fn id_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

pub struct SessionClient {
    http: reqwest::Client,
    base: String,
    session_file: PathBuf,
}

impl SessionClient {
    pub fn new(http: reqwest::Client, base: &str, session_file: impl Into<PathBuf>) -> Self {
        Self {
            http,
            base: base.trim_end_matches('/').to_string(),
            session_file: session_file.into(),
        }
    }

    fn cookie(settings: &SessionSettings) -> String {
        let session_id = settings.session_id.as_deref().unwrap_or_default();
        match &settings.user_id {
            Some(user_id) => format!("sessionid={session_id}; ds_user_id={user_id}"),
            None => format!("sessionid={session_id}"),
        }
    }

    async fn send(
        &self,
        service: &'static str,
        request: reqwest::RequestBuilder,
        settings: &SessionSettings,
    ) -> Result<Value> {
        let response = request.header(COOKIE, Self::cookie(settings)).send().await?;
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(Error::upstream(service, format!("{status}: {body}")));
        }
        debug!("{} response: {:.200}", service, body);
        Ok(serde_json::from_str(&body)?)
    }

    async fn login(&self, settings: &mut SessionSettings, session_id: &str) -> Result<()> {
        settings.session_id = Some(session_id.to_string());
        let request = self
            .http
            .get(format!("{}/api/v1/accounts/current_user/", self.base))
            .query(&[("edit", "true")]);
        let body = self.send("Instagram login", request, settings).await?;

        settings.user_id = id_string(&body["user"]["pk"]);
        if settings.user_id.is_none() {
            return Err(Error::upstream("Instagram login", "session id was not accepted"));
        }
        Ok(())
    }
}

#[async_trait]
impl AlbumUploader for SessionClient {
    async fn album_upload(
        &self,
        session_id: &str,
        photos: &[PathBuf],
        caption: &str,
    ) -> Result<String> {
        let mut settings = load_settings(&self.session_file)?;
        info!("Logging in via session id");
        self.login(&mut settings, session_id).await?;
        save_settings(&self.session_file, &settings)?;
        info!("Login successful, session saved");

        let sidecar_id = chrono::Utc::now().timestamp_millis();
        let mut children = Vec::new();
        for (i, photo) in photos.iter().enumerate() {
            let upload_id = (sidecar_id + i as i64).to_string();
            info!("Uploading album photo {}", photo.display());
            let bytes = tokio::fs::read(photo).await?;
            let params = json!({ "upload_id": upload_id, "media_type": "1" });
            let request = self
                .http
                .post(format!("{}/rupload_igphoto/fb_uploader_{}", self.base, upload_id))
                .header("X-Instagram-Rupload-Params", params.to_string())
                .header("X-Entity-Length", bytes.len().to_string())
                .header("Offset", "0")
                .body(bytes);
            self.send("Instagram upload", request, &settings).await?;
            children.push(json!({ "upload_id": upload_id }));
        }

        let request = self
            .http
            .post(format!("{}/api/v1/media/configure_sidecar/", self.base))
            .json(&json!({
                "caption": caption,
                "client_sidecar_id": sidecar_id.to_string(),
                "children_metadata": children,
            }));
        let body = self.send("Instagram album", request, &settings).await?;

        let media = &body["media"];
        id_string(&media["pk"])
            .or_else(|| id_string(&media["id"]))
            .ok_or_else(|| Error::upstream("Instagram album", "response carried no media id"))
    }
}
