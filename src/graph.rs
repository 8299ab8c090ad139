//! Instagram Graph API content publishing calls.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use crate::error::{Error, Result};
use crate::media::MediaKind;

/// The three calls of the container protocol. Nothing becomes visible until
/// `publish` succeeds.
#[async_trait]
pub trait GraphApi: Send + Sync {
    /// Stages one carousel item and returns its container id.
    async fn create_item_container(&self, url: &str, kind: MediaKind) -> Result<String>;

    /// Bundles staged items into a carousel container.
    async fn create_carousel(&self, caption: &str, children: &[String]) -> Result<String>;

    /// Makes the carousel live and returns the post id.
    async fn publish(&self, creation_id: &str) -> Result<String>;
}

#[derive(Debug, Deserialize)]
struct IdResponse {
    id: String,
}

pub struct GraphClient {
    http: reqwest::Client,
    base: String,
    access_token: String,
    account_id: String,
}

impl GraphClient {
    pub fn new(http: reqwest::Client, base: &str, access_token: &str, account_id: &str) -> Self {
        Self {
            http,
            base: base.trim_end_matches('/').to_string(),
            access_token: access_token.to_string(),
            account_id: account_id.to_string(),
        }
    }

    async fn post(&self, edge: &str, params: &[(&str, &str)]) -> Result<String> {
        let url = format!("{}/{}/{}", self.base, self.account_id, edge);
        let mut form = params.to_vec();
        form.push(("access_token", self.access_token.as_str()));

        let response = self.http.post(&url).form(&form).send().await?;
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(Error::upstream("Graph API", format!("{status}: {body}")));
        }
        debug!("Graph API {} response: {}", edge, body);
        let parsed: IdResponse = serde_json::from_str(&body)?;
        Ok(parsed.id)
    }
}

#[async_trait]
impl GraphApi for GraphClient {
    async fn create_item_container(&self, url: &str, kind: MediaKind) -> Result<String> {
        match kind {
            MediaKind::Image => {
                self.post("media", &[("image_url", url), ("is_carousel_item", "true")])
                    .await
            }
            MediaKind::Video => {
                self.post(
                    "media",
                    &[
                        ("media_type", "VIDEO"),
                        ("video_url", url),
                        ("is_carousel_item", "true"),
                    ],
                )
                .await
            }
        }
    }

    async fn create_carousel(&self, caption: &str, children: &[String]) -> Result<String> {
        let children = children.join(",");
        self.post(
            "media",
            &[
                ("caption", caption),
                ("media_type", "CAROUSEL"),
                ("children", children.as_str()),
            ],
        )
        .await
    }

    async fn publish(&self, creation_id: &str) -> Result<String> {
        self.post("media_publish", &[("creation_id", creation_id)])
            .await
    }
}
