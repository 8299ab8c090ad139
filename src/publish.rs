//! Carousel publishing.
//!
//! With Graph API credentials: upload each item, stage it as a container,
//! bundle the containers into a carousel, publish. Without them: one album
//! upload through the stored web session, if there is one.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::{error, info, warn};

use crate::config::Config;
use crate::graph::{GraphApi, GraphClient};
use crate::legacy::{AlbumUploader, SessionClient};
use crate::media::{MediaItem, MediaKind};
use crate::stage::Stage;
use crate::storage::{GcsUploader, ObjectStore};

pub const GRAPH_KEY_PREFIX: &str = "instagram";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Published {
    DryRun,
    Graph { post_id: String },
    Legacy { media_id: String },
}

pub struct LegacyLogin {
    pub session_id: String,
    pub uploader: Arc<dyn AlbumUploader>,
}

pub struct Publisher {
    graph: Option<Arc<dyn GraphApi>>,
    store: Option<Arc<dyn ObjectStore>>,
    legacy: Option<LegacyLogin>,
}

impl Publisher {
    pub fn new(
        graph: Option<Arc<dyn GraphApi>>,
        store: Option<Arc<dyn ObjectStore>>,
        legacy: Option<LegacyLogin>,
    ) -> Self {
        Self {
            graph,
            store,
            legacy,
        }
    }

    pub fn from_config(http: reqwest::Client, config: &Config) -> Self {
        let graph = config
            .graph_credentials()
            .map(|(token, account)| -> Arc<dyn GraphApi> {
                Arc::new(GraphClient::new(
                    http.clone(),
                    &config.graph_api_base,
                    token,
                    account,
                ))
            });
        let store = GcsUploader::from_config(http.clone(), config)
            .ok()
            .map(|s| Arc::new(s) as Arc<dyn ObjectStore>);
        let legacy = config.session_id().map(|session_id| LegacyLogin {
            session_id: session_id.to_string(),
            uploader: Arc::new(SessionClient::new(
                http,
                &config.instagram_api_base,
                &config.session_file,
            )),
        });
        Self::new(graph, store, legacy)
    }

    pub async fn publish(
        &self,
        items: &[MediaItem],
        caption: &str,
        dry_run: bool,
    ) -> Stage<Published> {
        if dry_run {
            info!(
                "[Dry Run] Would upload {} items with caption: {:.50}...",
                items.len(),
                caption
            );
            return Stage::Done(Published::DryRun);
        }

        let Some(graph) = &self.graph else {
            warn!("Instagram Graph API credentials not found, falling back to session id method");
            return self.publish_legacy(items, caption).await;
        };
        let Some(store) = &self.store else {
            warn!("Cloud Storage is not configured, falling back to session id method");
            return self.publish_legacy(items, caption).await;
        };

        info!("Uploading via Instagram Graph API");
        self.publish_graph(graph.as_ref(), store.as_ref(), items, caption)
            .await
    }

    async fn publish_graph(
        &self,
        graph: &dyn GraphApi,
        store: &dyn ObjectStore,
        items: &[MediaItem],
        caption: &str,
    ) -> Stage<Published> {
        let mut children = Vec::new();
        for item in items {
            if !item.path.is_file() {
                continue;
            }
            let url = match store.upload(&item.path, GRAPH_KEY_PREFIX).await {
                Ok(url) => url,
                Err(e) => {
                    error!("Failed to upload {}: {}", item.path.display(), e);
                    continue;
                }
            };
            match graph.create_item_container(&url, item.kind).await {
                Ok(id) => {
                    info!("Created Instagram media container, ID: {}", id);
                    children.push(id);
                }
                Err(e) => error!("Failed to create media container: {}", e),
            }
        }

        if children.is_empty() {
            warn!("No media uploaded successfully");
            return Stage::skipped("no media containers were created");
        }

        info!("Creating carousel from {} containers", children.len());
        let carousel_id = match graph.create_carousel(caption, &children).await {
            Ok(id) => id,
            Err(e) => {
                error!("Failed to create carousel: {}", e);
                return Stage::skipped(format!("carousel assembly failed: {e}"));
            }
        };
        info!("Carousel created, ID: {}", carousel_id);

        match graph.publish(&carousel_id).await {
            Ok(post_id) => {
                info!("Successfully published! Post ID: {}", post_id);
                Stage::Done(Published::Graph { post_id })
            }
            Err(e) => {
                error!("Failed to publish: {}", e);
                Stage::skipped(format!("publish failed: {e}"))
            }
        }
    }

    async fn publish_legacy(&self, items: &[MediaItem], caption: &str) -> Stage<Published> {
        let Some(legacy) = &self.legacy else {
            warn!("No Instagram credentials available");
            return Stage::skipped("no Instagram credentials configured");
        };

        let photos: Vec<PathBuf> = items
            .iter()
            .filter(|item| item.kind == MediaKind::Image)
            .map(|item| item.path.clone())
            .collect();
        if photos.is_empty() {
            return Stage::skipped("no photos for an album");
        }

        info!("Uploading album of {} photos", photos.len());
        match legacy
            .uploader
            .album_upload(&legacy.session_id, &photos, caption)
            .await
        {
            Ok(media_id) => {
                info!("Upload successful!");
                Stage::Done(Published::Legacy { media_id })
            }
            Err(e) => {
                error!("Legacy upload failed: {}", e);
                Stage::skipped(format!("legacy upload failed: {e}"))
            }
        }
    }
}
