//! Image and video generation for one carousel.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{error, info, warn};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::google::{ImageModel, TextModel, VertexImagen, VertexText};
use crate::imaging;
use crate::stage::Stage;

pub const DRY_RUN_IMAGES: [&str; 2] = ["dummy_image_url_1", "dummy_image_url_2"];
pub const DRY_RUN_VIDEO: &str = "dummy_video_url";
pub const VIDEO_PLACEHOLDER_FILE: &str = "video_placeholder.txt";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Image,
    Video,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaItem {
    pub path: PathBuf,
    pub kind: MediaKind,
}

impl MediaItem {
    pub fn image(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            kind: MediaKind::Image,
        }
    }

    pub fn video(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            kind: MediaKind::Video,
        }
    }
}

/// What one generation run produced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MediaSet {
    pub images: Vec<PathBuf>,
    pub video: Option<PathBuf>,
}

impl MediaSet {
    pub fn is_empty(&self) -> bool {
        self.images.is_empty() && self.video.is_none()
    }

    /// Images then the video, skipping blank paths.
    pub fn items(&self) -> Vec<MediaItem> {
        let images = self.images.iter().cloned().map(MediaItem::image);
        let video = self.video.iter().cloned().map(MediaItem::video);
        images
            .chain(video)
            .filter(|item| !item.path.as_os_str().is_empty())
            .collect()
    }
}

fn image_prompts(caption: &str) -> [String; 2] {
    let scene = caption.to_lowercase();
    [
        format!(
            "Ultra-realistic photograph of a small brown rabbit wearing a forest green knitted sweater and a white polar bear cub wearing a cream-colored knitted sweater, {scene}, professional photography, natural lighting, shallow depth of field, 50mm lens, highly detailed fur texture, cozy domestic setting, Instagram aesthetic"
        ),
        format!(
            "Professional studio photograph of a brown rabbit in a green sweater and a white polar bear cub in a cream sweater, {scene}, close-up shot, soft natural window light, photorealistic, ultra high detail, bokeh background, warm tones, lifestyle photography style"
        ),
    ]
}

fn video_prompt(caption: &str) -> String {
    format!(
        "A short, funny, and cute animated video featuring Bobo the rabbit in a green sweater and Stella the polar bear in a cream knit, depicting the adventure: {caption}. Focus on their interaction and expressions."
    )
}

/// The Vertex AI models; present only when a cloud project is configured.
pub struct MediaModels {
    pub image: Arc<dyn ImageModel>,
    pub video: Arc<dyn TextModel>,
}

impl MediaModels {
    pub fn from_config(http: reqwest::Client, config: &Config) -> Option<Self> {
        let project = config.cloud_project()?;
        Some(Self {
            image: Arc::new(VertexImagen::new(http.clone(), config, project)),
            video: Arc::new(VertexText::new(http, config, project, &config.video_model)),
        })
    }
}

pub struct MediaGenerator {
    models: Option<MediaModels>,
    work_dir: PathBuf,
}

impl MediaGenerator {
    pub fn new(models: Option<MediaModels>, work_dir: impl Into<PathBuf>) -> Self {
        Self {
            models,
            work_dir: work_dir.into(),
        }
    }

    pub fn from_config(http: reqwest::Client, config: &Config) -> Self {
        Self::new(MediaModels::from_config(http, config), &config.work_dir)
    }

    pub fn image_model_name(&self) -> Option<&str> {
        self.models.as_ref().map(|m| m.image.name())
    }

    /// Generates the carousel images and the video stand-in.
    ///
    /// A missing cloud project skips the stage. Model failures and replies
    /// that do not decode only drop the affected item; if no image survives,
    /// two placeholder squares are written instead. Errors are reserved for
    /// local file problems, after removing what this run already wrote.
    pub async fn generate(&self, caption: &str, dry_run: bool) -> Result<Stage<MediaSet>> {
        if dry_run {
            info!("[Dry Run] Skipping image and video generation");
            return Ok(Stage::Done(MediaSet {
                images: DRY_RUN_IMAGES.iter().map(PathBuf::from).collect(),
                video: Some(PathBuf::from(DRY_RUN_VIDEO)),
            }));
        }

        let Some(models) = &self.models else {
            warn!("GOOGLE_CLOUD_PROJECT not set, skipping Vertex AI generation");
            return Ok(Stage::skipped("GOOGLE_CLOUD_PROJECT is not configured"));
        };

        let mut images = self.generate_images(models.image.as_ref(), caption).await?;
        if images.is_empty() {
            warn!("No images generated, using placeholder images");
            images = self.write_placeholders()?;
        }

        let video = self.generate_video(models.video.as_ref(), caption).await;

        Ok(Stage::Done(MediaSet { images, video }))
    }

    async fn generate_images(
        &self,
        model: &dyn ImageModel,
        caption: &str,
    ) -> Result<Vec<PathBuf>> {
        info!("Generating images using {}", model.name());
        let stamp = chrono::Utc::now().timestamp();
        let mut paths = Vec::new();

        for (i, prompt) in image_prompts(caption).iter().enumerate() {
            info!("Generating image {}", i + 1);
            let bytes = match model.generate_image(prompt).await {
                Ok(Some(bytes)) => bytes,
                Ok(None) => {
                    warn!("Image {} came back empty", i + 1);
                    continue;
                }
                Err(e) => {
                    error!("Error generating image {}: {}", i + 1, e);
                    continue;
                }
            };

            let dest = self.work_dir.join(format!("generated_image_{stamp}_{i}.jpg"));
            match imaging::save_as_jpeg(&bytes, &dest) {
                Ok(()) => {
                    info!("Saved {}", dest.display());
                    paths.push(dest);
                }
                Err(Error::Image(e)) => {
                    error!("Image {} is not a usable image: {}", i + 1, e);
                    remove_local_files([dest.as_path()]);
                }
                Err(e) => {
                    paths.push(dest);
                    remove_local_files(paths.iter().map(PathBuf::as_path));
                    return Err(e);
                }
            }
        }
        Ok(paths)
    }

    fn write_placeholders(&self) -> Result<Vec<PathBuf>> {
        let mut paths = Vec::new();
        for i in 0..2u8 {
            let dest = self.work_dir.join(format!("dummy_image_{}.jpg", i + 1));
            let written = imaging::write_placeholder(i, &dest);
            paths.push(dest);
            if let Err(e) = written {
                remove_local_files(paths.iter().map(PathBuf::as_path));
                return Err(e);
            }
        }
        Ok(paths)
    }

    async fn generate_video(&self, model: &dyn TextModel, caption: &str) -> Option<PathBuf> {
        info!("Generating video using {}", model.name());
        let text = match model.generate_text(&video_prompt(caption)).await {
            Ok(text) if !text.trim().is_empty() => text,
            Ok(_) => {
                warn!("Video model returned nothing");
                return None;
            }
            Err(e) => {
                warn!("Video generation failed/skipped: {}", e);
                return None;
            }
        };

        info!("Video info: {:.200}", text);
        let dest = self.work_dir.join(VIDEO_PLACEHOLDER_FILE);
        match tokio::fs::write(&dest, text).await {
            Ok(()) => Some(dest),
            Err(e) => {
                warn!("Could not write {}: {}", dest.display(), e);
                None
            }
        }
    }
}

/// Removes every produced file that still exists. Returns how many were removed.
pub fn remove_local_files<'a>(paths: impl IntoIterator<Item = &'a Path>) -> usize {
    let mut removed = 0;
    for path in paths {
        if !path.is_file() {
            continue;
        }
        match std::fs::remove_file(path) {
            Ok(()) => removed += 1,
            Err(e) => warn!("Could not remove {}: {}", path.display(), e),
        }
    }
    removed
}
