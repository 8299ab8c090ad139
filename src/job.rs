//! One full agent run: caption, media, publish, clean up.

use tracing::{info, warn};

use crate::caption::CaptionGenerator;
use crate::config::Config;
use crate::error::Result;
use crate::media::{MediaGenerator, MediaItem, remove_local_files};
use crate::publish::{Published, Publisher};
use crate::stage::Stage;

#[derive(Debug)]
pub struct JobReport {
    pub caption: String,
    pub media: Vec<MediaItem>,
    pub published: Stage<Published>,
    pub removed: usize,
}

pub struct Job {
    caption: CaptionGenerator,
    media: MediaGenerator,
    publisher: Publisher,
}

impl Job {
    pub fn new(caption: CaptionGenerator, media: MediaGenerator, publisher: Publisher) -> Self {
        Self {
            caption,
            media,
            publisher,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        let http = reqwest::Client::new();
        Self::new(
            CaptionGenerator::from_config(http.clone(), config),
            MediaGenerator::from_config(http.clone(), config),
            Publisher::from_config(http, config),
        )
    }

    pub async fn run(&self, dry_run: bool) -> Result<Stage<JobReport>> {
        info!("Starting daily adventure generation");

        let caption = self.caption.generate(dry_run).await?;
        if caption.is_empty() {
            warn!("Story came back empty. Aborting.");
            return Ok(Stage::skipped("empty story"));
        }
        info!("Story: {}", caption);

        let media = match self.media.generate(&caption, dry_run).await? {
            Stage::Done(media) => media,
            Stage::Skipped(reason) => {
                warn!("No content generated ({}). Aborting.", reason);
                return Ok(Stage::Skipped(reason));
            }
        };

        let items = media.items();
        if items.is_empty() {
            warn!("No valid media paths found. Aborting.");
            return Ok(Stage::skipped("no media produced"));
        }

        let published = self.publisher.publish(&items, &caption, dry_run).await;
        if let Stage::Skipped(reason) = &published {
            warn!("Carousel was not published: {}", reason);
        }

        let removed = if dry_run {
            0
        } else {
            remove_local_files(items.iter().map(|item| item.path.as_path()))
        };
        info!("Removed {} local media files", removed);

        Ok(Stage::Done(JobReport {
            caption,
            media: items,
            published,
            removed,
        }))
    }
}
