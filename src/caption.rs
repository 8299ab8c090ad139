use std::sync::Arc;

use tracing::info;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::google::{GeminiText, TextModel};

pub const DRY_RUN_CAPTION: &str =
    "Bobo and Stella went to the moon and ate cheese. 🐰🐻‍❄️🧀";

const CAPTION_PROMPT: &str = concat!(
    "Write a short, funny, and cute Instagram caption (max 100 words) about a daily adventure ",
    "of Bobo (a rabbit in a green sweater) and Stella (a polar bear in a cream knit). ",
    "Include some emojis. The story should be suitable for a photo carousel."
);

/// Writes the day's adventure caption.
pub struct CaptionGenerator {
    model: Option<Arc<dyn TextModel>>,
}

impl CaptionGenerator {
    pub fn new(model: Option<Arc<dyn TextModel>>) -> Self {
        Self { model }
    }

    /// Without an API key only dry runs can succeed.
    pub fn from_config(http: reqwest::Client, config: &Config) -> Self {
        let model = GeminiText::new(http, config)
            .ok()
            .map(|m| Arc::new(m) as Arc<dyn TextModel>);
        Self::new(model)
    }

    pub async fn generate(&self, dry_run: bool) -> Result<String> {
        if dry_run {
            info!("[Dry Run] Skipping story generation, using dummy story");
            return Ok(DRY_RUN_CAPTION.to_string());
        }

        let model = self
            .model
            .as_ref()
            .ok_or(Error::NotConfigured("GOOGLE_API_KEY"))?;
        info!("Generating story using {}", model.name());
        let text = model.generate_text(CAPTION_PROMPT).await?;
        Ok(text.trim().to_string())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Scripted text model that records its prompts.
    pub struct FakeText {
        pub reply: std::result::Result<String, String>,
        pub prompts: Mutex<Vec<String>>,
    }

    impl FakeText {
        pub fn replying(text: &str) -> Arc<Self> {
            Arc::new(Self {
                reply: Ok(text.to_string()),
                prompts: Mutex::new(Vec::new()),
            })
        }

        pub fn failing(message: &str) -> Arc<Self> {
            Arc::new(Self {
                reply: Err(message.to_string()),
                prompts: Mutex::new(Vec::new()),
            })
        }

        pub fn calls(&self) -> usize {
            self.prompts.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl TextModel for FakeText {
        fn name(&self) -> &str {
            "fake-text"
        }

        async fn generate_text(&self, prompt: &str) -> Result<String> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            self.reply
                .clone()
                .map_err(|message| Error::upstream("fake", message))
        }
    }

    #[tokio::test]
    async fn dry_run_returns_fixed_caption_without_calling_model() {
        let model = FakeText::replying("unused");
        let generator = CaptionGenerator::new(Some(model.clone()));

        let caption = generator.generate(true).await.unwrap();
        assert_eq!(
            caption,
            "Bobo and Stella went to the moon and ate cheese. 🐰🐻‍❄️🧀"
        );
        assert_eq!(model.calls(), 0);
    }

    #[tokio::test]
    async fn trims_model_output() {
        let model = FakeText::replying("\n  Carrots for everyone! 🥕 \n");
        let generator = CaptionGenerator::new(Some(model.clone()));

        assert_eq!(generator.generate(false).await.unwrap(), "Carrots for everyone! 🥕");
        assert_eq!(model.calls(), 1);
        assert!(model.prompts.lock().unwrap()[0].contains("Bobo (a rabbit in a green sweater)"));
    }

    #[tokio::test]
    async fn model_failure_propagates() {
        let generator = CaptionGenerator::new(Some(FakeText::failing("quota")));
        assert!(generator.generate(false).await.is_err());
    }

    #[tokio::test]
    async fn missing_api_key_only_blocks_real_runs() {
        let generator = CaptionGenerator::from_config(reqwest::Client::new(), &Config::default());
        assert!(generator.generate(true).await.is_ok());
        assert!(matches!(
            generator.generate(false).await,
            Err(Error::NotConfigured("GOOGLE_API_KEY"))
        ));
    }
}
