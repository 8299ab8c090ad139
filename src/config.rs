use std::path::PathBuf;

use clap::Args;

pub const DEFAULT_TEXT_MODEL: &str = "gemini-1.5-flash";
pub const DEFAULT_IMAGE_MODEL: &str = "imagen-3.0-generate-001";
pub const DEFAULT_VIDEO_MODEL: &str = "veo-1.0-generate-001";
pub const DEFAULT_LOCATION: &str = "us-central1";
pub const DEFAULT_BUCKET: &str = "boboandstella-instagram";
pub const DEFAULT_SESSION_FILE: &str = "session.json";
pub const DEFAULT_SITE_OWNER: &str = "Qi-Han Wong";

pub const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com";
pub const GCS_API_BASE: &str = "https://storage.googleapis.com";
pub const GRAPH_API_BASE: &str = "https://graph.facebook.com/v18.0";
pub const INSTAGRAM_API_BASE: &str = "https://i.instagram.com";

/// Everything the agent and the web server read from the environment.
///
/// Built once at process start and handed to each component by reference.
/// Blank values count as unset.
#[derive(Args, Debug, Clone)]
pub struct Config {
    #[arg(long, env = "GOOGLE_API_KEY", hide_env_values = true)]
    pub google_api_key: Option<String>,

    #[arg(long, env = "GEMINI_MODEL", default_value = DEFAULT_TEXT_MODEL)]
    pub text_model: String,

    #[arg(long, env = "IMAGEN_MODEL", default_value = DEFAULT_IMAGE_MODEL)]
    pub image_model: String,

    #[arg(long, env = "VEO_MODEL", default_value = DEFAULT_VIDEO_MODEL)]
    pub video_model: String,

    #[arg(long, env = "GOOGLE_CLOUD_PROJECT")]
    pub cloud_project: Option<String>,

    #[arg(long, env = "GOOGLE_CLOUD_LOCATION", default_value = DEFAULT_LOCATION)]
    pub cloud_location: String,

    /// OAuth bearer token for Vertex AI and Cloud Storage
    #[arg(long, env = "GOOGLE_CLOUD_ACCESS_TOKEN", hide_env_values = true)]
    pub cloud_access_token: Option<String>,

    #[arg(long, env = "GCS_BUCKET", default_value = DEFAULT_BUCKET)]
    pub bucket: String,

    #[arg(long, env = "INSTAGRAM_ACCESS_TOKEN", hide_env_values = true)]
    pub instagram_access_token: Option<String>,

    #[arg(long, env = "INSTAGRAM_BUSINESS_ACCOUNT_ID")]
    pub instagram_account_id: Option<String>,

    #[arg(long, env = "INSTAGRAM_SESSION_ID", hide_env_values = true)]
    pub instagram_session_id: Option<String>,

    #[arg(long, env = "INSTAGRAM_SESSION_FILE", default_value = DEFAULT_SESSION_FILE)]
    pub session_file: PathBuf,

    /// Directory generated media is written to
    #[arg(long, env = "AGENT_WORK_DIR", default_value = ".")]
    pub work_dir: PathBuf,

    #[arg(long, env = "GEMINI_API_BASE", default_value = GEMINI_API_BASE, hide = true)]
    pub gemini_api_base: String,

    /// Defaults to the regional endpoint of `cloud_location`
    #[arg(long, env = "VERTEX_API_BASE", hide = true)]
    pub vertex_api_base: Option<String>,

    #[arg(long, env = "GCS_API_BASE", default_value = GCS_API_BASE, hide = true)]
    pub gcs_api_base: String,

    #[arg(long, env = "GRAPH_API_BASE", default_value = GRAPH_API_BASE, hide = true)]
    pub graph_api_base: String,

    #[arg(long, env = "INSTAGRAM_API_BASE", default_value = INSTAGRAM_API_BASE, hide = true)]
    pub instagram_api_base: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            google_api_key: None,
            text_model: DEFAULT_TEXT_MODEL.to_string(),
            image_model: DEFAULT_IMAGE_MODEL.to_string(),
            video_model: DEFAULT_VIDEO_MODEL.to_string(),
            cloud_project: None,
            cloud_location: DEFAULT_LOCATION.to_string(),
            cloud_access_token: None,
            bucket: DEFAULT_BUCKET.to_string(),
            instagram_access_token: None,
            instagram_account_id: None,
            instagram_session_id: None,
            session_file: PathBuf::from(DEFAULT_SESSION_FILE),
            work_dir: PathBuf::from("."),
            gemini_api_base: GEMINI_API_BASE.to_string(),
            vertex_api_base: None,
            gcs_api_base: GCS_API_BASE.to_string(),
            graph_api_base: GRAPH_API_BASE.to_string(),
            instagram_api_base: INSTAGRAM_API_BASE.to_string(),
        }
    }
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

impl Config {
    pub fn google_api_key(&self) -> Option<&str> {
        present(&self.google_api_key)
    }

    /// The cloud project, unless unset or still the `.env` template value.
    pub fn cloud_project(&self) -> Option<&str> {
        present(&self.cloud_project).filter(|p| !p.contains("your_project_id"))
    }

    pub fn cloud_access_token(&self) -> Option<&str> {
        present(&self.cloud_access_token)
    }

    /// Access token and business account id, only when both are set.
    pub fn graph_credentials(&self) -> Option<(&str, &str)> {
        Some((
            present(&self.instagram_access_token)?,
            present(&self.instagram_account_id)?,
        ))
    }

    pub fn session_id(&self) -> Option<&str> {
        present(&self.instagram_session_id)
    }

    pub fn vertex_api_base(&self) -> String {
        match present(&self.vertex_api_base) {
            Some(base) => base.to_string(),
            None => format!("https://{}-aiplatform.googleapis.com", self.cloud_location),
        }
    }
}
