//! Uploads to a public Cloud Storage bucket.

use std::path::Path;

use async_trait::async_trait;
use tracing::info;

use crate::config::Config;
use crate::error::{Error, Result};

/// Where uploaded objects are publicly served from.
pub const PUBLIC_HOST: &str = "https://storage.googleapis.com";

#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Uploads `local` under `prefix` and returns its public URL.
    async fn upload(&self, local: &Path, prefix: &str) -> Result<String>;
}

/// `{prefix}/{unix seconds}_{file name}`.
pub fn object_key(prefix: &str, local: &Path, unix_seconds: i64) -> String {
    let name = local
        .file_name()
        .map(|n| n.to_string_lossy())
        .unwrap_or_default();
    format!("{}/{}_{}", prefix.trim_end_matches('/'), unix_seconds, name)
}

pub fn public_url(bucket: &str, key: &str) -> String {
    format!("{PUBLIC_HOST}/{bucket}/{key}")
}

/// Cloud Storage JSON API media upload.
pub struct GcsUploader {
    http: reqwest::Client,
    base: String,
    bucket: String,
    token: Option<String>,
}

impl GcsUploader {
    pub fn from_config(http: reqwest::Client, config: &Config) -> Result<Self> {
        config
            .cloud_project()
            .ok_or(Error::NotConfigured("GOOGLE_CLOUD_PROJECT"))?;
        Ok(Self {
            http,
            base: config.gcs_api_base.trim_end_matches('/').to_string(),
            bucket: config.bucket.clone(),
            token: config.cloud_access_token().map(str::to_string),
        })
    }
}

#[async_trait]
impl ObjectStore for GcsUploader {
    async fn upload(&self, local: &Path, prefix: &str) -> Result<String> {
        let bytes = tokio::fs::read(local).await?;
        let key = object_key(prefix, local, chrono::Utc::now().timestamp());
        let content_type = mime_guess::from_path(local).first_or_octet_stream();
        info!("Uploading {} to gs://{}/{}", local.display(), self.bucket, key);

        let url = format!("{}/upload/storage/v1/b/{}/o", self.base, self.bucket);
        let mut request = self
            .http
            .post(&url)
            .query(&[("uploadType", "media"), ("name", key.as_str())])
            .header(reqwest::header::CONTENT_TYPE, content_type.as_ref())
            .body(bytes);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::upstream("Cloud Storage", format!("{status}: {body}")));
        }

        let url = public_url(&self.bucket, &key);
        info!("Uploaded to {}", url);
        Ok(url)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::sync::Mutex;
    use wiremock::matchers::{body_bytes, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    /// Records uploads; fails for any file whose name contains `fail_on`.
    #[derive(Default)]
    pub struct FakeStore {
        pub fail_on: Option<String>,
        pub uploads: Mutex<Vec<(PathBuf, String)>>,
    }

    #[async_trait]
    impl ObjectStore for FakeStore {
        async fn upload(&self, local: &Path, prefix: &str) -> Result<String> {
            self.uploads
                .lock()
                .unwrap()
                .push((local.to_path_buf(), prefix.to_string()));
            if let Some(needle) = &self.fail_on {
                if local.to_string_lossy().contains(needle.as_str()) {
                    return Err(Error::upstream("fake store", "refused"));
                }
            }
            Ok(public_url("bucket", &object_key(prefix, local, 1700000000)))
        }
    }

    #[test]
    fn key_embeds_prefix_timestamp_and_basename() {
        let local = Path::new("/tmp/run/generated_image_1_0.jpg");
        let key = object_key("instagram", local, 1700000123);
        assert_eq!(key, "instagram/1700000123_generated_image_1_0.jpg");
        assert_eq!(
            public_url("boboandstella-instagram", &key),
            "https://storage.googleapis.com/boboandstella-instagram/instagram/1700000123_generated_image_1_0.jpg"
        );
    }

    #[test]
    fn same_file_in_later_second_gets_new_key() {
        let local = Path::new("dummy_image_1.jpg");
        assert_ne!(
            object_key("website_demo", local, 10),
            object_key("website_demo", local, 11)
        );
    }

    #[test]
    fn uploader_needs_a_project() {
        let result = GcsUploader::from_config(reqwest::Client::new(), &Config::default());
        assert!(matches!(result, Err(Error::NotConfigured(_))));
    }

    #[tokio::test]
    async fn uploads_bytes_and_returns_public_url() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/upload/storage/v1/b/my-bucket/o"))
            .and(query_param("uploadType", "media"))
            .and(header("content-type", "image/jpeg"))
            .and(header("authorization", "Bearer tok"))
            .and(body_bytes(b"jpeg!".to_vec()))
            .respond_with(ResponseTemplate::new(200).set_body_string("{}"))
            .expect(1)
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let local = dir.path().join("pic.jpg");
        std::fs::write(&local, b"jpeg!").unwrap();

        let config = Config {
            cloud_project: Some("p".into()),
            cloud_access_token: Some("tok".into()),
            bucket: "my-bucket".into(),
            gcs_api_base: server.uri(),
            ..Config::default()
        };
        let store = GcsUploader::from_config(reqwest::Client::new(), &config).unwrap();
        let url = store.upload(&local, "website_demo").await.unwrap();

        assert!(url.starts_with("https://storage.googleapis.com/my-bucket/website_demo/"));
        assert!(url.ends_with("_pic.jpg"));
    }

    #[tokio::test]
    async fn missing_file_is_an_error() {
        let config = Config {
            cloud_project: Some("p".into()),
            ..Config::default()
        };
        let store = GcsUploader::from_config(reqwest::Client::new(), &config).unwrap();
        let err = store
            .upload(Path::new("/definitely/not/here.jpg"), "instagram")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }

    #[tokio::test]
    async fn rejected_upload_is_upstream_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_string("no auth"))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let local = dir.path().join("pic.jpg");
        std::fs::write(&local, b"x").unwrap();

        let config = Config {
            cloud_project: Some("p".into()),
            gcs_api_base: server.uri(),
            ..Config::default()
        };
        let store = GcsUploader::from_config(reqwest::Client::new(), &config).unwrap();
        let err = store.upload(&local, "instagram").await.unwrap_err();
        assert!(matches!(err, Error::Upstream { service: "Cloud Storage", .. }));
    }
}
