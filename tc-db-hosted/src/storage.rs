use reqwest::header::CONTENT_TYPE;
use tc_core::RepositoryError;
use tracing::debug;

use crate::http::check;

/// Object-storage bucket that cover sheets are uploaded to before they are
/// linked to a record. Uploaded objects are served from the bucket's public
/// path.
#[derive(Debug, Clone)]
pub struct StorageClient {
    http: reqwest::Client,
    base_url: String,
    bucket: String,
    api_key: String,
}

/// Keep letters, digits, `.`, `-` and `_`; anything else becomes `_`.
pub fn sanitize_filename(name: &str) -> String {
    let cleaned: String = name
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    if cleaned.is_empty() {
        "document.pdf".to_string()
    } else {
        cleaned
    }
}

impl StorageClient {
    pub fn new(
        http: reqwest::Client,
        base_url: &str,
        bucket: &str,
        api_key: &str,
    ) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            bucket: bucket.to_string(),
            api_key: api_key.to_string(),
        }
    }

    pub fn public_url(
        &self,
        object_path: &str,
    ) -> String {
        format!("{}/object/public/{}/{}", self.base_url, self.bucket, object_path)
    }

    /// Upload `bytes` under `object_path` and return its public url.
    pub async fn upload(
        &self,
        object_path: &str,
        bytes: &[u8],
        content_type: &str,
    ) -> Result<String, RepositoryError> {
        let url = format!("{}/object/{}/{}", self.base_url, self.bucket, object_path);

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.api_key)
            .header("apikey", &self.api_key)
            .header("x-upsert", "true")
            .header(CONTENT_TYPE, content_type)
            .body(bytes.to_vec())
            .send()
            .await
            .map_err(|e| RepositoryError::Connection(e.to_string()))?;
        check(response).await?;

        debug!(object = object_path, bytes = bytes.len(), "uploaded to storage");
        Ok(self.public_url(object_path))
    }
}
