//! Supabase Storage REST backend.

use async_trait::async_trait;

use crate::{http_fetch, validate_object_name, BlobStore, StorageError, MAX_FETCH_BYTES};

pub struct SupabaseStore {
    client: reqwest::Client,
    /// Project URL, e.g. `https://xyz.supabase.co`.
    base_url: String,
    key: String,
    bucket: String,
}

impl SupabaseStore {
    pub fn new(base_url: String, key: String, bucket: String) -> Self {
        Self::with_client(reqwest::Client::new(), base_url, key, bucket)
    }

    pub fn with_client(
        client: reqwest::Client,
        base_url: String,
        key: String,
        bucket: String,
    ) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            key,
            bucket,
        }
    }

    fn object_url(&self, folder: &str, file_name: &str) -> String {
        format!(
            "{}/storage/v1/object/{}/{folder}/{file_name}",
            self.base_url, self.bucket
        )
    }

    /// Prefix shared by every public URL of this bucket.
    fn public_prefix(&self) -> String {
        format!("{}/storage/v1/object/public/{}/", self.base_url, self.bucket)
    }

    /// Whether `url` is a public object URL of this bucket.
    fn owns(&self, url: &str) -> bool {
        url.strip_prefix(&self.public_prefix()).is_some_and(|path| {
            !path.is_empty()
                && path
                    .split('/')
                    .all(|segment| !segment.is_empty() && segment != "." && segment != "..")
        })
    }
}

#[async_trait]
impl BlobStore for SupabaseStore {
    async fn upload(
        &self,
        folder: &str,
        file_name: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<String, StorageError> {
        validate_object_name(file_name)?;
        let size = bytes.len();

        let response = self
            .client
            .post(self.object_url(folder, file_name))
            .bearer_auth(&self.key)
            .header("apikey", &self.key)
            .header("x-upsert", "true")
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .body(bytes)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            tracing::error!(folder, file_name, status = status.as_u16(), %body, "Supabase upload failed");
            return Err(StorageError::Api {
                status: status.as_u16(),
                body,
            });
        }

        tracing::debug!(folder, file_name, size, "Supabase upload complete");
        Ok(self.public_url(folder, file_name))
    }

    fn public_url(&self, folder: &str, file_name: &str) -> String {
        format!(
            "{}/storage/v1/object/public/{}/{folder}/{file_name}",
            self.base_url, self.bucket
        )
    }

    async fn fetch(&self, url: &str) -> Result<Vec<u8>, StorageError> {
        if !self.owns(url) {
            return Err(StorageError::InvalidLocation(format!(
                "'{url}' is not an object of bucket '{}'",
                self.bucket
            )));
        }
        http_fetch(&self.client, url, MAX_FETCH_BYTES).await
    }

    fn backend_name(&self) -> &'static str {
        "supabase"
    }
}
