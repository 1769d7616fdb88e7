//! Blob storage for story covers, character images and generated scenes.
//!
//! Objects live in one of two folders ([`ASSETS_FOLDER`] and
//! [`OUTPUT_FOLDER`]) and are addressed by public URL once uploaded.
//! Two backends exist: Supabase Storage over its REST API, and a local
//! directory served by the API under `/assets`.

pub mod config;
pub mod local;
pub mod supabase;

use async_trait::async_trait;
use creaition_core::naming;

pub use config::{StorageBackend, StorageConfig};
pub use creaition_core::naming::{ASSETS_FOLDER, OUTPUT_FOLDER};
pub use local::LocalStore;
pub use supabase::SupabaseStore;

/// Errors from a storage backend.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Storage request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The backend answered with a non-2xx status code.
    #[error("Storage API error ({status}): {body}")]
    Api { status: u16, body: String },

    /// The object name or URL cannot be mapped to this store.
    #[error("Invalid storage location: {0}")]
    InvalidLocation(String),

    /// A fetched object exceeded [`MAX_FETCH_BYTES`].
    #[error("Stored object exceeds {limit} bytes")]
    TooLarge { limit: usize },
}

/// Largest object [`BlobStore::fetch`] will load into memory.
pub const MAX_FETCH_BYTES: usize = 10 * 1024 * 1024;

/// Pluggable object store.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store `bytes` as `{folder}/{file_name}`, replacing any existing
    /// object, and return its public URL.
    async fn upload(
        &self,
        folder: &str,
        file_name: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<String, StorageError>;

    /// Public URL of `{folder}/{file_name}`. Does not check existence.
    fn public_url(&self, folder: &str, file_name: &str) -> String;

    /// Download the object behind a public URL handed out by this store.
    ///
    /// URLs from anywhere else are rejected with
    /// [`StorageError::InvalidLocation`]; bodies over [`MAX_FETCH_BYTES`]
    /// with [`StorageError::TooLarge`].
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, StorageError>;

    /// Short backend name for logs and health output.
    fn backend_name(&self) -> &'static str;
}

/// Upload a generated scene image to the output folder.
pub async fn upload_scene_image(
    store: &dyn BlobStore,
    story_title: &str,
    scene_number: i32,
    bytes: Vec<u8>,
    mime_type: &str,
) -> Result<String, StorageError> {
    let file_name = naming::scene_image_filename(
        story_title,
        scene_number,
        naming::extension_for_mime(mime_type),
    );
    let url = store.upload(OUTPUT_FOLDER, &file_name, bytes, mime_type).await?;
    tracing::info!(%file_name, backend = store.backend_name(), "Uploaded scene image");
    Ok(url)
}

/// Upload a story cover to the assets folder.
///
/// `extension` comes from the uploaded file name and keeps its dot.
pub async fn upload_story_cover(
    store: &dyn BlobStore,
    story_title: &str,
    extension: &str,
    bytes: Vec<u8>,
    content_type: &str,
) -> Result<(String, String), StorageError> {
    let file_name = naming::cover_filename(story_title, extension);
    let url = store
        .upload(ASSETS_FOLDER, &file_name, bytes, content_type)
        .await?;
    tracing::info!(%file_name, backend = store.backend_name(), "Uploaded story cover");
    Ok((url, file_name))
}

/// Upload a character image to the assets folder under `file_name`.
pub async fn upload_character_image(
    store: &dyn BlobStore,
    file_name: &str,
    bytes: Vec<u8>,
    content_type: &str,
) -> Result<String, StorageError> {
    let url = store
        .upload(ASSETS_FOLDER, file_name, bytes, content_type)
        .await?;
    tracing::info!(%file_name, backend = store.backend_name(), "Uploaded character image");
    Ok(url)
}

/// Reject object names that could escape their folder.
pub(crate) fn validate_object_name(name: &str) -> Result<(), StorageError> {
    let bad = name.is_empty()
        || name.contains('/')
        || name.contains('\\')
        || name == "."
        || name == "..";
    if bad {
        return Err(StorageError::InvalidLocation(format!(
            "'{name}' is not a valid object name"
        )));
    }
    Ok(())
}

/// GET an absolute URL and return the body, reading at most `limit` bytes.
pub(crate) async fn http_fetch(
    client: &reqwest::Client,
    url: &str,
    limit: usize,
) -> Result<Vec<u8>, StorageError> {
    let mut response = client.get(url).send().await?;
    let status = response.status();
    if !status.is_success() {
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "<unreadable body>".to_string());
        return Err(StorageError::Api {
            status: status.as_u16(),
            body,
        });
    }
    if response
        .content_length()
        .is_some_and(|len| len > limit as u64)
    {
        return Err(StorageError::TooLarge { limit });
    }

    let mut body = Vec::new();
    while let Some(chunk) = response.chunk().await? {
        if body.len() + chunk.len() > limit {
            return Err(StorageError::TooLarge { limit });
        }
        body.extend_from_slice(&chunk);
    }
    Ok(body)
}
