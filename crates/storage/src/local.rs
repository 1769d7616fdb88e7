//! Local-directory backend.
//!
//! Objects are written to `{base_dir}/{folder}/{file_name}` and published
//! as `{url_prefix}/{folder}/{file_name}`. The API serves `base_dir` under
//! the same prefix.

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::{validate_object_name, BlobStore, StorageError, MAX_FETCH_BYTES};

pub struct LocalStore {
    base_dir: PathBuf,
    url_prefix: String,
}

impl LocalStore {
    pub fn new(base_dir: impl Into<PathBuf>, url_prefix: impl Into<String>) -> Self {
        let url_prefix: String = url_prefix.into();
        Self {
            base_dir: base_dir.into(),
            url_prefix: url_prefix.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Map a public URL produced by this store back to a file path.
    ///
    /// Accepts the bare prefixed path as well as an absolute URL whose path
    /// starts with the prefix. Returns `None` for URLs outside the store.
    fn resolve(&self, url: &str) -> Option<PathBuf> {
        let path = match url.find("://") {
            Some(scheme_end) => {
                let rest = &url[scheme_end + 3..];
                &rest[rest.find('/')?..]
            }
            None => url,
        };
        let relative = path.strip_prefix(&self.url_prefix)?.strip_prefix('/')?;

        let mut resolved = self.base_dir.clone();
        for segment in relative.split('/') {
            if segment.is_empty() || segment == "." || segment == ".." {
                return None;
            }
            resolved.push(segment);
        }
        Some(resolved)
    }
}

#[async_trait]
impl BlobStore for LocalStore {
    async fn upload(
        &self,
        folder: &str,
        file_name: &str,
        bytes: Vec<u8>,
        _content_type: &str,
    ) -> Result<String, StorageError> {
        validate_object_name(folder)?;
        validate_object_name(file_name)?;

        let dir = self.base_dir.join(folder);
        tokio::fs::create_dir_all(&dir).await?;
        let path = dir.join(file_name);
        tokio::fs::write(&path, &bytes).await?;

        tracing::debug!(path = %path.display(), size = bytes.len(), "Stored local object");
        Ok(self.public_url(folder, file_name))
    }

    fn public_url(&self, folder: &str, file_name: &str) -> String {
        format!("{}/{folder}/{file_name}", self.url_prefix)
    }

    async fn fetch(&self, url: &str) -> Result<Vec<u8>, StorageError> {
        let path = self.resolve(url).ok_or_else(|| {
            StorageError::InvalidLocation(format!("'{url}' does not belong to the local store"))
        })?;
        let len = tokio::fs::metadata(&path).await?.len();
        if len > MAX_FETCH_BYTES as u64 {
            return Err(StorageError::TooLarge {
                limit: MAX_FETCH_BYTES,
            });
        }
        Ok(tokio::fs::read(&path).await?)
    }

    fn backend_name(&self) -> &'static str {
        "local"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_prefixed_paths() {
        let store = LocalStore::new("/srv/data", "/assets");
        assert_eq!(
            store.resolve("/assets/output/a_1.png"),
            Some(PathBuf::from("/srv/data/output/a_1.png"))
        );
        assert_eq!(
            store.resolve("http://localhost:3000/assets/assets/c.jpg"),
            Some(PathBuf::from("/srv/data/assets/c.jpg"))
        );
    }

    #[test]
    fn resolve_rejects_foreign_and_traversal() {
        let store = LocalStore::new("/srv/data", "/assets");
        assert_eq!(store.resolve("/other/x.png"), None);
        assert_eq!(store.resolve("/assets/../etc/passwd"), None);
        assert_eq!(store.resolve("/assetsx/y.png"), None);
    }
}
