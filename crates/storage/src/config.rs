use std::path::PathBuf;
use std::sync::Arc;

use crate::{BlobStore, LocalStore, StorageError, SupabaseStore};

pub const DEFAULT_BUCKET: &str = "creaition";
pub const DEFAULT_ASSETS_DIR: &str = "./data";
pub const DEFAULT_ASSETS_URL_PREFIX: &str = "/assets";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageBackend {
    Local,
    Supabase,
}

/// Blob storage settings.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    pub supabase_url: Option<String>,
    pub supabase_key: Option<String>,
    pub bucket: String,
    /// Root directory of the local store; also what `/assets` serves.
    pub assets_dir: PathBuf,
    /// URL prefix the local store hands out.
    pub assets_url_prefix: String,
}

impl StorageConfig {
    /// Load from environment variables.
    ///
    /// | Env var                | Default     |
    /// |------------------------|-------------|
    /// | `STORAGE_BACKEND`      | `supabase` when `SUPABASE_URL` is set, else `local` |
    /// | `SUPABASE_URL`         | (none)      |
    /// | `SUPABASE_SERVICE_KEY` | falls back to `SUPABASE_ANON_KEY` |
    /// | `BUCKET_NAME`          | `creaition` |
    /// | `ASSETS_DIR`           | `./data`    |
    /// | `ASSETS_URL_PREFIX`    | `/assets`   |
    pub fn from_env() -> Self {
        let supabase_url = non_blank_env("SUPABASE_URL");
        let supabase_key =
            non_blank_env("SUPABASE_SERVICE_KEY").or_else(|| non_blank_env("SUPABASE_ANON_KEY"));

        let backend = match non_blank_env("STORAGE_BACKEND").as_deref() {
            Some("supabase") => StorageBackend::Supabase,
            Some("local") => StorageBackend::Local,
            Some(other) => {
                tracing::warn!(backend = other, "Unknown STORAGE_BACKEND, using local");
                StorageBackend::Local
            }
            None if supabase_url.is_some() => StorageBackend::Supabase,
            None => StorageBackend::Local,
        };

        Self {
            backend,
            supabase_url,
            supabase_key,
            bucket: non_blank_env("BUCKET_NAME").unwrap_or_else(|| DEFAULT_BUCKET.to_string()),
            assets_dir: non_blank_env("ASSETS_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_ASSETS_DIR)),
            assets_url_prefix: non_blank_env("ASSETS_URL_PREFIX")
                .unwrap_or_else(|| DEFAULT_ASSETS_URL_PREFIX.to_string()),
        }
    }

    /// A local store rooted at `assets_dir`.
    pub fn local(assets_dir: impl Into<PathBuf>) -> Self {
        Self {
            backend: StorageBackend::Local,
            supabase_url: None,
            supabase_key: None,
            bucket: DEFAULT_BUCKET.to_string(),
            assets_dir: assets_dir.into(),
            assets_url_prefix: DEFAULT_ASSETS_URL_PREFIX.to_string(),
        }
    }

    /// Construct the configured backend.
    pub fn build(&self) -> Result<Arc<dyn BlobStore>, StorageError> {
        match self.backend {
            StorageBackend::Local => Ok(Arc::new(LocalStore::new(
                self.assets_dir.clone(),
                self.assets_url_prefix.clone(),
            ))),
            StorageBackend::Supabase => {
                let url = self.supabase_url.clone().ok_or_else(|| {
                    StorageError::InvalidLocation("SUPABASE_URL is not set".to_string())
                })?;
                let key = self.supabase_key.clone().ok_or_else(|| {
                    StorageError::InvalidLocation(
                        "SUPABASE_SERVICE_KEY or SUPABASE_ANON_KEY must be set".to_string(),
                    )
                })?;
                if std::env::var("SUPABASE_SERVICE_KEY").is_err() {
                    tracing::warn!("SUPABASE_SERVICE_KEY not set, uploads may be rejected by row-level security");
                }
                Ok(Arc::new(SupabaseStore::new(url, key, self.bucket.clone())))
            }
        }
    }
}

fn non_blank_env(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn supabase_requires_url_and_key() {
        let mut config = StorageConfig::local("/tmp/x");
        config.backend = StorageBackend::Supabase;
        assert!(config.build().is_err());

        config.supabase_url = Some("https://proj.supabase.co".to_string());
        assert!(config.build().is_err());

        config.supabase_key = Some("key".to_string());
        let store = config.build().unwrap();
        assert_eq!(store.backend_name(), "supabase");
    }

    #[test]
    fn local_builds_local_store() {
        let store = StorageConfig::local("/tmp/x").build().unwrap();
        assert_eq!(store.backend_name(), "local");
        assert_eq!(store.public_url("assets", "a.png"), "/assets/assets/a.png");
    }
}
