use std::path::PathBuf;
use std::sync::Arc;

use creaition_core::error::CoreError;
use creaition_gemini::GenerativeModel;
use creaition_pipeline::StoryPipeline;
use creaition_storage::BlobStore;

use crate::config::ServerConfig;
use crate::error::AppError;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: creaition_db::DbPool,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// Generative model, absent when no API key is configured.
    pub model: Option<Arc<dyn GenerativeModel>>,
    /// Blob store for covers, character images and scene images.
    pub store: Arc<dyn BlobStore>,
    /// Directory served at `/assets` when the local store is in use.
    pub assets_dir: Option<PathBuf>,
}

impl AppState {
    /// Pipeline over the configured model and store.
    ///
    /// Fails with 503 when the model is not configured.
    pub fn pipeline(&self) -> Result<StoryPipeline, AppError> {
        let model = self.model.clone().ok_or_else(|| {
            AppError::Core(CoreError::Unavailable(
                "AI generation is not configured (GEMINI_API_KEY is missing)".to_string(),
            ))
        })?;
        Ok(StoryPipeline::new(model, Arc::clone(&self.store)))
    }

    pub fn model_available(&self) -> bool {
        self.model.is_some()
    }
}
