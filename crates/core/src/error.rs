use crate::types::DbId;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: DbId },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    /// A collaborator (AI service, database, blob store) is not configured.
    #[error("Service unavailable: {0}")]
    Unavailable(String),

    /// A collaborator answered, but with something unusable.
    #[error("Upstream failure: {0}")]
    Upstream(String),

    #[error("Internal error: {0}")]
    Internal(String),
}
