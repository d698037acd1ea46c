use thiserror::Error;

/// Errors that can occur in the session layer.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("json serialization error: {0}")]
    Json(#[from] serde_json::Error),
}
