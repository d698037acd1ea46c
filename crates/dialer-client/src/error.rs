use thiserror::Error;

/// Errors from the remote API client.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("json serialization error: {0}")]
    Json(#[from] serde_json::Error),
}
