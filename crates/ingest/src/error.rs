use thiserror::Error;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error: {status}: {body}")]
    Api { status: u16, body: String },

    #[error("invalid API url: {0}")]
    Url(#[from] url::ParseError),

    #[error("invalid JSON response: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unexpected response shape: {0}")]
    Shape(String),

    #[error("core error: {0}")]
    Core(#[from] usersplit_core::CoreError),
}
