use thiserror::Error;

use usersplit_core::CoreError;
use usersplit_ingest::IngestError;
use usersplit_storage::StorageError;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("core error: {0}")]
    Core(#[from] CoreError),

    #[error("ingest error: {0}")]
    Ingest(#[from] IngestError),

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
