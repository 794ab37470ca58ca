use std::path::Path;

use tracing::info;

use usersplit_core::Frame;

use crate::error::PipelineError;

/// Write `frame` as a JSON array of row objects, replacing any existing file.
/// Missing parent directories are created.
pub async fn write_records_json(frame: &Frame, path: &Path) -> Result<(), PipelineError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }

    let body = serde_json::to_vec(&frame.to_json_records())?;
    tokio::fs::write(path, body).await?;

    info!(path = %path.display(), rows = frame.row_count(), "Export written");
    Ok(())
}
