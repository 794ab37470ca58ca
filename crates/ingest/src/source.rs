use async_trait::async_trait;
use serde_json::Value;

use crate::error::IngestError;

/// Anything that can hand over a batch of raw user records.
#[async_trait]
pub trait UserSource: Send + Sync {
    /// Fetch the records as returned by the upstream service (one JSON object each).
    async fn fetch_records(&self) -> Result<Vec<Value>, IngestError>;
}

/// Fixed in-memory records. Used for offline runs and tests.
pub struct StaticSource {
    records: Vec<Value>,
}

impl StaticSource {
    pub fn new(records: Vec<Value>) -> Self {
        Self { records }
    }
}

#[async_trait]
impl UserSource for StaticSource {
    async fn fetch_records(&self) -> Result<Vec<Value>, IngestError> {
        Ok(self.records.clone())
    }
}
