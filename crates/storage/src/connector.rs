use sqlx::{AnyConnection, Connection};
use tracing::debug;

use usersplit_core::config::{redact_url, DatabaseSettings};

use crate::error::StorageError;

/// Connection descriptor. Every [`connect`](Database::connect) call opens a
/// brand-new connection; nothing is pooled or reused, and the connection is
/// closed when the caller drops it.
#[derive(Debug, Clone)]
pub struct Database {
    url: String,
    redacted: String,
}

impl Database {
    /// Descriptor built from the loaded database settings.
    pub fn from_settings(settings: &DatabaseSettings) -> Result<Self, StorageError> {
        Ok(Self {
            url: settings.connection_url()?,
            redacted: settings.redacted_url(),
        })
    }

    /// Descriptor for an explicit sqlx URL (`mysql://…`, `sqlite://…`).
    pub fn from_url(url: impl Into<String>) -> Self {
        let url = url.into();
        let redacted = redact_url(&url);
        Self { url, redacted }
    }

    /// The URL with any password masked, for logs.
    pub fn redacted_url(&self) -> &str {
        &self.redacted
    }

    pub async fn connect(&self) -> Result<AnyConnection, StorageError> {
        sqlx::any::install_default_drivers();
        let conn = AnyConnection::connect(&self.url).await?;
        debug!(url = %self.redacted, "Opened connection");
        Ok(conn)
    }
}
