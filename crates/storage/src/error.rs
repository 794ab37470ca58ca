use thiserror::Error;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("cannot write table '{0}': frame has no columns")]
    EmptySchema(String),

    #[error("cannot decode column '{column}': {reason}")]
    Decode { column: String, reason: String },

    #[error("core error: {0}")]
    Core(#[from] usersplit_core::CoreError),
}
