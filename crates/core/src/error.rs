use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("missing required config key: {0}")]
    MissingConfig(String),

    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error("column not found: {0}")]
    ColumnNotFound(String),

    #[error("column '{column}' row {row}: cannot convert {value} to integer")]
    NonNumeric {
        column: String,
        row: usize,
        value: String,
    },

    #[error("shape mismatch: {0}")]
    ShapeMismatch(String),
}
