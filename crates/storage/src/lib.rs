//! Relational persistence for frames: one fresh connection per operation,
//! full-table replace on write, `SELECT`-based reads.

pub mod connector;
pub mod error;
pub mod reader;
pub mod schema;
pub mod writer;

pub use connector::Database;
pub use error::StorageError;
pub use reader::{query_frame, read_table, top_n_union};
pub use writer::replace_table;
