//! Fetch → partition → store → reconcile → export.

pub mod error;
pub mod export;
pub mod partition;
pub mod reconcile;
pub mod runner;
pub mod tables;

pub use error::PipelineError;
pub use runner::{Pipeline, RunReport};
pub use tables::{TableNames, TableReport};
