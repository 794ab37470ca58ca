//! Shared configuration, errors and the in-memory `Frame` table.

pub mod config;
pub mod error;
pub mod frame;
pub mod value;

pub use config::Config;
pub use error::*;
pub use frame::Frame;
pub use value::*;
