//! Fetching and flattening of upstream user records.

pub mod error;
pub mod normalize;
pub mod randomuser;
pub mod source;

pub use error::IngestError;
pub use normalize::{get_users_frame, normalize_records};
pub use randomuser::RandomUserClient;
pub use source::{StaticSource, UserSource};
