pub mod client;
pub mod columns;
pub mod etl;
pub mod extract;
pub mod jobs;
pub mod rate_limiter;
pub mod selector;

pub use crate::domain::model::{Record, Table};
pub use crate::domain::ports::{Pipeline, Storage};
pub use crate::utils::error::Result;
