pub mod adapters;
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod registry;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::cli::Cli;

pub use adapters::{LocalStorage, ReqwestTransport, TokioClock};
pub use app::pipelines::{AdresmatchPipeline, GebouwenPipeline, RunOptions};
pub use core::client::{ClientSettings, RegistryClient, RetryPolicy};
pub use core::etl::{EnrichmentEngine, RunReport};
pub use core::rate_limiter::RateLimiter;
pub use utils::error::{EnrichError, Result};
