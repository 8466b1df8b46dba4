use crate::domain::model::{EnrichmentResult, Table};
use crate::utils::error::Result;
use async_trait::async_trait;
use std::path::Path;
use std::time::{Duration, Instant};

pub trait Storage: Send + Sync {
    fn read_table(&self, path: &Path) -> impl std::future::Future<Output = Result<Table>> + Send;
    /// Replaces `path` with `table`; the old content survives any failure.
    fn write_table(
        &self,
        path: &Path,
        table: &Table,
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

/// Monotonic time source for rate limiting and retry waits.
#[async_trait]
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
    async fn sleep(&self, duration: Duration);
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub url: String,
    pub query: Vec<(String, String)>,
    pub headers: Vec<(String, String)>,
    pub timeout: Duration,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
    /// Parsed `Retry-After` seconds, when the server sent one.
    pub retry_after: Option<Duration>,
}

/// Failure below HTTP: the request never produced a status line.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct TransportError {
    pub message: String,
}

impl TransportError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(&self, request: &HttpRequest) -> std::result::Result<HttpResponse, TransportError>;
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    fn name(&self) -> &str;
    async fn extract(&self) -> Result<Table>;
    async fn transform(&self, table: Table) -> Result<EnrichmentResult>;
    async fn load(&self, result: EnrichmentResult) -> Result<String>;
}
