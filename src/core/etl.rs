use crate::core::Pipeline;
use crate::domain::model::RunStats;
use crate::utils::error::Result;
use std::time::Duration;

/// What one file run produced.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub output: String,
    pub stats: RunStats,
    pub elapsed: Duration,
}

pub struct EnrichmentEngine<P: Pipeline> {
    pipeline: P,
}

impl<P: Pipeline> EnrichmentEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self { pipeline }
    }

    pub fn pipeline(&self) -> &P {
        &self.pipeline
    }

    pub async fn run(&self) -> Result<RunReport> {
        let name = self.pipeline.name();

        // Extract
        let table = self.pipeline.extract().await?;
        tracing::info!(
            "{}: read {} rows, {} columns",
            name,
            table.records.len(),
            table.headers.len()
        );

        // Transform
        let result = self.pipeline.transform(table).await?;
        let stats = result.stats.clone();
        let elapsed = result.elapsed;

        // Load
        let output = self.pipeline.load(result).await?;
        tracing::info!(
            "{}: processed {} rows ({} skipped) in {:.1?}; {}. Written to {}",
            name,
            stats.evaluated,
            stats.skipped,
            elapsed,
            stats.summary(),
            output
        );

        Ok(RunReport {
            output,
            stats,
            elapsed,
        })
    }
}
