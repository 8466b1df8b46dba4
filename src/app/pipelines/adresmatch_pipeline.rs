use crate::app::pipelines::RunOptions;
use crate::core::columns::{apply_adresmatch, should_skip, ADRESMATCH_COLUMNS, ADRESMATCH_STATUS};
use crate::core::extract::{extract_query, COL_HOUSE_NUMBER, COL_STREET};
use crate::core::jobs::FileJob;
use crate::domain::model::{AdresmatchOutcome, EnrichmentResult, RunStats, Table};
use crate::domain::ports::{Pipeline, Storage};
use crate::registry::adresmatch::AdresmatchApi;
use crate::utils::error::Result;
use crate::utils::monitor::ProgressMonitor;

/// Stage 1: match every row against the Adressenregister.
pub struct AdresmatchPipeline<S: Storage> {
    storage: S,
    api: AdresmatchApi,
    job: FileJob,
    options: RunOptions,
}

impl<S: Storage> AdresmatchPipeline<S> {
    pub fn new(storage: S, api: AdresmatchApi, job: FileJob, options: RunOptions) -> Self {
        Self {
            storage,
            api,
            job,
            options,
        }
    }

    pub fn job(&self) -> &FileJob {
        &self.job
    }
}

#[async_trait::async_trait]
impl<S: Storage> Pipeline for AdresmatchPipeline<S> {
    fn name(&self) -> &str {
        "adresmatch"
    }

    async fn extract(&self) -> Result<Table> {
        tracing::info!("adresmatch: reading {}", self.job.input.display());
        self.storage.read_table(&self.job.input).await
    }

    async fn transform(&self, mut table: Table) -> Result<EnrichmentResult> {
        for column in [COL_STREET, COL_HOUSE_NUMBER] {
            if !table.has_column(column) {
                tracing::warn!(
                    "{} has no {} column; its rows will be marked missing_input",
                    self.job.input.display(),
                    column
                );
            }
        }
        table.ensure_columns(&ADRESMATCH_COLUMNS);

        let mut stats = RunStats::new(table.records.len());
        let mut monitor = ProgressMonitor::new(
            self.name(),
            self.options.progress_interval,
            self.options.monitor,
        );

        for (index, record) in table.records.iter_mut().enumerate() {
            if self.options.limit_reached(&stats) {
                tracing::info!("adresmatch: stopping after {} evaluated rows", stats.evaluated);
                break;
            }
            if should_skip(record, ADRESMATCH_STATUS, self.options.force) {
                stats.skip();
                continue;
            }

            let outcome = match extract_query(record) {
                Ok(params) => self.api.lookup(&params).await,
                Err(missing) => AdresmatchOutcome::MissingInput(missing.to_string()),
            };
            match &outcome {
                AdresmatchOutcome::Error(message) => {
                    tracing::warn!("row {}: {}", index + 1, message)
                }
                other => tracing::debug!("row {}: {}", index + 1, other.status()),
            }

            apply_adresmatch(record, &outcome);
            stats.record(outcome.status());
            monitor.row_done(&stats);
        }

        monitor.finish(&stats);
        Ok(EnrichmentResult {
            table,
            stats,
            elapsed: monitor.elapsed(),
        })
    }

    async fn load(&self, result: EnrichmentResult) -> Result<String> {
        self.storage
            .write_table(&self.job.output, &result.table)
            .await?;
        Ok(self.job.output.display().to_string())
    }
}
