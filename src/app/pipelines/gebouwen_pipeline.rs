use crate::app::pipelines::RunOptions;
use crate::core::columns::{apply_building, should_skip, GEBOUW_COLUMNS, GEBOUW_STATUS};
use crate::core::extract::extract_adres_id;
use crate::core::jobs::FileJob;
use crate::domain::model::{BuildingOutcome, EnrichmentResult, RunStats, Table};
use crate::domain::ports::{Pipeline, Storage};
use crate::registry::gebouwen::GebouwenApi;
use crate::utils::error::Result;
use crate::utils::monitor::ProgressMonitor;

/// Stage 2: attach the building id and footprint of every matched address.
pub struct GebouwenPipeline<S: Storage> {
    storage: S,
    api: GebouwenApi,
    adres_id_field: String,
    job: FileJob,
    options: RunOptions,
}

impl<S: Storage> GebouwenPipeline<S> {
    pub fn new(
        storage: S,
        api: GebouwenApi,
        adres_id_field: impl Into<String>,
        job: FileJob,
        options: RunOptions,
    ) -> Self {
        Self {
            storage,
            api,
            adres_id_field: adres_id_field.into(),
            job,
            options,
        }
    }
}

#[async_trait::async_trait]
impl<S: Storage> Pipeline for GebouwenPipeline<S> {
    fn name(&self) -> &str {
        "gebouwen"
    }

    async fn extract(&self) -> Result<Table> {
        tracing::info!("gebouwen: reading {}", self.job.input.display());
        self.storage.read_table(&self.job.input).await
    }

    async fn transform(&self, mut table: Table) -> Result<EnrichmentResult> {
        if !table.has_column(&self.adres_id_field) {
            tracing::warn!(
                "{} has no {} column; run adresmatch first or pass --adres-id-field",
                self.job.input.display(),
                self.adres_id_field
            );
        }
        table.ensure_columns(&GEBOUW_COLUMNS);

        let mut stats = RunStats::new(table.records.len());
        let mut monitor = ProgressMonitor::new(
            self.name(),
            self.options.progress_interval,
            self.options.monitor,
        );

        for (index, record) in table.records.iter_mut().enumerate() {
            if self.options.limit_reached(&stats) {
                tracing::info!("gebouwen: stopping after {} evaluated rows", stats.evaluated);
                break;
            }
            if should_skip(record, GEBOUW_STATUS, self.options.force) {
                stats.skip();
                continue;
            }

            let adres_id = extract_adres_id(record, &self.adres_id_field).map(str::to_string);
            let outcome = match adres_id {
                Some(id) => self.api.lookup(&id).await,
                None => BuildingOutcome::MissingAdresId(self.adres_id_field.clone()),
            };
            match &outcome {
                BuildingOutcome::Error(message) => tracing::warn!("row {}: {}", index + 1, message),
                other => tracing::debug!("row {}: {}", index + 1, other.status()),
            }

            apply_building(record, &outcome);
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
