pub mod adresmatch_pipeline;
pub mod gebouwen_pipeline;

pub use adresmatch_pipeline::AdresmatchPipeline;
pub use gebouwen_pipeline::GebouwenPipeline;

use crate::domain::model::RunStats;

/// Per-file run switches shared by both pipelines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOptions {
    /// Recompute rows that already carry a status for the stage.
    pub force: bool,
    /// Cap on evaluated rows per file; skipped rows are not counted.
    pub max_rows: Option<usize>,
    pub progress_interval: usize,
    pub monitor: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            force: false,
            max_rows: None,
            progress_interval: 100,
            monitor: false,
        }
    }
}

impl RunOptions {
    pub fn limit_reached(&self, stats: &RunStats) -> bool {
        self.max_rows.is_some_and(|max| stats.evaluated >= max)
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::adapters::{ManualClock, ReqwestTransport};
    use crate::core::client::{ClientSettings, RegistryClient, RetryPolicy};
    use crate::core::rate_limiter::RateLimiter;
    use crate::domain::model::Table;
    use crate::domain::ports::{Clock, Storage};
    use crate::utils::error::{EnrichError, Result};
    use std::collections::HashMap;
    use std::path::{Path, PathBuf};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    /// In-memory tables keyed by path.
    #[derive(Clone, Default)]
    pub struct MemoryStorage {
        pub files: Arc<Mutex<HashMap<PathBuf, Table>>>,
    }

    impl MemoryStorage {
        pub fn with(path: &str, table: Table) -> Self {
            let storage = Self::default();
            storage
                .files
                .lock()
                .unwrap()
                .insert(PathBuf::from(path), table);
            storage
        }

        pub fn table(&self, path: &str) -> Option<Table> {
            self.files.lock().unwrap().get(Path::new(path)).cloned()
        }
    }

    impl Storage for MemoryStorage {
        async fn read_table(&self, path: &Path) -> Result<Table> {
            self.files
                .lock()
                .unwrap()
                .get(path)
                .cloned()
                .ok_or_else(|| EnrichError::InputNotFound {
                    path: path.to_path_buf(),
                })
        }

        async fn write_table(&self, path: &Path, table: &Table) -> Result<()> {
            self.files
                .lock()
                .unwrap()
                .insert(path.to_path_buf(), table.clone());
            Ok(())
        }
    }

    /// Real HTTP transport, manual clock, no rate limit.
    pub fn test_client(retries: u32) -> Arc<RegistryClient> {
        let clock: Arc<dyn Clock> = Arc::new(ManualClock::new());
        let settings = ClientSettings {
            retry: RetryPolicy {
                retries,
                wait: Duration::from_secs(1),
            },
            ..ClientSettings::default()
        };
        Arc::new(RegistryClient::new(
            Arc::new(ReqwestTransport::new().unwrap()),
            RateLimiter::new(clock, 0.0, Duration::ZERO),
            settings,
        ))
    }

    pub fn table(headers: &[&str], rows: &[&[&str]]) -> Table {
        let headers: Vec<String> = headers.iter().map(|h| h.to_string()).collect();
        let records = rows
            .iter()
            .map(|row| {
                headers
                    .iter()
                    .cloned()
                    .zip(row.iter().map(|v| v.to_string()))
                    .collect()
            })
            .collect();
        Table::new(headers, records)
    }
}
