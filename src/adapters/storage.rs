use crate::domain::model::{Record, Table};
use crate::domain::ports::Storage;
use crate::utils::error::{EnrichError, Result};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// CSV files on the local file system, replaced atomically on write.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalStorage;

impl LocalStorage {
    pub fn new() -> Self {
        Self
    }
}

impl Storage for LocalStorage {
    async fn read_table(&self, path: &Path) -> Result<Table> {
        read_csv(path)
    }

    async fn write_table(&self, path: &Path, table: &Table) -> Result<()> {
        stage_table(path, table)?.commit()
    }
}

pub fn read_csv(path: &Path) -> Result<Table> {
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_path(path)?;
    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .enumerate()
        .map(|(i, h)| {
            if i == 0 {
                h.trim_start_matches('\u{feff}').to_string()
            } else {
                h.to_string()
            }
        })
        .collect();

    let mut records = Vec::new();
    for row in reader.records() {
        let row = row?;
        // Trailing blank cells are harmless; anything else would be lost on write.
        if row.iter().skip(headers.len()).any(|cell| !cell.is_empty()) {
            return Err(EnrichError::RowTooLong {
                path: path.to_path_buf(),
                line: row.position().map_or(0, |p| p.line()),
                fields: row.len(),
                columns: headers.len(),
            });
        }
        let record: Record = headers
            .iter()
            .zip(row.iter())
            .map(|(h, v)| (h.as_str(), v))
            .collect();
        records.push(record);
    }

    tracing::debug!(
        "Read {} rows with {} columns from {}",
        records.len(),
        headers.len(),
        path.display()
    );
    Ok(Table::new(headers, records))
}

/// A fully written temporary file waiting to replace its destination.
///
/// Dropping it without [`StagedWrite::commit`] deletes the temporary file and
/// leaves the destination as it was.
#[derive(Debug)]
pub struct StagedWrite {
    temp: NamedTempFile,
    destination: PathBuf,
}

impl StagedWrite {
    pub fn temp_path(&self) -> &Path {
        self.temp.path()
    }

    pub fn destination(&self) -> &Path {
        &self.destination
    }

    pub fn commit(self) -> Result<()> {
        let destination = self.destination;
        self.temp
            .persist(&destination)
            .map_err(|e| EnrichError::StorageError {
                path: destination.clone(),
                source: e.error,
            })?;
        tracing::debug!("Replaced {}", destination.display());
        Ok(())
    }
}

/// Writes `table` to a temporary file next to `destination`.
pub fn stage_table(destination: &Path, table: &Table) -> Result<StagedWrite> {
    let storage_err = |source: std::io::Error| EnrichError::StorageError {
        path: destination.to_path_buf(),
        source,
    };

    let dir = match destination.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    fs::create_dir_all(&dir).map_err(storage_err)?;

    let mut temp = tempfile::Builder::new()
        .prefix(".adres-enrich-")
        .suffix(".csv.tmp")
        .tempfile_in(&dir)
        .map_err(storage_err)?;

    temp.write_all(UTF8_BOM).map_err(storage_err)?;
    {
        let mut writer = csv::Writer::from_writer(temp.as_file_mut());
        writer
            .write_record(&table.headers)
            .map_err(|e| storage_err(e.into()))?;
        for record in &table.records {
            writer
                .write_record(table.row_values(record))
                .map_err(|e| storage_err(e.into()))?;
        }
        writer.flush().map_err(storage_err)?;
    }

    // Keep the destination's mode instead of the 0600 of the temp file.
    if let Ok(metadata) = fs::metadata(destination) {
        temp.as_file()
            .set_permissions(metadata.permissions())
            .map_err(storage_err)?;
    }
    temp.as_file().sync_all().map_err(storage_err)?;

    Ok(StagedWrite {
        temp,
        destination: destination.to_path_buf(),
    })
}
