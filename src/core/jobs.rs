//! Input path resolution: one [`FileJob`] per CSV to enrich.

use crate::utils::error::{EnrichError, Result};
use std::fs;
use std::path::{Path, PathBuf};

const GEBOUWEN_SUFFIX: &str = "_gebouwen";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Adresmatch,
    Gebouwen,
}

impl Stage {
    pub fn name(&self) -> &'static str {
        match self {
            Stage::Adresmatch => "adresmatch",
            Stage::Gebouwen => "gebouwen",
        }
    }

    /// Output path when neither `--output` nor `--output-dir` is given.
    pub fn default_output(&self, input: &Path) -> PathBuf {
        match self {
            Stage::Adresmatch => input.to_path_buf(),
            Stage::Gebouwen => {
                let stem = input
                    .file_stem()
                    .map(|s| s.to_string_lossy().into_owned())
                    .unwrap_or_default();
                let ext = input
                    .extension()
                    .map(|e| e.to_string_lossy().into_owned())
                    .unwrap_or_else(|| "csv".to_string());
                input.with_file_name(format!("{}{}.{}", stem, GEBOUWEN_SUFFIX, ext))
            }
        }
    }

    fn accepts(&self, path: &Path) -> bool {
        let is_csv = path
            .extension()
            .is_some_and(|e| e.eq_ignore_ascii_case("csv"));
        let is_own_output = path
            .file_stem()
            .is_some_and(|s| s.to_string_lossy().ends_with(GEBOUWEN_SUFFIX));
        match self {
            Stage::Adresmatch => is_csv,
            Stage::Gebouwen => is_csv && !is_own_output,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileJob {
    pub input: PathBuf,
    pub output: PathBuf,
}

/// Where results go, as requested on the command line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutputTarget {
    pub output: Option<PathBuf>,
    pub output_dir: Option<PathBuf>,
}

fn conflict(field: &str, value: &Path, reason: &str) -> EnrichError {
    EnrichError::InvalidConfigValueError {
        field: field.to_string(),
        value: value.display().to_string(),
        reason: reason.to_string(),
    }
}

/// Expands `input` (file or directory) into jobs, in file name order.
pub fn plan_jobs(stage: Stage, input: &Path, target: &OutputTarget) -> Result<Vec<FileJob>> {
    if !input.exists() {
        return Err(EnrichError::InputNotFound {
            path: input.to_path_buf(),
        });
    }
    if let (Some(output), Some(_)) = (&target.output, &target.output_dir) {
        return Err(conflict(
            "output",
            output,
            "--output and --output-dir cannot be combined",
        ));
    }

    let inputs = if input.is_dir() {
        if let Some(output) = &target.output {
            return Err(conflict(
                "output",
                output,
                "--output needs a single input file; use --output-dir for directories",
            ));
        }
        list_csv_files(stage, input)?
    } else {
        vec![input.to_path_buf()]
    };

    Ok(inputs
        .into_iter()
        .map(|input| {
            let output = match (&target.output, &target.output_dir) {
                (Some(output), _) => output.clone(),
                (None, Some(dir)) => match input.file_name() {
                    Some(name) => dir.join(name),
                    None => stage.default_output(&input),
                },
                (None, None) => stage.default_output(&input),
            };
            FileJob { input, output }
        })
        .collect())
}

fn list_csv_files(stage: Stage, dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && stage.accepts(&path) {
            files.push(path);
        }
    }
    files.sort();
    if files.is_empty() {
        tracing::warn!("No CSV files found in {}", dir.display());
    }
    Ok(files)
}
