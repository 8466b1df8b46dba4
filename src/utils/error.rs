use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EnrichError {
    #[error("HTTP client error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Input path not found: {}", path.display())]
    InputNotFound { path: PathBuf },

    #[error(
        "{} line {line}: {fields} fields but only {columns} columns",
        path.display()
    )]
    RowTooLong {
        path: PathBuf,
        line: u64,
        fields: usize,
        columns: usize,
    },

    #[error("Failed to write {}: {source}", path.display())]
    StorageError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Input,
    Network,
    Storage,
    Data,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl EnrichError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            EnrichError::ConfigError { .. }
            | EnrichError::InvalidConfigValueError { .. }
            | EnrichError::MissingConfigError { .. } => ErrorCategory::Configuration,
            EnrichError::CsvError(e) if matches!(e.kind(), csv::ErrorKind::Io(_)) => {
                ErrorCategory::Storage
            }
            EnrichError::InputNotFound { .. }
            | EnrichError::CsvError(_)
            | EnrichError::RowTooLong { .. } => ErrorCategory::Input,
            EnrichError::HttpError(_) => ErrorCategory::Network,
            EnrichError::IoError(_) | EnrichError::StorageError { .. } => ErrorCategory::Storage,
            EnrichError::SerializationError(_) => ErrorCategory::Data,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Network => ErrorSeverity::Medium,
            ErrorCategory::Configuration | ErrorCategory::Input | ErrorCategory::Data => {
                ErrorSeverity::High
            }
            ErrorCategory::Storage => ErrorSeverity::Critical,
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            EnrichError::InputNotFound { path } => {
                format!("Input file or directory does not exist: {}", path.display())
            }
            EnrichError::CsvError(e) => format!("Could not read the CSV file: {}", e),
            EnrichError::RowTooLong { path, line, .. } => format!(
                "Row {} of {} has more fields than the header; fix the file so no data is lost",
                line,
                path.display()
            ),
            EnrichError::StorageError { path, .. } => {
                format!("Could not write the output file {}", path.display())
            }
            EnrichError::InvalidConfigValueError { field, reason, .. } => {
                format!("Option {} is invalid: {}", field, reason)
            }
            EnrichError::MissingConfigError { field } => {
                format!("Option {} is required", field)
            }
            other => other.to_string(),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self.category() {
            ErrorCategory::Configuration => "Check the command line flags and the --config file",
            ErrorCategory::Input => "Check that the input path exists and is a readable CSV file",
            ErrorCategory::Network => "Check network connectivity and the API URLs, then retry",
            ErrorCategory::Storage => {
                "Check free disk space and write permissions for the output directory"
            }
            ErrorCategory::Data => "Inspect the input data for malformed values",
        }
    }

    /// Process exit code for a fatal run error.
    pub fn exit_code(&self) -> i32 {
        match self.severity() {
            ErrorSeverity::Low => 0,
            ErrorSeverity::Medium => 2,
            ErrorSeverity::High => 1,
            ErrorSeverity::Critical => 3,
        }
    }
}

pub type Result<T> = std::result::Result<T, EnrichError>;
