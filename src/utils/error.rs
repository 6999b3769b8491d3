use crate::domain::ports::{Level, Reporter};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EtlError {
    #[error("Input file not found at {path}")]
    SourceNotFound { path: String },

    #[error("Failed to load data from {path}: {reason}")]
    LoadFailure { path: String, reason: String },

    #[error("Input table for {stage} is empty")]
    EmptyInput { stage: &'static str },

    #[error("Input table for {stage} is missing columns: {}", .columns.join(", "))]
    MissingColumns {
        stage: &'static str,
        columns: Vec<String>,
    },

    #[error("Failed to write {path}: {reason}")]
    WriteFailure { path: String, reason: String },

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Configuration error in {field}: {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    SourceNotFound,
    LoadFailure,
    EmptyInput,
    MissingColumns,
    WriteFailure,
    Io,
    Configuration,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ErrorCategory::SourceNotFound => "source_not_found",
            ErrorCategory::LoadFailure => "load_failure",
            ErrorCategory::EmptyInput => "empty_input",
            ErrorCategory::MissingColumns => "missing_columns",
            ErrorCategory::WriteFailure => "write_failure",
            ErrorCategory::Io => "io",
            ErrorCategory::Configuration => "configuration",
        };
        f.write_str(name)
    }
}

impl EtlError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            EtlError::SourceNotFound { .. } => ErrorCategory::SourceNotFound,
            EtlError::LoadFailure { .. } | EtlError::CsvError(_) => ErrorCategory::LoadFailure,
            EtlError::EmptyInput { .. } => ErrorCategory::EmptyInput,
            EtlError::MissingColumns { .. } => ErrorCategory::MissingColumns,
            EtlError::WriteFailure { .. } | EtlError::SerializationError(_) => {
                ErrorCategory::WriteFailure
            }
            EtlError::IoError(_) => ErrorCategory::Io,
            EtlError::ConfigError { .. }
            | EtlError::ConfigValidationError { .. }
            | EtlError::InvalidConfigValueError { .. }
            | EtlError::MissingConfigError { .. } => ErrorCategory::Configuration,
        }
    }

    /// Data conditions end a stage early; configuration problems stop the
    /// process before the pipeline starts.
    pub fn is_recoverable(&self) -> bool {
        self.category() != ErrorCategory::Configuration
    }

    pub fn level(&self) -> Level {
        match self.category() {
            ErrorCategory::EmptyInput => Level::Warn,
            _ => Level::Error,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self.category() {
            ErrorCategory::SourceNotFound => "Check the input path or set SALES_ETL_INPUT",
            ErrorCategory::LoadFailure => {
                "Make sure the input is UTF-8 delimited text with a header row and the expected delimiter"
            }
            ErrorCategory::EmptyInput => "Provide input containing at least one valid sales row",
            ErrorCategory::MissingColumns => {
                "The input header must contain price, quantity, category and customer_email"
            }
            ErrorCategory::WriteFailure => {
                "Check that the output directory exists or can be created and is writable"
            }
            ErrorCategory::Io => "Check file permissions and available disk space",
            ErrorCategory::Configuration => "Fix the configuration file or command line flags",
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            EtlError::InvalidConfigValueError { field, reason, .. } => {
                format!("Invalid setting '{}': {}", field, reason)
            }
            EtlError::MissingConfigError { field } => format!("Missing setting '{}'", field),
            other => other.to_string(),
        }
    }

    /// Sends this condition to `reporter` at its natural level.
    pub fn report(&self, reporter: &dyn Reporter) {
        reporter.record(
            self.level(),
            &self.to_string(),
            &[("condition", self.category().to_string())],
        );
    }
}

pub type Result<T> = std::result::Result<T, EtlError>;
