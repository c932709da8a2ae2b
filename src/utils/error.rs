use std::fmt;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstraintKind {
    DuplicateKey,
    ForeignKey,
}

impl fmt::Display for ConstraintKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConstraintKind::DuplicateKey => f.write_str("duplicate key"),
            ConstraintKind::ForeignKey => f.write_str("dangling foreign key"),
        }
    }
}

#[derive(Error, Debug)]
pub enum InsightsError {
    #[error("Constraint violation on {table}: {kind} ({key})")]
    ConstraintViolation {
        kind: ConstraintKind,
        table: &'static str,
        key: String,
    },

    #[error("Numeric overflow while computing {context}")]
    NumericOverflow { context: String },

    #[error("Malformed data in {file} at line {line}: {message}")]
    DataFormat {
        file: String,
        line: u64,
        message: String,
    },

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Zip operation failed: {0}")]
    ZipError(#[from] zip::result::ZipError),

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
    Configuration,
    Data,
    Integrity,
    Io,
    Output,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl InsightsError {
    pub fn constraint(kind: ConstraintKind, table: &'static str, key: impl Into<String>) -> Self {
        InsightsError::ConstraintViolation {
            kind,
            table,
            key: key.into(),
        }
    }

    pub fn overflow(context: impl Into<String>) -> Self {
        InsightsError::NumericOverflow {
            context: context.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            InsightsError::ConstraintViolation { .. } => ErrorCategory::Integrity,
            InsightsError::NumericOverflow { .. }
            | InsightsError::DataFormat { .. }
            | InsightsError::CsvError(_) => ErrorCategory::Data,
            InsightsError::IoError(_) => ErrorCategory::Io,
            InsightsError::SerializationError(_) | InsightsError::ZipError(_) => {
                ErrorCategory::Output
            }
            InsightsError::ConfigError { .. }
            | InsightsError::ConfigValidationError { .. }
            | InsightsError::InvalidConfigValueError { .. }
            | InsightsError::MissingConfigError { .. } => ErrorCategory::Configuration,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Configuration | ErrorCategory::Data | ErrorCategory::Integrity => {
                ErrorSeverity::High
            }
            ErrorCategory::Io => ErrorSeverity::Medium,
            ErrorCategory::Output => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            InsightsError::ConstraintViolation {
                kind: ConstraintKind::DuplicateKey,
                ..
            } => "Remove the duplicated row, or merge repeat purchases into one line",
            InsightsError::ConstraintViolation {
                kind: ConstraintKind::ForeignKey,
                ..
            } => "Make sure every referenced customer, invoice and product is present in its table",
            InsightsError::NumericOverflow { .. } => {
                "Check the dataset for corrupted quantities or prices"
            }
            InsightsError::DataFormat { .. } | InsightsError::CsvError(_) => {
                "Check the input file headers and field formats"
            }
            InsightsError::IoError(_) => "Check that the paths exist and are readable/writable",
            InsightsError::SerializationError(_) | InsightsError::ZipError(_) => {
                "Retry the run; if it persists, write reports without an archive"
            }
            InsightsError::ConfigError { .. }
            | InsightsError::ConfigValidationError { .. }
            | InsightsError::InvalidConfigValueError { .. }
            | InsightsError::MissingConfigError { .. } => {
                "Review the configuration values and try again"
            }
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            InsightsError::ConstraintViolation { table, key, .. } => {
                format!("The {} table has an invalid row ({})", table, key)
            }
            InsightsError::DataFormat { file, line, .. } => {
                format!("Could not read {} (line {})", file, line)
            }
            InsightsError::IoError(e) => format!("File access failed: {}", e),
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, InsightsError>;
