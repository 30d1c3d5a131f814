use std::path::PathBuf;
use thiserror::Error;

/// All errors produced by the audience analyzer.
#[derive(Error, Debug)]
pub enum AnalysisError {
    /// A required column is absent from the table, or holds a value of the
    /// wrong type or outside its domain.
    #[error("Schema error: column '{column}' {reason}")]
    Schema { column: String, reason: String },

    /// A filter or threshold left no groups to report.
    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    /// A threshold or setting is missing or invalid.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A file could not be opened or read from disk.
    #[error("Failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The input path does not exist.
    #[error("Data path not found: {0}")]
    DataPathNotFound(PathBuf),

    /// No CSV files were found under the given directory.
    #[error("No CSV files found in {0}")]
    NoDataFiles(PathBuf),

    /// A CSV document could not be read or written.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// A JSON document could not be parsed or written.
    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// An error originating from the terminal / TUI layer.
    #[error("Terminal error: {0}")]
    Terminal(String),

    /// Pass-through for any raw I/O error that does not carry a path.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl AnalysisError {
    /// Schema error for a required column that is not present.
    pub fn missing_column(column: &str) -> Self {
        AnalysisError::Schema {
            column: column.to_string(),
            reason: "is required but missing".to_string(),
        }
    }

    /// Schema error for a column holding a value outside its domain.
    pub fn invalid_value(column: &str, value: impl std::fmt::Display) -> Self {
        AnalysisError::Schema {
            column: column.to_string(),
            reason: format!("has invalid value '{}'", value),
        }
    }

    /// `true` for errors a caller can recover from by changing its
    /// configuration and calling again.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            AnalysisError::InsufficientData(_) | AnalysisError::Configuration(_)
        )
    }
}

/// Convenience alias used throughout the audience crates.
pub type Result<T> = std::result::Result<T, AnalysisError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_missing_column() {
        let err = AnalysisError::missing_column("age_band");
        assert_eq!(
            err.to_string(),
            "Schema error: column 'age_band' is required but missing"
        );
    }

    #[test]
    fn test_error_display_invalid_value() {
        let err = AnalysisError::invalid_value("weekday", 9);
        assert_eq!(
            err.to_string(),
            "Schema error: column 'weekday' has invalid value '9'"
        );
    }

    #[test]
    fn test_error_display_insufficient_data() {
        let err = AnalysisError::InsufficientData("no programs".to_string());
        assert_eq!(err.to_string(), "Insufficient data: no programs");
    }

    #[test]
    fn test_error_display_configuration() {
        let err = AnalysisError::Configuration("top_n must be positive".to_string());
        assert_eq!(err.to_string(), "Configuration error: top_n must be positive");
    }

    #[test]
    fn test_error_display_file_read() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "no such file");
        let err = AnalysisError::FileRead {
            path: PathBuf::from("/data/ratings.csv"),
            source: io_err,
        };
        let msg = err.to_string();
        assert!(msg.contains("Failed to read file"));
        assert!(msg.contains("/data/ratings.csv"));
        assert!(msg.contains("no such file"));
    }

    #[test]
    fn test_error_display_no_data_files() {
        let err = AnalysisError::NoDataFiles(PathBuf::from("/empty/dir"));
        assert_eq!(err.to_string(), "No CSV files found in /empty/dir");
    }

    #[test]
    fn test_recoverable_classification() {
        assert!(AnalysisError::InsufficientData("x".into()).is_recoverable());
        assert!(AnalysisError::Configuration("x".into()).is_recoverable());
        assert!(!AnalysisError::missing_column("rating").is_recoverable());
        assert!(!AnalysisError::Terminal("x".into()).is_recoverable());
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: AnalysisError = io_err.into();
        assert!(err.to_string().contains("denied"));
    }

    #[test]
    fn test_error_from_serde_json() {
        let json_err = serde_json::from_str::<serde_json::Value>("{invalid}").unwrap_err();
        let err: AnalysisError = json_err.into();
        assert!(err.to_string().contains("Failed to parse JSON"));
    }
}
