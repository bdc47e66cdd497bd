use std::path::PathBuf;
use thiserror::Error;

/// All errors produced while loading and analysing audit records.
#[derive(Error, Debug)]
pub enum AuditError {
    /// A file could not be opened or read from disk.
    #[error("Failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The CSV layer rejected the input (bad quoting, ragged rows, ...).
    #[error("Failed to parse CSV: {0}")]
    Csv(#[from] csv::Error),

    /// A required column is absent from the input header.
    #[error("Missing required column: {column}")]
    MissingColumn { column: String },

    /// A cell could not be parsed as the type its column requires.
    #[error("Invalid value {value:?} in column {column} at line {line}: {reason}")]
    Parse {
        line: u64,
        column: String,
        value: String,
        reason: String,
    },

    /// A JSON document could not be parsed or written.
    #[error("Failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// The input path does not exist.
    #[error("Input path not found: {0}")]
    InputNotFound(PathBuf),

    /// No CSV files were found under the given directory.
    #[error("No CSV files found in {0}")]
    NoDataFiles(PathBuf),

    /// A configuration value is missing or invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Pass-through for any raw I/O error that does not carry a path.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Catch-all for errors from third-party crates via `anyhow`.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl AuditError {
    /// Build a [`AuditError::Parse`] for one cell.
    pub fn parse(
        line: u64,
        column: impl Into<String>,
        value: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::Parse {
            line,
            column: column.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }

    /// Build a [`AuditError::MissingColumn`].
    pub fn missing_column(column: impl Into<String>) -> Self {
        Self::MissingColumn {
            column: column.into(),
        }
    }
}

/// Convenience alias used throughout the audit crates.
pub type Result<T> = std::result::Result<T, AuditError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_file_read() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "no such file");
        let err = AuditError::FileRead {
            path: PathBuf::from("/data/audits.csv"),
            source: io_err,
        };
        let msg = err.to_string();
        assert!(msg.contains("Failed to read file"));
        assert!(msg.contains("/data/audits.csv"));
        assert!(msg.contains("no such file"));
    }

    #[test]
    fn test_error_display_missing_column() {
        let err = AuditError::missing_column("audit_date");
        assert_eq!(err.to_string(), "Missing required column: audit_date");
    }

    #[test]
    fn test_error_display_parse() {
        let err = AuditError::parse(7, "records_requested", "ten", "expected a whole number");
        assert_eq!(
            err.to_string(),
            "Invalid value \"ten\" in column records_requested at line 7: expected a whole number"
        );
    }

    #[test]
    fn test_error_display_no_data_files() {
        let err = AuditError::NoDataFiles(PathBuf::from("/empty/dir"));
        assert_eq!(err.to_string(), "No CSV files found in /empty/dir");
    }

    #[test]
    fn test_error_display_config() {
        let err = AuditError::Config("percentile must be within 0..=100".to_string());
        assert_eq!(
            err.to_string(),
            "Configuration error: percentile must be within 0..=100"
        );
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: AuditError = io_err.into();
        assert!(err.to_string().contains("denied"));
    }

    #[test]
    fn test_error_from_serde_json() {
        let json_err = serde_json::from_str::<serde_json::Value>("{invalid}").unwrap_err();
        let err: AuditError = json_err.into();
        assert!(err.to_string().contains("Failed to parse JSON"));
    }

    #[test]
    fn test_error_from_anyhow_is_transparent() {
        let err: AuditError = anyhow::anyhow!("upstream failure").into();
        assert_eq!(err.to_string(), "upstream failure");
    }
}
