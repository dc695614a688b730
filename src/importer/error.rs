// ==========================================
// Vending Sales Ingest - importer error types
// ==========================================
// Tool: thiserror derive
// Only the format / tokenize / date kinds abort an upload;
// row-level persistence failures are counted, not raised.
// ==========================================

use thiserror::Error;

/// Importer error type
#[derive(Error, Debug)]
pub enum ImportError {
    // ===== Whole-file format errors =====
    #[error("Unknown CSV format. Expected iOS Vending Systems or Cantaloupe Systems format. (header: {header})")]
    UnrecognizedFormat { header: String },

    #[error("CSV parse failed: {0}")]
    MalformedCsv(String),

    #[error("required column missing for {vendor}: {column}")]
    MissingColumn { vendor: String, column: String },

    #[error("invalid date (row {row}, field {field}): {value}")]
    InvalidDate {
        row: usize,
        field: String,
        value: String,
    },

    // ===== File errors =====
    #[error("file not found: {0}")]
    FileNotFound(String),

    #[error("unsupported file: {0} (only .csv is accepted)")]
    UnsupportedFormat(String),

    #[error("file read failed: {0}")]
    FileReadError(String),

    // ===== Config errors =====
    #[error("config read failed (key: {key}): {message}")]
    ConfigReadError { key: String, message: String },

    // ===== Generic =====
    #[error("internal error: {0}")]
    InternalError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ImportError {
    /// True for the error kinds that reject the file before any write.
    pub fn is_format_error(&self) -> bool {
        matches!(
            self,
            ImportError::UnrecognizedFormat { .. }
                | ImportError::MalformedCsv(_)
                | ImportError::MissingColumn { .. }
                | ImportError::InvalidDate { .. }
        )
    }
}

impl From<std::io::Error> for ImportError {
    fn from(err: std::io::Error) -> Self {
        ImportError::FileReadError(err.to_string())
    }
}

impl From<csv::Error> for ImportError {
    fn from(err: csv::Error) -> Self {
        ImportError::MalformedCsv(err.to_string())
    }
}

/// Result alias
pub type ImportResult<T> = Result<T, ImportError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_error_classification() {
        assert!(ImportError::UnrecognizedFormat {
            header: "a,b".to_string()
        }
        .is_format_error());
        assert!(ImportError::MalformedCsv("x".to_string()).is_format_error());
        assert!(ImportError::InvalidDate {
            row: 1,
            field: "Trans_Date".to_string(),
            value: "nope".to_string(),
        }
        .is_format_error());
        assert!(!ImportError::ConfigReadError {
            key: "location_label_separator".to_string(),
            message: "locked".to_string(),
        }
        .is_format_error());
    }

    #[test]
    fn test_invalid_date_message() {
        let err = ImportError::InvalidDate {
            row: 4,
            field: "Sale_Date".to_string(),
            value: "yesterday".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "invalid date (row 4, field Sale_Date): yesterday"
        );
    }
}
