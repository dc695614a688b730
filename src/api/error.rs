// ==========================================
// Vending Sales Ingest - API error types
// ==========================================
// Maps importer / repository failures onto the upload boundary:
// a status code plus one fixed client message per category.
// Row-level detail stays in the logs.
// ==========================================

use crate::importer::error::ImportError;
use crate::repository::error::RepositoryError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const MSG_NO_FILE: &str = "No file provided";
pub const MSG_NOT_CSV: &str = "File must be a CSV";
pub const MSG_TOO_LARGE: &str = "File exceeds the maximum upload size";
pub const MSG_UNKNOWN_FORMAT: &str = "Unknown CSV format. Please ensure the file matches iOS Vending Systems or Cantaloupe Systems format.";
pub const MSG_PARSE_FAILED: &str = "Failed to parse CSV file. Please check the format and ensure all required columns are present.";
pub const MSG_UNEXPECTED: &str = "An unexpected error occurred during upload processing. Please check the console for details.";

/// API error type
#[derive(Error, Debug)]
pub enum ApiError {
    // ==========================================
    // Upload rejected (400)
    // ==========================================
    #[error("no file provided")]
    MissingFile,

    #[error("not a CSV file: {0}")]
    UnsupportedFile(String),

    #[error("file too large: {size} bytes (limit {limit})")]
    FileTooLarge { size: usize, limit: usize },

    #[error("format detection failed: {0}")]
    UnrecognizedFormat(String),

    #[error("CSV parse failed: {0}")]
    ParseFailed(String),

    // ==========================================
    // Everything else (500)
    // ==========================================
    #[error("not found: {0}")]
    NotFound(String),

    #[error("database error: {0}")]
    DatabaseError(String),

    #[error("database connection failed: {0}")]
    DatabaseConnectionError(String),

    #[error("import failed: {0}")]
    ImportError(String),

    #[error("internal error: {0}")]
    InternalError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ApiError {
    /// HTTP-style status for the boundary.
    pub fn status_code(&self) -> u16 {
        match self {
            ApiError::MissingFile
            | ApiError::UnsupportedFile(_)
            | ApiError::FileTooLarge { .. }
            | ApiError::UnrecognizedFormat(_)
            | ApiError::ParseFailed(_) => 400,
            _ => 500,
        }
    }

    /// The fixed message shown to the uploader.
    pub fn client_message(&self) -> &'static str {
        match self {
            ApiError::MissingFile => MSG_NO_FILE,
            ApiError::UnsupportedFile(_) => MSG_NOT_CSV,
            ApiError::FileTooLarge { .. } => MSG_TOO_LARGE,
            ApiError::UnrecognizedFormat(_) => MSG_UNKNOWN_FORMAT,
            ApiError::ParseFailed(_) => MSG_PARSE_FAILED,
            _ => MSG_UNEXPECTED,
        }
    }

    pub fn to_response(&self) -> ErrorResponse {
        ErrorResponse {
            error: self.client_message().to_string(),
        }
    }
}

// ==========================================
// From ImportError
// ==========================================
impl From<ImportError> for ApiError {
    fn from(err: ImportError) -> Self {
        match err {
            ImportError::UnrecognizedFormat { header } => ApiError::UnrecognizedFormat(header),
            e if e.is_format_error() => ApiError::ParseFailed(e.to_string()),
            ImportError::UnsupportedFormat(path) => ApiError::UnsupportedFile(path),
            ImportError::FileNotFound(path) => ApiError::NotFound(path),
            ImportError::Other(e) => ApiError::Other(e),
            other => ApiError::ImportError(other.to_string()),
        }
    }
}

// ==========================================
// From RepositoryError
// ==========================================
impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound { entity, id } => {
                ApiError::NotFound(format!("{}(id={})", entity, id))
            }
            RepositoryError::DatabaseConnectionError(msg) => ApiError::DatabaseConnectionError(msg),
            RepositoryError::LockError(msg) => {
                ApiError::DatabaseConnectionError(format!("database lock failed: {}", msg))
            }
            RepositoryError::Other(e) => ApiError::Other(e),
            other => ApiError::DatabaseError(other.to_string()),
        }
    }
}

/// Result alias
pub type ApiResult<T> = Result<T, ApiError>;

/// Error body returned to the uploader.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_errors_are_client_errors() {
        let err: ApiError = ImportError::UnrecognizedFormat {
            header: "foo,bar".to_string(),
        }
        .into();
        assert_eq!(err.status_code(), 400);
        assert_eq!(err.client_message(), MSG_UNKNOWN_FORMAT);
    }

    #[test]
    fn test_parse_class_errors_share_one_message() {
        let errors = vec![
            ImportError::MalformedCsv("record 2 has 3 fields".to_string()),
            ImportError::MissingColumn {
                vendor: "Cantaloupe Systems".to_string(),
                column: "UPC".to_string(),
            },
            ImportError::InvalidDate {
                row: 4,
                field: "Sale_Date".to_string(),
                value: "tomorrow".to_string(),
            },
        ];

        for import_err in errors {
            let err: ApiError = import_err.into();
            assert!(matches!(err, ApiError::ParseFailed(_)));
            assert_eq!(err.status_code(), 400);
            assert_eq!(err.client_message(), MSG_PARSE_FAILED);
        }
    }

    #[test]
    fn test_other_errors_are_server_errors() {
        let err: ApiError = RepositoryError::LockError("poisoned".to_string()).into();
        assert_eq!(err.status_code(), 500);
        assert_eq!(err.to_response().error, MSG_UNEXPECTED);

        let err: ApiError = ImportError::InternalError("boom".to_string()).into();
        assert_eq!(err.status_code(), 500);
    }

    #[test]
    fn test_upload_rejections() {
        assert_eq!(ApiError::MissingFile.client_message(), MSG_NO_FILE);
        assert_eq!(
            ApiError::UnsupportedFile("a.txt".to_string()).client_message(),
            MSG_NOT_CSV
        );
        assert_eq!(
            ApiError::FileTooLarge { size: 11, limit: 10 }.status_code(),
            400
        );
    }
}
