// ==========================================
// Vending Sales Ingest - upload API
// ==========================================
// Boundary of the ingestion pipeline: file checks, size limit,
// error -> status mapping and the success body.
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use crate::config::{ConfigManager, IngestConfigReader};
use crate::db::open_sqlite_connection;
use crate::domain::types::VendorSchema;
use crate::domain::vending::IngestSummary;
use crate::importer::{SalesImporter, SalesImporterImpl};
use crate::repository::SalesImportRepositoryImpl;
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use tracing::{error, info, warn};

/// Success body of an upload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub success: bool,
    pub processed_rows: usize,
    pub new_locations: usize,
    pub new_products: usize,
    pub conflicts_resolved: usize,
    pub inventory_updates: usize,
    pub errors: usize,
    pub vendor_format: VendorSchema,
    pub message: String,
}

impl From<&IngestSummary> for UploadResponse {
    fn from(summary: &IngestSummary) -> Self {
        let c = &summary.counters;
        Self {
            success: true,
            processed_rows: c.processed_rows,
            new_locations: c.new_locations,
            new_products: c.new_products,
            conflicts_resolved: c.conflicts_resolved,
            inventory_updates: c.inventory_updates,
            errors: c.errors,
            vendor_format: summary.vendor,
            message: format!(
                "Successfully processed {} sales records. {} new locations, {} new products, {} inventory updates, and {} conflicts resolved.",
                c.processed_rows,
                c.new_locations,
                c.new_products,
                c.inventory_updates,
                c.conflicts_resolved
            ),
        }
    }
}

/// Upload API
pub struct UploadApi {
    db_path: String,
}

impl UploadApi {
    pub fn new(db_path: String) -> Self {
        Self { db_path }
    }

    fn open_connection(&self) -> ApiResult<Arc<Mutex<Connection>>> {
        let conn = open_sqlite_connection(&self.db_path)
            .map_err(|e| ApiError::DatabaseConnectionError(e.to_string()))?;
        Ok(Arc::new(Mutex::new(conn)))
    }

    /// Ingest one uploaded CSV.
    ///
    /// # Parameters
    /// - file_name: uploaded file name; None means no file part was sent
    /// - content: decoded file text
    ///
    /// # Returns
    /// - Ok(UploadResponse): counts of the persistence pass
    /// - Err(ApiError): 400 for rejected files, 500 otherwise
    pub async fn upload(
        &self,
        file_name: Option<&str>,
        content: &str,
    ) -> ApiResult<UploadResponse> {
        let file_name = file_name.ok_or_else(|| {
            warn!("upload without a file");
            ApiError::MissingFile
        })?;

        if !has_csv_extension(file_name) {
            warn!(file_name = %file_name, "upload is not a CSV");
            return Err(ApiError::UnsupportedFile(file_name.to_string()));
        }

        let conn = self.open_connection()?;
        let config = ConfigManager::from_connection(conn.clone())
            .map_err(|e| ApiError::InternalError(e.to_string()))?;

        let limit = config
            .get_upload_max_bytes()
            .await
            .map_err(|e| ApiError::InternalError(e.to_string()))?;
        if content.len() > limit {
            warn!(file_name = %file_name, size = content.len(), limit, "upload too large");
            return Err(ApiError::FileTooLarge {
                size: content.len(),
                limit,
            });
        }

        info!(file_name = %file_name, bytes = content.len(), "processing upload");

        let importer = SalesImporterImpl::with_defaults(
            SalesImportRepositoryImpl::from_connection(conn),
            config,
        );

        let summary = importer
            .import_content(Some(file_name), content)
            .await
            .map_err(|e| {
                error!(file_name = %file_name, error = %e, "upload failed");
                ApiError::from(e)
            })?;

        Ok(UploadResponse::from(&summary))
    }

    /// Status code and JSON body for either outcome.
    pub async fn handle(&self, file_name: Option<&str>, content: &str) -> (u16, serde_json::Value) {
        match self.upload(file_name, content).await {
            Ok(response) => match serde_json::to_value(&response) {
                Ok(body) => (200, body),
                Err(e) => {
                    let err = ApiError::InternalError(e.to_string());
                    (err.status_code(), error_body(&err))
                }
            },
            Err(err) => (err.status_code(), error_body(&err)),
        }
    }
}

fn error_body(err: &ApiError) -> serde_json::Value {
    serde_json::to_value(err.to_response())
        .unwrap_or_else(|_| serde_json::json!({ "error": err.client_message() }))
}

fn has_csv_extension(file_name: &str) -> bool {
    file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.eq_ignore_ascii_case("csv"))
        .unwrap_or(false)
}
