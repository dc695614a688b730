// ==========================================
// Vending Sales Ingest - API layer
// ==========================================

pub mod dashboard_api;
pub mod error;
pub mod upload_api;

pub use dashboard_api::DashboardApi;
pub use error::{ApiError, ApiResult, ErrorResponse};
pub use upload_api::{UploadApi, UploadResponse};
