// ==========================================
// Vending Sales Ingest - dashboard API
// ==========================================
// Read side for the location and inventory pages.
// Low-stock threshold and unit value come from config.
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use crate::config::{ConfigManager, IngestConfigReader};
use crate::db::open_sqlite_connection;
use crate::domain::vending::{InventoryLine, LocationWithInventory, StoredSale};
use crate::repository::{SalesImportRepository, SalesImportRepositoryImpl};
use std::sync::{Arc, Mutex};

/// Default page size for recent sales.
pub const DEFAULT_RECENT_SALES_LIMIT: usize = 20;

pub struct DashboardApi {
    repo: Arc<dyn SalesImportRepository>,
    config: Arc<dyn IngestConfigReader>,
}

impl DashboardApi {
    pub fn new(repo: Arc<dyn SalesImportRepository>, config: Arc<dyn IngestConfigReader>) -> Self {
        Self { repo, config }
    }

    /// Wire both collaborators on one connection to `db_path`.
    pub fn open(db_path: &str) -> ApiResult<Self> {
        let conn = open_sqlite_connection(db_path)
            .map_err(|e| ApiError::DatabaseConnectionError(e.to_string()))?;
        let conn = Arc::new(Mutex::new(conn));

        let config = ConfigManager::from_connection(conn.clone())
            .map_err(|e| ApiError::InternalError(e.to_string()))?;

        Ok(Self::new(
            Arc::new(SalesImportRepositoryImpl::from_connection(conn)),
            Arc::new(config),
        ))
    }

    /// All locations with their inventory summary.
    pub async fn list_locations(&self) -> ApiResult<Vec<LocationWithInventory>> {
        let threshold = self
            .config
            .get_low_stock_threshold()
            .await
            .map_err(|e| ApiError::InternalError(e.to_string()))?;
        let unit_value = self
            .config
            .get_assumed_unit_value()
            .await
            .map_err(|e| ApiError::InternalError(e.to_string()))?;

        Ok(self
            .repo
            .list_locations_with_inventory(threshold, unit_value)
            .await?)
    }

    /// Inventory lines for one location.
    ///
    /// # Errors
    /// - NotFound: unknown location id
    pub async fn location_inventory(&self, location_id: &str) -> ApiResult<Vec<InventoryLine>> {
        self.require_location(location_id).await?;
        Ok(self.repo.list_inventory_by_location(location_id).await?)
    }

    /// Newest sales for one location; `limit` defaults to 20 and is capped at 500.
    pub async fn recent_sales(
        &self,
        location_id: &str,
        limit: Option<usize>,
    ) -> ApiResult<Vec<StoredSale>> {
        self.require_location(location_id).await?;
        let limit = limit.unwrap_or(DEFAULT_RECENT_SALES_LIMIT).clamp(1, 500);
        Ok(self.repo.list_recent_sales(location_id, limit).await?)
    }

    async fn require_location(&self, location_id: &str) -> ApiResult<()> {
        match self.repo.find_location(location_id).await? {
            Some(_) => Ok(()),
            None => Err(ApiError::NotFound(format!("location(id={})", location_id))),
        }
    }
}
