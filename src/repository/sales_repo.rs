// ==========================================
// Vending Sales Ingest - sales import repository trait
// ==========================================
// Data access for the persistence pass and the dashboard reads.
// No business rules here: conflict decisions live in the importer.
// ==========================================

use crate::domain::vending::{
    CanonicalLocation, CanonicalProduct, CanonicalSale, ImportBatch, InventoryLine,
    InventoryRecord, LocationWithInventory, StoredLocation, StoredProduct, StoredSale,
};
use crate::repository::error::RepositoryResult;
use async_trait::async_trait;

// ==========================================
// SalesImportRepository Trait
// ==========================================
// Implementor: SalesImportRepositoryImpl (rusqlite)
#[async_trait]
pub trait SalesImportRepository: Send + Sync {
    // ===== Locations =====

    /// Look a location up by its vendor id.
    async fn find_location(&self, location_id: &str) -> RepositoryResult<Option<StoredLocation>>;

    async fn insert_location(&self, location: &CanonicalLocation) -> RepositoryResult<()>;

    /// Overwrite the vendor label (used for label merges).
    async fn update_location_vendor(&self, location_id: &str, vendor: &str)
        -> RepositoryResult<()>;

    // ===== Products =====

    async fn find_product_by_scancode(
        &self,
        scancode: &str,
    ) -> RepositoryResult<Option<StoredProduct>>;

    /// Insert a product under a fresh id.
    ///
    /// # Returns
    /// - Ok(String): generated product id
    async fn insert_product(&self, product: &CanonicalProduct) -> RepositoryResult<String>;

    // ===== Sales =====

    /// True if a sale with this content hash is already stored.
    async fn sale_exists(&self, content_hash: &str) -> RepositoryResult<bool>;

    /// Insert a sale; the inventory trigger fires on the same statement.
    async fn insert_sale(&self, sale: &CanonicalSale) -> RepositoryResult<String>;

    async fn count_sales(&self) -> RepositoryResult<i64>;

    /// Most recent sales at a location, newest first.
    async fn list_recent_sales(
        &self,
        location_id: &str,
        limit: usize,
    ) -> RepositoryResult<Vec<StoredSale>>;

    // ===== Inventory =====

    async fn find_inventory(
        &self,
        location_id: &str,
        product_id: &str,
    ) -> RepositoryResult<Option<InventoryRecord>>;

    /// Inventory lines of a location joined with product names.
    async fn list_inventory_by_location(
        &self,
        location_id: &str,
    ) -> RepositoryResult<Vec<InventoryLine>>;

    /// Every location with its inventory summary, ordered by name.
    ///
    /// # Parameters
    /// - low_stock_threshold: current_quantity at or below this counts as low stock
    /// - unit_value: value assumed per unit on hand
    async fn list_locations_with_inventory(
        &self,
        low_stock_threshold: i64,
        unit_value: f64,
    ) -> RepositoryResult<Vec<LocationWithInventory>>;

    // ===== Import batches =====

    async fn insert_batch(&self, batch: &ImportBatch) -> RepositoryResult<()>;

    async fn get_batch(&self, batch_id: &str) -> RepositoryResult<Option<ImportBatch>>;
}
