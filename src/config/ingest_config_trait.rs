// ==========================================
// Vending Sales Ingest - ingest config reader trait
// ==========================================
// Read-only view of the settings the upload path needs.
// ==========================================

use async_trait::async_trait;
use std::error::Error;

// ==========================================
// IngestConfigReader Trait
// ==========================================
// Implementor: ConfigManager (config_kv table)
#[async_trait]
pub trait IngestConfigReader: Send + Sync {
    /// Largest accepted upload, in bytes.
    ///
    /// # Default
    /// - 10485760 (10 MiB)
    async fn get_upload_max_bytes(&self) -> Result<usize, Box<dyn Error + Send + Sync>>;

    /// Joins vendor labels when one location id shows up under two vendors.
    ///
    /// # Default
    /// - ", "
    async fn get_location_label_separator(&self) -> Result<String, Box<dyn Error + Send + Sync>>;

    /// current_quantity at or below this counts as low stock.
    ///
    /// # Default
    /// - 5
    async fn get_low_stock_threshold(&self) -> Result<i64, Box<dyn Error + Send + Sync>>;

    /// Value per unit on hand used by the inventory summary.
    ///
    /// # Default
    /// - 2.5
    async fn get_assumed_unit_value(&self) -> Result<f64, Box<dyn Error + Send + Sync>>;
}
