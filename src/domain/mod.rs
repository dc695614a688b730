// ==========================================
// Vending Sales Ingest - domain layer
// ==========================================
// Entities, value types and read models.
// No data access, no parsing logic.
// ==========================================

pub mod types;
pub mod vending;

// Re-export core types
pub use types::{VendorColumns, VendorProfile, VendorSchema};
pub use vending::{
    CanonicalLocation, CanonicalProduct, CanonicalSale, ImportBatch, IngestCounters,
    IngestSummary, InventoryLevel, InventoryLine, InventoryRecord, InventorySummary,
    LocationWithInventory, NormalizedBatch, ParsedTable, RawRow, StoredLocation, StoredProduct,
    StoredSale, Timestamped, VendorARow, VendorBRow, VendorRow,
};
