// ==========================================
// Vending Sales Ingest - sales domain model
// ==========================================
// Raw rows -> typed vendor rows -> canonical records -> stored rows
// Canonical records are built fresh per upload and handed to the
// repository, which owns existence checks and inserts.
// ==========================================

use crate::domain::types::VendorSchema;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

// ==========================================
// RawRow - one tokenized CSV line
// ==========================================
// Values are kept in header-declared column order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRow {
    pub row_number: usize,
    pub values: Vec<(String, String)>,
}

impl RawRow {
    /// Case-insensitive column lookup.
    pub fn get(&self, column: &str) -> Option<&str> {
        self.values
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(column))
            .map(|(_, value)| value.as_str())
    }

    pub fn is_blank(&self) -> bool {
        self.values.iter().all(|(_, v)| v.trim().is_empty())
    }
}

/// Header plus data rows of one tokenized file.
#[derive(Debug, Clone, Default)]
pub struct ParsedTable {
    pub headers: Vec<String>,
    pub rows: Vec<RawRow>,
}

// ==========================================
// Typed vendor rows
// ==========================================

/// iOS Vending Systems row (Vendor A)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VendorARow {
    pub location_id: String,
    pub product_name: String,
    pub scancode: String,
    pub trans_date: String,
    pub price: String,
    pub total_amount: String,
    pub row_number: usize,
}

/// Cantaloupe Systems row (Vendor B)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VendorBRow {
    pub site_code: String,
    pub item_description: String,
    pub upc: String,
    pub sale_date: String,
    pub unit_price: String,
    pub final_total: String,
    pub row_number: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VendorRow {
    IosVending(VendorARow),
    Cantaloupe(VendorBRow),
}

impl VendorRow {
    pub fn schema(&self) -> VendorSchema {
        match self {
            VendorRow::IosVending(_) => VendorSchema::IosVending,
            VendorRow::Cantaloupe(_) => VendorSchema::Cantaloupe,
        }
    }

    pub fn row_number(&self) -> usize {
        match self {
            VendorRow::IosVending(r) => r.row_number,
            VendorRow::Cantaloupe(r) => r.row_number,
        }
    }

    pub fn location_key(&self) -> &str {
        match self {
            VendorRow::IosVending(r) => &r.location_id,
            VendorRow::Cantaloupe(r) => &r.site_code,
        }
    }

    /// Scancode for Vendor A, UPC for Vendor B.
    pub fn product_key(&self) -> &str {
        match self {
            VendorRow::IosVending(r) => &r.scancode,
            VendorRow::Cantaloupe(r) => &r.upc,
        }
    }

    pub fn product_name(&self) -> &str {
        match self {
            VendorRow::IosVending(r) => &r.product_name,
            VendorRow::Cantaloupe(r) => &r.item_description,
        }
    }

    pub fn raw_date(&self) -> &str {
        match self {
            VendorRow::IosVending(r) => &r.trans_date,
            VendorRow::Cantaloupe(r) => &r.sale_date,
        }
    }

    pub fn raw_price(&self) -> &str {
        match self {
            VendorRow::IosVending(r) => &r.price,
            VendorRow::Cantaloupe(r) => &r.unit_price,
        }
    }

    pub fn raw_total(&self) -> &str {
        match self {
            VendorRow::IosVending(r) => &r.total_amount,
            VendorRow::Cantaloupe(r) => &r.final_total,
        }
    }
}

// ==========================================
// Canonical records
// ==========================================
// Field names follow the storage columns on the wire.

/// Identity = id
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanonicalLocation {
    pub id: String,
    #[serde(rename = "name")]
    pub display_name: String,
    #[serde(rename = "vendor")]
    pub vendor_label: String,
}

/// Identity = scancode
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanonicalProduct {
    pub scancode: String,
    #[serde(rename = "name")]
    pub display_name: String,
    pub upc: String,
}

/// Identity = content_hash
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalSale {
    pub location_id: String,
    pub product_id: String, // = product scancode
    pub quantity_sold: i64,
    #[serde(rename = "sale_date")]
    pub sale_timestamp: DateTime<Utc>,
    #[serde(rename = "price")]
    pub unit_price: f64,
    #[serde(rename = "total")]
    pub total_amount: f64,
    #[serde(rename = "source")]
    pub source_label: String,
    #[serde(rename = "raw_csv_hash")]
    pub content_hash: String,
}

/// Output of one normalization pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedBatch {
    pub vendor: VendorSchema,
    pub locations: Vec<CanonicalLocation>,
    pub products: Vec<CanonicalProduct>,
    pub sales: Vec<CanonicalSale>,
}

/// Derived stock levels for one (location, product) pair.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryLevel {
    pub starting: i64,
    pub current: i64,
}

// ==========================================
// Timestamped - records with a last-modified instant
// ==========================================
pub trait Timestamped {
    fn updated_at(&self) -> DateTime<Utc>;
}

// ==========================================
// Stored rows (repository read side)
// ==========================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredLocation {
    pub id: String,
    pub name: String,
    pub vendor: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Timestamped for StoredLocation {
    fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredProduct {
    pub id: String,
    pub name: String,
    pub scancode: String,
    pub upc: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Timestamped for StoredProduct {
    fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryRecord {
    pub id: String,
    pub location_id: String,
    pub product_id: String,
    pub starting_quantity: i64,
    pub current_quantity: i64,
    pub last_updated: DateTime<Utc>,
}

impl Timestamped for InventoryRecord {
    fn updated_at(&self) -> DateTime<Utc> {
        self.last_updated
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredSale {
    pub id: String,
    pub location_id: String,
    pub product_id: String,
    pub quantity_sold: i64,
    pub sale_date: DateTime<Utc>,
    pub price: f64,
    pub total: f64,
    pub source: String,
    pub raw_csv_hash: String,
    pub created_at: DateTime<Utc>,
}

// ==========================================
// Dashboard read models
// ==========================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventorySummary {
    pub total_products: i64,
    pub low_stock_items: i64,
    pub total_value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationWithInventory {
    pub location: StoredLocation,
    pub inventory_summary: InventorySummary,
}

/// Inventory row joined with the product it counts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryLine {
    pub product_id: String,
    pub product_name: Option<String>,
    pub starting_quantity: i64,
    pub current_quantity: i64,
    pub last_updated: DateTime<Utc>,
}

// ==========================================
// Import bookkeeping
// ==========================================

/// Audit row written once per upload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportBatch {
    pub batch_id: String,
    pub file_name: Option<String>,
    pub vendor: VendorSchema,
    pub total_rows: i64,
    pub processed_rows: i64,
    pub new_locations: i64,
    pub new_products: i64,
    pub conflicts_resolved: i64,
    pub inventory_updates: i64,
    pub error_count: i64,
    pub imported_at: DateTime<Utc>,
    pub elapsed_ms: i64,
}

/// Counters reported after the persistence pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestCounters {
    pub processed_rows: usize,
    pub new_locations: usize,
    pub new_products: usize,
    pub conflicts_resolved: usize,
    pub inventory_updates: usize,
    pub errors: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngestSummary {
    pub batch_id: String,
    pub vendor: VendorSchema,
    pub total_rows: usize,
    pub counters: IngestCounters,
    pub elapsed_time: Duration,
}
