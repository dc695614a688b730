// ==========================================
// Vending Sales Ingest - importer traits
// ==========================================
// Seams of the ingestion pipeline (interfaces only):
// detect -> tokenize -> map -> derive -> normalize -> persist
// ==========================================

use crate::domain::types::VendorSchema;
use crate::domain::vending::{
    CanonicalLocation, CanonicalProduct, CanonicalSale, IngestSummary, InventoryLevel,
    NormalizedBatch, ParsedTable, RawRow, StoredLocation, StoredProduct, VendorRow,
};
use crate::importer::conflict_handler::{LocationDecision, ProductDecision};
use crate::importer::error::ImportResult;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::path::Path;

// ==========================================
// SalesImporter Trait
// ==========================================
// Implementor: SalesImporterImpl
#[async_trait]
pub trait SalesImporter: Send + Sync {
    /// Detect the vendor and normalize the file without touching storage.
    ///
    /// # Errors
    /// - UnrecognizedFormat: header matches neither schema
    /// - MalformedCsv / MissingColumn: tokenizer or header mapping failed
    /// - InvalidDate: a row's date cannot be parsed
    fn normalize(&self, content: &str) -> ImportResult<NormalizedBatch>;

    /// Normalize, then hand locations, products and sales to the repository.
    ///
    /// # Returns
    /// - Ok(IngestSummary): counters of the persistence pass
    /// - Err: any whole-file error; nothing has been written in that case
    async fn import_content(
        &self,
        file_name: Option<&str>,
        content: &str,
    ) -> ImportResult<IngestSummary>;

    /// Read a .csv file from disk and import it.
    async fn import_from_file<P: AsRef<Path> + Send>(
        &self,
        file_path: P,
    ) -> ImportResult<IngestSummary>;
}

// ==========================================
// FormatDetector Trait
// ==========================================
pub trait FormatDetector: Send + Sync {
    /// Classify the file by its first line.
    fn detect(&self, content: &str) -> ImportResult<VendorSchema>;
}

// ==========================================
// FileParser Trait
// ==========================================
// Implementor: CsvParser
pub trait FileParser: Send + Sync {
    /// Tokenize in-memory CSV text into a header and raw rows.
    fn parse_content(&self, content: &str) -> ImportResult<ParsedTable>;

    /// Read a file from disk and tokenize it.
    fn parse_file(&self, file_path: &Path) -> ImportResult<ParsedTable>;
}

// ==========================================
// FieldMapper Trait
// ==========================================
pub trait FieldMapper: Send + Sync {
    /// Fail with MissingColumn unless the header declares every required column.
    fn validate_headers(&self, schema: VendorSchema, headers: &[String]) -> ImportResult<()>;

    /// Build the strongly-typed vendor row from a raw row.
    fn map_row(&self, schema: VendorSchema, row: &RawRow) -> ImportResult<VendorRow>;
}

// ==========================================
// DerivationService Trait
// ==========================================
pub trait DerivationService: Send + Sync {
    /// Lenient decimal parse: unparsable input yields 0.
    fn parse_decimal(&self, value: &str) -> f64;

    /// round(total / price) when price > 0, else 1.
    fn derive_quantity(&self, price: f64, total: f64) -> i64;

    /// Parse a raw date string into a UTC instant.
    fn parse_sale_date(
        &self,
        value: &str,
        row_number: usize,
        field: &str,
    ) -> ImportResult<DateTime<Utc>>;

    /// Fold sales into per (location, product) starting / current levels.
    fn derive_inventory(
        &self,
        sales: &[CanonicalSale],
    ) -> HashMap<(String, String), InventoryLevel>;
}

// ==========================================
// VendorNormalizer Trait
// ==========================================
// Implementor: SchemaNormalizer (one per vendor schema)
pub trait VendorNormalizer: Send + Sync {
    fn schema(&self) -> VendorSchema;

    /// Sales in input order; locations / products deduplicated, first seen wins.
    fn normalize(&self, content: &str) -> ImportResult<NormalizedBatch>;
}

// ==========================================
// ConflictHandler Trait
// ==========================================
pub trait ConflictHandler: Send + Sync {
    /// Same location id arriving under a different vendor label.
    fn classify_location(
        &self,
        existing: &StoredLocation,
        incoming: &CanonicalLocation,
        separator: &str,
    ) -> LocationDecision;

    /// Same scancode arriving under a different product name.
    fn classify_product(
        &self,
        existing: &StoredProduct,
        incoming: &CanonicalProduct,
    ) -> ProductDecision;
}
