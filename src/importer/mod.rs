// ==========================================
// Vending Sales Ingest - importer layer
// ==========================================
// Vendor CSV exports -> canonical locations, products and sales
// Supported: iOS Vending Systems, Cantaloupe Systems
// ==========================================

pub mod conflict_handler;
pub mod derivation;
pub mod error;
pub mod field_mapper;
pub mod file_parser;
pub mod format_detector;
pub mod hasher;
pub mod sales_importer_impl;
pub mod sales_importer_trait;
pub mod vendor_normalizer;

// Implementations
pub use conflict_handler::ConflictHandler as ConflictHandlerImpl;
pub use conflict_handler::{normalize_location_name, resolve, LocationDecision, ProductDecision};
pub use derivation::DerivationService as DerivationServiceImpl;
pub use error::{ImportError, ImportResult};
pub use field_mapper::FieldMapper as FieldMapperImpl;
pub use file_parser::{read_csv_file, CsvParser};
pub use format_detector::FormatDetector as FormatDetectorImpl;
pub use hasher::{fingerprint, sale_fingerprint};
pub use sales_importer_impl::SalesImporterImpl;
pub use vendor_normalizer::SchemaNormalizer;

// Trait interfaces
pub use sales_importer_trait::{
    ConflictHandler, DerivationService, FieldMapper, FileParser, FormatDetector, SalesImporter,
    VendorNormalizer,
};
