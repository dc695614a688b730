// ==========================================
// Vending Sales Ingest - library root
// ==========================================
// Vendor CSV exports (iOS Vending Systems, Cantaloupe Systems)
// -> canonical locations / products / sales -> SQLite
// ==========================================

// Domain - entities and vendor schemas
pub mod domain;

// Repository - data access
pub mod repository;

// Importer - detection, normalization, persistence pass
pub mod importer;

// Config - config_kv reader
pub mod config;

// Database bootstrap (PRAGMAs, schema, trigger)
pub mod db;

// Logging
pub mod logging;

// API - upload boundary and dashboard reads
pub mod api;

// ==========================================
// Re-exports
// ==========================================

pub use domain::types::VendorSchema;
pub use domain::vending::{
    CanonicalLocation, CanonicalProduct, CanonicalSale, IngestCounters, IngestSummary,
    InventoryLevel, NormalizedBatch,
};
pub use importer::{ImportError, ImportResult, SalesImporter, SalesImporterImpl};
pub use api::{ApiError, DashboardApi, UploadApi, UploadResponse};

// ==========================================
// Constants
// ==========================================

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub const APP_NAME: &str = "Vending Sales Ingest";
