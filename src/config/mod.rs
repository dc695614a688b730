// ==========================================
// Vending Sales Ingest - config layer
// ==========================================
// Storage: config_kv table
// ==========================================

pub mod config_manager;
pub mod ingest_config_trait;

pub use config_manager::{config_keys, defaults, ConfigManager};
pub use ingest_config_trait::IngestConfigReader;
