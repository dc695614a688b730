// ==========================================
// Vending Sales Ingest - repository layer
// ==========================================
// Data access only; all queries are parameterized.
// ==========================================

pub mod error;
pub mod sales_repo;
pub mod sales_repo_impl;

pub use error::{RepositoryError, RepositoryResult};
pub use sales_repo::SalesImportRepository;
pub use sales_repo_impl::SalesImportRepositoryImpl;
