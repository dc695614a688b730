// ==========================================
// Vending Sales Ingest - sales importer
// ==========================================
// Flow: detect -> normalize -> locations -> products -> sales -> batch record
// Whole-file errors abort before the first write; after that every
// row-level database failure is counted and the pass continues.
// ==========================================

use crate::config::{config_keys, IngestConfigReader};
use crate::domain::vending::{
    CanonicalLocation, CanonicalProduct, CanonicalSale, ImportBatch, IngestCounters,
    IngestSummary, NormalizedBatch,
};
use crate::importer::conflict_handler::{
    ConflictHandler as ConflictHandlerImpl, LocationDecision, ProductDecision,
};
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::file_parser::read_csv_file;
use crate::importer::format_detector::FormatDetector as FormatDetectorImpl;
use crate::importer::sales_importer_trait::{
    ConflictHandler, FormatDetector, SalesImporter, VendorNormalizer,
};
use crate::importer::vendor_normalizer::SchemaNormalizer;
use crate::repository::SalesImportRepository;
use chrono::Utc;
use std::path::Path;
use std::time::Instant;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

// ==========================================
// SalesImporterImpl
// ==========================================
pub struct SalesImporterImpl<R, C>
where
    R: SalesImportRepository,
    C: IngestConfigReader,
{
    // data access
    import_repo: R,

    // config reader
    config: C,

    // pipeline components
    format_detector: Box<dyn FormatDetector>,
    normalizers: Vec<Box<dyn VendorNormalizer>>,
    conflict_handler: Box<dyn ConflictHandler>,
}

impl<R, C> SalesImporterImpl<R, C>
where
    R: SalesImportRepository,
    C: IngestConfigReader,
{
    /// Build an importer from explicit components.
    ///
    /// # Parameters
    /// - import_repo: persistence collaborator
    /// - config: config reader
    /// - format_detector: header classifier
    /// - normalizers: one per supported vendor schema
    /// - conflict_handler: location / product conflict rules
    pub fn new(
        import_repo: R,
        config: C,
        format_detector: Box<dyn FormatDetector>,
        normalizers: Vec<Box<dyn VendorNormalizer>>,
        conflict_handler: Box<dyn ConflictHandler>,
    ) -> Self {
        Self {
            import_repo,
            config,
            format_detector,
            normalizers,
            conflict_handler,
        }
    }

    /// Standard wiring: both vendor normalizers and the default handlers.
    pub fn with_defaults(import_repo: R, config: C) -> Self {
        Self::new(
            import_repo,
            config,
            Box::new(FormatDetectorImpl),
            vec![
                Box::new(SchemaNormalizer::ios_vending()),
                Box::new(SchemaNormalizer::cantaloupe()),
            ],
            Box::new(ConflictHandlerImpl),
        )
    }
}

#[async_trait::async_trait]
impl<R, C> SalesImporter for SalesImporterImpl<R, C>
where
    R: SalesImportRepository + Send + Sync,
    C: IngestConfigReader + Send + Sync,
{
    fn normalize(&self, content: &str) -> ImportResult<NormalizedBatch> {
        let schema = self.format_detector.detect(content)?;
        info!(vendor = %schema, "vendor format detected");

        let normalizer = self
            .normalizers
            .iter()
            .find(|n| n.schema() == schema)
            .ok_or_else(|| {
                ImportError::InternalError(format!("no normalizer registered for {}", schema))
            })?;

        normalizer.normalize(content)
    }

    #[instrument(skip(self, content), fields(batch_id))]
    async fn import_content(
        &self,
        file_name: Option<&str>,
        content: &str,
    ) -> ImportResult<IngestSummary> {
        let start_time = Instant::now();
        let batch_id = Uuid::new_v4().to_string();
        tracing::Span::current().record("batch_id", batch_id.as_str());

        info!(file_name = file_name.unwrap_or("-"), bytes = content.len(), "import started");

        // === Step 1: detect + normalize (no writes yet) ===
        let batch = self.normalize(content).map_err(|e| {
            error!(error = %e, "normalization failed, nothing written");
            e
        })?;
        info!(
            vendor = %batch.vendor,
            locations = batch.locations.len(),
            products = batch.products.len(),
            sales = batch.sales.len(),
            "normalization complete"
        );

        let separator = self
            .config
            .get_location_label_separator()
            .await
            .map_err(|e| ImportError::ConfigReadError {
                key: config_keys::LOCATION_LABEL_SEPARATOR.to_string(),
                message: e.to_string(),
            })?;

        // === Step 2: persistence pass ===
        let mut counters = IngestCounters::default();
        self.persist_locations(&batch.locations, &separator, &mut counters)
            .await;
        self.persist_products(&batch.products, &mut counters).await;
        self.persist_sales(&batch.sales, &mut counters).await;

        let elapsed_time = start_time.elapsed();

        // === Step 3: batch record ===
        let record = ImportBatch {
            batch_id: batch_id.clone(),
            file_name: file_name.map(|s| s.to_string()),
            vendor: batch.vendor,
            total_rows: batch.sales.len() as i64,
            processed_rows: counters.processed_rows as i64,
            new_locations: counters.new_locations as i64,
            new_products: counters.new_products as i64,
            conflicts_resolved: counters.conflicts_resolved as i64,
            inventory_updates: counters.inventory_updates as i64,
            error_count: counters.errors as i64,
            imported_at: Utc::now(),
            elapsed_ms: elapsed_time.as_millis() as i64,
        };
        if let Err(e) = self.import_repo.insert_batch(&record).await {
            // Audit only; the upload itself already went through
            warn!(error = %e, "failed to record import batch");
        }

        info!(
            vendor = %batch.vendor,
            processed = counters.processed_rows,
            new_locations = counters.new_locations,
            new_products = counters.new_products,
            conflicts = counters.conflicts_resolved,
            inventory_updates = counters.inventory_updates,
            errors = counters.errors,
            elapsed_ms = elapsed_time.as_millis() as u64,
            "import complete"
        );

        Ok(IngestSummary {
            batch_id,
            vendor: batch.vendor,
            total_rows: batch.sales.len(),
            counters,
            elapsed_time,
        })
    }

    async fn import_from_file<P: AsRef<Path> + Send>(
        &self,
        file_path: P,
    ) -> ImportResult<IngestSummary> {
        let path = file_path.as_ref();
        let content = read_csv_file(path)?;
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .map(|n| n.to_string());

        self.import_content(file_name.as_deref(), &content).await
    }
}

// ==========================================
// Persistence pass
// ==========================================
// A failed existence check skips the record without counting it.
impl<R, C> SalesImporterImpl<R, C>
where
    R: SalesImportRepository,
    C: IngestConfigReader,
{
    async fn persist_locations(
        &self,
        locations: &[CanonicalLocation],
        separator: &str,
        counters: &mut IngestCounters,
    ) {
        for location in locations {
            let existing = match self.import_repo.find_location(&location.id).await {
                Ok(existing) => existing,
                Err(e) => {
                    error!(location_id = %location.id, error = %e, "location lookup failed");
                    continue;
                }
            };

            let Some(stored) = existing else {
                match self.import_repo.insert_location(location).await {
                    Ok(()) => {
                        counters.new_locations += 1;
                        debug!(location_id = %location.id, "location created");
                    }
                    Err(e) => {
                        counters.errors += 1;
                        error!(location_id = %location.id, error = %e, "location insert failed");
                    }
                }
                continue;
            };

            match self
                .conflict_handler
                .classify_location(&stored, location, separator)
            {
                LocationDecision::Unchanged => {}
                LocationDecision::MergeVendor { merged_vendor } => {
                    counters.conflicts_resolved += 1;
                    warn!(
                        location_id = %location.id,
                        existing = %stored.vendor,
                        incoming = %location.vendor_label,
                        "vendor conflict, merging labels"
                    );
                    if let Err(e) = self
                        .import_repo
                        .update_location_vendor(&location.id, &merged_vendor)
                        .await
                    {
                        counters.errors += 1;
                        error!(
                            location_id = %location.id,
                            error = %e,
                            "vendor label update failed"
                        );
                    }
                }
            }
        }
    }

    async fn persist_products(&self, products: &[CanonicalProduct], counters: &mut IngestCounters) {
        for product in products {
            let existing = match self
                .import_repo
                .find_product_by_scancode(&product.scancode)
                .await
            {
                Ok(existing) => existing,
                Err(e) => {
                    error!(scancode = %product.scancode, error = %e, "product lookup failed");
                    continue;
                }
            };

            match existing {
                None => match self.import_repo.insert_product(product).await {
                    Ok(product_id) => {
                        counters.new_products += 1;
                        debug!(
                            scancode = %product.scancode,
                            product_id = %product_id,
                            "product created"
                        );
                    }
                    Err(e) => {
                        counters.errors += 1;
                        error!(scancode = %product.scancode, error = %e, "product insert failed");
                    }
                },
                Some(stored) => {
                    if let ProductDecision::NameConflict {
                        existing_name,
                        incoming_name,
                    } = self.conflict_handler.classify_product(&stored, product)
                    {
                        // Flag only; the stored name stays
                        counters.conflicts_resolved += 1;
                        warn!(
                            scancode = %product.scancode,
                            existing = %existing_name,
                            incoming = %incoming_name,
                            "product name conflict"
                        );
                    }
                }
            }
        }
    }

    async fn persist_sales(&self, sales: &[CanonicalSale], counters: &mut IngestCounters) {
        for sale in sales {
            match self.import_repo.sale_exists(&sale.content_hash).await {
                Ok(false) => {}
                Ok(true) => {
                    debug!(hash = %sale.content_hash, "sale already stored, skipping");
                    continue;
                }
                Err(e) => {
                    error!(hash = %sale.content_hash, error = %e, "sale lookup failed");
                    continue;
                }
            }

            if let Err(e) = self.import_repo.insert_sale(sale).await {
                counters.errors += 1;
                error!(
                    location_id = %sale.location_id,
                    product_id = %sale.product_id,
                    error = %e,
                    "sale insert failed"
                );
                continue;
            }

            // The trigger has run by now
            match self
                .import_repo
                .find_inventory(&sale.location_id, &sale.product_id)
                .await
            {
                Ok(Some(inventory)) => {
                    counters.inventory_updates += 1;
                    debug!(
                        location_id = %sale.location_id,
                        product_id = %sale.product_id,
                        current = inventory.current_quantity,
                        "inventory updated"
                    );
                }
                Ok(None) => {
                    debug!(
                        location_id = %sale.location_id,
                        product_id = %sale.product_id,
                        "no inventory row"
                    );
                }
                Err(e) => {
                    warn!(error = %e, "inventory lookup failed");
                }
            }

            counters.processed_rows += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigManager;
    use crate::db::{configure_sqlite_connection, init_schema};
    use crate::domain::types::VendorSchema;
    use crate::domain::vending::{
        InventoryLine, InventoryRecord, LocationWithInventory, StoredLocation, StoredProduct,
        StoredSale,
    };
    use crate::repository::{RepositoryError, RepositoryResult, SalesImportRepositoryImpl};
    use async_trait::async_trait;
    use rusqlite::Connection;
    use std::sync::{Arc, Mutex};

    const VENDOR_A: &str = "Location_ID,Product_Name,Scancode,Trans_Date,Price,Total_Amount\n\
                            LOC001,Coca Cola,CC001,2024-01-15,2.50,5.00\n\
                            LOC001,Sprite,SP001,2024-01-15,2.00,6.00";

    fn shared_conn() -> Arc<Mutex<Connection>> {
        let conn = Connection::open_in_memory().unwrap();
        configure_sqlite_connection(&conn).unwrap();
        init_schema(&conn).unwrap();
        Arc::new(Mutex::new(conn))
    }

    fn importer(
        conn: Arc<Mutex<Connection>>,
    ) -> SalesImporterImpl<SalesImportRepositoryImpl, ConfigManager> {
        SalesImporterImpl::with_defaults(
            SalesImportRepositoryImpl::from_connection(conn.clone()),
            ConfigManager::from_connection(conn).unwrap(),
        )
    }

    #[tokio::test]
    async fn test_import_counts_new_records() {
        let importer = importer(shared_conn());
        let summary = importer.import_content(Some("a.csv"), VENDOR_A).await.unwrap();

        assert_eq!(summary.vendor, VendorSchema::IosVending);
        assert_eq!(summary.total_rows, 2);
        assert_eq!(
            summary.counters,
            IngestCounters {
                processed_rows: 2,
                new_locations: 1,
                new_products: 2,
                conflicts_resolved: 0,
                inventory_updates: 2,
                errors: 0,
            }
        );
    }

    #[tokio::test]
    async fn test_reimport_skips_duplicate_sales() {
        let conn = shared_conn();
        let importer = importer(conn.clone());
        importer.import_content(None, VENDOR_A).await.unwrap();

        let summary = importer.import_content(None, VENDOR_A).await.unwrap();
        assert_eq!(summary.counters, IngestCounters::default());

        let repo = SalesImportRepositoryImpl::from_connection(conn);
        assert_eq!(repo.count_sales().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_unrecognized_format_writes_nothing() {
        let conn = shared_conn();
        let importer = importer(conn.clone());

        let result = importer.import_content(None, "foo,bar\n1,2").await;
        assert!(matches!(result, Err(ImportError::UnrecognizedFormat { .. })));

        let repo = SalesImportRepositoryImpl::from_connection(conn);
        assert_eq!(repo.count_sales().await.unwrap(), 0);
        assert!(repo.find_location("LOC001").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_batch_record_written() {
        let conn = shared_conn();
        let importer = importer(conn.clone());
        let summary = importer.import_content(Some("a.csv"), VENDOR_A).await.unwrap();

        let repo = SalesImportRepositoryImpl::from_connection(conn);
        let batch = repo.get_batch(&summary.batch_id).await.unwrap().unwrap();
        assert_eq!(batch.file_name.as_deref(), Some("a.csv"));
        assert_eq!(batch.vendor, VendorSchema::IosVending);
        assert_eq!(batch.processed_rows, 2);
    }

    // Delegates to the SQLite repository but rejects every sale insert.
    struct RejectingSalesRepo {
        inner: SalesImportRepositoryImpl,
    }

    #[async_trait]
    impl SalesImportRepository for RejectingSalesRepo {
        async fn find_location(&self, id: &str) -> RepositoryResult<Option<StoredLocation>> {
            self.inner.find_location(id).await
        }
        async fn insert_location(&self, l: &CanonicalLocation) -> RepositoryResult<()> {
            self.inner.insert_location(l).await
        }
        async fn update_location_vendor(&self, id: &str, v: &str) -> RepositoryResult<()> {
            self.inner.update_location_vendor(id, v).await
        }
        async fn find_product_by_scancode(
            &self,
            s: &str,
        ) -> RepositoryResult<Option<StoredProduct>> {
            self.inner.find_product_by_scancode(s).await
        }
        async fn insert_product(&self, p: &CanonicalProduct) -> RepositoryResult<String> {
            self.inner.insert_product(p).await
        }
        async fn sale_exists(&self, h: &str) -> RepositoryResult<bool> {
            self.inner.sale_exists(h).await
        }
        async fn insert_sale(&self, _sale: &CanonicalSale) -> RepositoryResult<String> {
            Err(RepositoryError::DatabaseQueryError("disk full".to_string()))
        }
        async fn count_sales(&self) -> RepositoryResult<i64> {
            self.inner.count_sales().await
        }
        async fn list_recent_sales(
            &self,
            id: &str,
            limit: usize,
        ) -> RepositoryResult<Vec<StoredSale>> {
            self.inner.list_recent_sales(id, limit).await
        }
        async fn find_inventory(
            &self,
            l: &str,
            p: &str,
        ) -> RepositoryResult<Option<InventoryRecord>> {
            self.inner.find_inventory(l, p).await
        }
        async fn list_inventory_by_location(
            &self,
            id: &str,
        ) -> RepositoryResult<Vec<InventoryLine>> {
            self.inner.list_inventory_by_location(id).await
        }
        async fn list_locations_with_inventory(
            &self,
            t: i64,
            v: f64,
        ) -> RepositoryResult<Vec<LocationWithInventory>> {
            self.inner.list_locations_with_inventory(t, v).await
        }
        async fn insert_batch(&self, b: &ImportBatch) -> RepositoryResult<()> {
            self.inner.insert_batch(b).await
        }
        async fn get_batch(&self, id: &str) -> RepositoryResult<Option<ImportBatch>> {
            self.inner.get_batch(id).await
        }
    }

    #[tokio::test]
    async fn test_row_failures_are_counted_not_raised() {
        let conn = shared_conn();
        let importer = SalesImporterImpl::with_defaults(
            RejectingSalesRepo {
                inner: SalesImportRepositoryImpl::from_connection(conn.clone()),
            },
            ConfigManager::from_connection(conn).unwrap(),
        );

        let summary = importer.import_content(None, VENDOR_A).await.unwrap();
        assert_eq!(summary.counters.errors, 2);
        assert_eq!(summary.counters.processed_rows, 0);
        assert_eq!(summary.counters.inventory_updates, 0);
        assert_eq!(summary.counters.new_locations, 1);
        assert_eq!(summary.counters.new_products, 2);
    }
}
