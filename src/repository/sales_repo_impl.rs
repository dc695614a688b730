// ==========================================
// Vending Sales Ingest - sales import repository (rusqlite)
// ==========================================
// Timestamps are stored as RFC 3339 text.
// sales.product_id and inventory.product_id hold the product scancode.
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::types::VendorSchema;
use crate::domain::vending::{
    CanonicalLocation, CanonicalProduct, CanonicalSale, ImportBatch, InventoryLine,
    InventoryRecord, InventorySummary, LocationWithInventory, StoredLocation, StoredProduct,
    StoredSale,
};
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::sales_repo::SalesImportRepository;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::sync::{Arc, Mutex, MutexGuard};
use uuid::Uuid;

// ==========================================
// Row mapping helpers
// ==========================================

fn parse_timestamp(idx: usize, raw: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn get_timestamp(row: &Row, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    parse_timestamp(idx, &raw)
}

fn map_location(row: &Row) -> rusqlite::Result<StoredLocation> {
    Ok(StoredLocation {
        id: row.get(0)?,
        name: row.get(1)?,
        vendor: row.get(2)?,
        created_at: get_timestamp(row, 3)?,
        updated_at: get_timestamp(row, 4)?,
    })
}

fn map_product(row: &Row) -> rusqlite::Result<StoredProduct> {
    Ok(StoredProduct {
        id: row.get(0)?,
        name: row.get(1)?,
        scancode: row.get(2)?,
        upc: row.get(3)?,
        created_at: get_timestamp(row, 4)?,
        updated_at: get_timestamp(row, 5)?,
    })
}

fn map_inventory(row: &Row) -> rusqlite::Result<InventoryRecord> {
    Ok(InventoryRecord {
        id: row.get(0)?,
        location_id: row.get(1)?,
        product_id: row.get(2)?,
        starting_quantity: row.get(3)?,
        current_quantity: row.get(4)?,
        last_updated: get_timestamp(row, 5)?,
    })
}

fn map_sale(row: &Row) -> rusqlite::Result<StoredSale> {
    Ok(StoredSale {
        id: row.get(0)?,
        location_id: row.get(1)?,
        product_id: row.get(2)?,
        quantity_sold: row.get(3)?,
        sale_date: get_timestamp(row, 4)?,
        price: row.get(5)?,
        total: row.get(6)?,
        source: row.get(7)?,
        raw_csv_hash: row.get(8)?,
        created_at: get_timestamp(row, 9)?,
    })
}

fn map_batch(row: &Row) -> rusqlite::Result<ImportBatch> {
    let vendor_tag: String = row.get(2)?;
    let vendor = VendorSchema::from_tag(&vendor_tag).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            2,
            Type::Text,
            format!("unknown vendor tag: {}", vendor_tag).into(),
        )
    })?;

    Ok(ImportBatch {
        batch_id: row.get(0)?,
        file_name: row.get(1)?,
        vendor,
        total_rows: row.get(3)?,
        processed_rows: row.get(4)?,
        new_locations: row.get(5)?,
        new_products: row.get(6)?,
        conflicts_resolved: row.get(7)?,
        inventory_updates: row.get(8)?,
        error_count: row.get(9)?,
        imported_at: get_timestamp(row, 10)?,
        elapsed_ms: row.get(11)?,
    })
}

// ==========================================
// SalesImportRepositoryImpl
// ==========================================
pub struct SalesImportRepositoryImpl {
    conn: Arc<Mutex<Connection>>,
}

impl SalesImportRepositoryImpl {
    /// Open a repository on its own connection.
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)
            .map_err(|e| RepositoryError::DatabaseConnectionError(e.to_string()))?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Share an existing connection (same PRAGMAs assumed).
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }
}

#[async_trait]
impl SalesImportRepository for SalesImportRepositoryImpl {
    // ===== Locations =====

    async fn find_location(&self, location_id: &str) -> RepositoryResult<Option<StoredLocation>> {
        let conn = self.get_conn()?;
        let location = conn
            .query_row(
                "SELECT id, name, vendor, created_at, updated_at FROM locations WHERE id = ?1",
                params![location_id],
                map_location,
            )
            .optional()?;
        Ok(location)
    }

    async fn insert_location(&self, location: &CanonicalLocation) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let now = Utc::now().to_rfc3339();
        conn.execute(
            r#"
            INSERT INTO locations (id, name, vendor, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?4)
            "#,
            params![location.id, location.display_name, location.vendor_label, now],
        )?;
        Ok(())
    }

    async fn update_location_vendor(
        &self,
        location_id: &str,
        vendor: &str,
    ) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let affected = conn.execute(
            "UPDATE locations SET vendor = ?2, updated_at = ?3 WHERE id = ?1",
            params![location_id, vendor, Utc::now().to_rfc3339()],
        )?;

        if affected == 0 {
            return Err(RepositoryError::NotFound {
                entity: "location".to_string(),
                id: location_id.to_string(),
            });
        }
        Ok(())
    }

    // ===== Products =====

    async fn find_product_by_scancode(
        &self,
        scancode: &str,
    ) -> RepositoryResult<Option<StoredProduct>> {
        let conn = self.get_conn()?;
        let product = conn
            .query_row(
                r#"
                SELECT id, name, scancode, upc, created_at, updated_at
                FROM products WHERE scancode = ?1
                "#,
                params![scancode],
                map_product,
            )
            .optional()?;
        Ok(product)
    }

    async fn insert_product(&self, product: &CanonicalProduct) -> RepositoryResult<String> {
        let conn = self.get_conn()?;
        let id = Uuid::new_v4().to_string();
        let now = Utc::now().to_rfc3339();
        conn.execute(
            r#"
            INSERT INTO products (id, name, scancode, upc, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?5)
            "#,
            params![id, product.display_name, product.scancode, product.upc, now],
        )?;
        Ok(id)
    }

    // ===== Sales =====

    async fn sale_exists(&self, content_hash: &str) -> RepositoryResult<bool> {
        let conn = self.get_conn()?;
        let found = conn
            .query_row(
                "SELECT 1 FROM sales WHERE raw_csv_hash = ?1 LIMIT 1",
                params![content_hash],
                |_row| Ok(true),
            )
            .optional()?
            .unwrap_or(false);
        Ok(found)
    }

    async fn insert_sale(&self, sale: &CanonicalSale) -> RepositoryResult<String> {
        let conn = self.get_conn()?;
        let id = Uuid::new_v4().to_string();
        conn.execute(
            r#"
            INSERT INTO sales (
                id, location_id, product_id, quantity_sold, sale_date,
                price, total, source, raw_csv_hash, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
            params![
                id,
                sale.location_id,
                sale.product_id,
                sale.quantity_sold,
                sale.sale_timestamp.to_rfc3339(),
                sale.unit_price,
                sale.total_amount,
                sale.source_label,
                sale.content_hash,
                Utc::now().to_rfc3339(),
            ],
        )?;
        Ok(id)
    }

    async fn count_sales(&self) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        let count = conn.query_row("SELECT COUNT(*) FROM sales", [], |row| row.get(0))?;
        Ok(count)
    }

    async fn list_recent_sales(
        &self,
        location_id: &str,
        limit: usize,
    ) -> RepositoryResult<Vec<StoredSale>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT id, location_id, product_id, quantity_sold, sale_date,
                   price, total, source, raw_csv_hash, created_at
            FROM sales
            WHERE location_id = ?1
            ORDER BY sale_date DESC, created_at DESC
            LIMIT ?2
            "#,
        )?;

        let sales = stmt
            .query_map(params![location_id, limit as i64], map_sale)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(sales)
    }

    // ===== Inventory =====

    async fn find_inventory(
        &self,
        location_id: &str,
        product_id: &str,
    ) -> RepositoryResult<Option<InventoryRecord>> {
        let conn = self.get_conn()?;
        let record = conn
            .query_row(
                r#"
                SELECT id, location_id, product_id, starting_quantity, current_quantity, last_updated
                FROM inventory
                WHERE location_id = ?1 AND product_id = ?2
                "#,
                params![location_id, product_id],
                map_inventory,
            )
            .optional()?;
        Ok(record)
    }

    async fn list_inventory_by_location(
        &self,
        location_id: &str,
    ) -> RepositoryResult<Vec<InventoryLine>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT i.product_id, p.name, i.starting_quantity, i.current_quantity, i.last_updated
            FROM inventory i
            LEFT JOIN products p ON p.scancode = i.product_id
            WHERE i.location_id = ?1
            ORDER BY i.product_id
            "#,
        )?;

        let lines = stmt
            .query_map(params![location_id], |row| {
                Ok(InventoryLine {
                    product_id: row.get(0)?,
                    product_name: row.get(1)?,
                    starting_quantity: row.get(2)?,
                    current_quantity: row.get(3)?,
                    last_updated: get_timestamp(row, 4)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(lines)
    }

    async fn list_locations_with_inventory(
        &self,
        low_stock_threshold: i64,
        unit_value: f64,
    ) -> RepositoryResult<Vec<LocationWithInventory>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT l.id, l.name, l.vendor, l.created_at, l.updated_at,
                   COUNT(i.id),
                   COALESCE(SUM(CASE WHEN i.current_quantity <= ?1 THEN 1 ELSE 0 END), 0),
                   COALESCE(SUM(i.current_quantity), 0)
            FROM locations l
            LEFT JOIN inventory i ON i.location_id = l.id
            GROUP BY l.id
            ORDER BY l.name
            "#,
        )?;

        let rows = stmt
            .query_map(params![low_stock_threshold], |row| {
                let location = map_location(row)?;
                let total_products: i64 = row.get(5)?;
                let low_stock_items: i64 = row.get(6)?;
                let units_on_hand: i64 = row.get(7)?;
                Ok(LocationWithInventory {
                    location,
                    inventory_summary: InventorySummary {
                        total_products,
                        low_stock_items,
                        total_value: units_on_hand as f64 * unit_value,
                    },
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    // ===== Import batches =====

    async fn insert_batch(&self, batch: &ImportBatch) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO import_batch (
                batch_id, file_name, vendor, total_rows, processed_rows,
                new_locations, new_products, conflicts_resolved, inventory_updates,
                error_count, imported_at, elapsed_ms
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
            "#,
            params![
                batch.batch_id,
                batch.file_name,
                batch.vendor.tag(),
                batch.total_rows,
                batch.processed_rows,
                batch.new_locations,
                batch.new_products,
                batch.conflicts_resolved,
                batch.inventory_updates,
                batch.error_count,
                batch.imported_at.to_rfc3339(),
                batch.elapsed_ms,
            ],
        )?;
        Ok(())
    }

    async fn get_batch(&self, batch_id: &str) -> RepositoryResult<Option<ImportBatch>> {
        let conn = self.get_conn()?;
        let batch = conn
            .query_row(
                r#"
                SELECT batch_id, file_name, vendor, total_rows, processed_rows,
                       new_locations, new_products, conflicts_resolved, inventory_updates,
                       error_count, imported_at, elapsed_ms
                FROM import_batch WHERE batch_id = ?1
                "#,
                params![batch_id],
                map_batch,
            )
            .optional()?;
        Ok(batch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_schema;
    use chrono::TimeZone;

    fn repo() -> SalesImportRepositoryImpl {
        let conn = Connection::open_in_memory().unwrap();
        crate::db::configure_sqlite_connection(&conn).unwrap();
        init_schema(&conn).unwrap();
        SalesImportRepositoryImpl::from_connection(Arc::new(Mutex::new(conn)))
    }

    fn location(id: &str) -> CanonicalLocation {
        CanonicalLocation {
            id: id.to_string(),
            display_name: format!("Location {id}"),
            vendor_label: "iOS Vending Systems".to_string(),
        }
    }

    fn product(code: &str, name: &str) -> CanonicalProduct {
        CanonicalProduct {
            scancode: code.to_string(),
            display_name: name.to_string(),
            upc: code.to_string(),
        }
    }

    fn sale(location: &str, product: &str, quantity: i64, hash: &str) -> CanonicalSale {
        CanonicalSale {
            location_id: location.to_string(),
            product_id: product.to_string(),
            quantity_sold: quantity,
            sale_timestamp: Utc.with_ymd_and_hms(2024, 1, 15, 0, 0, 0).unwrap(),
            unit_price: 2.5,
            total_amount: 2.5 * quantity as f64,
            source_label: "iOS Vending Systems".to_string(),
            content_hash: hash.to_string(),
        }
    }

    #[tokio::test]
    async fn test_location_insert_find_and_update() {
        let repo = repo();
        assert!(repo.find_location("LOC001").await.unwrap().is_none());

        repo.insert_location(&location("LOC001")).await.unwrap();
        let stored = repo.find_location("LOC001").await.unwrap().unwrap();
        assert_eq!(stored.name, "Location LOC001");
        assert_eq!(stored.vendor, "iOS Vending Systems");

        repo.update_location_vendor("LOC001", "iOS Vending Systems, Cantaloupe Systems")
            .await
            .unwrap();
        let stored = repo.find_location("LOC001").await.unwrap().unwrap();
        assert_eq!(stored.vendor, "iOS Vending Systems, Cantaloupe Systems");
    }

    #[tokio::test]
    async fn test_update_missing_location_is_not_found() {
        let repo = repo();
        let result = repo.update_location_vendor("NOPE", "x").await;
        assert!(matches!(result, Err(RepositoryError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_product_scancode_is_unique() {
        let repo = repo();
        let id = repo.insert_product(&product("CC001", "Coca Cola")).await.unwrap();
        let stored = repo.find_product_by_scancode("CC001").await.unwrap().unwrap();
        assert_eq!(stored.id, id);
        assert_eq!(stored.upc, "CC001");

        let dup = repo.insert_product(&product("CC001", "Coke")).await;
        assert!(matches!(dup, Err(RepositoryError::UniqueConstraintViolation(_))));
    }

    #[tokio::test]
    async fn test_sale_insert_fires_inventory_trigger() {
        let repo = repo();
        repo.insert_location(&location("LOC001")).await.unwrap();
        repo.insert_product(&product("CC001", "Coca Cola")).await.unwrap();

        repo.insert_sale(&sale("LOC001", "CC001", 3, "h1")).await.unwrap();
        repo.insert_sale(&sale("LOC001", "CC001", 2, "h2")).await.unwrap();

        assert!(repo.sale_exists("h1").await.unwrap());
        assert!(!repo.sale_exists("h3").await.unwrap());
        assert_eq!(repo.count_sales().await.unwrap(), 2);

        let inventory = repo.find_inventory("LOC001", "CC001").await.unwrap().unwrap();
        assert_eq!(inventory.starting_quantity, 50);
        assert_eq!(inventory.current_quantity, 48);
    }

    #[tokio::test]
    async fn test_sale_requires_known_location() {
        let repo = repo();
        repo.insert_product(&product("CC001", "Coca Cola")).await.unwrap();
        let result = repo.insert_sale(&sale("GHOST", "CC001", 1, "h1")).await;
        assert!(matches!(result, Err(RepositoryError::ForeignKeyViolation(_))));
    }

    #[tokio::test]
    async fn test_batch_round_trip() {
        let repo = repo();
        let batch = ImportBatch {
            batch_id: "b-1".to_string(),
            file_name: Some("sales.csv".to_string()),
            vendor: VendorSchema::Cantaloupe,
            total_rows: 4,
            processed_rows: 3,
            new_locations: 1,
            new_products: 2,
            conflicts_resolved: 0,
            inventory_updates: 3,
            error_count: 1,
            imported_at: Utc.with_ymd_and_hms(2024, 2, 1, 9, 30, 0).unwrap(),
            elapsed_ms: 12,
        };

        repo.insert_batch(&batch).await.unwrap();
        assert_eq!(repo.get_batch("b-1").await.unwrap(), Some(batch));
        assert!(repo.get_batch("b-2").await.unwrap().is_none());
    }
}
