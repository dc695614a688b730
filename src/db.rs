// ==========================================
// Vending Sales Ingest - SQLite connection and schema
// ==========================================
// Every Connection::open goes through here so PRAGMAs match.
// init_schema is idempotent (IF NOT EXISTS everywhere).
// ==========================================

use rusqlite::Connection;
use rusqlite::OptionalExtension;
use std::path::PathBuf;
use std::time::Duration;

/// Default busy_timeout (ms)
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// Schema version written by `init_schema`.
pub const CURRENT_SCHEMA_VERSION: i64 = 1;

/// Env var overriding the database location.
pub const DB_PATH_ENV: &str = "VENDING_SALES_DB_PATH";

const DB_FILE_NAME: &str = "vending_sales.db";

/// Per-connection PRAGMAs.
///
/// foreign_keys and busy_timeout do not persist in the file, so each
/// connection has to set them.
pub fn configure_sqlite_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS))?;
    Ok(())
}

/// Open a SQLite connection with the shared PRAGMAs applied.
pub fn open_sqlite_connection(db_path: &str) -> rusqlite::Result<Connection> {
    let conn = Connection::open(db_path)?;
    configure_sqlite_connection(&conn)?;
    Ok(conn)
}

/// Read schema_version (None when the table is missing).
pub fn read_schema_version(conn: &Connection) -> rusqlite::Result<Option<i64>> {
    let has_table: bool = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version' LIMIT 1",
            [],
            |_row| Ok(true),
        )
        .optional()?
        .unwrap_or(false);

    if !has_table {
        return Ok(None);
    }

    let v: Option<i64> =
        conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| row.get(0))?;
    Ok(v)
}

/// Create tables, indexes and the inventory trigger.
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(SCHEMA_SQL)?;
    conn.execute(
        "INSERT OR IGNORE INTO schema_version (version, applied_at) VALUES (?1, datetime('now'))",
        [CURRENT_SCHEMA_VERSION],
    )?;
    Ok(())
}

/// Resolve the database path: env var, then the user data dir, then cwd.
pub fn get_default_db_path() -> String {
    if let Ok(path) = std::env::var(DB_PATH_ENV) {
        if !path.trim().is_empty() {
            return path;
        }
    }

    match dirs::data_dir() {
        Some(dir) => {
            let app_dir = dir.join("vending-sales-ingest");
            if std::fs::create_dir_all(&app_dir).is_ok() {
                return app_dir.join(DB_FILE_NAME).to_string_lossy().to_string();
            }
            PathBuf::from(DB_FILE_NAME).to_string_lossy().to_string()
        }
        None => PathBuf::from(DB_FILE_NAME).to_string_lossy().to_string(),
    }
}

// starting += q * 10, current = MAX(0, new starting - q).
// The UPDATE's right-hand side sees the pre-update row.
const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS schema_version (
    version     INTEGER PRIMARY KEY,
    applied_at  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS config_kv (
    scope_id    TEXT NOT NULL DEFAULT 'global',
    key         TEXT NOT NULL,
    value       TEXT NOT NULL,
    updated_at  TEXT NOT NULL DEFAULT (datetime('now')),
    PRIMARY KEY (scope_id, key)
);

CREATE TABLE IF NOT EXISTS locations (
    id          TEXT PRIMARY KEY,
    name        TEXT NOT NULL,
    vendor      TEXT NOT NULL,
    created_at  TEXT NOT NULL,
    updated_at  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS products (
    id          TEXT PRIMARY KEY,
    name        TEXT NOT NULL,
    scancode    TEXT NOT NULL UNIQUE,
    upc         TEXT NOT NULL,
    created_at  TEXT NOT NULL,
    updated_at  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS inventory (
    id                  TEXT PRIMARY KEY,
    location_id         TEXT NOT NULL,
    product_id          TEXT NOT NULL,
    starting_quantity   INTEGER NOT NULL DEFAULT 0,
    current_quantity    INTEGER NOT NULL DEFAULT 0,
    last_updated        TEXT NOT NULL,
    UNIQUE (location_id, product_id)
);

CREATE TABLE IF NOT EXISTS sales (
    id              TEXT PRIMARY KEY,
    location_id     TEXT NOT NULL REFERENCES locations(id),
    product_id      TEXT NOT NULL REFERENCES products(scancode),
    quantity_sold   INTEGER NOT NULL,
    sale_date       TEXT NOT NULL,
    price           REAL NOT NULL,
    total           REAL NOT NULL,
    source          TEXT NOT NULL,
    raw_csv_hash    TEXT NOT NULL UNIQUE,
    created_at      TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_sales_location_date ON sales (location_id, sale_date);

CREATE TABLE IF NOT EXISTS import_batch (
    batch_id            TEXT PRIMARY KEY,
    file_name           TEXT,
    vendor              TEXT NOT NULL,
    total_rows          INTEGER NOT NULL,
    processed_rows      INTEGER NOT NULL,
    new_locations       INTEGER NOT NULL,
    new_products        INTEGER NOT NULL,
    conflicts_resolved  INTEGER NOT NULL,
    inventory_updates   INTEGER NOT NULL,
    error_count         INTEGER NOT NULL,
    imported_at         TEXT NOT NULL,
    elapsed_ms          INTEGER NOT NULL
);

CREATE TRIGGER IF NOT EXISTS trg_sales_inventory
AFTER INSERT ON sales
BEGIN
    INSERT OR IGNORE INTO inventory (
        id, location_id, product_id, starting_quantity, current_quantity, last_updated
    ) VALUES (
        lower(hex(randomblob(16))), NEW.location_id, NEW.product_id, 0, 0,
        strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
    );

    UPDATE inventory
    SET starting_quantity = starting_quantity + NEW.quantity_sold * 10,
        current_quantity  = MAX(0, starting_quantity + NEW.quantity_sold * 10 - NEW.quantity_sold),
        last_updated      = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
    WHERE location_id = NEW.location_id AND product_id = NEW.product_id;
END;
"#;
