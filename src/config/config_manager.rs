// ==========================================
// Vending Sales Ingest - config manager
// ==========================================
// Storage: config_kv table (scope_id + key -> value)
// Missing or unparsable values fall back to the documented defaults.
// ==========================================

use crate::config::ingest_config_trait::IngestConfigReader;
use crate::db::open_sqlite_connection;
use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};
use serde_json::json;
use std::collections::BTreeMap;
use std::error::Error;
use std::sync::{Arc, Mutex};
use tracing::warn;

type ConfigResult<T> = Result<T, Box<dyn Error + Send + Sync>>;

const GLOBAL_SCOPE: &str = "global";

// ==========================================
// ConfigManager
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// Open a ConfigManager on its own connection.
    pub fn new(db_path: &str) -> ConfigResult<Self> {
        let conn = open_sqlite_connection(db_path)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Share an existing connection; PRAGMAs are re-applied (idempotent).
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> ConfigResult<Self> {
        {
            let conn_guard = conn.lock().map_err(|e| format!("lock failed: {}", e))?;
            crate::db::configure_sqlite_connection(&conn_guard)?;
        }

        Ok(Self { conn })
    }

    /// Global-scope value for `key`, None when unset.
    pub fn get_config_value(&self, key: &str) -> ConfigResult<Option<String>> {
        let conn = self.conn.lock().map_err(|e| format!("lock failed: {}", e))?;

        let value = conn
            .query_row(
                "SELECT value FROM config_kv WHERE scope_id = ?1 AND key = ?2",
                params![GLOBAL_SCOPE, key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    /// Upsert a global-scope value.
    pub fn set_config_value(&self, key: &str, value: &str) -> ConfigResult<()> {
        let conn = self.conn.lock().map_err(|e| format!("lock failed: {}", e))?;
        conn.execute(
            r#"
            INSERT INTO config_kv (scope_id, key, value, updated_at)
            VALUES (?1, ?2, ?3, datetime('now'))
            ON CONFLICT(scope_id, key) DO UPDATE SET value = ?3, updated_at = datetime('now')
            "#,
            params![GLOBAL_SCOPE, key, value],
        )?;
        Ok(())
    }

    fn get_config_or_default(&self, key: &str, default: &str) -> ConfigResult<String> {
        Ok(self
            .get_config_value(key)?
            .unwrap_or_else(|| default.to_string()))
    }

    /// Parse a stored value, warning and falling back on bad input.
    fn get_parsed_or_default<T>(&self, key: &str, default: T) -> ConfigResult<T>
    where
        T: std::str::FromStr + Copy,
    {
        match self.get_config_value(key)? {
            Some(raw) => match raw.trim().parse::<T>() {
                Ok(v) => Ok(v),
                Err(_) => {
                    warn!(
                        config_key = key,
                        raw_value = %raw,
                        "config value unparsable, using default"
                    );
                    Ok(default)
                }
            },
            None => Ok(default),
        }
    }

    /// JSON snapshot of all global-scope settings, sorted by key.
    pub fn get_config_snapshot(&self) -> ConfigResult<String> {
        let conn = self.conn.lock().map_err(|e| format!("lock failed: {}", e))?;

        let mut stmt =
            conn.prepare("SELECT key, value FROM config_kv WHERE scope_id = ?1 ORDER BY key")?;
        let rows = stmt.query_map(params![GLOBAL_SCOPE], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut config_map: BTreeMap<String, String> = BTreeMap::new();
        for row in rows {
            let (key, value) = row?;
            config_map.insert(key, value);
        }

        Ok(serde_json::to_string(&json!(config_map))?)
    }
}

// ==========================================
// IngestConfigReader impl
// ==========================================
#[async_trait]
impl IngestConfigReader for ConfigManager {
    async fn get_upload_max_bytes(&self) -> ConfigResult<usize> {
        self.get_parsed_or_default(config_keys::UPLOAD_MAX_BYTES, defaults::UPLOAD_MAX_BYTES)
    }

    async fn get_location_label_separator(&self) -> ConfigResult<String> {
        // Whitespace is significant here, so no trim
        let value = self.get_config_or_default(
            config_keys::LOCATION_LABEL_SEPARATOR,
            defaults::LOCATION_LABEL_SEPARATOR,
        )?;
        if value.is_empty() {
            Ok(defaults::LOCATION_LABEL_SEPARATOR.to_string())
        } else {
            Ok(value)
        }
    }

    async fn get_low_stock_threshold(&self) -> ConfigResult<i64> {
        self.get_parsed_or_default(config_keys::LOW_STOCK_THRESHOLD, defaults::LOW_STOCK_THRESHOLD)
    }

    async fn get_assumed_unit_value(&self) -> ConfigResult<f64> {
        let value = self.get_parsed_or_default(
            config_keys::ASSUMED_UNIT_VALUE,
            defaults::ASSUMED_UNIT_VALUE,
        )?;
        if value.is_finite() && value >= 0.0 {
            Ok(value)
        } else {
            Ok(defaults::ASSUMED_UNIT_VALUE)
        }
    }
}

// ==========================================
// Config keys
// ==========================================
pub mod config_keys {
    // Upload
    pub const UPLOAD_MAX_BYTES: &str = "upload_max_bytes";

    // Persistence pass
    pub const LOCATION_LABEL_SEPARATOR: &str = "location_label_separator";

    // Inventory summary
    pub const LOW_STOCK_THRESHOLD: &str = "low_stock_threshold";
    pub const ASSUMED_UNIT_VALUE: &str = "assumed_unit_value";
}

pub mod defaults {
    pub const UPLOAD_MAX_BYTES: usize = 10 * 1024 * 1024;
    pub const LOCATION_LABEL_SEPARATOR: &str = ", ";
    pub const LOW_STOCK_THRESHOLD: i64 = 5;
    pub const ASSUMED_UNIT_VALUE: f64 = 2.5;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_schema;

    fn manager() -> ConfigManager {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();
        ConfigManager::from_connection(Arc::new(Mutex::new(conn))).unwrap()
    }

    #[tokio::test]
    async fn test_defaults_when_unset() {
        let config = manager();
        assert_eq!(config.get_upload_max_bytes().await.unwrap(), 10_485_760);
        assert_eq!(config.get_location_label_separator().await.unwrap(), ", ");
        assert_eq!(config.get_low_stock_threshold().await.unwrap(), 5);
        assert_eq!(config.get_assumed_unit_value().await.unwrap(), 2.5);
    }

    #[tokio::test]
    async fn test_overrides_are_read() {
        let config = manager();
        config.set_config_value(config_keys::UPLOAD_MAX_BYTES, "1024").unwrap();
        config.set_config_value(config_keys::LOCATION_LABEL_SEPARATOR, " | ").unwrap();
        config.set_config_value(config_keys::LOW_STOCK_THRESHOLD, "2").unwrap();

        assert_eq!(config.get_upload_max_bytes().await.unwrap(), 1024);
        assert_eq!(config.get_location_label_separator().await.unwrap(), " | ");
        assert_eq!(config.get_low_stock_threshold().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_unparsable_values_fall_back() {
        let config = manager();
        config.set_config_value(config_keys::LOW_STOCK_THRESHOLD, "many").unwrap();
        config.set_config_value(config_keys::ASSUMED_UNIT_VALUE, "-3").unwrap();

        assert_eq!(config.get_low_stock_threshold().await.unwrap(), 5);
        assert_eq!(config.get_assumed_unit_value().await.unwrap(), 2.5);
    }

    #[test]
    fn test_snapshot_is_sorted_json() {
        let config = manager();
        config.set_config_value("b_key", "2").unwrap();
        config.set_config_value("a_key", "1").unwrap();
        config.set_config_value("a_key", "3").unwrap();

        assert_eq!(config.get_config_snapshot().unwrap(), r#"{"a_key":"3","b_key":"2"}"#);
    }
}
