// ==========================================
// Config tests
// ==========================================
// ConfigManager on a file-backed database, values seeded through
// a separate connection.
// ==========================================


use vending_sales::config::{config_keys, defaults, ConfigManager, IngestConfigReader};
use test_helpers::{create_test_db, set_config};

#[tokio::test]
async fn test_fresh_database_uses_defaults() {
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    let config = ConfigManager::new(&db_path).expect("config manager");

    assert_eq!(config.get_upload_max_bytes().await.unwrap(), defaults::UPLOAD_MAX_BYTES);
    assert_eq!(
        config.get_location_label_separator().await.unwrap(),
        defaults::LOCATION_LABEL_SEPARATOR
    );
    assert_eq!(
        config.get_low_stock_threshold().await.unwrap(),
        defaults::LOW_STOCK_THRESHOLD
    );
    assert_eq!(config.get_config_snapshot().unwrap(), "{}");
}

#[tokio::test]
async fn test_values_written_elsewhere_are_visible() {
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    set_config(&db_path, config_keys::UPLOAD_MAX_BYTES, "2048").unwrap();
    set_config(&db_path, config_keys::ASSUMED_UNIT_VALUE, "1.75").unwrap();

    let config = ConfigManager::new(&db_path).expect("config manager");
    assert_eq!(config.get_upload_max_bytes().await.unwrap(), 2048);
    assert_eq!(config.get_assumed_unit_value().await.unwrap(), 1.75);
}

#[tokio::test]
async fn test_set_config_value_overwrites() {
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    let config = ConfigManager::new(&db_path).expect("config manager");

    config
        .set_config_value(config_keys::LOCATION_LABEL_SEPARATOR, " + ")
        .unwrap();
    config
        .set_config_value(config_keys::LOCATION_LABEL_SEPARATOR, "; ")
        .unwrap();

    assert_eq!(config.get_location_label_separator().await.unwrap(), "; ");
    assert_eq!(
        config.get_config_value(config_keys::LOCATION_LABEL_SEPARATOR).unwrap(),
        Some("; ".to_string())
    );
}

#[tokio::test]
async fn test_empty_separator_falls_back() {
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    set_config(&db_path, config_keys::LOCATION_LABEL_SEPARATOR, "").unwrap();

    let config = ConfigManager::new(&db_path).expect("config manager");
    assert_eq!(config.get_location_label_separator().await.unwrap(), ", ");
}
