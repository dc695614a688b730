// ==========================================
// Vending Sales Ingest - field derivation service
// ==========================================
// Lenient decimals, quantity from total / price, sale date parsing,
// and the legacy inventory fold.
// ==========================================

use crate::domain::vending::{CanonicalSale, InventoryLevel};
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::sales_importer_trait::DerivationService as DerivationServiceTrait;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use std::collections::HashMap;

/// Assumed starting stock per unit sold, used by `derive_inventory`.
pub const STARTING_STOCK_MULTIPLIER: i64 = 10;

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
    // 12-hour US exports
    "%m/%d/%Y %I:%M:%S %p",
    "%m/%d/%Y %I:%M %p",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y", "%Y/%m/%d", "%b %d, %Y"];

pub struct DerivationService;

impl DerivationServiceTrait for DerivationService {
    /// Parses the longest numeric prefix, like a browser `parseFloat`.
    /// Empty or non-numeric input yields 0.
    fn parse_decimal(&self, value: &str) -> f64 {
        numeric_prefix(value.trim())
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .unwrap_or(0.0)
    }

    fn derive_quantity(&self, price: f64, total: f64) -> i64 {
        if price > 0.0 {
            (total / price).round().max(0.0) as i64
        } else {
            // free or zero-priced vend
            1
        }
    }

    /// Offset-less values are taken as UTC.
    fn parse_sale_date(
        &self,
        value: &str,
        row_number: usize,
        field: &str,
    ) -> ImportResult<DateTime<Utc>> {
        let trimmed = value.trim();

        if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
            return Ok(dt.with_timezone(&Utc));
        }

        for format in DATETIME_FORMATS {
            if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, format) {
                return Ok(naive.and_utc());
            }
        }

        for format in DATE_FORMATS {
            if let Ok(date) = NaiveDate::parse_from_str(trimmed, format) {
                if let Some(naive) = date.and_hms_opt(0, 0, 0) {
                    return Ok(naive.and_utc());
                }
            }
        }

        Err(ImportError::InvalidDate {
            row: row_number,
            field: field.to_string(),
            value: value.to_string(),
        })
    }

    /// Legacy arithmetic, kept as is:
    /// - starting += quantity * 10 on every sale for the pair
    /// - current = max(0, starting - this sale's quantity), overwritten each time
    fn derive_inventory(
        &self,
        sales: &[CanonicalSale],
    ) -> HashMap<(String, String), InventoryLevel> {
        let mut inventory: HashMap<(String, String), InventoryLevel> = HashMap::new();

        for sale in sales {
            let key = (sale.location_id.clone(), sale.product_id.clone());
            let level = inventory.entry(key).or_default();

            level.starting = level
                .starting
                .saturating_add(sale.quantity_sold.saturating_mul(STARTING_STOCK_MULTIPLIER));
            level.current = (level.starting - sale.quantity_sold).max(0);
        }

        inventory
    }
}

/// `[+-]? digits [. digits] [e [+-] digits]`, longest match from the start.
fn numeric_prefix(s: &str) -> &str {
    let bytes = s.as_bytes();
    let mut i = 0;

    if i < bytes.len() && (bytes[i] == b'+' || bytes[i] == b'-') {
        i += 1;
    }

    let mut digits = 0;
    while i < bytes.len() && bytes[i].is_ascii_digit() {
        i += 1;
        digits += 1;
    }
    if i < bytes.len() && bytes[i] == b'.' {
        i += 1;
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
            digits += 1;
        }
    }
    if digits == 0 {
        return "";
    }

    let mut end = i;
    if i < bytes.len() && (bytes[i] == b'e' || bytes[i] == b'E') {
        let mut j = i + 1;
        if j < bytes.len() && (bytes[j] == b'+' || bytes[j] == b'-') {
            j += 1;
        }
        let exp_start = j;
        while j < bytes.len() && bytes[j].is_ascii_digit() {
            j += 1;
        }
        if j > exp_start {
            end = j;
        }
    }

    &s[..end]
}
