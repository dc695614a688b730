// ==========================================
// Vending Sales Ingest - vendor normalizer
// ==========================================
// One normalizer per vendor schema; the schema's profile supplies
// column names, location naming and the vendor label.
// Per row: hash -> location -> product -> price/total -> quantity -> date
// ==========================================

use crate::domain::types::VendorSchema;
use crate::domain::vending::{CanonicalLocation, CanonicalProduct, CanonicalSale, NormalizedBatch};
use crate::importer::derivation::DerivationService;
use crate::importer::error::ImportResult;
use crate::importer::field_mapper::FieldMapper;
use crate::importer::file_parser::CsvParser;
use crate::importer::hasher::sale_fingerprint;
use crate::importer::sales_importer_trait::{
    DerivationService as _, FieldMapper as _, FileParser as _, VendorNormalizer,
};
use std::collections::HashMap;
use tracing::debug;

// ==========================================
// FirstSeen - insertion-ordered map, insert-if-absent
// ==========================================
struct FirstSeen<T> {
    index: HashMap<String, usize>,
    items: Vec<T>,
}

impl<T> FirstSeen<T> {
    fn new() -> Self {
        Self {
            index: HashMap::new(),
            items: Vec::new(),
        }
    }

    /// Builds the record only for a key not seen before.
    fn insert_if_absent(&mut self, key: &str, build: impl FnOnce() -> T) {
        if !self.index.contains_key(key) {
            self.index.insert(key.to_string(), self.items.len());
            self.items.push(build());
        }
    }

    fn into_vec(self) -> Vec<T> {
        self.items
    }
}

// ==========================================
// SchemaNormalizer
// ==========================================
pub struct SchemaNormalizer {
    schema: VendorSchema,
    parser: CsvParser,
    mapper: FieldMapper,
    derivation: DerivationService,
}

impl SchemaNormalizer {
    pub fn new(schema: VendorSchema) -> Self {
        Self {
            schema,
            parser: CsvParser,
            mapper: FieldMapper,
            derivation: DerivationService,
        }
    }

    /// Vendor A normalizer
    pub fn ios_vending() -> Self {
        Self::new(VendorSchema::IosVending)
    }

    /// Vendor B normalizer
    pub fn cantaloupe() -> Self {
        Self::new(VendorSchema::Cantaloupe)
    }
}

impl VendorNormalizer for SchemaNormalizer {
    fn schema(&self) -> VendorSchema {
        self.schema
    }

    fn normalize(&self, content: &str) -> ImportResult<NormalizedBatch> {
        let schema = self.schema;
        let label = schema.label();
        let date_column = schema.columns().sale_date;

        let table = self.parser.parse_content(content)?;
        self.mapper.validate_headers(schema, &table.headers)?;

        let mut locations: FirstSeen<CanonicalLocation> = FirstSeen::new();
        let mut products: FirstSeen<CanonicalProduct> = FirstSeen::new();
        let mut sales = Vec::with_capacity(table.rows.len());

        for raw in &table.rows {
            let row = self.mapper.map_row(schema, raw)?;

            let content_hash = sale_fingerprint(
                row.location_key(),
                row.product_key(),
                row.raw_date(),
                row.raw_total(),
            );

            locations.insert_if_absent(row.location_key(), || CanonicalLocation {
                id: row.location_key().to_string(),
                display_name: schema.location_display_name(row.location_key()),
                vendor_label: label.to_string(),
            });

            // One product code per vendor, copied into both identity fields
            products.insert_if_absent(row.product_key(), || CanonicalProduct {
                scancode: row.product_key().to_string(),
                display_name: row.product_name().to_string(),
                upc: row.product_key().to_string(),
            });

            let unit_price = self.derivation.parse_decimal(row.raw_price());
            let total_amount = self.derivation.parse_decimal(row.raw_total());
            let quantity_sold = self.derivation.derive_quantity(unit_price, total_amount);

            let sale_timestamp = self.derivation.parse_sale_date(
                row.raw_date(),
                row.row_number(),
                date_column,
            )?;

            sales.push(CanonicalSale {
                location_id: row.location_key().to_string(),
                product_id: row.product_key().to_string(),
                quantity_sold,
                sale_timestamp,
                unit_price,
                total_amount,
                source_label: label.to_string(),
                content_hash,
            });
        }

        let batch = NormalizedBatch {
            vendor: schema,
            locations: locations.into_vec(),
            products: products.into_vec(),
            sales,
        };

        debug!(
            vendor = %schema,
            locations = batch.locations.len(),
            products = batch.products.len(),
            sales = batch.sales.len(),
            "normalization finished"
        );

        Ok(batch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::importer::error::ImportError;
    use crate::importer::hasher::fingerprint;
    use chrono::{TimeZone, Utc};

    const VENDOR_A_HEADER: &str = "Location_ID,Product_Name,Scancode,Trans_Date,Price,Total_Amount";
    const VENDOR_B_HEADER: &str = "Site_Code,Item_Description,UPC,Sale_Date,Unit_Price,Final_Total";

    #[test]
    fn test_normalize_vendor_a_single_row() {
        let normalizer = SchemaNormalizer::ios_vending();
        let content = format!("{VENDOR_A_HEADER}\nLOC001,Coca Cola,CC001,2024-01-15,2.50,5.00");

        let batch = normalizer.normalize(&content).unwrap();

        assert_eq!(batch.vendor, VendorSchema::IosVending);
        assert_eq!(
            batch.locations,
            vec![CanonicalLocation {
                id: "LOC001".to_string(),
                display_name: "Location LOC001".to_string(),
                vendor_label: "iOS Vending Systems".to_string(),
            }]
        );
        assert_eq!(
            batch.products,
            vec![CanonicalProduct {
                scancode: "CC001".to_string(),
                display_name: "Coca Cola".to_string(),
                upc: "CC001".to_string(),
            }]
        );

        let sale = &batch.sales[0];
        assert_eq!(sale.quantity_sold, 2);
        assert_eq!(sale.unit_price, 2.50);
        assert_eq!(sale.total_amount, 5.00);
        assert_eq!(sale.source_label, "iOS Vending Systems");
        assert_eq!(
            sale.sale_timestamp,
            Utc.with_ymd_and_hms(2024, 1, 15, 0, 0, 0).unwrap()
        );
        assert_eq!(
            sale.content_hash,
            fingerprint("LOC001-CC001-2024-01-15-5.00")
        );
    }

    #[test]
    fn test_normalize_vendor_b_single_row() {
        let normalizer = SchemaNormalizer::cantaloupe();
        let content = format!("{VENDOR_B_HEADER}\nSITE001,Pepsi Cola,123456789,2024-01-15,2.00,4.00");

        let batch = normalizer.normalize(&content).unwrap();

        assert_eq!(batch.vendor, VendorSchema::Cantaloupe);
        assert_eq!(batch.locations[0].display_name, "Site SITE001");
        assert_eq!(batch.locations[0].vendor_label, "Cantaloupe Systems");
        assert_eq!(batch.products[0].scancode, "123456789");
        assert_eq!(batch.products[0].upc, "123456789");
        assert_eq!(batch.sales[0].quantity_sold, 2);
        assert_eq!(batch.sales[0].product_id, "123456789");
    }

    #[test]
    fn test_normalize_keeps_first_seen_records() {
        let normalizer = SchemaNormalizer::ios_vending();
        let content = format!(
            "{VENDOR_A_HEADER}\n\
             LOC001,Coca Cola,CC001,2024-01-15,2.50,5.00\n\
             LOC002,Sprite,SP001,2024-01-15,2.00,2.00\n\
             LOC001,Coke Classic,CC001,2024-01-16,2.50,7.50"
        );

        let batch = normalizer.normalize(&content).unwrap();

        assert_eq!(batch.sales.len(), 3);
        let location_ids: Vec<_> = batch.locations.iter().map(|l| l.id.as_str()).collect();
        assert_eq!(location_ids, vec!["LOC001", "LOC002"]);
        let scancodes: Vec<_> = batch.products.iter().map(|p| p.scancode.as_str()).collect();
        assert_eq!(scancodes, vec!["CC001", "SP001"]);
        assert_eq!(batch.products[0].display_name, "Coca Cola");
        assert_eq!(batch.sales[2].quantity_sold, 3);
    }

    #[test]
    fn test_normalize_hash_ignores_product_name_and_price() {
        let normalizer = SchemaNormalizer::ios_vending();
        let content = format!(
            "{VENDOR_A_HEADER}\n\
             LOC001,Coca Cola,CC001,2024-01-15,2.50,5.00\n\
             LOC001,Coke,CC001,2024-01-15,1.25,5.00"
        );

        let batch = normalizer.normalize(&content).unwrap();
        assert_eq!(batch.sales[0].content_hash, batch.sales[1].content_hash);
        assert_ne!(batch.sales[0].quantity_sold, batch.sales[1].quantity_sold);
    }

    #[test]
    fn test_normalize_lenient_numbers() {
        let normalizer = SchemaNormalizer::cantaloupe();
        let content = format!("{VENDOR_B_HEADER}\nSITE001,Water,111,2024-01-15,free,abc");

        let batch = normalizer.normalize(&content).unwrap();
        assert_eq!(batch.sales[0].unit_price, 0.0);
        assert_eq!(batch.sales[0].total_amount, 0.0);
        assert_eq!(batch.sales[0].quantity_sold, 1);
    }

    #[test]
    fn test_normalize_invalid_date_fails_whole_file() {
        let normalizer = SchemaNormalizer::ios_vending();
        let content = format!(
            "{VENDOR_A_HEADER}\n\
             LOC001,Coca Cola,CC001,2024-01-15,2.50,5.00\n\
             LOC001,Coca Cola,CC001,someday,2.50,5.00"
        );

        match normalizer.normalize(&content) {
            Err(ImportError::InvalidDate { row, field, .. }) => {
                assert_eq!(row, 2);
                assert_eq!(field, "Trans_Date");
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_normalize_unterminated_quote_is_malformed() {
        let normalizer = SchemaNormalizer::ios_vending();
        let content = format!("{VENDOR_A_HEADER}\nLOC001,Coca Cola,CC001,2024-01-15,2.50,\"5.00\n");

        match normalizer.normalize(&content) {
            Err(ImportError::MalformedCsv(_)) => {}
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_normalize_twelve_hour_us_date() {
        let normalizer = SchemaNormalizer::ios_vending();
        let content =
            format!("{VENDOR_A_HEADER}\nLOC001,Coca Cola,CC001,1/15/2024 1:45 PM,2.50,5.00");

        let batch = normalizer.normalize(&content).unwrap();
        assert_eq!(
            batch.sales[0].sale_timestamp,
            Utc.with_ymd_and_hms(2024, 1, 15, 13, 45, 0).unwrap()
        );
    }

    #[test]
    fn test_normalize_missing_required_column() {
        let normalizer = SchemaNormalizer::ios_vending();
        let content = "Location_ID,Product_Name,Scancode,Trans_Date\nLOC001,Coca Cola,CC001,2024-01-15";
        assert!(matches!(
            normalizer.normalize(content),
            Err(ImportError::MissingColumn { .. })
        ));
    }

    #[test]
    fn test_normalize_header_only() {
        let normalizer = SchemaNormalizer::cantaloupe();
        let batch = normalizer.normalize(VENDOR_B_HEADER).unwrap();
        assert!(batch.sales.is_empty());
        assert!(batch.locations.is_empty());
        assert!(batch.products.is_empty());
    }
}
