// ==========================================
// Vending Sales Ingest - field mapper
// ==========================================
// Raw column name -> typed vendor row, driven by the schema's
// VendorColumns table. Missing required columns are rejected.
// ==========================================

use crate::domain::types::VendorSchema;
use crate::domain::vending::{RawRow, VendorARow, VendorBRow, VendorRow};
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::sales_importer_trait::FieldMapper as FieldMapperTrait;

pub struct FieldMapper;

impl FieldMapperTrait for FieldMapper {
    fn validate_headers(&self, schema: VendorSchema, headers: &[String]) -> ImportResult<()> {
        for column in schema.columns().required() {
            if !headers.iter().any(|h| h.eq_ignore_ascii_case(column)) {
                return Err(missing_column(schema, column));
            }
        }
        Ok(())
    }

    fn map_row(&self, schema: VendorSchema, row: &RawRow) -> ImportResult<VendorRow> {
        let columns = schema.columns();

        let row = match schema {
            VendorSchema::IosVending => VendorRow::IosVending(VendorARow {
                location_id: self.get_required(schema, row, columns.location_id)?,
                product_name: self.get_required(schema, row, columns.product_name)?,
                scancode: self.get_required(schema, row, columns.product_code)?,
                trans_date: self.get_required(schema, row, columns.sale_date)?,
                price: self.get_required(schema, row, columns.unit_price)?,
                total_amount: self.get_required(schema, row, columns.total_amount)?,
                row_number: row.row_number,
            }),
            VendorSchema::Cantaloupe => VendorRow::Cantaloupe(VendorBRow {
                site_code: self.get_required(schema, row, columns.location_id)?,
                item_description: self.get_required(schema, row, columns.product_name)?,
                upc: self.get_required(schema, row, columns.product_code)?,
                sale_date: self.get_required(schema, row, columns.sale_date)?,
                unit_price: self.get_required(schema, row, columns.unit_price)?,
                final_total: self.get_required(schema, row, columns.total_amount)?,
                row_number: row.row_number,
            }),
        };

        Ok(row)
    }
}

impl FieldMapper {
    /// Present-but-empty values are kept as empty strings.
    fn get_required(
        &self,
        schema: VendorSchema,
        row: &RawRow,
        column: &str,
    ) -> ImportResult<String> {
        row.get(column)
            .map(|v| v.trim().to_string())
            .ok_or_else(|| missing_column(schema, column))
    }
}

fn missing_column(schema: VendorSchema, column: &str) -> ImportError {
    ImportError::MissingColumn {
        vendor: schema.label().to_string(),
        column: column.to_string(),
    }
}
