// ==========================================
// Vending Sales Ingest - vendor format detector
// ==========================================
// Looks at the first line only: lowercase, then substring test for
// both marker tokens of each schema. Vendor A is tried first.
// ==========================================

use crate::domain::types::VendorSchema;
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::sales_importer_trait::FormatDetector as FormatDetectorTrait;

pub struct FormatDetector;

impl FormatDetectorTrait for FormatDetector {
    fn detect(&self, content: &str) -> ImportResult<VendorSchema> {
        let first_line = content.split('\n').next().unwrap_or("");
        let header = first_line.to_lowercase();

        VendorSchema::ALL
            .into_iter()
            .find(|schema| {
                schema
                    .profile()
                    .markers
                    .iter()
                    .all(|marker| header.contains(marker))
            })
            .ok_or_else(|| ImportError::UnrecognizedFormat {
                header: first_line.trim_end_matches('\r').to_string(),
            })
    }
}
