// ==========================================
// Vending Sales Ingest - conflict handler
// ==========================================
// Same location id under another vendor -> merge labels.
// Same scancode under another name -> flag only, stored name kept.
// Versioned records -> newer updated_at wins.
// ==========================================

use crate::domain::types::VendorSchema;
use crate::domain::vending::{
    CanonicalLocation, CanonicalProduct, StoredLocation, StoredProduct, Timestamped,
};
use crate::importer::sales_importer_trait::ConflictHandler as ConflictHandlerTrait;

/// Outcome of comparing an incoming location with the stored one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LocationDecision {
    Unchanged,
    /// Vendor label differs; carries the merged label to write back.
    MergeVendor { merged_vendor: String },
}

/// Outcome of comparing an incoming product with the stored one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProductDecision {
    Unchanged,
    NameConflict {
        existing_name: String,
        incoming_name: String,
    },
}

pub struct ConflictHandler;

impl ConflictHandlerTrait for ConflictHandler {
    fn classify_location(
        &self,
        existing: &StoredLocation,
        incoming: &CanonicalLocation,
        separator: &str,
    ) -> LocationDecision {
        // Whole-label comparison: a merged label differs from either vendor
        if existing.vendor == incoming.vendor_label {
            return LocationDecision::Unchanged;
        }

        LocationDecision::MergeVendor {
            merged_vendor: format!("{}{}{}", existing.vendor, separator, incoming.vendor_label),
        }
    }

    fn classify_product(
        &self,
        existing: &StoredProduct,
        incoming: &CanonicalProduct,
    ) -> ProductDecision {
        if existing.name == incoming.display_name {
            ProductDecision::Unchanged
        } else {
            ProductDecision::NameConflict {
                existing_name: existing.name.clone(),
                incoming_name: incoming.display_name.clone(),
            }
        }
    }
}

/// Pick between two versions of the same record.
///
/// `incoming` wins only when its `updated_at` is strictly later; ties keep
/// `existing`. No field-level merge.
pub fn resolve<T: Timestamped>(existing: T, incoming: T) -> T {
    if incoming.updated_at() > existing.updated_at() {
        incoming
    } else {
        existing
    }
}

/// Vendor-branded location name ("iOS Location X", "Cantaloupe Site X").
/// Unknown vendor labels fall back to "Location X".
pub fn normalize_location_name(location_id: &str, vendor_label: &str) -> String {
    match VendorSchema::from_label(vendor_label) {
        Some(schema) => format!("{} {}", schema.profile().branded_location_prefix, location_id),
        None => format!("Location {}", location_id),
    }
}
