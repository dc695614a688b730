// ==========================================
// Vending Sales Ingest - domain types
// ==========================================
// Vendor schemas are a closed enumeration; each variant carries its
// detection markers, column mapping table and naming rules as data.
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// VendorColumns - column name mapping table
// ==========================================
// Maps the vendor's raw column names onto the six canonical row fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VendorColumns {
    pub location_id: &'static str,  // location / site identifier
    pub product_name: &'static str, // product display name
    pub product_code: &'static str, // scancode (A) or UPC (B)
    pub sale_date: &'static str,    // raw transaction date
    pub unit_price: &'static str,   // unit price
    pub total_amount: &'static str, // transaction total
}

impl VendorColumns {
    /// Every column a file of this vendor must declare in its header.
    pub fn required(&self) -> [&'static str; 6] {
        [
            self.location_id,
            self.product_name,
            self.product_code,
            self.sale_date,
            self.unit_price,
            self.total_amount,
        ]
    }
}

// ==========================================
// VendorProfile - per-vendor static data
// ==========================================
#[derive(Debug, Clone, Copy)]
pub struct VendorProfile {
    /// Short tag reported back to the uploader
    pub tag: &'static str,
    /// Label written to locations.vendor and sales.source
    pub label: &'static str,
    /// Lowercase header tokens that must all be present for detection
    pub markers: [&'static str; 2],
    /// Prefix of the synthesized location display name
    pub location_prefix: &'static str,
    /// Prefix used by `normalize_location_name`
    pub branded_location_prefix: &'static str,
    pub columns: VendorColumns,
}

const IOS_VENDING_PROFILE: VendorProfile = VendorProfile {
    tag: "ios-vending",
    label: "iOS Vending Systems",
    markers: ["location_id", "product_name"],
    location_prefix: "Location",
    branded_location_prefix: "iOS Location",
    columns: VendorColumns {
        location_id: "Location_ID",
        product_name: "Product_Name",
        product_code: "Scancode",
        sale_date: "Trans_Date",
        unit_price: "Price",
        total_amount: "Total_Amount",
    },
};

const CANTALOUPE_PROFILE: VendorProfile = VendorProfile {
    tag: "cantaloupe",
    label: "Cantaloupe Systems",
    markers: ["site_code", "item_description"],
    location_prefix: "Site",
    branded_location_prefix: "Cantaloupe Site",
    columns: VendorColumns {
        location_id: "Site_Code",
        product_name: "Item_Description",
        product_code: "UPC",
        sale_date: "Sale_Date",
        unit_price: "Unit_Price",
        total_amount: "Final_Total",
    },
};

// ==========================================
// VendorSchema - supported export formats
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum VendorSchema {
    /// Vendor A: iOS Vending Systems export
    IosVending,
    /// Vendor B: Cantaloupe Systems export
    Cantaloupe,
}

impl VendorSchema {
    /// Detection order: first match wins.
    pub const ALL: [VendorSchema; 2] = [VendorSchema::IosVending, VendorSchema::Cantaloupe];

    pub fn profile(&self) -> &'static VendorProfile {
        match self {
            VendorSchema::IosVending => &IOS_VENDING_PROFILE,
            VendorSchema::Cantaloupe => &CANTALOUPE_PROFILE,
        }
    }

    pub fn tag(&self) -> &'static str {
        self.profile().tag
    }

    pub fn label(&self) -> &'static str {
        self.profile().label
    }

    pub fn columns(&self) -> &'static VendorColumns {
        &self.profile().columns
    }

    /// Synthetic display name for a location first seen in an upload.
    pub fn location_display_name(&self, location_id: &str) -> String {
        format!("{} {}", self.profile().location_prefix, location_id)
    }

    /// Looks a schema up by its vendor label.
    pub fn from_label(label: &str) -> Option<VendorSchema> {
        VendorSchema::ALL
            .into_iter()
            .find(|schema| schema.label() == label)
    }

    pub fn from_tag(tag: &str) -> Option<VendorSchema> {
        VendorSchema::ALL.into_iter().find(|schema| schema.tag() == tag)
    }
}

impl fmt::Display for VendorSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.tag())
    }
}
