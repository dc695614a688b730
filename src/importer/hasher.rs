// ==========================================
// Vending Sales Ingest - content fingerprint
// ==========================================
// MD5 hex digest: duplicate-row signal only, no adversary in scope.
// ==========================================

/// Deterministic 32-char lowercase hex digest of `content`.
pub fn fingerprint(content: &str) -> String {
    format!("{:x}", md5::compute(content.as_bytes()))
}

/// Sale identity key: location, product code, raw date and raw total.
///
/// Other columns (product name, price) do not take part, so two rows that
/// agree on these four values collapse to the same hash.
pub fn sale_fingerprint(
    location_id: &str,
    product_code: &str,
    raw_date: &str,
    raw_total: &str,
) -> String {
    fingerprint(&format!(
        "{}-{}-{}-{}",
        location_id, product_code, raw_date, raw_total
    ))
}
