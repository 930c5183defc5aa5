//! Cleaning of currency cells scraped from salary tables.

/// Strip currency symbols and thousands separators, then trim.
///
/// Pure and idempotent: `clean_amount(clean_amount(x)) == clean_amount(x)`.
pub fn clean_amount(raw: &str) -> String {
    raw.chars()
        .filter(|c| *c != '$' && *c != ',')
        .collect::<String>()
        .trim()
        .to_string()
}

/// Clean a cell and map an empty result to an explicit absence.
pub fn amount_field(raw: &str) -> Option<String> {
    let cleaned = clean_amount(raw);
    if cleaned.is_empty() {
        None
    } else {
        Some(cleaned)
    }
}
