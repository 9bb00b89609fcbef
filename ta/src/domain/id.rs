//! Record ID normalization
//!
//! Every record ID is a UUIDv7 in canonical hyphenated lowercase form:
//! `0190b1a4-6f3e-7c21-9a4d-2b5e8f0c1d3a`. Input from the outside world may also
//! arrive as bare hex or in uppercase; it is normalized here before lookup.

use uuid::Uuid;

/// Normalize an externally supplied ID
///
/// Returns `None` when the input is not a UUID at all, which callers treat the
/// same as a record that does not exist.
pub fn canonical_id(raw: &str) -> Option<String> {
    Uuid::try_parse(raw.trim())
        .ok()
        .map(|uuid| uuid.hyphenated().to_string())
}
