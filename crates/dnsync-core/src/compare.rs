//! Record comparison
//!
//! Decides whether a desired record and an observed record are the same for
//! reconciliation purposes. Providers round TTLs and append a trailing dot to
//! FQDN values, so exact equality would cause update storms.

use crate::record::CanonicalRecord;

/// TTLs closer than this (exclusive) are considered equal
pub const TTL_TOLERANCE_SECS: i64 = 120;

/// Strip a single trailing `.` from a value
pub fn trim_trailing_dot(value: &str) -> &str {
    value.strip_suffix('.').unwrap_or(value)
}

/// Whether two TTLs fall within the tolerance band of each other
pub fn ttl_within_tolerance(a: u32, b: u32) -> bool {
    let (a, b) = (i64::from(a), i64::from(b));
    a - TTL_TOLERANCE_SECS < b && a + TTL_TOLERANCE_SECS > b
}

/// Semantic equality of two canonical records.
///
/// Only the first value of each record is compared; multi-value records
/// are not supported.
pub fn equal(a: &CanonicalRecord, b: &CanonicalRecord) -> bool {
    trim_trailing_dot(a.first_value()) == trim_trailing_dot(b.first_value())
        && a.name.eq_ignore_ascii_case(&b.name)
        && a.record_type.eq_ignore_ascii_case(&b.record_type)
        && ttl_within_tolerance(a.ttl, b.ttl)
}
