//! # Invoice References
//!
//! Human-readable invoice references: `INV-<YYYYMM>-<seq>`.
//!
//! ```text
//! INV-202501-0007
//! │   │      └── per-period sequence, zero-padded to 4 digits
//! │   └──────── calendar period (year + month, UTC)
//! └──────────── fixed prefix
//! ```
//!
//! The sequence number itself comes from storage (one counter row per
//! period, bumped inside the invoice transaction). This module only decides
//! the period key and the text layout.

use chrono::{DateTime, Utc};

/// Fixed reference prefix.
pub const REFERENCE_PREFIX: &str = "INV";

/// Period key for the sequence counter, e.g. `202501`.
pub fn reference_period(at: DateTime<Utc>) -> String {
    at.format("%Y%m").to_string()
}

/// Formats a reference from a period key and a sequence number.
///
/// Sequences past 9999 widen instead of wrapping, so references stay unique.
///
/// ## Example
/// ```rust
/// use tally_core::reference::format_reference;
///
/// assert_eq!(format_reference("202501", 7), "INV-202501-0007");
/// assert_eq!(format_reference("202501", 12345), "INV-202501-12345");
/// ```
pub fn format_reference(period: &str, sequence: i64) -> String {
    format!("{}-{}-{:04}", REFERENCE_PREFIX, period, sequence)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_period_is_year_month() {
        let at = Utc.with_ymd_and_hms(2025, 3, 9, 23, 59, 0).unwrap();
        assert_eq!(reference_period(at), "202503");
    }

    #[test]
    fn test_format_pads_and_widens() {
        assert_eq!(format_reference("202503", 42), "INV-202503-0042");
        assert_eq!(format_reference("202503", 10000), "INV-202503-10000");
    }
}
