//! # Date Ranges
//!
//! Inclusive `[start, end]` ranges over invoice dates, either bound optional.
//!
//! Request strings may be full RFC 3339 timestamps or plain `YYYY-MM-DD`
//! dates. A plain start date means the first instant of that day, a plain
//! end date the last instant of that day, so `2025-01-31` as an end bound
//! still covers invoices written on the 31st.

use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::validation::ValidationResult;

/// An inclusive date range. `None` on either side means open-ended.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

/// Which side of the range a string is parsed for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Bound {
    Start,
    End,
}

impl DateRange {
    /// Unbounded range ("all time").
    pub fn all() -> Self {
        DateRange::default()
    }

    pub fn new(start: Option<DateTime<Utc>>, end: Option<DateTime<Utc>>) -> Self {
        DateRange { start, end }
    }

    /// Covers one calendar day (UTC), first to last instant.
    pub fn for_day(day: NaiveDate) -> Self {
        DateRange {
            start: Some(start_of_day(day)),
            end: Some(end_of_day(day)),
        }
    }

    /// Parses optional `startDate` / `endDate` request values.
    ///
    /// Blank strings count as absent.
    ///
    /// ## Example
    /// ```rust
    /// use tally_core::DateRange;
    ///
    /// let range = DateRange::parse(Some("2025-01-01"), Some("2025-01-31")).unwrap();
    /// assert_eq!(range.start.unwrap().to_rfc3339(), "2025-01-01T00:00:00+00:00");
    /// assert!(DateRange::parse(Some("2025-02-01"), Some("2025-01-01")).is_err());
    /// ```
    pub fn parse(start: Option<&str>, end: Option<&str>) -> ValidationResult<Self> {
        let start = parse_bound(start, "startDate", Bound::Start)?;
        let end = parse_bound(end, "endDate", Bound::End)?;

        if let (Some(s), Some(e)) = (start, end) {
            if s > e {
                return Err(ValidationError::OutOfOrder {
                    first: "startDate".to_string(),
                    second: "endDate".to_string(),
                });
            }
        }

        Ok(DateRange { start, end })
    }

    pub fn start_date(&self) -> Option<NaiveDate> {
        self.start.map(|d| d.date_naive())
    }

    pub fn end_date(&self) -> Option<NaiveDate> {
        self.end.map(|d| d.date_naive())
    }

    pub fn is_unbounded(&self) -> bool {
        self.start.is_none() && self.end.is_none()
    }
}

/// First instant of `day` in UTC.
pub fn start_of_day(day: NaiveDate) -> DateTime<Utc> {
    Utc.from_utc_datetime(&day.and_time(NaiveTime::default()))
}

/// Last representable instant of `day` in UTC.
pub fn end_of_day(day: NaiveDate) -> DateTime<Utc> {
    // 23:59:59.999999999 always exists; the default is never taken
    let last = NaiveTime::from_hms_nano_opt(23, 59, 59, 999_999_999).unwrap_or_default();
    Utc.from_utc_datetime(&day.and_time(last))
}

fn parse_bound(
    raw: Option<&str>,
    field: &str,
    bound: Bound,
) -> ValidationResult<Option<DateTime<Utc>>> {
    let raw = match raw.map(str::trim) {
        Some(s) if !s.is_empty() => s,
        _ => return Ok(None),
    };

    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Ok(Some(ts.with_timezone(&Utc)));
    }

    let day = NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|_| {
        ValidationError::InvalidFormat {
            field: field.to_string(),
            reason: format!("expected YYYY-MM-DD or RFC 3339, got '{}'", raw),
        }
    })?;

    Ok(Some(match bound {
        Bound::Start => start_of_day(day),
        Bound::End => end_of_day(day),
    }))
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_plain_dates_cover_whole_days() {
        let range = DateRange::parse(Some("2025-01-01"), Some("2025-01-31")).unwrap();
        let late_on_last_day = Utc.with_ymd_and_hms(2025, 1, 31, 23, 30, 0).unwrap();
        let next_day = Utc.with_ymd_and_hms(2025, 2, 1, 0, 0, 0).unwrap();

        let end = range.end.unwrap();
        assert!(late_on_last_day <= end);
        assert!(next_day > end);
        assert_eq!(range.start_date(), Some(day(2025, 1, 1)));
        assert_eq!(range.end_date(), Some(day(2025, 1, 31)));
    }

    #[test]
    fn test_rfc3339_is_taken_verbatim() {
        let range = DateRange::parse(None, Some("2025-05-19T12:00:00+02:00")).unwrap();
        assert_eq!(
            range.end,
            Some(Utc.with_ymd_and_hms(2025, 5, 19, 10, 0, 0).unwrap())
        );
        assert!(range.start.is_none());
    }

    #[test]
    fn test_blank_is_absent() {
        let range = DateRange::parse(Some(""), Some("  ")).unwrap();
        assert!(range.is_unbounded());
    }

    #[test]
    fn test_rejects_garbage_and_reversed() {
        assert!(matches!(
            DateRange::parse(Some("yesterday"), None),
            Err(ValidationError::InvalidFormat { .. })
        ));
        assert!(matches!(
            DateRange::parse(Some("2025-02-01"), Some("2025-01-01")),
            Err(ValidationError::OutOfOrder { .. })
        ));
    }

    #[test]
    fn test_for_day() {
        let range = DateRange::for_day(day(2025, 1, 1));
        assert_eq!(range.start_date(), range.end_date());
        assert_eq!(
            range.start,
            Some(Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap())
        );
        assert_eq!(range.end, Some(end_of_day(day(2025, 1, 1))));
    }
}
