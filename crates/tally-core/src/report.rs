//! # Sales Aggregation
//!
//! Folds invoice lines (joined with their items) into a [`SalesReport`].
//!
//! ## Aggregation Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  SalesLine rows (date order)          SalesAccumulator                  │
//! │  ───────────────────────────          ─────────────────────────────     │
//! │  SKU1  qty 2  sale 50  unit 30  ──►   SKU1: qty 2  rev 100  prof 40     │
//! │  SKU2  qty 3  sale 100 unit 80  ──►   SKU2: qty 3  rev 300  prof 60     │
//! │  SKU1  qty 1  sale 50  unit 30  ──►   SKU1: qty 3  rev 150  prof 60     │
//! │                                                                         │
//! │                                       totals: amount 450, profit 120    │
//! │                                                                         │
//! │  first occurrence of a SKU seeds its entry (name, position);            │
//! │  later occurrences only add quantity / revenue / profit                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::HashMap;

use chrono::NaiveDate;

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::range::DateRange;
use crate::types::{SalesLine, SalesReport, SalesReportItem};

/// Running per-SKU totals for one report.
#[derive(Debug, Default)]
pub struct SalesAccumulator {
    range: DateRange,
    positions: HashMap<String, usize>,
    items: Vec<SalesReportItem>,
    total_amount: Money,
    total_profit: Money,
    lines_seen: usize,
}

impl SalesAccumulator {
    pub fn new(range: DateRange) -> Self {
        SalesAccumulator {
            range,
            ..Default::default()
        }
    }

    /// Adds one line to the per-SKU map and the running totals.
    pub fn add(&mut self, line: &SalesLine) {
        let revenue = line.revenue();
        let profit = line.profit();

        match self.positions.get(&line.sku) {
            Some(&pos) => {
                let entry = &mut self.items[pos];
                entry.quantity += line.quantity;
                entry.revenue += revenue;
                entry.profit += profit;
            }
            None => {
                self.positions.insert(line.sku.clone(), self.items.len());
                self.items.push(SalesReportItem {
                    sku: line.sku.clone(),
                    name: line.name.clone(),
                    quantity: line.quantity,
                    revenue,
                    profit,
                });
            }
        }

        self.total_amount += revenue;
        self.total_profit += profit;
        self.lines_seen += 1;
    }

    /// Produces the report.
    ///
    /// ## Errors
    /// `CoreError::NoSalesData` when no line was added.
    pub fn finish(self) -> CoreResult<SalesReport> {
        if self.lines_seen == 0 {
            return Err(CoreError::NoSalesData);
        }

        Ok(SalesReport {
            date_range_start: self.range.start,
            date_range_end: self.range.end,
            total_amount: self.total_amount,
            total_profit: self.total_profit,
            items: self.items,
        })
    }
}

/// Aggregates a batch of lines in one call.
pub fn aggregate_sales<I>(range: DateRange, lines: I) -> CoreResult<SalesReport>
where
    I: IntoIterator<Item = SalesLine>,
{
    let mut acc = SalesAccumulator::new(range);
    for line in lines {
        acc.add(&line);
    }
    acc.finish()
}

/// Download / attachment name for a report over the given bounds.
///
/// ## Example
/// ```rust
/// use chrono::NaiveDate;
/// use tally_core::report::report_filename;
///
/// let jan1 = NaiveDate::from_ymd_opt(2025, 1, 1);
/// let jan31 = NaiveDate::from_ymd_opt(2025, 1, 31);
///
/// assert_eq!(report_filename(None, None), "sales-report.pdf");
/// assert_eq!(report_filename(jan1, None), "sales-report-2025-01-01.pdf");
/// assert_eq!(report_filename(jan1, jan31), "sales-report-2025-01-01_2025-01-31.pdf");
/// ```
pub fn report_filename(start: Option<NaiveDate>, end: Option<NaiveDate>) -> String {
    const FMT: &str = "%Y-%m-%d";
    match (start, end) {
        (None, None) => "sales-report.pdf".to_string(),
        (Some(s), None) => format!("sales-report-{}.pdf", s.format(FMT)),
        (None, Some(e)) => format!("sales-report-{}.pdf", e.format(FMT)),
        (Some(s), Some(e)) => format!("sales-report-{}_{}.pdf", s.format(FMT), e.format(FMT)),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn line(sku: &str, quantity: i64, sale: i64, unit: i64) -> SalesLine {
        SalesLine {
            sku: sku.to_string(),
            name: format!("{} name", sku),
            quantity,
            unit_price_cents: unit,
            sale_price_cents: sale,
        }
    }

    #[test]
    fn test_same_sku_lines_merge() {
        let report = aggregate_sales(
            DateRange::all(),
            vec![line("SKU1", 2, 5000, 3000), line("SKU1", 1, 5000, 3000)],
        )
        .unwrap();

        assert_eq!(report.items.len(), 1);
        let entry = &report.items[0];
        assert_eq!(entry.quantity, 3);
        assert_eq!(entry.revenue.to_string(), "150.00");
        assert_eq!(entry.profit.to_string(), "60.00");
        assert_eq!(report.total_amount.cents(), 15000);
        assert_eq!(report.total_profit.cents(), 6000);
    }

    #[test]
    fn test_mixed_skus_keep_first_seen_order() {
        let report = aggregate_sales(
            DateRange::all(),
            vec![
                line("SKU1", 2, 5000, 3000),
                line("SKU2", 3, 10000, 8000),
                line("SKU1", 1, 5000, 3000),
            ],
        )
        .unwrap();

        let skus: Vec<_> = report.items.iter().map(|i| i.sku.as_str()).collect();
        assert_eq!(skus, vec!["SKU1", "SKU2"]);
        assert_eq!(report.items[1].revenue.cents(), 30000);
        assert_eq!(report.items[1].profit.cents(), 6000);
        assert_eq!(report.total_amount.cents(), 45000);
        assert_eq!(report.total_profit.cents(), 12000);
    }

    #[test]
    fn test_no_lines_is_no_data() {
        let result = aggregate_sales(DateRange::all(), Vec::new());
        assert!(matches!(result, Err(CoreError::NoSalesData)));
    }

    #[test]
    fn test_range_is_carried_into_report() {
        let range = DateRange::parse(Some("2025-01-01"), Some("2025-01-31")).unwrap();
        let report = aggregate_sales(range, vec![line("A", 1, 100, 50)]).unwrap();
        assert_eq!(report.date_range_start, range.start);
        assert_eq!(report.date_range_end, range.end);
    }

    #[test]
    fn test_filenames() {
        let jan1 = NaiveDate::from_ymd_opt(2025, 1, 1);
        let jan31 = NaiveDate::from_ymd_opt(2025, 1, 31);

        assert_eq!(report_filename(None, None), "sales-report.pdf");
        assert_eq!(report_filename(jan1, None), "sales-report-2025-01-01.pdf");
        assert_eq!(report_filename(None, jan31), "sales-report-2025-01-31.pdf");
        assert_eq!(
            report_filename(jan1, jan31),
            "sales-report-2025-01-01_2025-01-31.pdf"
        );
    }
}
