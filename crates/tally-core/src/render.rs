//! # Report Rendering
//!
//! Turns a [`SalesReport`] into a PDF document built with `lopdf`.
//!
//! ## Document Layout
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Catalog ──► Pages (MediaBox, Resources: /F1 Courier)                   │
//! │                 ├── Page 1 ──► content: BT /F1 Tf TL Td (line) Tj T* ET │
//! │                 ├── Page 2 ──► ...                                      │
//! │                 └── ...        LINES_PER_PAGE lines each                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Page content is plain text lines: title, report date, period, totals and
//! one row per SKU. Money always prints with exactly two decimals.

use chrono::{DateTime, Utc};
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};

use crate::error::{CoreError, CoreResult};
use crate::report::report_filename;
use crate::types::{ReportArtifact, SalesReport};

// =============================================================================
// Constants
// =============================================================================

const PAGE_WIDTH: i64 = 612;
const PAGE_HEIGHT: i64 = 792;
const MARGIN_LEFT: i64 = 40;
const TOP_BASELINE: i64 = 750;
const FONT_SIZE: i64 = 9;
const LEADING: i64 = 12;
const LINES_PER_PAGE: usize = 58;
const NAME_WIDTH: usize = 28;

// =============================================================================
// Public API
// =============================================================================

/// Renders `report` into a PDF artifact named after its date range.
///
/// ## Example
/// ```rust
/// use chrono::Utc;
/// use tally_core::report::aggregate_sales;
/// use tally_core::render::render_report;
/// use tally_core::{DateRange, SalesLine};
///
/// let report = aggregate_sales(DateRange::all(), vec![SalesLine {
///     sku: "SKU1".into(),
///     name: "Widget".into(),
///     quantity: 3,
///     unit_price_cents: 3000,
///     sale_price_cents: 5000,
/// }]).unwrap();
///
/// let artifact = render_report(&report, Utc::now()).unwrap();
/// assert_eq!(artifact.filename, "sales-report.pdf");
/// assert!(artifact.content.starts_with(b"%PDF-"));
/// ```
pub fn render_report(
    report: &SalesReport,
    generated_at: DateTime<Utc>,
) -> CoreResult<ReportArtifact> {
    let lines = report_lines(report, generated_at);
    Ok(ReportArtifact {
        filename: report_filename(report.start_date(), report.end_date()),
        content: build_document(&lines)?,
    })
}

/// The text lines printed into the document, in order.
pub fn report_lines(report: &SalesReport, generated_at: DateTime<Utc>) -> Vec<String> {
    let period = match (report.start_date(), report.end_date()) {
        (None, None) => "all time".to_string(),
        (Some(s), None) => format!("from {}", s),
        (None, Some(e)) => format!("until {}", e),
        (Some(s), Some(e)) => format!("{} to {}", s, e),
    };

    let mut lines = vec![
        "Sales Report".to_string(),
        String::new(),
        format!("Report date:  {}", generated_at.format("%Y-%m-%d %H:%M UTC")),
        format!("Period:       {}", period),
        format!("Total sales:  {}", report.total_amount),
        format!("Total profit: {}", report.total_profit),
        String::new(),
        format!(
            "{:<14} {:<width$} {:>6} {:>13} {:>13}",
            "SKU",
            "Name",
            "Qty",
            "Revenue",
            "Profit",
            width = NAME_WIDTH
        ),
        "-".repeat(14 + 1 + NAME_WIDTH + 1 + 6 + 1 + 13 + 1 + 13),
    ];

    for item in &report.items {
        let name: String = item.name.chars().take(NAME_WIDTH).collect();
        lines.push(format!(
            "{:<14} {:<width$} {:>6} {:>13} {:>13}",
            item.sku,
            name,
            item.quantity,
            item.revenue,
            item.profit,
            width = NAME_WIDTH
        ));
    }

    lines
}

// =============================================================================
// Document
// =============================================================================

fn render_error(err: impl std::fmt::Display) -> CoreError {
    CoreError::Render(err.to_string())
}

fn build_document(lines: &[String]) -> CoreResult<Vec<u8>> {
    let pages: Vec<&[String]> = if lines.is_empty() {
        vec![&[][..]]
    } else {
        lines.chunks(LINES_PER_PAGE).collect()
    };

    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            "F1" => font_id,
        },
    });

    let mut kids: Vec<Object> = Vec::with_capacity(pages.len());
    for page_lines in &pages {
        let content = page_content(page_lines).encode().map_err(render_error)?;
        let content_id = doc.add_object(Stream::new(dictionary! {}, content));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        kids.push(page_id.into());
    }

    let page_count = kids.len() as i64;
    let media_box: Vec<Object> = vec![
        0i64.into(),
        0i64.into(),
        PAGE_WIDTH.into(),
        PAGE_HEIGHT.into(),
    ];
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => page_count,
            "Resources" => resources_id,
            "MediaBox" => media_box,
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut buf = Vec::with_capacity(4096);
    doc.save_to(&mut buf).map_err(render_error)?;
    Ok(buf)
}

fn page_content(lines: &[String]) -> Content {
    let mut operations = vec![
        Operation::new("BT", vec![]),
        Operation::new("Tf", vec!["F1".into(), FONT_SIZE.into()]),
        Operation::new("TL", vec![LEADING.into()]),
        Operation::new("Td", vec![MARGIN_LEFT.into(), TOP_BASELINE.into()]),
    ];
    for line in lines {
        operations.push(Operation::new("Tj", vec![text(line)]));
        operations.push(Operation::new("T*", vec![]));
    }
    operations.push(Operation::new("ET", vec![]));

    Content { operations }
}

/// Built-in Courier only covers the standard encoding; anything else prints as `?`.
fn text(line: &str) -> Object {
    let ascii: String = line
        .chars()
        .map(|c| if c.is_ascii() && !c.is_ascii_control() { c } else { '?' })
        .collect();
    Object::string_literal(ascii)
}

// =============================================================================
// Unit Tests
// =============================================================================
