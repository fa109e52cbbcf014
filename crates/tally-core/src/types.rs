//! # Domain Types
//!
//! Core domain types used throughout Tally.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  Persisted                                                              │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────────┐   │
//! │  │      Item       │   │     Invoice     │   │  InvoiceLineItem    │   │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────────  │   │
//! │  │  id (UUID)      │   │  id (UUID)      │   │  invoice_id (FK)    │   │
//! │  │  sku (business) │◄──┤  reference      │◄──┤  item_id (FK)       │   │
//! │  │  quantity       │   │  amount_cents   │   │  quantity > 0       │   │
//! │  │  unit/sale cents│   │  user_id        │   │                     │   │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────────┘   │
//! │                                                                         │
//! │  Transient                                                              │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────────┐   │
//! │  │   SalesLine     │──►│   SalesReport   │──►│   ReportArtifact    │   │
//! │  │ (joined row)    │   │ per-SKU totals  │   │  filename + bytes   │   │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Dual-Key Identity Pattern
//! - `id`: UUID v4, used for relations
//! - Business ID: `sku` for items, `reference` for invoices

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::money::Money;

// =============================================================================
// Item
// =============================================================================

/// A catalog item with finite stock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Item {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Display name.
    pub name: String,

    /// Stock Keeping Unit, unique within the catalog.
    pub sku: String,

    /// Units on hand. Never negative.
    pub quantity: i64,

    /// Cost per unit in cents.
    pub unit_price_cents: i64,

    /// Selling price per unit in cents.
    pub sale_price_cents: i64,

    pub created_at: DateTime<Utc>,
}

impl Item {
    #[inline]
    pub fn unit_price(&self) -> Money {
        Money::from_cents(self.unit_price_cents)
    }

    #[inline]
    pub fn sale_price(&self) -> Money {
        Money::from_cents(self.sale_price_cents)
    }

    /// Checks whether `quantity` units can be taken from current stock.
    pub fn has_stock_for(&self, quantity: i64) -> bool {
        quantity <= self.quantity
    }
}

// =============================================================================
// Invoice
// =============================================================================

/// A committed sales invoice. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Invoice {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Free-text customer name.
    pub customer: String,

    /// Human-readable reference, `INV-YYYYMM-XXXX`.
    pub reference: String,

    /// Invoice date.
    pub date: DateTime<Utc>,

    /// Σ quantity × sale price, in cents.
    pub amount_cents: i64,

    /// Owner / creator of the invoice.
    pub user_id: String,

    pub created_at: DateTime<Utc>,

    /// Line items, attached after loading.
    #[cfg_attr(feature = "sqlx", sqlx(skip))]
    #[serde(default)]
    pub items: Vec<InvoiceLineItem>,
}

impl Invoice {
    #[inline]
    pub fn amount(&self) -> Money {
        Money::from_cents(self.amount_cents)
    }
}

/// One line of an invoice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct InvoiceLineItem {
    pub id: String,
    pub invoice_id: String,
    pub item_id: String,
    pub quantity: i64,
}

// =============================================================================
// Commands & Queries
// =============================================================================

/// A validated-shape request to create an invoice.
///
/// ## Wire Shape
/// ```json
/// {
///   "customer": "John Doe",
///   "date": "2025-05-19T12:00:00Z",
///   "items": [{ "itemId": "1fc7...", "quantity": 5 }],
///   "ownerId": "user-1"
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateInvoice {
    pub customer: String,

    /// Requested invoice date. Defaults to the creation time.
    #[serde(default)]
    pub date: Option<DateTime<Utc>>,

    pub items: Vec<InvoiceLineRequest>,

    /// Supplied by the authorization collaborator, never by the client body.
    #[serde(default)]
    pub owner_id: String,
}

/// One requested invoice line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceLineRequest {
    pub item_id: String,
    pub quantity: i64,
}

/// Authorization-derived restriction on invoice queries.
///
/// `InvoiceScope::default()` is unrestricted (administrators).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceScope {
    pub owner_id: Option<String>,
}

impl InvoiceScope {
    /// Unrestricted scope.
    pub fn all() -> Self {
        InvoiceScope::default()
    }

    /// Restricts to invoices owned by `owner_id`.
    pub fn owner(owner_id: impl Into<String>) -> Self {
        InvoiceScope {
            owner_id: Some(owner_id.into()),
        }
    }

    /// Owner filter, with an empty string treated as "no restriction".
    pub fn owner_filter(&self) -> Option<&str> {
        self.owner_id.as_deref().filter(|id| !id.is_empty())
    }
}

/// Raw listing parameters as they arrive from the transport layer.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceListRequest {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

/// Raw report parameters as they arrive from the transport layer.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportRequest {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

// =============================================================================
// Sales Reporting
// =============================================================================

/// One invoice line joined with its item, as read for aggregation.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct SalesLine {
    pub sku: String,
    pub name: String,
    pub quantity: i64,
    pub unit_price_cents: i64,
    pub sale_price_cents: i64,
}

impl SalesLine {
    /// sale price × quantity
    pub fn revenue(&self) -> Money {
        Money::from_cents(self.sale_price_cents).multiply_quantity(self.quantity)
    }

    /// (sale price − unit price) × quantity
    pub fn profit(&self) -> Money {
        Money::from_cents(self.sale_price_cents - self.unit_price_cents)
            .multiply_quantity(self.quantity)
    }
}

/// Per-SKU totals within a report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SalesReportItem {
    pub sku: String,
    pub name: String,
    pub quantity: i64,
    pub revenue: Money,
    pub profit: Money,
}

/// Aggregated sales for a date range. Not persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SalesReport {
    /// Absent means open-ended.
    pub date_range_start: Option<DateTime<Utc>>,
    pub date_range_end: Option<DateTime<Utc>>,
    pub total_amount: Money,
    pub total_profit: Money,
    /// One entry per SKU, in first-sold order.
    pub items: Vec<SalesReportItem>,
}

impl SalesReport {
    pub fn start_date(&self) -> Option<NaiveDate> {
        self.date_range_start.map(|d| d.date_naive())
    }

    pub fn end_date(&self) -> Option<NaiveDate> {
        self.date_range_end.map(|d| d.date_naive())
    }
}

/// A rendered report ready to download or mail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportArtifact {
    pub filename: String,
    pub content: Vec<u8>,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sales_line_math() {
        let line = SalesLine {
            sku: "SKU1".to_string(),
            name: "Widget".to_string(),
            quantity: 2,
            unit_price_cents: 3000,
            sale_price_cents: 5000,
        };
        assert_eq!(line.revenue().cents(), 10000);
        assert_eq!(line.profit().cents(), 4000);
    }

    #[test]
    fn test_scope_owner_filter() {
        assert_eq!(InvoiceScope::all().owner_filter(), None);
        assert_eq!(InvoiceScope::owner("").owner_filter(), None);
        assert_eq!(InvoiceScope::owner("u-1").owner_filter(), Some("u-1"));
    }

    #[test]
    fn test_create_invoice_wire_shape() {
        let json = r#"{
            "customer": "John Doe",
            "date": "2025-05-19T12:00:00Z",
            "items": [{ "itemId": "abc", "quantity": 5 }],
            "ownerId": "user-1"
        }"#;
        let cmd: CreateInvoice = serde_json::from_str(json).unwrap();
        assert_eq!(cmd.items[0].item_id, "abc");
        assert_eq!(cmd.owner_id, "user-1");
        assert!(cmd.date.is_some());
    }
}
