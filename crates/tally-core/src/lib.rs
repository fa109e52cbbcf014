//! # tally-core: Pure Business Logic for Tally
//!
//! Everything here is a pure function over plain data. Storage, the report
//! queue and mail delivery live in the other workspace members.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          Tally Architecture                             │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │              Transport collaborator (HTTP, CLI, ...)            │   │
//! │  │   raw request ──► (validated command, authorization scope)      │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                 tally-service (orchestration)                   │   │
//! │  │   InvoiceTransactionManager, QueryService, SalesAggregator,     │   │
//! │  │   ReportDistributor, ReportScheduler                            │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ tally-core (THIS CRATE) ★                       │   │
//! │  │                                                                 │   │
//! │  │   ┌──────────┐ ┌──────────┐ ┌────────────┐ ┌──────────────┐    │   │
//! │  │   │  types   │ │  money   │ │ pagination │ │  reference   │    │   │
//! │  │   │  Item    │ │  Money   │ │  PageMeta  │ │ INV-YYYYMM-  │    │   │
//! │  │   │ Invoice  │ │          │ │            │ │    XXXX      │    │   │
//! │  │   └──────────┘ └──────────┘ └────────────┘ └──────────────┘    │   │
//! │  │   ┌──────────┐ ┌──────────┐ ┌────────────┐ ┌──────────────┐    │   │
//! │  │   │  range   │ │  report  │ │   render   │ │  validation  │    │   │
//! │  │   │DateRange │ │ per-SKU  │ │  PDF bytes │ │    rules     │    │   │
//! │  │   └──────────┘ └──────────┘ └────────────┘ └──────────────┘    │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Item, Invoice, SalesReport, ...)
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`error`] - Domain error types
//! - [`validation`] - Invoice command validation
//! - [`pagination`] - Page/limit coercion and page metadata
//! - [`range`] - Inclusive date ranges parsed from request strings
//! - [`reference`] - Invoice reference formatting
//! - [`report`] - Sales aggregation and report filenames
//! - [`render`] - Sales report to PDF bytes
//!
//! ## Example Usage
//!
//! ```rust
//! use tally_core::money::Money;
//!
//! let sale_price = Money::from_cents(5000); // 50.00
//! let line_total = sale_price.multiply_quantity(3);
//!
//! assert_eq!(line_total.to_string(), "150.00");
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod money;
pub mod pagination;
pub mod range;
pub mod reference;
pub mod render;
pub mod report;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use pagination::{pagination_params, Page, PageMeta, PaginationParams};
pub use range::DateRange;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum number of lines accepted on a single invoice.
pub const MAX_INVOICE_LINES: usize = 100;

/// Default page size for invoice listings.
pub const DEFAULT_PAGE_LIMIT: i64 = 10;

/// Queue that carries rendered daily sales reports to the mailer.
pub const DAILY_SALES_REPORT_QUEUE: &str = "daily_sales_report";
