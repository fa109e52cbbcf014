//! # Error Types
//!
//! Domain-specific error types for tally-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  tally-core errors (this file)                                         │
//! │  ├── CoreError        - Business rule failures                         │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  tally-db errors          └── DbError     - Database failures          │
//! │  tally-queue errors       └── QueueError  - Broker failures            │
//! │  tally-service errors     └── ServiceError - What callers see          │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError ─┐                                  │
//! │                  DbError/QueueError ─┴─► ServiceError → caller          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
///
/// Every variant except `Render` is a deliberate domain outcome and reaches
/// the caller unchanged. `Render` is an internal fault. Storage and transport
/// faults never appear here.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A requested catalog item does not exist.
    #[error("Item not found: {0}")]
    ItemNotFound(String),

    /// Not enough stock to cover a requested line.
    ///
    /// ## User Workflow
    /// ```text
    /// Create invoice (item X, qty: 5)
    ///      │
    ///      ▼
    /// Stock check / conditional decrement: available=3
    ///      │
    ///      ▼
    /// InsufficientStock { item_id: "X", requested: 5, available: 3 }
    ///      │
    ///      ▼
    /// Whole invoice rolled back, caller sees both quantities
    /// ```
    #[error("Insufficient stock for item {item_id}: requested {requested}, available {available}")]
    InsufficientStock {
        item_id: String,
        requested: i64,
        available: i64,
    },

    /// No invoice matches the id (within the caller's scope).
    #[error("Invoice not found: {0}")]
    InvoiceNotFound(String),

    /// A sales report was requested for a range with no sales.
    #[error("No sales data found for the requested period")]
    NoSalesData,

    /// The report document could not be assembled.
    #[error("Report rendering failed: {0}")]
    Render(String),

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// Raised before any storage work starts.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Collection holds more entries than allowed.
    #[error("{field} cannot have more than {max} entries")]
    TooMany { field: String, max: usize },

    /// Invalid format (e.g., unparseable date).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Two values are in the wrong order (e.g., start after end).
    #[error("{first} must not be after {second}")]
    OutOfOrder { first: String, second: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
