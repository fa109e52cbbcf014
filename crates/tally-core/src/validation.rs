//! # Validation Module
//!
//! Business-rule validation for invoice commands.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Transport collaborator                                       │
//! │  ├── Deserialization, declarative DTO checks                           │
//! │  └── Authorization context → owner id                                  │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE (before any transaction starts)                  │
//! │  ├── owner present, customer present                                   │
//! │  └── at least one line, every quantity > 0                             │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── CHECK (quantity >= 0) on items                                    │
//! │  ├── UNIQUE (reference) on invoices                                    │
//! │  └── Foreign keys on invoice_items                                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use tally_core::validation::validate_quantity;
//!
//! assert!(validate_quantity(5).is_ok());
//! assert!(validate_quantity(0).is_err());
//! ```

use crate::error::ValidationError;
use crate::types::{CreateInvoice, InvoiceLineRequest};
use crate::MAX_INVOICE_LINES;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Longest accepted customer name.
const MAX_CUSTOMER_LEN: usize = 200;

// =============================================================================
// Field Validators
// =============================================================================

/// Validates the owner id handed over by the authorization collaborator.
pub fn validate_owner_id(owner_id: &str) -> ValidationResult<()> {
    if owner_id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "ownerId".to_string(),
        });
    }
    Ok(())
}

/// Validates a customer name.
///
/// ## Rules
/// - Must not be empty
/// - At most 200 characters
pub fn validate_customer(customer: &str) -> ValidationResult<()> {
    let customer = customer.trim();

    if customer.is_empty() {
        return Err(ValidationError::Required {
            field: "customer".to_string(),
        });
    }

    if customer.chars().count() > MAX_CUSTOMER_LEN {
        return Err(ValidationError::TooLong {
            field: "customer".to_string(),
            max: MAX_CUSTOMER_LEN,
        });
    }

    Ok(())
}

/// Validates a line quantity.
pub fn validate_quantity(quantity: i64) -> ValidationResult<()> {
    if quantity <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }
    Ok(())
}

/// Validates the requested invoice lines.
///
/// ## Rules
/// - At least one line, at most [`MAX_INVOICE_LINES`]
/// - Every line names an item and asks for a positive quantity
pub fn validate_lines(lines: &[InvoiceLineRequest]) -> ValidationResult<()> {
    if lines.is_empty() {
        return Err(ValidationError::Required {
            field: "items".to_string(),
        });
    }

    if lines.len() > MAX_INVOICE_LINES {
        return Err(ValidationError::TooMany {
            field: "items".to_string(),
            max: MAX_INVOICE_LINES,
        });
    }

    for line in lines {
        if line.item_id.trim().is_empty() {
            return Err(ValidationError::Required {
                field: "itemId".to_string(),
            });
        }
        validate_quantity(line.quantity)?;
    }

    Ok(())
}

// =============================================================================
// Command Validators
// =============================================================================

/// Validates a create-invoice command before the transaction starts.
///
/// Checks run owner first so an unauthenticated call is reported as such
/// even when its body is also malformed.
pub fn validate_create_invoice(cmd: &CreateInvoice) -> ValidationResult<()> {
    validate_owner_id(&cmd.owner_id)?;
    validate_customer(&cmd.customer)?;
    validate_lines(&cmd.items)?;
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
