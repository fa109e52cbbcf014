//! # Invoice Transaction Manager
//!
//! Creates invoices atomically against the shared catalog.
//!
//! ## Create Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  validate_create_invoice(cmd)           → InvalidRequest               │
//! │       │                                                                 │
//! │  BEGIN (UnitOfWork)                                                    │
//! │       │                                                                 │
//! │  next_sequence(YYYYMM)                  reference INV-YYYYMM-XXXX      │
//! │       │                                                                 │
//! │  items_by_ids(requested ids)            one read                       │
//! │       ├── absent        → ItemNotFound       ─┐                         │
//! │       └── qty > stock   → InsufficientStock  ─┤                         │
//! │       │                                       │                         │
//! │  amount = Σ qty × sale_price                  │                         │
//! │  insert_invoice(header + lines)               ├─► ROLLBACK              │
//! │       │                                       │                         │
//! │  decrement_stock per line                     │                         │
//! │       └── 0 rows → InsufficientStock ────────┘                         │
//! │       │                                                                 │
//! │  COMMIT → Invoice with lines                                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The stock check on the read is a fast-path rejection. Oversell is
//! prevented by the conditional decrement alone, which also covers the same
//! item appearing on several lines.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use tally_core::reference::{format_reference, reference_period};
use tally_core::validation::validate_create_invoice;
use tally_core::{CoreError, CreateInvoice, Invoice, InvoiceLineItem, Item, Money};
use tally_db::repository::generate_id;
use tally_db::{Database, UnitOfWork};

use crate::error::{ServiceError, ServiceResult};

/// Orchestrates invoice creation.
#[derive(Debug, Clone)]
pub struct InvoiceTransactionManager {
    db: Database,
}

impl InvoiceTransactionManager {
    pub fn new(db: Database) -> Self {
        InvoiceTransactionManager { db }
    }

    /// Creates an invoice and takes its quantities out of stock, all or
    /// nothing.
    ///
    /// ## Returns
    /// * `Ok(Invoice)` - Committed invoice with its lines
    /// * `Err(InvalidRequest)` - Missing owner, no lines, non-positive quantity
    /// * `Err(ItemNotFound)` - A line names an unknown item
    /// * `Err(InsufficientStock)` - Not enough stock, now or at commit time
    /// * `Err(Internal)` - Storage failure (logged)
    pub async fn create_invoice(&self, cmd: CreateInvoice) -> ServiceResult<Invoice> {
        validate_create_invoice(&cmd)?;

        debug!(
            owner = %cmd.owner_id,
            lines = cmd.items.len(),
            "create_invoice"
        );

        let now = Utc::now();
        let mut uow = self.db.begin().await?;

        match create_in(&mut uow, &cmd, now).await {
            Ok(invoice) => {
                uow.commit().await?;
                info!(
                    invoice_id = %invoice.id,
                    reference = %invoice.reference,
                    amount = %invoice.amount(),
                    lines = invoice.items.len(),
                    "Invoice created"
                );
                Ok(invoice)
            }
            Err(e) => {
                if let Err(rollback) = uow.rollback().await {
                    warn!(error = %rollback, "Rollback failed");
                }
                debug!(error = %e, "Invoice creation aborted");
                Err(e)
            }
        }
    }
}

async fn create_in(
    uow: &mut UnitOfWork,
    cmd: &CreateInvoice,
    now: DateTime<Utc>,
) -> ServiceResult<Invoice> {
    // Write first: takes the SQLite write lock before any stock is read.
    let period = reference_period(now);
    let sequence = uow.next_sequence(&period).await?;

    let mut ids: Vec<String> = Vec::with_capacity(cmd.items.len());
    for line in &cmd.items {
        if !ids.contains(&line.item_id) {
            ids.push(line.item_id.clone());
        }
    }

    let items = uow.items_by_ids(&ids).await?;
    let catalog: HashMap<&str, &Item> = items.iter().map(|i| (i.id.as_str(), i)).collect();

    let mut amount = Money::zero();
    for line in &cmd.items {
        let item = catalog
            .get(line.item_id.as_str())
            .ok_or_else(|| CoreError::ItemNotFound(line.item_id.clone()))?;

        if !item.has_stock_for(line.quantity) {
            return Err(CoreError::InsufficientStock {
                item_id: line.item_id.clone(),
                requested: line.quantity,
                available: item.quantity,
            }
            .into());
        }

        amount += item.sale_price().multiply_quantity(line.quantity);
    }

    let invoice_id = generate_id();
    let lines = cmd
        .items
        .iter()
        .map(|line| InvoiceLineItem {
            id: generate_id(),
            invoice_id: invoice_id.clone(),
            item_id: line.item_id.clone(),
            quantity: line.quantity,
        })
        .collect();

    let invoice = Invoice {
        id: invoice_id,
        customer: cmd.customer.trim().to_string(),
        reference: format_reference(&period, sequence),
        date: cmd.date.unwrap_or(now),
        amount_cents: amount.cents(),
        user_id: cmd.owner_id.clone(),
        created_at: now,
        items: lines,
    };

    uow.insert_invoice(&invoice).await?;

    for line in &invoice.items {
        if !uow.decrement_stock(&line.item_id, line.quantity).await? {
            let available = uow.stock_of(&line.item_id).await?.unwrap_or(0);
            return Err(ServiceError::InsufficientStock {
                item_id: line.item_id.clone(),
                requested: line.quantity,
                available,
            });
        }
    }

    Ok(invoice)
}

// =============================================================================
// Unit Tests
// =============================================================================
