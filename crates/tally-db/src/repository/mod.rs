//! # Repository Module
//!
//! Read and insert access to the Tally tables.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  Service layer                                                         │
//! │       │                                                                 │
//! │       │  db.invoices().list(&scope, &range, skip, take)                │
//! │       ▼                                                                 │
//! │  InvoiceRepository                                                     │
//! │  ├── get_by_id(&self, id, scope)                                       │
//! │  ├── list(&self, scope, range, skip, take)                             │
//! │  └── count(&self, scope, range)                                        │
//! │       │                                                                 │
//! │       │  SQL Query                                                      │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! │                                                                         │
//! │  Multi-statement writes (invoice creation) go through UnitOfWork       │
//! │  instead, so they share one transaction.                               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`item::ItemRepository`] - Catalog lookups and inserts
//! - [`invoice::InvoiceRepository`] - Scoped invoice reads with line items
//! - [`sales::SalesRepository`] - Joined sales lines for reporting

use uuid::Uuid;

pub mod invoice;
pub mod item;
pub mod sales;

/// Generates a new row identifier (UUID v4).
pub fn generate_id() -> String {
    Uuid::new_v4().to_string()
}

// =============================================================================
// Test Fixtures
// =============================================================================

#[cfg(test)]
pub(crate) mod fixtures {
    use chrono::{DateTime, Utc};
    use tally_core::{Invoice, InvoiceLineItem, Item};

    use super::generate_id;
    use crate::pool::{Database, DbConfig};

    pub async fn memory_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    pub fn item(name: &str, sku: &str, quantity: i64, unit: i64, sale: i64) -> Item {
        Item {
            id: generate_id(),
            name: name.to_string(),
            sku: sku.to_string(),
            quantity,
            unit_price_cents: unit,
            sale_price_cents: sale,
            created_at: Utc::now(),
        }
    }

    /// Builds an invoice whose amount is derived from `lines` at each item's
    /// sale price.
    pub fn invoice(
        reference: &str,
        owner: &str,
        date: DateTime<Utc>,
        lines: &[(&Item, i64)],
    ) -> Invoice {
        let id = generate_id();
        let items = lines
            .iter()
            .map(|(item, quantity)| InvoiceLineItem {
                id: generate_id(),
                invoice_id: id.clone(),
                item_id: item.id.clone(),
                quantity: *quantity,
            })
            .collect();
        let amount_cents = lines
            .iter()
            .map(|(item, quantity)| item.sale_price_cents * quantity)
            .sum();

        Invoice {
            id,
            customer: "John Doe".to_string(),
            reference: reference.to_string(),
            date,
            amount_cents,
            user_id: owner.to_string(),
            created_at: Utc::now(),
            items,
        }
    }

    /// Inserts items through the repository.
    pub async fn insert_items(db: &Database, items: &[&Item]) {
        for item in items {
            db.items().insert(item).await.unwrap();
        }
    }

    /// Commits an invoice without touching stock.
    pub async fn insert_invoice(db: &Database, invoice: &Invoice) {
        let mut uow = db.begin().await.unwrap();
        uow.insert_invoice(invoice).await.unwrap();
        uow.commit().await.unwrap();
    }
}
