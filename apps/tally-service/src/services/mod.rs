//! Service layer.
//!
//! ```text
//! InvoiceTransactionManager ── create_invoice
//! QueryService ─────────────── list_invoices / get_invoice
//! SalesAggregator ──────────── aggregate / generate
//! ReportDistributor ────────── on_demand / publish_report / consume → Mailer
//! ReportScheduler ──────────── daily run_scheduled
//! ```

pub mod distributor;
pub mod invoice_service;
pub mod query_service;
pub mod report_service;
pub mod scheduler;

pub use distributor::ReportDistributor;
pub use invoice_service::InvoiceTransactionManager;
pub use query_service::QueryService;
pub use report_service::SalesAggregator;
pub use scheduler::{ReportScheduler, ReportSchedulerHandle};

#[cfg(test)]
pub(crate) mod testing {
    use chrono::{DateTime, Utc};
    use tally_core::{Invoice, InvoiceLineItem, Item};
    use tally_db::repository::generate_id;
    use tally_db::{Database, DbConfig};

    pub async fn memory_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    pub async fn add_item(db: &Database, sku: &str, quantity: i64, unit: i64, sale: i64) -> Item {
        let item = Item {
            id: generate_id(),
            name: format!("Item {sku}"),
            sku: sku.to_string(),
            quantity,
            unit_price_cents: unit,
            sale_price_cents: sale,
            created_at: Utc::now(),
        };
        db.items().insert(&item).await.unwrap()
    }

    /// Commits an invoice directly, leaving stock untouched.
    pub async fn add_invoice(
        db: &Database,
        reference: &str,
        owner: &str,
        date: DateTime<Utc>,
        lines: &[(&Item, i64)],
    ) -> Invoice {
        let id = generate_id();
        let invoice = Invoice {
            id: id.clone(),
            customer: "John Doe".to_string(),
            reference: reference.to_string(),
            date,
            amount_cents: lines
                .iter()
                .map(|(item, quantity)| item.sale_price_cents * quantity)
                .sum(),
            user_id: owner.to_string(),
            created_at: Utc::now(),
            items: lines
                .iter()
                .map(|(item, quantity)| InvoiceLineItem {
                    id: generate_id(),
                    invoice_id: id.clone(),
                    item_id: item.id.clone(),
                    quantity: *quantity,
                })
                .collect(),
        };

        let mut uow = db.begin().await.unwrap();
        uow.insert_invoice(&invoice).await.unwrap();
        uow.commit().await.unwrap();
        invoice
    }
}
