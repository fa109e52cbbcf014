//! # Invoice Repository
//!
//! Scoped, paginated reads of committed invoices.
//!
//! ## Filters
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  SELECT ... FROM invoices                                              │
//! │  WHERE 1 = 1                                                           │
//! │    [AND user_id = ?]     ← InvoiceScope with a non-empty owner         │
//! │    [AND date >= ?]       ← DateRange.start                             │
//! │    [AND date <= ?]       ← DateRange.end                               │
//! │  ORDER BY date DESC, reference DESC                                    │
//! │  LIMIT take OFFSET skip                                                │
//! │                                                                         │
//! │  then: one IN (...) query loads the lines of every returned invoice    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The same filter builder feeds `list` and `count`, so page totals always
//! agree with page contents.

use std::collections::HashMap;

use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use tracing::debug;

use crate::error::DbResult;
use tally_core::{DateRange, Invoice, InvoiceLineItem, InvoiceScope};

const INVOICE_COLUMNS: &str =
    "id, customer, reference, date, amount_cents, user_id, created_at";

/// Repository for invoice reads.
#[derive(Debug, Clone)]
pub struct InvoiceRepository {
    pool: SqlitePool,
}

impl InvoiceRepository {
    /// Creates a new InvoiceRepository.
    pub fn new(pool: SqlitePool) -> Self {
        InvoiceRepository { pool }
    }

    /// Gets one invoice with its lines, if it is visible in `scope`.
    ///
    /// ## Returns
    /// * `Ok(Some(Invoice))` - Found and owned by the scope's owner (or scope is unrestricted)
    /// * `Ok(None)` - Missing, or belongs to someone else
    pub async fn get_by_id(&self, id: &str, scope: &InvoiceScope) -> DbResult<Option<Invoice>> {
        let mut qb = QueryBuilder::<Sqlite>::new(format!("SELECT {INVOICE_COLUMNS} FROM invoices"));
        qb.push(" WHERE id = ").push_bind(id.to_string());
        if let Some(owner) = scope.owner_filter() {
            qb.push(" AND user_id = ").push_bind(owner.to_string());
        }

        let invoice = qb
            .build_query_as::<Invoice>()
            .fetch_optional(&self.pool)
            .await?;

        match invoice {
            Some(mut invoice) => {
                invoice.items = self.lines_of(&invoice.id).await?;
                Ok(Some(invoice))
            }
            None => Ok(None),
        }
    }

    /// Lists invoices newest first, each with its line items.
    pub async fn list(
        &self,
        scope: &InvoiceScope,
        range: &DateRange,
        skip: i64,
        take: i64,
    ) -> DbResult<Vec<Invoice>> {
        debug!(
            owner = ?scope.owner_filter(),
            skip = skip,
            take = take,
            "Listing invoices"
        );

        let mut qb = QueryBuilder::<Sqlite>::new(format!("SELECT {INVOICE_COLUMNS} FROM invoices"));
        push_filters(&mut qb, scope, range);
        qb.push(" ORDER BY date DESC, reference DESC");
        qb.push(" LIMIT ").push_bind(take);
        qb.push(" OFFSET ").push_bind(skip);

        let mut invoices = qb
            .build_query_as::<Invoice>()
            .fetch_all(&self.pool)
            .await?;

        self.attach_lines(&mut invoices).await?;

        Ok(invoices)
    }

    /// Counts invoices matching the same filters as [`Self::list`].
    pub async fn count(&self, scope: &InvoiceScope, range: &DateRange) -> DbResult<i64> {
        let mut qb = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM invoices");
        push_filters(&mut qb, scope, range);

        let count = qb
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    /// Loads the lines of one invoice in entry order.
    pub async fn lines_of(&self, invoice_id: &str) -> DbResult<Vec<InvoiceLineItem>> {
        let lines = sqlx::query_as::<_, InvoiceLineItem>(
            r#"
            SELECT id, invoice_id, item_id, quantity
            FROM invoice_items
            WHERE invoice_id = ?1
            ORDER BY position
            "#,
        )
        .bind(invoice_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(lines)
    }

    async fn attach_lines(&self, invoices: &mut [Invoice]) -> DbResult<()> {
        if invoices.is_empty() {
            return Ok(());
        }

        let mut qb = QueryBuilder::<Sqlite>::new(
            "SELECT id, invoice_id, item_id, quantity FROM invoice_items WHERE invoice_id IN (",
        );
        let mut ids = qb.separated(", ");
        for invoice in invoices.iter() {
            ids.push_bind(invoice.id.clone());
        }
        ids.push_unseparated(") ORDER BY invoice_id, position");

        let lines = qb
            .build_query_as::<InvoiceLineItem>()
            .fetch_all(&self.pool)
            .await?;

        let mut by_invoice: HashMap<String, Vec<InvoiceLineItem>> = HashMap::new();
        for line in lines {
            by_invoice
                .entry(line.invoice_id.clone())
                .or_default()
                .push(line);
        }

        for invoice in invoices.iter_mut() {
            invoice.items = by_invoice.remove(&invoice.id).unwrap_or_default();
        }

        Ok(())
    }
}

fn push_filters(qb: &mut QueryBuilder<'_, Sqlite>, scope: &InvoiceScope, range: &DateRange) {
    qb.push(" WHERE 1 = 1");
    if let Some(owner) = scope.owner_filter() {
        qb.push(" AND user_id = ").push_bind(owner.to_string());
    }
    if let Some(start) = range.start {
        qb.push(" AND date >= ").push_bind(start);
    }
    if let Some(end) = range.end {
        qb.push(" AND date <= ").push_bind(end);
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
