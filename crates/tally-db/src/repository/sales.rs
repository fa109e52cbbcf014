//! # Sales Repository
//!
//! Flattened invoice lines for report aggregation.
//!
//! ```text
//! invoice_items ──► invoices (date filter, ordering)
//!       │
//!       └─────────► items (sku, name, prices)
//!
//! one SalesLine per invoice line, oldest invoice first, then entry order
//! ```

use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use tracing::debug;

use crate::error::DbResult;
use tally_core::{DateRange, SalesLine};

/// Repository for report source rows.
#[derive(Debug, Clone)]
pub struct SalesRepository {
    pool: SqlitePool,
}

impl SalesRepository {
    /// Creates a new SalesRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SalesRepository { pool }
    }

    /// Returns every invoice line dated inside `range`, joined with its item.
    ///
    /// Rows come back ordered by invoice date, then reference, then line
    /// position. The aggregator relies on this for first-seen item order.
    pub async fn lines_in_range(&self, range: &DateRange) -> DbResult<Vec<SalesLine>> {
        let mut qb = QueryBuilder::<Sqlite>::new(
            r#"
            SELECT
                it.sku,
                it.name,
                ii.quantity,
                it.unit_price_cents,
                it.sale_price_cents
            FROM invoice_items ii
            INNER JOIN invoices inv ON inv.id = ii.invoice_id
            INNER JOIN items it ON it.id = ii.item_id
            WHERE 1 = 1
            "#,
        );
        if let Some(start) = range.start {
            qb.push(" AND inv.date >= ").push_bind(start);
        }
        if let Some(end) = range.end {
            qb.push(" AND inv.date <= ").push_bind(end);
        }
        qb.push(" ORDER BY inv.date ASC, inv.reference ASC, ii.position ASC");

        let lines = qb
            .build_query_as::<SalesLine>()
            .fetch_all(&self.pool)
            .await?;

        debug!(count = lines.len(), "Loaded sales lines");
        Ok(lines)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
