//! # Unit of Work
//!
//! One SQLite transaction spanning every write of an invoice creation.
//!
//! ## Statement Order
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  BEGIN                                                                  │
//! │   1. next_sequence(period)   UPSERT invoice_sequences  ← takes the      │
//! │                                                          write lock     │
//! │   2. items_by_ids(ids)       stock + prices, read under the lock        │
//! │   3. insert_invoice(inv)     header + lines                             │
//! │   4. decrement_stock(id, n)  UPDATE ... WHERE quantity >= n             │
//! │      └─ false? caller rolls back, nothing above survives                │
//! │  COMMIT                                                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Starting with a write matters under WAL: a transaction that reads first
//! and writes later can fail with `SQLITE_BUSY_SNAPSHOT` when another writer
//! commits in between. Writing first makes concurrent creators queue on
//! `busy_timeout` instead.
//!
//! Dropping a `UnitOfWork` without committing rolls back.

use sqlx::{QueryBuilder, Sqlite, SqlitePool, Transaction};
use tracing::debug;

use crate::error::{DbError, DbResult};
use tally_core::{Invoice, Item};

/// An open write transaction.
pub struct UnitOfWork {
    tx: Transaction<'static, Sqlite>,
}

impl UnitOfWork {
    /// Begins a transaction on a pooled connection.
    pub async fn begin(pool: &SqlitePool) -> DbResult<Self> {
        let tx = pool
            .begin()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        Ok(UnitOfWork { tx })
    }

    /// Allocates the next reference sequence number for `period` (`YYYYMM`).
    ///
    /// The first call for a period returns 1. Rolling back the transaction
    /// returns the number to the pool.
    pub async fn next_sequence(&mut self, period: &str) -> DbResult<i64> {
        let value: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO invoice_sequences (period, last_value)
            VALUES (?1, 1)
            ON CONFLICT (period) DO UPDATE SET last_value = last_value + 1
            RETURNING last_value
            "#,
        )
        .bind(period)
        .fetch_one(&mut *self.tx)
        .await?;

        debug!(period = %period, sequence = value, "Allocated invoice sequence");
        Ok(value)
    }

    /// Loads the given items. Unknown IDs are simply absent from the result.
    pub async fn items_by_ids(&mut self, ids: &[String]) -> DbResult<Vec<Item>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut qb = QueryBuilder::<Sqlite>::new(
            "SELECT id, name, sku, quantity, unit_price_cents, sale_price_cents, created_at \
             FROM items WHERE id IN (",
        );
        let mut separated = qb.separated(", ");
        for id in ids {
            separated.push_bind(id.clone());
        }
        separated.push_unseparated(")");

        let items = qb
            .build_query_as::<Item>()
            .fetch_all(&mut *self.tx)
            .await?;

        Ok(items)
    }

    /// Current stock of one item, `None` if the item does not exist.
    pub async fn stock_of(&mut self, item_id: &str) -> DbResult<Option<i64>> {
        let quantity: Option<i64> = sqlx::query_scalar("SELECT quantity FROM items WHERE id = ?1")
            .bind(item_id)
            .fetch_optional(&mut *self.tx)
            .await?;

        Ok(quantity)
    }

    /// Inserts an invoice header and its lines, keeping line order.
    ///
    /// ## Returns
    /// * `Err(DbError::UniqueViolation)` - Reference already taken
    /// * `Err(DbError::ForeignKeyViolation)` - A line names an unknown item
    pub async fn insert_invoice(&mut self, invoice: &Invoice) -> DbResult<()> {
        debug!(reference = %invoice.reference, lines = invoice.items.len(), "Inserting invoice");

        sqlx::query(
            r#"
            INSERT INTO invoices (
                id, customer, reference, date, amount_cents, user_id, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&invoice.id)
        .bind(&invoice.customer)
        .bind(&invoice.reference)
        .bind(invoice.date)
        .bind(invoice.amount_cents)
        .bind(&invoice.user_id)
        .bind(invoice.created_at)
        .execute(&mut *self.tx)
        .await?;

        for (position, line) in invoice.items.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO invoice_items (id, invoice_id, item_id, quantity, position)
                VALUES (?1, ?2, ?3, ?4, ?5)
                "#,
            )
            .bind(&line.id)
            .bind(&invoice.id)
            .bind(&line.item_id)
            .bind(line.quantity)
            .bind(position as i64)
            .execute(&mut *self.tx)
            .await?;
        }

        Ok(())
    }

    /// Takes `quantity` units from an item only if that many are on hand.
    ///
    /// ## Returns
    /// * `Ok(true)` - Stock decremented
    /// * `Ok(false)` - Not enough stock (or no such item); nothing changed
    pub async fn decrement_stock(&mut self, item_id: &str, quantity: i64) -> DbResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE items
            SET quantity = quantity - ?2
            WHERE id = ?1 AND quantity >= ?2
            "#,
        )
        .bind(item_id)
        .bind(quantity)
        .execute(&mut *self.tx)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Commits every write made through this unit of work.
    pub async fn commit(self) -> DbResult<()> {
        self.tx
            .commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))
    }

    /// Discards every write made through this unit of work.
    pub async fn rollback(self) -> DbResult<()> {
        self.tx
            .rollback()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))
    }
}

impl std::fmt::Debug for UnitOfWork {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UnitOfWork").finish_non_exhaustive()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::fixtures;
    use tally_core::InvoiceScope;

    #[tokio::test]
    async fn test_sequence_is_per_period() {
        let db = fixtures::memory_db().await;

        let mut uow = db.begin().await.unwrap();
        assert_eq!(uow.next_sequence("202505").await.unwrap(), 1);
        assert_eq!(uow.next_sequence("202505").await.unwrap(), 2);
        assert_eq!(uow.next_sequence("202506").await.unwrap(), 1);
        uow.commit().await.unwrap();

        let mut uow = db.begin().await.unwrap();
        assert_eq!(uow.next_sequence("202505").await.unwrap(), 3);
        uow.commit().await.unwrap();
    }

    #[tokio::test]
    async fn test_rollback_releases_sequence() {
        let db = fixtures::memory_db().await;

        let mut uow = db.begin().await.unwrap();
        assert_eq!(uow.next_sequence("202505").await.unwrap(), 1);
        uow.rollback().await.unwrap();

        let mut uow = db.begin().await.unwrap();
        assert_eq!(uow.next_sequence("202505").await.unwrap(), 1);
        uow.commit().await.unwrap();
    }

    #[tokio::test]
    async fn test_conditional_decrement() {
        let db = fixtures::memory_db().await;
        let widget = fixtures::item("Widget", "WIDGE-0001", 5, 3000, 5000);
        fixtures::insert_items(&db, &[&widget]).await;

        let mut uow = db.begin().await.unwrap();
        assert!(uow.decrement_stock(&widget.id, 3).await.unwrap());
        assert!(!uow.decrement_stock(&widget.id, 3).await.unwrap());
        assert_eq!(uow.stock_of(&widget.id).await.unwrap(), Some(2));
        assert!(!uow.decrement_stock("missing", 1).await.unwrap());
        assert_eq!(uow.stock_of("missing").await.unwrap(), None);
        uow.commit().await.unwrap();

        let stored = db.items().get_by_id(&widget.id).await.unwrap().unwrap();
        assert_eq!(stored.quantity, 2);
    }

    #[tokio::test]
    async fn test_items_by_ids() {
        let db = fixtures::memory_db().await;
        let a = fixtures::item("A", "AAAAA-0001", 1, 1, 2);
        let b = fixtures::item("B", "BBBBB-0001", 2, 1, 2);
        fixtures::insert_items(&db, &[&a, &b]).await;

        let mut uow = db.begin().await.unwrap();
        assert!(uow.items_by_ids(&[]).await.unwrap().is_empty());

        let found = uow
            .items_by_ids(&[a.id.clone(), "missing".to_string(), b.id.clone()])
            .await
            .unwrap();
        assert_eq!(found.len(), 2);
        uow.rollback().await.unwrap();
    }

    #[tokio::test]
    async fn test_dropped_unit_of_work_rolls_back() {
        let db = fixtures::memory_db().await;
        let widget = fixtures::item("Widget", "WIDGE-0001", 5, 3000, 5000);
        fixtures::insert_items(&db, &[&widget]).await;
        let invoice = fixtures::invoice(
            "INV-202505-0001",
            "alice",
            chrono::Utc::now(),
            &[(&widget, 2)],
        );

        {
            let mut uow = db.begin().await.unwrap();
            uow.insert_invoice(&invoice).await.unwrap();
            assert!(uow.decrement_stock(&widget.id, 2).await.unwrap());
        }

        let missing = db
            .invoices()
            .get_by_id(&invoice.id, &InvoiceScope::all())
            .await
            .unwrap();
        assert!(missing.is_none());
        let stored = db.items().get_by_id(&widget.id).await.unwrap().unwrap();
        assert_eq!(stored.quantity, 5);
    }

    #[tokio::test]
    async fn test_duplicate_reference_rejected() {
        let db = fixtures::memory_db().await;
        let widget = fixtures::item("Widget", "WIDGE-0001", 5, 3000, 5000);
        fixtures::insert_items(&db, &[&widget]).await;

        let first = fixtures::invoice("INV-202505-0001", "a", chrono::Utc::now(), &[(&widget, 1)]);
        let second = fixtures::invoice("INV-202505-0001", "a", chrono::Utc::now(), &[(&widget, 1)]);
        fixtures::insert_invoice(&db, &first).await;

        let mut uow = db.begin().await.unwrap();
        let err = uow.insert_invoice(&second).await.unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));
    }
}
