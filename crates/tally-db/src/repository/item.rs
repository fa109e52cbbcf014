//! # Item Repository
//!
//! Catalog lookups for items and their stock.
//!
//! Stock is only ever decremented inside an invoice transaction, see
//! [`crate::UnitOfWork::decrement_stock`]. This repository never writes
//! `quantity` after insert.

use sqlx::SqlitePool;
use tracing::debug;

use crate::error::DbResult;
use tally_core::Item;

const ITEM_COLUMNS: &str =
    "id, name, sku, quantity, unit_price_cents, sale_price_cents, created_at";

/// Repository for item database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = db.items();
///
/// let item = repo.get_by_sku("WIDGE-0001").await?;
/// ```
#[derive(Debug, Clone)]
pub struct ItemRepository {
    pool: SqlitePool,
}

impl ItemRepository {
    /// Creates a new ItemRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ItemRepository { pool }
    }

    /// Gets an item by its ID.
    ///
    /// ## Returns
    /// * `Ok(Some(Item))` - Item found
    /// * `Ok(None)` - Item not found
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Item>> {
        let sql = format!("SELECT {ITEM_COLUMNS} FROM items WHERE id = ?1");

        let item = sqlx::query_as::<_, Item>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(item)
    }

    /// Gets an item by its SKU.
    pub async fn get_by_sku(&self, sku: &str) -> DbResult<Option<Item>> {
        let sql = format!("SELECT {ITEM_COLUMNS} FROM items WHERE sku = ?1");

        let item = sqlx::query_as::<_, Item>(&sql)
            .bind(sku)
            .fetch_optional(&self.pool)
            .await?;

        Ok(item)
    }

    /// Lists items ordered by SKU.
    pub async fn list(&self, skip: i64, take: i64) -> DbResult<Vec<Item>> {
        let sql = format!("SELECT {ITEM_COLUMNS} FROM items ORDER BY sku LIMIT ?1 OFFSET ?2");

        let items = sqlx::query_as::<_, Item>(&sql)
            .bind(take)
            .bind(skip)
            .fetch_all(&self.pool)
            .await?;

        Ok(items)
    }

    /// Counts catalog items.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM items")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    /// Inserts a new item.
    ///
    /// ## Returns
    /// * `Ok(Item)` - The inserted item
    /// * `Err(DbError::UniqueViolation)` - SKU already exists
    /// * `Err(DbError::CheckViolation)` - Negative stock or price
    pub async fn insert(&self, item: &Item) -> DbResult<Item> {
        debug!(sku = %item.sku, "Inserting item");

        sqlx::query(
            r#"
            INSERT INTO items (
                id, name, sku, quantity,
                unit_price_cents, sale_price_cents, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&item.id)
        .bind(&item.name)
        .bind(&item.sku)
        .bind(item.quantity)
        .bind(item.unit_price_cents)
        .bind(item.sale_price_cents)
        .bind(item.created_at)
        .execute(&self.pool)
        .await?;

        Ok(item.clone())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
