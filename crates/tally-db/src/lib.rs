//! # tally-db: Database Layer for Tally
//!
//! SQLite storage for the item catalog and the invoice ledger, via sqlx.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          Tally Data Flow                                │
//! │                                                                         │
//! │  InvoiceTransactionManager / QueryService / SalesAggregator             │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     tally-db (THIS CRATE)                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │               │    │  (embedded)  │  │   │
//! │  │   │               │    │ ItemRepo      │    │ 001_initial_ │  │   │
//! │  │   │ SqlitePool    │◄───│ InvoiceRepo   │    │   schema.sql │  │   │
//! │  │   │ begin() ──────┼─┐  │ SalesRepo     │    │              │  │   │
//! │  │   └───────────────┘ │  └───────────────┘    └──────────────┘  │   │
//! │  │                     ▼                                           │   │
//! │  │   ┌─────────────────────────────────────────────────────────┐  │   │
//! │  │   │ UnitOfWork (unit_of_work.rs)                            │  │   │
//! │  │   │ sequence bump • stock read • inserts • conditional dec. │  │   │
//! │  │   │ commit / rollback                                       │  │   │
//! │  │   └─────────────────────────────────────────────────────────┘  │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite database file (WAL)                                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Read/insert repositories (items, invoices, sales lines)
//! - [`unit_of_work`] - Explicit transaction for invoice creation
//!
//! ## Usage
//!
//! ```rust,ignore
//! use tally_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("./tally.db")).await?;
//!
//! let mut uow = db.begin().await?;
//! let seq = uow.next_sequence("202501").await?;
//! uow.commit().await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;
pub mod unit_of_work;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};
pub use unit_of_work::UnitOfWork;

pub use repository::invoice::InvoiceRepository;
pub use repository::item::ItemRepository;
pub use repository::sales::SalesRepository;
