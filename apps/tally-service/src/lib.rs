//! # tally-service
//!
//! Invoicing and sales-report distribution over the shared item catalog.
//!
//! ## Module Map
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  config     ServiceConfig from environment                              │
//! │  error      ServiceError taxonomy + transport error body                │
//! │  mailer     Mailer seam (HTTP relay, log-only)                          │
//! │  services   InvoiceTransactionManager  QueryService  SalesAggregator    │
//! │             ReportDistributor          ReportScheduler                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The transport layer (HTTP routing, authentication) lives outside this
//! crate. It supplies the caller's identity as an owner id or an
//! [`InvoiceScope`](tally_core::InvoiceScope) and maps [`ServiceError`]
//! through [`ServiceError::to_body`].

pub mod config;
pub mod error;
pub mod mailer;
pub mod services;

pub use config::{ConfigError, ServiceConfig};
pub use error::{ErrorBody, ErrorCode, ServiceError, ServiceResult};
pub use mailer::{Attachment, HttpMailer, LogMailer, Mail, MailError, Mailer};
pub use services::{
    InvoiceTransactionManager, QueryService, ReportDistributor, ReportScheduler,
    ReportSchedulerHandle, SalesAggregator,
};
