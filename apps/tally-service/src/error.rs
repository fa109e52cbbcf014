//! # Service Error Type
//!
//! The caller-facing error taxonomy.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  ValidationError ──► CoreError::Validation ──► InvalidRequest    (400)  │
//! │  CoreError::ItemNotFound ────────────────────► ItemNotFound      (404)  │
//! │  CoreError::InsufficientStock ───────────────► InsufficientStock (409)  │
//! │  CoreError::InvoiceNotFound ─────────────────► NotFound          (404)  │
//! │  CoreError::NoSalesData ─────────────────────► NoDataFound       (404)  │
//! │                                                                         │
//! │  DbError / QueueError / MailError ──► logged ──► Internal        (500)  │
//! │  CoreError::Render ─────────────────► logged ──► Internal        (500)  │
//! │                                       (generic message to caller)       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Domain errors pass through with their detail; infrastructure detail never
//! reaches the caller.

use serde::Serialize;
use tally_core::CoreError;
use tally_db::DbError;
use tally_queue::QueueError;

use crate::mailer::MailError;

/// Result type alias for service operations.
pub type ServiceResult<T> = Result<T, ServiceError>;

/// Service error returned from every public operation.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// Malformed or missing input.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// A requested item does not exist.
    #[error("Item not found: {0}")]
    ItemNotFound(String),

    /// Not enough stock for a line.
    #[error("Insufficient stock for item {item_id}: requested {requested}, available {available}")]
    InsufficientStock {
        item_id: String,
        requested: i64,
        available: i64,
    },

    /// No record matches the id within the caller's scope.
    #[error("{0}")]
    NotFound(String),

    /// Report aggregation matched no sales.
    #[error("No sales data found for the requested period")]
    NoDataFound,

    /// Storage, queue or mail failure. Already logged.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Machine-readable error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    InvalidRequest,
    ItemNotFound,
    InsufficientStock,
    NotFound,
    NoDataFound,
    Internal,
}

/// Serializable error body for the transport layer.
///
/// ```json
/// {
///   "code": "INSUFFICIENT_STOCK",
///   "message": "Insufficient stock for item abc: requested 5, available 3",
///   "requested": 5,
///   "available": 3
/// }
/// ```
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    pub code: ErrorCode,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requested: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub available: Option<i64>,
}

impl ServiceError {
    /// Creates an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        ServiceError::Internal(message.into())
    }

    /// Machine-readable code.
    pub fn code(&self) -> ErrorCode {
        match self {
            ServiceError::InvalidRequest(_) => ErrorCode::InvalidRequest,
            ServiceError::ItemNotFound(_) => ErrorCode::ItemNotFound,
            ServiceError::InsufficientStock { .. } => ErrorCode::InsufficientStock,
            ServiceError::NotFound(_) => ErrorCode::NotFound,
            ServiceError::NoDataFound => ErrorCode::NoDataFound,
            ServiceError::Internal(_) => ErrorCode::Internal,
        }
    }

    /// HTTP-equivalent status for the transport layer.
    pub fn status_code(&self) -> u16 {
        match self {
            ServiceError::InvalidRequest(_) => 400,
            ServiceError::ItemNotFound(_) | ServiceError::NotFound(_) => 404,
            ServiceError::NoDataFound => 404,
            ServiceError::InsufficientStock { .. } => 409,
            ServiceError::Internal(_) => 500,
        }
    }

    /// Body the transport layer sends back.
    pub fn to_body(&self) -> ErrorBody {
        let (requested, available) = match self {
            ServiceError::InsufficientStock {
                requested,
                available,
                ..
            } => (Some(*requested), Some(*available)),
            _ => (None, None),
        };

        ErrorBody {
            code: self.code(),
            message: self.to_string(),
            requested,
            available,
        }
    }
}

/// Converts core errors to service errors.
impl From<CoreError> for ServiceError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ItemNotFound(id) => ServiceError::ItemNotFound(id),
            CoreError::InsufficientStock {
                item_id,
                requested,
                available,
            } => ServiceError::InsufficientStock {
                item_id,
                requested,
                available,
            },
            CoreError::InvoiceNotFound(id) => {
                ServiceError::NotFound(format!("Invoice not found: {}", id))
            }
            CoreError::NoSalesData => ServiceError::NoDataFound,
            CoreError::Render(reason) => {
                tracing::error!(error = %reason, "Report rendering failed");
                ServiceError::internal("Report rendering failed")
            }
            CoreError::Validation(e) => ServiceError::InvalidRequest(e.to_string()),
        }
    }
}

impl From<tally_core::ValidationError> for ServiceError {
    fn from(err: tally_core::ValidationError) -> Self {
        ServiceError::InvalidRequest(err.to_string())
    }
}

/// Converts database errors to service errors.
impl From<DbError> for ServiceError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => {
                ServiceError::NotFound(format!("{} not found: {}", entity, id))
            }
            DbError::PoolExhausted => {
                tracing::error!("Database pool exhausted");
                ServiceError::internal("Database unavailable")
            }
            other => {
                // Log the actual error but return a generic message
                tracing::error!(error = %other, "Database operation failed");
                ServiceError::internal("Database operation failed")
            }
        }
    }
}

/// Converts queue errors to service errors.
impl From<QueueError> for ServiceError {
    fn from(err: QueueError) -> Self {
        tracing::error!(error = %err, "Queue operation failed");
        ServiceError::internal("Queue operation failed")
    }
}

/// Converts mail errors to service errors.
impl From<MailError> for ServiceError {
    fn from(err: MailError) -> Self {
        tracing::error!(error = %err, "Mail dispatch failed");
        ServiceError::internal("Mail dispatch failed")
    }
}
