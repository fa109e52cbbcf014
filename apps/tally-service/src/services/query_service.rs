//! Read-side invoice queries with pagination and owner scope.

use tracing::debug;

use tally_core::{
    CoreError, DateRange, Invoice, InvoiceListRequest, InvoiceScope, Page, PageMeta,
    PaginationParams,
};
use tally_db::Database;

use crate::error::ServiceResult;

/// Paginated, scoped invoice reads.
#[derive(Debug, Clone)]
pub struct QueryService {
    db: Database,
}

impl QueryService {
    pub fn new(db: Database) -> Self {
        QueryService { db }
    }

    /// Lists invoices newest first with page metadata.
    ///
    /// `page` and `limit` default to 1 and 10 and are clamped to at least 1.
    /// A page past the end returns empty `data` with the correct totals.
    pub async fn list_invoices(
        &self,
        request: &InvoiceListRequest,
        scope: &InvoiceScope,
    ) -> ServiceResult<Page<Invoice>> {
        let params = PaginationParams::from_request(request.page, request.limit);
        let range = DateRange::parse(request.start_date.as_deref(), request.end_date.as_deref())?;

        let repo = self.db.invoices();
        let total = repo.count(scope, &range).await?;
        let data = repo.list(scope, &range, params.skip, params.take).await?;

        debug!(
            total = total,
            page = params.page,
            returned = data.len(),
            "Listed invoices"
        );

        Ok(Page {
            data,
            meta: PageMeta::new(params, total),
        })
    }

    /// Fetches one invoice with its lines.
    ///
    /// An invoice outside the caller's scope is reported as not found.
    pub async fn get_invoice(&self, id: &str, scope: &InvoiceScope) -> ServiceResult<Invoice> {
        self.db
            .invoices()
            .get_by_id(id, scope)
            .await?
            .ok_or_else(|| CoreError::InvoiceNotFound(id.to_string()).into())
    }
}
