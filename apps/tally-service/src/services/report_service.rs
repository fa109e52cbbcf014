//! # Sales Aggregator
//!
//! Turns committed invoice lines into a per-SKU sales report and renders it.
//!
//! ```text
//! DateRange ──► SalesRepository::lines_in_range ──► aggregate_sales ──► SalesReport
//!                                                                          │
//!                                                      render_report ◄─────┘
//!                                                          │
//!                                                          ▼
//!                                                   ReportArtifact (PDF)
//! ```

use chrono::Utc;
use tracing::{debug, info};

use tally_core::render::render_report;
use tally_core::report::aggregate_sales;
use tally_core::{DateRange, ReportArtifact, SalesReport};
use tally_db::Database;

use crate::error::ServiceResult;

#[derive(Debug, Clone)]
pub struct SalesAggregator {
    db: Database,
}

impl SalesAggregator {
    pub fn new(db: Database) -> Self {
        SalesAggregator { db }
    }

    /// Aggregates sales in `range` (inclusive, either bound optional).
    ///
    /// Fails with `NoDataFound` when no invoice line falls in the range.
    pub async fn aggregate(&self, range: &DateRange) -> ServiceResult<SalesReport> {
        let lines = self.db.sales().lines_in_range(range).await?;
        debug!(lines = lines.len(), "Aggregating sales");

        let report = aggregate_sales(*range, lines)?;
        Ok(report)
    }

    /// Aggregates and renders in one step.
    pub async fn generate(&self, range: &DateRange) -> ServiceResult<ReportArtifact> {
        let report = self.aggregate(range).await?;
        let artifact = render_report(&report, Utc::now())?;

        info!(
            filename = %artifact.filename,
            skus = report.items.len(),
            total = %report.total_amount,
            bytes = artifact.content.len(),
            "Sales report generated"
        );
        Ok(artifact)
    }
}
