//! # Report Distributor
//!
//! Delivers sales reports on demand and through the durable queue.
//!
//! ## Flows
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  on_demand(request)                                                     │
//! │      DateRange::parse ──► SalesAggregator::generate ──► ReportArtifact   │
//! │                                                                         │
//! │  run_scheduled(today) / publish_report(range)                           │
//! │      generate ──► ReportMessage{filename, base64} ──► QueueClient       │
//! │                                     daily_sales_report ─┐               │
//! │                                                         │               │
//! │  start_consumer()                                       ▼               │
//! │      ReportMailHandler::handle(delivery)                                │
//! │          ├── malformed payload  → log, drop                             │
//! │          ├── no ADMIN_EMAIL     → log, drop                             │
//! │          └── Mail::report ──► Mailer::send  (failure logged)            │
//! │      ack after handle returns, whatever the outcome                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use tracing::{error, info, warn};

use tally_core::{DateRange, ReportArtifact, ReportRequest, DAILY_SALES_REPORT_QUEUE};
use tally_queue::{ConsumerHandle, Delivery, MessageHandler, QueueClient, ReportMessage};

use crate::error::ServiceResult;
use crate::mailer::{Attachment, Mail, Mailer};
use crate::services::report_service::SalesAggregator;

/// Report delivery: on demand, to the queue, and from the queue to mail.
#[derive(Clone)]
pub struct ReportDistributor {
    aggregator: SalesAggregator,
    queue: Arc<dyn QueueClient>,
    mailer: Arc<dyn Mailer>,
    admin_email: Option<String>,
    mail_from: String,
}

impl ReportDistributor {
    pub fn new(
        aggregator: SalesAggregator,
        queue: Arc<dyn QueueClient>,
        mailer: Arc<dyn Mailer>,
        admin_email: Option<String>,
        mail_from: impl Into<String>,
    ) -> Self {
        ReportDistributor {
            aggregator,
            queue,
            mailer,
            admin_email,
            mail_from: mail_from.into(),
        }
    }

    /// Generates a report for the caller to download.
    pub async fn on_demand(&self, request: &ReportRequest) -> ServiceResult<ReportArtifact> {
        let range = DateRange::parse(request.start_date.as_deref(), request.end_date.as_deref())?;
        self.aggregator.generate(&range).await
    }

    /// Generates a report and publishes it to the report queue.
    ///
    /// Returns the broker message ID.
    pub async fn publish_report(&self, range: &DateRange) -> ServiceResult<String> {
        let artifact = self.aggregator.generate(range).await?;
        let payload = ReportMessage::new(&artifact.filename, &artifact.content).to_payload()?;

        let id = self.queue.publish(DAILY_SALES_REPORT_QUEUE, &payload).await?;
        info!(
            queue = DAILY_SALES_REPORT_QUEUE,
            id = %id,
            filename = %artifact.filename,
            "Report published"
        );
        Ok(id)
    }

    /// The daily job: today's sales, published for mailing.
    pub async fn run_scheduled(&self, today: NaiveDate) -> ServiceResult<String> {
        self.publish_report(&DateRange::for_day(today)).await
    }

    /// Generates a report and mails it straight to `to`, bypassing the queue.
    pub async fn email_report(&self, to: &str, range: &DateRange) -> ServiceResult<()> {
        let artifact = self.aggregator.generate(range).await?;
        let mail = Mail::report(
            &self.mail_from,
            to,
            Attachment::pdf(artifact.filename, artifact.content),
            Utc::now(),
        );
        self.mailer.send(mail).await?;
        Ok(())
    }

    /// Starts the consumer that mails queued reports to the administrator.
    pub async fn start_consumer(&self) -> ServiceResult<ConsumerHandle> {
        if self.admin_email.is_none() {
            warn!("ADMIN_EMAIL not set, queued reports will be acknowledged without mailing");
        }

        let handler = Arc::new(ReportMailHandler {
            mailer: Arc::clone(&self.mailer),
            admin_email: self.admin_email.clone(),
            mail_from: self.mail_from.clone(),
        });

        let handle = self
            .queue
            .consume(DAILY_SALES_REPORT_QUEUE, handler)
            .await?;
        info!(queue = DAILY_SALES_REPORT_QUEUE, "Report consumer started");
        Ok(handle)
    }
}

impl std::fmt::Debug for ReportDistributor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReportDistributor")
            .field("admin_email", &self.admin_email)
            .field("mail_from", &self.mail_from)
            .finish_non_exhaustive()
    }
}

// =============================================================================
// Consumer
// =============================================================================

struct ReportMailHandler {
    mailer: Arc<dyn Mailer>,
    admin_email: Option<String>,
    mail_from: String,
}

#[async_trait]
impl MessageHandler for ReportMailHandler {
    async fn handle(&self, delivery: Delivery) {
        let decoded = ReportMessage::from_payload(&delivery.payload)
            .and_then(|message| message.content().map(|bytes| (message.filename, bytes)));
        let (filename, content) = match decoded {
            Ok(parts) => parts,
            Err(e) => {
                warn!(id = %delivery.id, error = %e, "Dropping malformed report message");
                return;
            }
        };

        let Some(to) = self.admin_email.as_deref() else {
            warn!(id = %delivery.id, filename = %filename, "No admin address, report not mailed");
            return;
        };

        let mail = Mail::report(
            &self.mail_from,
            to,
            Attachment::pdf(filename.clone(), content),
            Utc::now(),
        );

        match self.mailer.send(mail).await {
            Ok(()) => info!(id = %delivery.id, to = %to, filename = %filename, "Report mailed"),
            Err(e) => error!(id = %delivery.id, to = %to, error = %e, "Report mail failed"),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use chrono::TimeZone;
    use tally_db::Database;
    use tally_queue::InMemoryQueue;

    use crate::error::ServiceError;
    use crate::mailer::recording::RecordingMailer;
    use crate::mailer::REPORT_MAIL_SUBJECT;
    use crate::services::testing::{add_invoice, add_item, memory_db};

    fn jan15() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, 15).unwrap()
    }

    async fn with_sale_on_jan15() -> Database {
        let db = memory_db().await;
        let widget = add_item(&db, "SKU1", 10, 3000, 5000).await;
        add_invoice(
            &db,
            "INV-202501-0001",
            "a",
            Utc.with_ymd_and_hms(2025, 1, 15, 10, 0, 0).unwrap(),
            &[(&widget, 2)],
        )
        .await;
        db
    }

    fn distributor(
        db: Database,
        queue: &InMemoryQueue,
        mailer: Arc<RecordingMailer>,
        admin: Option<&str>,
    ) -> ReportDistributor {
        ReportDistributor::new(
            SalesAggregator::new(db),
            Arc::new(queue.clone()),
            mailer,
            admin.map(str::to_string),
            "reports@tally.local",
        )
    }

    async fn wait_for_acks(queue: &InMemoryQueue, expected: usize) {
        for _ in 0..200 {
            if queue.acked() >= expected {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("expected {expected} acks, saw {}", queue.acked());
    }

    #[tokio::test]
    async fn test_on_demand() {
        let queue = InMemoryQueue::new();
        let mailer = Arc::new(RecordingMailer::default());
        let dist = distributor(with_sale_on_jan15().await, &queue, mailer, None);

        let artifact = dist
            .on_demand(&ReportRequest {
                start_date: Some("2025-01-01".to_string()),
                end_date: None,
            })
            .await
            .unwrap();
        assert_eq!(artifact.filename, "sales-report-2025-01-01.pdf");
        assert_eq!(queue.published(), 0);

        let err = dist
            .on_demand(&ReportRequest {
                start_date: Some("2025-03-01".to_string()),
                end_date: Some("2025-03-31".to_string()),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::NoDataFound));

        let err = dist
            .on_demand(&ReportRequest {
                start_date: Some("not a date".to_string()),
                end_date: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidRequest(_)));
    }

    #[tokio::test]
    async fn test_scheduled_run_mails_admin_once() {
        let queue = InMemoryQueue::new();
        let mailer = Arc::new(RecordingMailer::default());
        let dist = distributor(
            with_sale_on_jan15().await,
            &queue,
            mailer.clone(),
            Some("admin@example.com"),
        );

        let consumer = dist.start_consumer().await.unwrap();
        dist.run_scheduled(jan15()).await.unwrap();
        wait_for_acks(&queue, 1).await;
        consumer.shutdown().await;

        let sent = mailer.sent().await;
        assert_eq!(sent.len(), 1);
        assert_eq!(queue.published(), 1);
        assert_eq!(queue.acked(), 1);

        let mail = &sent[0];
        assert_eq!(mail.to, "admin@example.com");
        assert_eq!(mail.from, "reports@tally.local");
        assert_eq!(mail.subject, REPORT_MAIL_SUBJECT);
        assert_eq!(
            mail.attachments[0].filename,
            "sales-report-2025-01-15_2025-01-15.pdf"
        );
        assert!(mail.attachments[0].content.starts_with(b"%PDF-"));
    }

    #[tokio::test]
    async fn test_scheduled_run_without_sales_publishes_nothing() {
        let queue = InMemoryQueue::new();
        let mailer = Arc::new(RecordingMailer::default());
        let dist = distributor(
            with_sale_on_jan15().await,
            &queue,
            mailer,
            Some("admin@example.com"),
        );

        let err = dist
            .run_scheduled(NaiveDate::from_ymd_opt(2025, 1, 16).unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::NoDataFound));
        assert_eq!(queue.published(), 0);
    }

    #[tokio::test]
    async fn test_missing_admin_acks_without_mail() {
        let queue = InMemoryQueue::new();
        let mailer = Arc::new(RecordingMailer::default());
        let dist = distributor(with_sale_on_jan15().await, &queue, mailer.clone(), None);

        let consumer = dist.start_consumer().await.unwrap();
        dist.run_scheduled(jan15()).await.unwrap();
        wait_for_acks(&queue, 1).await;
        consumer.shutdown().await;

        assert_eq!(mailer.attempts(), 0);
        assert_eq!(queue.acked(), 1);
    }

    #[tokio::test]
    async fn test_mail_failure_still_acks() {
        let queue = InMemoryQueue::new();
        let mailer = Arc::new(RecordingMailer::failing());
        let dist = distributor(
            with_sale_on_jan15().await,
            &queue,
            mailer.clone(),
            Some("admin@example.com"),
        );

        let consumer = dist.start_consumer().await.unwrap();
        dist.run_scheduled(jan15()).await.unwrap();
        wait_for_acks(&queue, 1).await;
        consumer.shutdown().await;

        assert_eq!(mailer.attempts(), 1);
        assert!(mailer.sent().await.is_empty());
        assert_eq!(queue.acked(), 1);
    }

    #[tokio::test]
    async fn test_malformed_message_dropped() {
        let queue = InMemoryQueue::new();
        let mailer = Arc::new(RecordingMailer::default());
        let dist = distributor(
            with_sale_on_jan15().await,
            &queue,
            mailer.clone(),
            Some("admin@example.com"),
        );

        let consumer = dist.start_consumer().await.unwrap();
        queue
            .publish(DAILY_SALES_REPORT_QUEUE, b"{not json")
            .await
            .unwrap();
        wait_for_acks(&queue, 1).await;
        consumer.shutdown().await;

        assert_eq!(mailer.attempts(), 0);
    }

    #[tokio::test]
    async fn test_email_report_direct() {
        let queue = InMemoryQueue::new();
        let mailer = Arc::new(RecordingMailer::default());
        let dist = distributor(with_sale_on_jan15().await, &queue, mailer.clone(), None);

        dist.email_report("boss@example.com", &DateRange::all())
            .await
            .unwrap();

        let sent = mailer.sent().await;
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, "boss@example.com");
        assert_eq!(sent[0].attachments[0].filename, "sales-report.pdf");
        assert_eq!(queue.published(), 0);

        let failing = distributor(
            with_sale_on_jan15().await,
            &queue,
            Arc::new(RecordingMailer::failing()),
            None,
        );
        let err = failing
            .email_report("boss@example.com", &DateRange::all())
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Internal(_)));
    }
}
