//! # Report Scheduler
//!
//! Publishes the day's sales report once a day at a fixed UTC time.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │  loop                                                          │
//! │    sleep until next_run(now, REPORT_TIME)                      │
//! │      └─► ReportDistributor::run_scheduled(today)               │
//! │            ├── Ok(id)        → info                            │
//! │            ├── NoDataFound   → info, nothing published         │
//! │            └── other error   → error, loop continues           │
//! │    shutdown signal → break                                     │
//! └────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use tokio::sync::mpsc;
use tracing::{error, info, warn};

use crate::error::ServiceError;
use crate::services::distributor::ReportDistributor;

/// Next instant at `time` (UTC) strictly after `now`.
pub fn next_run(now: DateTime<Utc>, time: NaiveTime) -> DateTime<Utc> {
    let today = now.date_naive().and_time(time).and_utc();
    if today > now {
        today
    } else {
        today + Duration::days(1)
    }
}

/// Daily report job.
#[derive(Debug)]
pub struct ReportScheduler {
    distributor: ReportDistributor,

    /// Time of day (UTC) the report runs.
    report_time: NaiveTime,

    shutdown_rx: mpsc::Receiver<()>,
}

/// Handle for stopping the scheduler.
#[derive(Debug, Clone)]
pub struct ReportSchedulerHandle {
    shutdown_tx: mpsc::Sender<()>,
}

impl ReportSchedulerHandle {
    /// Triggers graceful shutdown.
    pub async fn shutdown(&self) {
        if self.shutdown_tx.send(()).await.is_err() {
            warn!("Report scheduler already stopped");
        }
    }
}

impl ReportScheduler {
    /// Creates a scheduler and its handle.
    pub fn new(
        distributor: ReportDistributor,
        report_time: NaiveTime,
    ) -> (Self, ReportSchedulerHandle) {
        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);

        let scheduler = ReportScheduler {
            distributor,
            report_time,
            shutdown_rx,
        };

        (scheduler, ReportSchedulerHandle { shutdown_tx })
    }

    /// Runs the scheduler loop.
    ///
    /// This should be spawned as a background task.
    pub async fn run(mut self) {
        info!(report_time = %self.report_time, "Report scheduler starting");

        loop {
            let now = Utc::now();
            let at = next_run(now, self.report_time);
            let wait = (at - now).to_std().unwrap_or_default();

            tokio::select! {
                _ = tokio::time::sleep(wait) => {
                    self.run_once(at.date_naive()).await;
                }

                _ = self.shutdown_rx.recv() => {
                    info!("Report scheduler shutting down");
                    break;
                }
            }
        }

        info!("Report scheduler stopped");
    }

    /// One scheduled run. Never fails; outcomes are logged.
    async fn run_once(&self, day: NaiveDate) {
        match self.distributor.run_scheduled(day).await {
            Ok(id) => info!(day = %day, id = %id, "Daily sales report queued"),
            Err(ServiceError::NoDataFound) => {
                info!(day = %day, "No sales for the day, nothing to report")
            }
            Err(e) => error!(day = %day, error = %e, "Daily sales report failed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use chrono::TimeZone;
    use tally_queue::InMemoryQueue;

    use crate::mailer::LogMailer;
    use crate::services::report_service::SalesAggregator;
    use crate::services::testing::{add_invoice, add_item, memory_db};

    fn noon() -> NaiveTime {
        NaiveTime::from_hms_opt(12, 0, 0).unwrap()
    }

    #[test]
    fn test_next_run_later_today() {
        let now = Utc.with_ymd_and_hms(2025, 5, 19, 9, 30, 0).unwrap();
        assert_eq!(
            next_run(now, noon()),
            Utc.with_ymd_and_hms(2025, 5, 19, 12, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_next_run_rolls_to_tomorrow() {
        let at_noon = Utc.with_ymd_and_hms(2025, 5, 19, 12, 0, 0).unwrap();
        assert_eq!(
            next_run(at_noon, noon()),
            Utc.with_ymd_and_hms(2025, 5, 20, 12, 0, 0).unwrap()
        );

        let late = Utc.with_ymd_and_hms(2025, 12, 31, 23, 0, 0).unwrap();
        assert_eq!(
            next_run(late, noon()),
            Utc.with_ymd_and_hms(2026, 1, 1, 12, 0, 0).unwrap()
        );
    }

    async fn scheduler(queue: &InMemoryQueue) -> (ReportScheduler, ReportSchedulerHandle) {
        let db = memory_db().await;
        let widget = add_item(&db, "SKU1", 10, 100, 200).await;
        add_invoice(
            &db,
            "INV-202501-0001",
            "a",
            Utc.with_ymd_and_hms(2025, 1, 15, 10, 0, 0).unwrap(),
            &[(&widget, 1)],
        )
        .await;

        let distributor = ReportDistributor::new(
            SalesAggregator::new(db),
            Arc::new(queue.clone()),
            Arc::new(LogMailer),
            None,
            "reports@tally.local",
        );
        ReportScheduler::new(distributor, noon())
    }

    #[tokio::test]
    async fn test_run_once_publishes_or_skips() {
        let queue = InMemoryQueue::new();
        let (scheduler, _handle) = scheduler(&queue).await;

        scheduler
            .run_once(NaiveDate::from_ymd_opt(2025, 1, 16).unwrap())
            .await;
        assert_eq!(queue.published(), 0);

        scheduler
            .run_once(NaiveDate::from_ymd_opt(2025, 1, 15).unwrap())
            .await;
        assert_eq!(queue.published(), 1);
    }

    #[tokio::test]
    async fn test_shutdown_stops_loop() {
        let queue = InMemoryQueue::new();
        let (scheduler, handle) = scheduler(&queue).await;

        let task = tokio::spawn(scheduler.run());
        handle.shutdown().await;

        tokio::time::timeout(std::time::Duration::from_secs(5), task)
            .await
            .unwrap()
            .unwrap();
    }
}
