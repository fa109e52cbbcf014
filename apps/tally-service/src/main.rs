//! # Tally Service
//!
//! Runs the background side of the service: the daily report scheduler and
//! the report-mail consumer.
//!
//! ## Startup
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  ServiceConfig::load()                                                  │
//! │       │                                                                 │
//! │  Database::new  (migrations)      RedisQueue::connect                   │
//! │       │                                  │                              │
//! │       └──► SalesAggregator ──► ReportDistributor ◄── Mailer             │
//! │                                    │          │                         │
//! │                          start_consumer   ReportScheduler::run          │
//! │                                    │          │                         │
//! │  ctrl-c / SIGTERM ──► stop both ──► close queue ──► close database      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::Arc;

use anyhow::Context;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use tally_db::{Database, DbConfig};
use tally_queue::{QueueClient, RedisQueue, RedisQueueConfig};
use tally_service::{
    HttpMailer, LogMailer, Mailer, ReportDistributor, ReportScheduler, SalesAggregator,
    ServiceConfig,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(true)
        .init();

    info!("Starting tally service...");

    // Load configuration
    let config = ServiceConfig::load().context("loading configuration")?;
    info!(
        database = %config.database_path,
        queue = %format!("{}:{}", config.queue_host, config.queue_port),
        report_time = %config.report_time,
        admin_email = ?config.admin_email,
        "Configuration loaded"
    );

    // Open database
    let db = Database::new(
        DbConfig::new(&config.database_path).max_connections(config.database_max_connections),
    )
    .await
    .context("opening database")?;
    info!("Database ready");

    // Connect to queue
    let queue = Arc::new(
        RedisQueue::connect(
            RedisQueueConfig::new(&config.queue_host, config.queue_port)
                .group(&config.queue_consumer_group)
                .consumer(&config.queue_consumer_name),
        )
        .await
        .context("connecting to queue")?,
    );

    // Pick mailer
    let mailer: Arc<dyn Mailer> = match &config.mail_relay_url {
        Some(url) => {
            info!(relay = %url, "Mail relay configured");
            Arc::new(HttpMailer::new(url.as_str()).context("building mail client")?)
        }
        None => {
            warn!("MAIL_RELAY_URL not set, reports will only be logged");
            Arc::new(LogMailer)
        }
    };

    let distributor = ReportDistributor::new(
        SalesAggregator::new(db.clone()),
        Arc::clone(&queue) as Arc<dyn QueueClient>,
        mailer,
        config.admin_email.clone(),
        config.mail_from.clone(),
    );

    // Start background workers
    let consumer = distributor
        .start_consumer()
        .await
        .context("starting report consumer")?;

    let (scheduler, scheduler_handle) = ReportScheduler::new(distributor, config.report_time);
    let scheduler_task = tokio::spawn(scheduler.run());

    info!("Tally service running");
    shutdown_signal().await;

    // Stop workers
    scheduler_handle.shutdown().await;
    if let Err(e) = scheduler_task.await {
        error!(error = %e, "Report scheduler task failed");
    }
    consumer.shutdown().await;

    match Arc::try_unwrap(queue) {
        Ok(queue) => queue.close().await,
        Err(_) => warn!("Queue still shared at shutdown, leaving connection to drop"),
    }
    db.close().await;

    info!("Shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received, starting graceful shutdown...");
}
