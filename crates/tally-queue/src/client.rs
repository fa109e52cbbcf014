//! # Queue Client Seam
//!
//! ```text
//! ┌──────────────┐  publish(queue, payload)   ┌──────────────────────────┐
//! │  producer    │ ─────────────────────────► │  QueueClient             │
//! └──────────────┘                            │  (RedisQueue / InMemory) │
//!                                             └────────────┬─────────────┘
//!                                                          │ one delivery
//!                                                          ▼
//!                                             ┌──────────────────────────┐
//!                                             │  MessageHandler::handle  │
//!                                             └────────────┬─────────────┘
//!                                                          │ returns
//!                                                          ▼
//!                                                     ack (exactly once)
//! ```
//!
//! Delivery is at-most-once per consumer run: a message is acknowledged
//! once, after the handler returns, whatever the handler did. Failures are
//! not retried; handlers log their own. Only an entry whose handler never
//! returned (a crash) or whose ack failed is read again, by the next
//! consumer start.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::warn;

use crate::error::QueueResult;

/// One message handed to a consumer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    /// Broker-assigned message ID.
    pub id: String,

    /// Queue the message came from.
    pub queue: String,

    pub payload: Vec<u8>,
}

/// Consumer-side callback. Called once per delivery.
#[async_trait]
pub trait MessageHandler: Send + Sync {
    async fn handle(&self, delivery: Delivery);
}

/// Publish / consume over a durable queue.
#[async_trait]
pub trait QueueClient: Send + Sync {
    /// Appends a payload to `queue`, creating the queue if needed.
    async fn publish(&self, queue: &str, payload: &[u8]) -> QueueResult<String>;

    /// Starts a background consumer on `queue`.
    ///
    /// The consumer runs until [`ConsumerHandle::shutdown`] is called.
    async fn consume(
        &self,
        queue: &str,
        handler: Arc<dyn MessageHandler>,
    ) -> QueueResult<ConsumerHandle>;
}

/// Handle for a running consumer task.
#[derive(Debug)]
pub struct ConsumerHandle {
    shutdown_tx: mpsc::Sender<()>,
    task: JoinHandle<()>,
}

impl ConsumerHandle {
    pub(crate) fn new(shutdown_tx: mpsc::Sender<()>, task: JoinHandle<()>) -> Self {
        ConsumerHandle { shutdown_tx, task }
    }

    /// Stops the consumer after the current delivery and waits for it.
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(()).await;
        if let Err(e) = self.task.await {
            warn!(error = %e, "Consumer task ended abnormally");
        }
    }
}
