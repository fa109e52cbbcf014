//! # In-Process Queue
//!
//! Channel-backed [`QueueClient`] for tests and single-process runs.
//! Messages published before a consumer starts are buffered. One consumer
//! per queue; acknowledgements are counted so tests can assert on them.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, info};

use crate::client::{ConsumerHandle, Delivery, MessageHandler, QueueClient};
use crate::error::{QueueError, QueueResult};

struct Channel {
    tx: mpsc::UnboundedSender<Delivery>,
    rx: Option<mpsc::UnboundedReceiver<Delivery>>,
}

impl Channel {
    fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Channel { tx, rx: Some(rx) }
    }
}

/// In-memory queue client.
#[derive(Clone, Default)]
pub struct InMemoryQueue {
    channels: Arc<Mutex<HashMap<String, Channel>>>,
    next_id: Arc<AtomicU64>,
    published: Arc<AtomicUsize>,
    acked: Arc<AtomicUsize>,
}

impl InMemoryQueue {
    pub fn new() -> Self {
        InMemoryQueue::default()
    }

    /// Messages published so far, across all queues.
    pub fn published(&self) -> usize {
        self.published.load(Ordering::SeqCst)
    }

    /// Messages acknowledged so far, across all queues.
    pub fn acked(&self) -> usize {
        self.acked.load(Ordering::SeqCst)
    }
}

impl std::fmt::Debug for InMemoryQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryQueue")
            .field("published", &self.published())
            .field("acked", &self.acked())
            .finish()
    }
}

#[async_trait]
impl QueueClient for InMemoryQueue {
    async fn publish(&self, queue: &str, payload: &[u8]) -> QueueResult<String> {
        let id = format!("{}-0", self.next_id.fetch_add(1, Ordering::SeqCst) + 1);
        let delivery = Delivery {
            id: id.clone(),
            queue: queue.to_string(),
            payload: payload.to_vec(),
        };

        let mut channels = self.channels.lock().await;
        let channel = channels
            .entry(queue.to_string())
            .or_insert_with(Channel::new);
        channel.tx.send(delivery).map_err(|_| QueueError::Closed)?;

        self.published.fetch_add(1, Ordering::SeqCst);
        debug!(queue = %queue, id = %id, "Published message");
        Ok(id)
    }

    async fn consume(
        &self,
        queue: &str,
        handler: Arc<dyn MessageHandler>,
    ) -> QueueResult<ConsumerHandle> {
        let mut rx = {
            let mut channels = self.channels.lock().await;
            let channel = channels
                .entry(queue.to_string())
                .or_insert_with(Channel::new);
            channel.rx.take().ok_or_else(|| {
                QueueError::ConsumerGroup(format!("queue '{queue}' already has a consumer"))
            })?
        };

        let (shutdown_tx, mut shutdown_rx) = mpsc::channel::<()>(1);
        let acked = Arc::clone(&self.acked);
        let queue_name = queue.to_string();

        let task = tokio::spawn(async move {
            info!(queue = %queue_name, "In-memory consumer started");
            loop {
                tokio::select! {
                    _ = shutdown_rx.recv() => break,
                    delivery = rx.recv() => {
                        let Some(delivery) = delivery else { break };
                        let id = delivery.id.clone();
                        handler.handle(delivery).await;
                        acked.fetch_add(1, Ordering::SeqCst);
                        debug!(queue = %queue_name, id = %id, "Acknowledged message");
                    }
                }
            }
            info!(queue = %queue_name, "In-memory consumer stopped");
        });

        Ok(ConsumerHandle::new(shutdown_tx, task))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[derive(Default)]
    struct Collect {
        seen: Mutex<Vec<Vec<u8>>>,
    }

    #[async_trait]
    impl MessageHandler for Collect {
        async fn handle(&self, delivery: Delivery) {
            self.seen.lock().await.push(delivery.payload);
        }
    }

    async fn wait_for_acks(queue: &InMemoryQueue, expected: usize) {
        for _ in 0..100 {
            if queue.acked() >= expected {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("expected {expected} acks, saw {}", queue.acked());
    }

    #[tokio::test]
    async fn test_buffered_then_live_delivery() {
        let queue = InMemoryQueue::new();
        queue.publish("reports", b"first").await.unwrap();

        let handler = Arc::new(Collect::default());
        let consumer = queue.consume("reports", handler.clone()).await.unwrap();

        queue.publish("reports", b"second").await.unwrap();
        wait_for_acks(&queue, 2).await;

        consumer.shutdown().await;

        let seen = handler.seen.lock().await;
        assert_eq!(*seen, vec![b"first".to_vec(), b"second".to_vec()]);
        assert_eq!(queue.published(), 2);
        assert_eq!(queue.acked(), 2);
    }

    #[tokio::test]
    async fn test_single_consumer_per_queue() {
        let queue = InMemoryQueue::new();
        let handler = Arc::new(Collect::default());

        let consumer = queue.consume("reports", handler.clone()).await.unwrap();
        let second = queue.consume("reports", handler).await;
        assert!(matches!(second, Err(QueueError::ConsumerGroup(_))));

        consumer.shutdown().await;
    }
}
