//! # Redis Streams Queue
//!
//! Durable queue on Redis Streams. Each entry is handled once per consumer run.
//!
//! ## Mapping
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  queue name          → stream key        (daily_sales_report)          │
//! │  publish(payload)    → XADD key * payload <bytes>                      │
//! │  consume(queue)      → XGROUP CREATE key <group> 0 MKSTREAM            │
//! │                        (BUSYGROUP = already exists, fine)              │
//! │                        XREADGROUP GROUP <group> <consumer>             │
//! │                          1. id 0.. → our own unacked entries, cursor   │
//! │                                      moves past each batch             │
//! │                          2. id >   → new entries, BLOCK                │
//! │  after handler       → XACK key <group> <id>                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The consumer blocks on its own connection so a long `XREADGROUP BLOCK`
//! never stalls publishes sharing the multiplexed one.
//!
//! An entry whose `XACK` fails stays in the pending list. The drain cursor
//! has already moved past it, so this run never handles it again; the next
//! consumer start picks it up.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::streams::{StreamReadOptions, StreamReadReply};
use redis::AsyncCommands;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::client::{ConsumerHandle, Delivery, MessageHandler, QueueClient};
use crate::error::{QueueError, QueueResult};

/// Stream entry field holding the message body.
const PAYLOAD_FIELD: &str = "payload";

/// Pause after a failed read before trying again.
const READ_RETRY_DELAY: Duration = Duration::from_secs(2);

// =============================================================================
// Configuration
// =============================================================================

/// Connection and consumer settings.
#[derive(Debug, Clone)]
pub struct RedisQueueConfig {
    pub host: String,
    pub port: u16,

    /// Consumer group shared by every service instance.
    pub group: String,

    /// This instance's consumer name. Keep it stable across restarts so
    /// unacknowledged entries are picked up again.
    pub consumer: String,

    /// How long one `XREADGROUP` waits for new entries.
    pub block: Duration,
}

impl RedisQueueConfig {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        RedisQueueConfig {
            host: host.into(),
            port,
            group: "tally-mailer".to_string(),
            consumer: "tally-service".to_string(),
            block: Duration::from_secs(5),
        }
    }

    pub fn group(mut self, group: impl Into<String>) -> Self {
        self.group = group.into();
        self
    }

    pub fn consumer(mut self, consumer: impl Into<String>) -> Self {
        self.consumer = consumer.into();
        self
    }

    pub fn block(mut self, block: Duration) -> Self {
        self.block = block;
        self
    }

    /// `redis://host:port/`
    pub fn url(&self) -> String {
        format!("redis://{}:{}/", self.host, self.port)
    }
}

// =============================================================================
// RedisQueue
// =============================================================================

/// Queue client backed by Redis Streams.
///
/// Only constructed through [`RedisQueue::connect`], so a live value always
/// holds a working connection.
#[derive(Clone)]
pub struct RedisQueue {
    client: redis::Client,
    conn: MultiplexedConnection,
    config: Arc<RedisQueueConfig>,
}

impl RedisQueue {
    /// Opens the connection used for publishing.
    ///
    /// ## Returns
    /// * `Err(QueueError::Connection)` - Broker unreachable
    pub async fn connect(config: RedisQueueConfig) -> QueueResult<Self> {
        let url = config.url();
        info!(url = %url, group = %config.group, "Connecting to queue");

        let client =
            redis::Client::open(url.as_str()).map_err(|e| QueueError::Connection(e.to_string()))?;
        let conn = client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| QueueError::Connection(e.to_string()))?;

        Ok(RedisQueue {
            client,
            conn,
            config: Arc::new(config),
        })
    }

    /// Drops the publishing connection. Running consumers are stopped
    /// through their own handles.
    pub async fn close(self) {
        info!("Closing queue connection");
        drop(self.conn);
    }

    async fn ensure_group(&self, queue: &str) -> QueueResult<()> {
        let mut conn = self.conn.clone();
        let created: redis::RedisResult<()> = conn
            .xgroup_create_mkstream(queue, &self.config.group, "0")
            .await;

        match created {
            Ok(()) => {
                info!(queue = %queue, group = %self.config.group, "Created consumer group");
                Ok(())
            }
            Err(e) if e.code() == Some("BUSYGROUP") => Ok(()),
            Err(e) => Err(QueueError::ConsumerGroup(e.to_string())),
        }
    }
}

impl std::fmt::Debug for RedisQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisQueue")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl QueueClient for RedisQueue {
    async fn publish(&self, queue: &str, payload: &[u8]) -> QueueResult<String> {
        let mut conn = self.conn.clone();
        let id: String = conn.xadd(queue, "*", &[(PAYLOAD_FIELD, payload)]).await?;

        debug!(queue = %queue, id = %id, bytes = payload.len(), "Published message");
        Ok(id)
    }

    async fn consume(
        &self,
        queue: &str,
        handler: Arc<dyn MessageHandler>,
    ) -> QueueResult<ConsumerHandle> {
        self.ensure_group(queue).await?;

        let read_conn = self
            .client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| QueueError::Connection(e.to_string()))?;

        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);
        let consumer = StreamConsumer {
            conn: read_conn,
            queue: queue.to_string(),
            config: Arc::clone(&self.config),
            handler,
            shutdown_rx,
        };

        let task = tokio::spawn(consumer.run());
        Ok(ConsumerHandle::new(shutdown_tx, task))
    }
}

// =============================================================================
// Consumer Loop
// =============================================================================

/// Where the next `XREADGROUP` starts.
#[derive(Debug, Clone, PartialEq, Eq)]
enum ReadCursor {
    /// Walking our own pending entries, strictly after this ID.
    Pending(String),
    /// Blocking for entries never delivered to anyone.
    New,
}

impl ReadCursor {
    fn start() -> Self {
        ReadCursor::Pending("0".to_string())
    }

    fn start_id(&self) -> &str {
        match self {
            ReadCursor::Pending(id) => id,
            ReadCursor::New => ">",
        }
    }

    fn blocks(&self) -> bool {
        matches!(self, ReadCursor::New)
    }

    /// Moves past `batch`. An empty pending batch ends the drain.
    fn advance(&self, batch: &[Delivery]) -> Self {
        match (self, batch.last()) {
            (ReadCursor::Pending(_), Some(last)) => ReadCursor::Pending(last.id.clone()),
            _ => ReadCursor::New,
        }
    }
}

struct StreamConsumer {
    conn: MultiplexedConnection,
    queue: String,
    config: Arc<RedisQueueConfig>,
    handler: Arc<dyn MessageHandler>,
    shutdown_rx: mpsc::Receiver<()>,
}

impl StreamConsumer {
    async fn run(mut self) {
        info!(
            queue = %self.queue,
            group = %self.config.group,
            consumer = %self.config.consumer,
            "Consumer started"
        );

        // Entries delivered to us before a restart but never acked come first.
        let mut cursor = ReadCursor::start();

        loop {
            let start_id = cursor.start_id().to_string();
            let block = cursor.blocks();

            tokio::select! {
                _ = self.shutdown_rx.recv() => {
                    info!(queue = %self.queue, "Consumer received shutdown");
                    break;
                }

                result = read_batch(&mut self.conn, &self.queue, &self.config, &start_id, block) => {
                    match result {
                        Ok(deliveries) => {
                            cursor = cursor.advance(&deliveries);
                            for delivery in deliveries {
                                self.deliver(delivery).await;
                            }
                        }
                        Err(e) => {
                            error!(queue = %self.queue, error = %e, "Queue read failed");
                            tokio::select! {
                                _ = self.shutdown_rx.recv() => break,
                                _ = tokio::time::sleep(READ_RETRY_DELAY) => {}
                            }
                        }
                    }
                }
            }
        }

        info!(queue = %self.queue, "Consumer stopped");
    }

    async fn deliver(&mut self, delivery: Delivery) {
        let id = delivery.id.clone();
        self.handler.handle(delivery).await;

        let acked: redis::RedisResult<i64> = self
            .conn
            .xack(&self.queue, &self.config.group, &[&id])
            .await;

        match acked {
            Ok(_) => debug!(queue = %self.queue, id = %id, "Acknowledged message"),
            Err(e) => warn!(
                queue = %self.queue,
                id = %id,
                error = %e,
                "Ack failed, entry stays pending until the consumer restarts"
            ),
        }
    }
}

async fn read_batch(
    conn: &mut MultiplexedConnection,
    queue: &str,
    config: &RedisQueueConfig,
    start_id: &str,
    block: bool,
) -> QueueResult<Vec<Delivery>> {
    let mut options = StreamReadOptions::default()
        .group(&config.group, &config.consumer)
        .count(10);
    if block {
        options = options.block(config.block.as_millis() as usize);
    }

    let reply: Option<StreamReadReply> = conn.xread_options(&[queue], &[start_id], &options).await?;

    let mut deliveries = Vec::new();
    for key in reply.map(|r| r.keys).unwrap_or_default() {
        for entry in key.ids {
            match entry.get::<Vec<u8>>(PAYLOAD_FIELD) {
                Some(payload) => deliveries.push(Delivery {
                    id: entry.id,
                    queue: queue.to_string(),
                    payload,
                }),
                None => {
                    // Still handed to the consumer so it gets acked and logged.
                    warn!(queue = %queue, id = %entry.id, "Entry has no payload field");
                    deliveries.push(Delivery {
                        id: entry.id,
                        queue: queue.to_string(),
                        payload: Vec::new(),
                    });
                }
            }
        }
    }

    Ok(deliveries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use redis::streams::StreamPendingReply;
    use redis::{ConnectionAddr, IntoConnectionInfo};

    fn delivery(id: &str) -> Delivery {
        Delivery {
            id: id.to_string(),
            queue: "reports".to_string(),
            payload: Vec::new(),
        }
    }

    #[test]
    fn test_cursor_walks_pending_then_blocks() {
        let cursor = ReadCursor::start();
        assert_eq!(cursor.start_id(), "0");
        assert!(!cursor.blocks());

        let cursor = cursor.advance(&[delivery("1-0"), delivery("2-0")]);
        assert_eq!(cursor, ReadCursor::Pending("2-0".to_string()));

        let cursor = cursor.advance(&[]);
        assert_eq!(cursor, ReadCursor::New);
        assert_eq!(cursor.start_id(), ">");
        assert!(cursor.blocks());

        assert_eq!(cursor.advance(&[delivery("3-0")]), ReadCursor::New);
    }

    #[test]
    fn test_cursor_never_rereads_unacked_entry() {
        // Same batch twice, as if both acks failed: the cursor still only moves forward.
        let batch = [delivery("5-0")];
        let cursor = ReadCursor::start().advance(&batch);
        assert_eq!(cursor.start_id(), "5-0");
        assert_eq!(cursor.advance(&batch).start_id(), "5-0");
    }

    #[test]
    fn test_config_defaults() {
        let config = RedisQueueConfig::new("127.0.0.1", 6379);
        assert_eq!(config.url(), "redis://127.0.0.1:6379/");
        assert_eq!(config.group, "tally-mailer");
        assert_eq!(config.block, Duration::from_secs(5));

        let config = config.group("mailers").consumer("node-2");
        assert_eq!(config.group, "mailers");
        assert_eq!(config.consumer, "node-2");
    }

    #[tokio::test]
    async fn test_connect_refused() {
        // Port 1 is never a Redis server.
        let result = RedisQueue::connect(RedisQueueConfig::new("127.0.0.1", 1)).await;
        assert!(matches!(result, Err(QueueError::Connection(_))));
    }

    // -------------------------------------------------------------------------
    // Live broker (set REDIS_URL, run with --ignored)
    // -------------------------------------------------------------------------

    #[derive(Default)]
    struct Count {
        handled: AtomicUsize,
    }

    #[async_trait]
    impl MessageHandler for Count {
        async fn handle(&self, _delivery: Delivery) {
            self.handled.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn live_config() -> RedisQueueConfig {
        let url = std::env::var("REDIS_URL").expect("REDIS_URL must be set");
        let info = url.as_str().into_connection_info().expect("valid REDIS_URL");
        match info.addr {
            ConnectionAddr::Tcp(host, port) => RedisQueueConfig::new(host, port)
                .group(format!("test-group-{}", uuid::Uuid::new_v4()))
                .block(Duration::from_millis(200)),
            other => panic!("REDIS_URL must be a TCP address, got {other:?}"),
        }
    }

    fn stream_key() -> String {
        format!("tally-test-{}", uuid::Uuid::new_v4())
    }

    async fn pending_count(queue: &RedisQueue, key: &str) -> usize {
        let mut conn = queue.conn.clone();
        let reply: StreamPendingReply = conn.xpending(key, &queue.config.group).await.unwrap();
        reply.count()
    }

    async fn wait_for_handled(handler: &Count, expected: usize) {
        for _ in 0..100 {
            if handler.handled.load(Ordering::SeqCst) >= expected {
                return;
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        panic!(
            "expected {expected} deliveries, saw {}",
            handler.handled.load(Ordering::SeqCst)
        );
    }

    async fn cleanup(queue: &RedisQueue, key: &str) {
        let mut conn = queue.conn.clone();
        let _: redis::RedisResult<()> = conn.del(key).await;
    }

    #[tokio::test]
    #[ignore = "needs a Redis server at REDIS_URL"]
    async fn test_live_publish_consume_acks_once() {
        let queue = RedisQueue::connect(live_config()).await.unwrap();
        let key = stream_key();
        let handler = Arc::new(Count::default());

        let consumer = queue.consume(&key, handler.clone()).await.unwrap();
        queue.publish(&key, b"report").await.unwrap();

        wait_for_handled(&handler, 1).await;
        // Let a few more read cycles pass; nothing is handed over twice.
        tokio::time::sleep(Duration::from_millis(600)).await;
        consumer.shutdown().await;

        assert_eq!(handler.handled.load(Ordering::SeqCst), 1);
        assert_eq!(pending_count(&queue, &key).await, 0);
        cleanup(&queue, &key).await;
    }

    #[tokio::test]
    #[ignore = "needs a Redis server at REDIS_URL"]
    async fn test_live_drains_pending_before_new() {
        let queue = RedisQueue::connect(live_config()).await.unwrap();
        let key = stream_key();
        queue.ensure_group(&key).await.unwrap();

        // Delivered to this consumer but never acked, as after a crash.
        queue.publish(&key, b"orphan").await.unwrap();
        let mut conn = queue.conn.clone();
        let read = read_batch(&mut conn, &key, &queue.config, ">", false)
            .await
            .unwrap();
        assert_eq!(read.len(), 1);
        assert_eq!(pending_count(&queue, &key).await, 1);

        let handler = Arc::new(Count::default());
        let consumer = queue.consume(&key, handler.clone()).await.unwrap();
        wait_for_handled(&handler, 1).await;

        queue.publish(&key, b"fresh").await.unwrap();
        wait_for_handled(&handler, 2).await;
        tokio::time::sleep(Duration::from_millis(600)).await;
        consumer.shutdown().await;

        assert_eq!(handler.handled.load(Ordering::SeqCst), 2);
        assert_eq!(pending_count(&queue, &key).await, 0);
        cleanup(&queue, &key).await;
    }
}
