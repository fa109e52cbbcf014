//! # tally-queue: Durable Report Queue
//!
//! Carries rendered sales reports from the scheduler to the mailer.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  ReportScheduler / ReportDistributor                                   │
//! │       │  ReportMessage::new(filename, pdf).to_payload()                │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                  tally-queue (THIS CRATE)                       │   │
//! │  │                                                                 │   │
//! │  │   QueueClient ──┬── RedisQueue     (Redis Streams, durable)     │   │
//! │  │                 └── InMemoryQueue  (channels, tests)            │   │
//! │  │                                                                 │   │
//! │  │   MessageHandler ◄── one call per delivery, then ack            │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Distributor consumer ──► Mailer                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod client;
pub mod envelope;
pub mod error;
pub mod memory;
pub mod redis_streams;

pub use client::{ConsumerHandle, Delivery, MessageHandler, QueueClient};
pub use envelope::ReportMessage;
pub use error::{QueueError, QueueResult};
pub use memory::InMemoryQueue;
pub use redis_streams::{RedisQueue, RedisQueueConfig};
