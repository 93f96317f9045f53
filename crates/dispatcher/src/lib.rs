//! # Dispatcher
//!
//! Flush dispatch for the stream output.
//!
//! Responsibilities:
//! - Run every host flush as its own detached task
//! - Bound each task by an attempt budget and a timeout
//! - Log and count the terminal outcome of every task
//! - Convert records into put-request entries (`adapters`)

pub mod adapters;
pub mod dispatcher;
pub mod metrics;

pub use adapters::{LogStreamClient, StreamAdapter};
pub use contracts::{DeliveryAdapter, FlushOutcome, FlushReport, StreamClient};
pub use dispatcher::{
    DispatcherConfig, FlushDispatcher, DEFAULT_MAX_ATTEMPTS, DEFAULT_TASK_TIMEOUT,
};
pub use metrics::{DispatchMetrics, MetricsSnapshot};
