//! FlushDispatcher - one detached, retry-bounded task per host flush

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, error, info, instrument, warn};

use contracts::{
    DeliveryAdapter, FlushOutcome, FlushReport, InstanceId, NormalizedBatch, NormalizedRecord,
    Record, RequestBuffer, MAX_RECORDS_PER_PUT,
};
use observability::metrics::{record_flush_attempt, record_flush_completed};
use registry::InstanceRegistry;

use crate::metrics::DispatchMetrics;

/// Default delivery attempts per flush
pub const DEFAULT_MAX_ATTEMPTS: u32 = 2;

/// Default bound on one flush task
pub const DEFAULT_TASK_TIMEOUT: Duration = Duration::from_secs(30);

/// Dispatcher configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatcherConfig {
    /// Attempts per flush, including the first (at least 1)
    pub max_attempts: u32,
    /// Upper bound on a whole flush task, all attempts included
    pub task_timeout: Duration,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            task_timeout: DEFAULT_TASK_TIMEOUT,
        }
    }
}

/// Spawns flush tasks for registry instances
pub struct FlushDispatcher<A> {
    registry: Arc<InstanceRegistry<A>>,
    config: DispatcherConfig,
    metrics: Arc<DispatchMetrics>,
    runtime: Handle,
}

impl<A> FlushDispatcher<A>
where
    A: DeliveryAdapter + Send + Sync + 'static,
{
    /// Create a dispatcher spawning onto `runtime`
    pub fn new(
        registry: Arc<InstanceRegistry<A>>,
        config: DispatcherConfig,
        runtime: Handle,
    ) -> Self {
        let config = DispatcherConfig {
            max_attempts: config.max_attempts.max(1),
            ..config
        };
        Self {
            registry,
            config,
            metrics: Arc::new(DispatchMetrics::new()),
            runtime,
        }
    }

    pub fn config(&self) -> &DispatcherConfig {
        &self.config
    }

    pub fn registry(&self) -> &Arc<InstanceRegistry<A>> {
        &self.registry
    }

    pub fn metrics(&self) -> &Arc<DispatchMetrics> {
        &self.metrics
    }

    /// Flush tasks spawned and not yet finished
    pub fn in_flight(&self) -> usize {
        self.metrics.in_flight()
    }

    /// Spawn the flush of one normalized batch and return immediately
    ///
    /// The batch moves into the task. The returned handle resolves to the
    /// task's terminal report, which is also logged and counted; callers
    /// that only need fire-and-forget semantics may drop it.
    pub fn dispatch(
        &self,
        id: InstanceId,
        tag: impl Into<String>,
        batch: NormalizedBatch,
    ) -> JoinHandle<FlushReport> {
        let registry = Arc::clone(&self.registry);
        let config = self.config;
        let tag = tag.into();

        self.metrics.task_started();
        let mut completion = TaskCompletion::new(
            Arc::clone(&self.metrics),
            id,
            tag.clone(),
            batch.records.len(),
        );
        self.runtime.spawn(async move {
            let report = flush_task(
                &registry,
                &completion.metrics,
                &completion.attempts,
                config,
                id,
                tag,
                batch.records,
            )
            .await;
            completion.report = Some(report.clone());
            drop(completion);
            report
        })
    }
}

/// Settles one flush task on drop
///
/// A task that panics or is cancelled before producing its report is
/// settled as `ERROR`.
struct TaskCompletion {
    metrics: Arc<DispatchMetrics>,
    attempts: AtomicU32,
    instance: InstanceId,
    tag: String,
    records: usize,
    started: Instant,
    report: Option<FlushReport>,
}

impl TaskCompletion {
    fn new(
        metrics: Arc<DispatchMetrics>,
        instance: InstanceId,
        tag: String,
        records: usize,
    ) -> Self {
        Self {
            metrics,
            attempts: AtomicU32::new(0),
            instance,
            tag,
            records,
            started: Instant::now(),
            report: None,
        }
    }
}

impl Drop for TaskCompletion {
    fn drop(&mut self) {
        let report = match self.report.take() {
            Some(report) => report,
            None => {
                error!(
                    instance = %self.instance,
                    tag = %self.tag,
                    panicking = std::thread::panicking(),
                    "flush task ended without a report"
                );
                FlushReport {
                    instance: self.instance,
                    tag: std::mem::take(&mut self.tag),
                    records: self.records,
                    attempts: self.attempts.load(Ordering::Relaxed),
                    outcome: FlushOutcome::Error,
                    timed_out: false,
                    elapsed: self.started.elapsed(),
                }
            }
        };
        self.metrics.task_finished(&report);
        record_flush_completed(&report);
        log_report(&report);
    }
}

#[instrument(
    name = "flush_task",
    skip(registry, metrics, attempts, config, records),
    fields(instance = %id, records = records.len())
)]
async fn flush_task<A: DeliveryAdapter>(
    registry: &InstanceRegistry<A>,
    metrics: &DispatchMetrics,
    attempts: &AtomicU32,
    config: DispatcherConfig,
    id: InstanceId,
    tag: String,
    records: Vec<NormalizedRecord>,
) -> FlushReport {
    let started = Instant::now();

    let attempt_loop = async {
        let mut outcome = FlushOutcome::Retry;
        for attempt in 1..=config.max_attempts {
            attempts.store(attempt, Ordering::Relaxed);
            metrics.inc_attempts();

            outcome = attempt_delivery(registry, id, &records).await;
            record_flush_attempt(id, outcome);
            debug!(attempt, outcome = %outcome, "delivery attempt finished");

            if outcome != FlushOutcome::Retry {
                break;
            }
        }
        outcome
    };

    let (outcome, timed_out) = match tokio::time::timeout(config.task_timeout, attempt_loop).await
    {
        Ok(outcome) => (outcome, false),
        Err(_) => (FlushOutcome::Error, true),
    };

    FlushReport {
        instance: id,
        tag,
        records: records.len(),
        attempts: attempts.load(Ordering::Relaxed),
        outcome,
        timed_out,
        elapsed: started.elapsed(),
    }
}

/// One delivery attempt over the whole batch with a fresh buffer
async fn attempt_delivery<A: DeliveryAdapter>(
    registry: &InstanceRegistry<A>,
    id: InstanceId,
    records: &[NormalizedRecord],
) -> FlushOutcome {
    let instance = match registry.get(id) {
        Ok(instance) => instance,
        Err(e) => {
            error!(error = %e, "flush for unknown instance");
            return FlushOutcome::Error;
        }
    };

    let mut buffer = RequestBuffer::with_capacity(MAX_RECORDS_PER_PUT);
    for (index, normalized) in records.iter().enumerate() {
        let Some(record) = normalized.record.as_ref() else {
            debug!(index, "skipping null record");
            continue;
        };
        debug!(index, record = %dump_record(record), "adding record");

        let outcome = instance
            .adapter
            .add_record(&mut buffer, record, normalized.timestamp)
            .await;
        if outcome != FlushOutcome::Ok {
            return outcome;
        }
    }

    instance.adapter.flush(&mut buffer).await
}

/// JSON text of a record for debug dumps
fn dump_record(record: &Record) -> String {
    match record.to_json() {
        Ok(data) => String::from_utf8_lossy(&data).into_owned(),
        Err(e) => format!("<unencodable: {e}>"),
    }
}

fn log_report(report: &FlushReport) {
    let elapsed_ms = report.elapsed.as_millis() as u64;
    match report.outcome {
        FlushOutcome::Ok => info!(
            instance = %report.instance,
            tag = %report.tag,
            records = report.records,
            attempts = report.attempts,
            elapsed_ms,
            "flush delivered"
        ),
        FlushOutcome::Retry => warn!(
            instance = %report.instance,
            tag = %report.tag,
            records = report.records,
            attempts = report.attempts,
            elapsed_ms,
            "retries exhausted, records not delivered"
        ),
        FlushOutcome::Error => error!(
            instance = %report.instance,
            tag = %report.tag,
            records = report.records,
            attempts = report.attempts,
            timed_out = report.timed_out,
            elapsed_ms,
            "flush failed"
        ),
    }
}
