//! Delivery metrics
//!
//! Counters for normalization and flush outcomes, plus an in-memory
//! aggregator for run summaries.

use contracts::{FlushOutcome, FlushReport, InstanceId};
use metrics::{counter, histogram};

/// Record one normalized batch
pub fn record_batch_normalized(records: usize, invalid: usize, malformed: bool) {
    counter!("kinesis_output_batches_total").increment(1);
    counter!("kinesis_output_records_total").increment(records as u64);

    if invalid > 0 {
        counter!("kinesis_output_invalid_records_total").increment(invalid as u64);
    }
    if malformed {
        counter!("kinesis_output_malformed_batches_total").increment(1);
    }
}

/// Record the outcome of one delivery attempt
pub fn record_flush_attempt(instance: InstanceId, outcome: FlushOutcome) {
    counter!(
        "kinesis_output_flush_attempts_total",
        "instance" => instance.to_string(),
        "outcome" => outcome.as_str()
    )
    .increment(1);
}

/// Record the terminal state of a flush task
///
/// # Example
///
/// ```ignore
/// use observability::metrics::record_flush_completed;
///
/// let report = handle.await?;
/// record_flush_completed(&report);
/// ```
pub fn record_flush_completed(report: &FlushReport) {
    let instance = report.instance.to_string();

    counter!(
        "kinesis_output_flushes_total",
        "instance" => instance.clone(),
        "outcome" => report.outcome.as_str()
    )
    .increment(1);

    histogram!("kinesis_output_flush_duration_ms", "instance" => instance.clone())
        .record(report.elapsed.as_secs_f64() * 1000.0);

    if report.timed_out {
        counter!("kinesis_output_flush_timeouts_total", "instance" => instance.clone())
            .increment(1);
    }
    if report.retries_exhausted() {
        counter!("kinesis_output_flush_retries_exhausted_total", "instance" => instance)
            .increment(1);
    }
}

/// Flush outcome aggregator
///
/// Aggregates reports in memory to print a run summary.
#[derive(Debug, Clone, Default)]
pub struct FlushStatsAggregator {
    pub total_flushes: u64,
    pub delivered: u64,
    pub failed: u64,
    pub retries_exhausted: u64,
    pub timed_out: u64,
    pub total_records: u64,
    /// Attempts per flush
    pub attempt_stats: RunningStats,
    /// Flush duration (ms)
    pub latency_stats: RunningStats,
}

impl FlushStatsAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&mut self, report: &FlushReport) {
        self.total_flushes += 1;
        self.total_records += report.records as u64;

        if report.timed_out {
            self.timed_out += 1;
        }
        match report.outcome {
            FlushOutcome::Ok => self.delivered += 1,
            FlushOutcome::Error => self.failed += 1,
            FlushOutcome::Retry => self.retries_exhausted += 1,
        }

        self.attempt_stats.push(f64::from(report.attempts));
        self.latency_stats
            .push(report.elapsed.as_secs_f64() * 1000.0);
    }

    pub fn summary(&self) -> MetricsSummary {
        MetricsSummary {
            total_flushes: self.total_flushes,
            delivered: self.delivered,
            failed: self.failed,
            retries_exhausted: self.retries_exhausted,
            timed_out: self.timed_out,
            total_records: self.total_records,
            attempts: StatsSummary::from(&self.attempt_stats),
            latency_ms: StatsSummary::from(&self.latency_stats),
        }
    }
}

/// Run summary
#[derive(Debug, Clone, Default)]
pub struct MetricsSummary {
    pub total_flushes: u64,
    pub delivered: u64,
    pub failed: u64,
    pub retries_exhausted: u64,
    pub timed_out: u64,
    pub total_records: u64,
    pub attempts: StatsSummary,
    pub latency_ms: StatsSummary,
}

impl std::fmt::Display for MetricsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Flush Summary ===")?;
        writeln!(f, "Flushes: {}", self.total_flushes)?;
        writeln!(f, "Records: {}", self.total_records)?;
        writeln!(f, "Delivered: {}", self.delivered)?;
        writeln!(f, "Failed: {}", self.failed)?;
        writeln!(f, "Retries exhausted: {}", self.retries_exhausted)?;
        writeln!(f, "Timed out: {}", self.timed_out)?;
        writeln!(f, "Attempts: {}", self.attempts)?;
        writeln!(f, "Latency (ms): {}", self.latency_ms)?;
        Ok(())
    }
}

/// Statistics summary
#[derive(Debug, Clone, Default)]
pub struct StatsSummary {
    pub count: u64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std_dev: f64,
}

impl From<&RunningStats> for StatsSummary {
    fn from(stats: &RunningStats) -> Self {
        Self {
            count: stats.count,
            min: stats.min,
            max: stats.max,
            mean: stats.mean(),
            std_dev: stats.std_dev(),
        }
    }
}

impl std::fmt::Display for StatsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.count == 0 {
            write!(f, "N/A")
        } else {
            write!(
                f,
                "min={:.3}, max={:.3}, mean={:.3}, std={:.3} (n={})",
                self.min, self.max, self.mean, self.std_dev, self.count
            )
        }
    }
}

/// Online statistics (Welford's algorithm)
#[derive(Debug, Clone, Default)]
pub struct RunningStats {
    count: u64,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
}

impl RunningStats {
    pub fn push(&mut self, value: f64) {
        self.count += 1;

        if self.count == 1 {
            self.min = value;
            self.max = value;
            self.mean = value;
            self.m2 = 0.0;
        } else {
            self.min = self.min.min(value);
            self.max = self.max.max(value);

            let delta = value - self.mean;
            self.mean += delta / self.count as f64;
            let delta2 = value - self.mean;
            self.m2 += delta * delta2;
        }
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.mean
        }
    }

    /// Sample variance
    pub fn variance(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            self.m2 / (self.count - 1) as f64
        }
    }

    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn report(outcome: FlushOutcome, attempts: u32, timed_out: bool) -> FlushReport {
        FlushReport {
            instance: InstanceId(0),
            tag: "app.logs".to_string(),
            records: 10,
            attempts,
            outcome,
            timed_out,
            elapsed: Duration::from_millis(20),
        }
    }

    #[test]
    fn test_running_stats() {
        let mut stats = RunningStats::default();
        for v in [1.0, 2.0, 3.0, 4.0, 5.0] {
            stats.push(v);
        }

        assert_eq!(stats.count(), 5);
        assert!((stats.mean() - 3.0).abs() < 1e-10);
        assert!((stats.min() - 1.0).abs() < 1e-10);
        assert!((stats.max() - 5.0).abs() < 1e-10);
        assert!((stats.variance() - 2.5).abs() < 1e-10);
    }

    #[test]
    fn test_aggregator_update() {
        let mut aggregator = FlushStatsAggregator::new();
        aggregator.update(&report(FlushOutcome::Ok, 1, false));
        aggregator.update(&report(FlushOutcome::Retry, 2, false));
        aggregator.update(&report(FlushOutcome::Error, 1, true));

        assert_eq!(aggregator.total_flushes, 3);
        assert_eq!(aggregator.total_records, 30);
        assert_eq!(aggregator.delivered, 1);
        assert_eq!(aggregator.retries_exhausted, 1);
        assert_eq!(aggregator.failed, 1);
        assert_eq!(aggregator.timed_out, 1);
        assert!((aggregator.attempt_stats.max() - 2.0).abs() < 1e-10);
    }

    #[test]
    fn test_summary_display() {
        let mut aggregator = FlushStatsAggregator::new();
        aggregator.update(&report(FlushOutcome::Ok, 1, false));

        let output = format!("{}", aggregator.summary());
        assert!(output.contains("Flushes: 1"));
        assert!(output.contains("Delivered: 1"));
        assert!(output.contains("(n=1)"));
    }
}
