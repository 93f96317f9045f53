//! FlushReport - terminal state of one detached flush task

use std::time::Duration;

use crate::{FlushOutcome, InstanceId};

/// Final result of a flush task after all attempts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlushReport {
    pub instance: InstanceId,
    pub tag: String,
    /// Records handed to the task (null records included)
    pub records: usize,
    /// Attempts started
    pub attempts: u32,
    pub outcome: FlushOutcome,
    /// Task was cut off by its timeout
    pub timed_out: bool,
    pub elapsed: Duration,
}

impl FlushReport {
    /// Every attempt asked for a retry and the budget ran out
    pub fn retries_exhausted(&self) -> bool {
        self.outcome == FlushOutcome::Retry && !self.timed_out
    }
}
