//! FlushOutcome - the three-valued host status

use std::fmt;

/// Status understood by the host's flow-control protocol
///
/// Every entry point (register / init / flush / exit) and every delivery
/// adapter call reduces its result to one of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FlushOutcome {
    /// Accepted / delivered
    Ok,
    /// Transient failure, the caller may try again
    Retry,
    /// Permanent failure
    Error,
}

impl FlushOutcome {
    /// Host status code (`FLB_ERROR = 0`, `FLB_OK = 1`, `FLB_RETRY = 2`)
    pub fn code(self) -> i32 {
        match self {
            Self::Error => 0,
            Self::Ok => 1,
            Self::Retry => 2,
        }
    }

    /// Inverse of [`FlushOutcome::code`]
    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            0 => Some(Self::Error),
            1 => Some(Self::Ok),
            2 => Some(Self::Retry),
            _ => None,
        }
    }

    /// Stable lowercase label (used in logs and metric labels)
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ok => "ok",
            Self::Retry => "retry",
            Self::Error => "error",
        }
    }

    pub fn is_ok(self) -> bool {
        self == Self::Ok
    }
}

impl fmt::Display for FlushOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
