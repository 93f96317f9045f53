//! InstanceId - host-assigned plugin instance handle

use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifier of a configured plugin instance
///
/// Issued sequentially by the instance registry starting at 0; the value is
/// the instance's position in the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct InstanceId(pub usize);

impl InstanceId {
    /// Position in the registry
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<usize> for InstanceId {
    fn from(value: usize) -> Self {
        Self(value)
    }
}
