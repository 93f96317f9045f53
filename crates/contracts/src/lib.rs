//! # Contracts
//!
//! Frozen interface contracts shared by every crate in the workspace: the
//! decoded record model, host-facing outcome codes, output configuration,
//! and the collaborator traits (config source, delivery adapter, stream
//! client). Business crates depend on this crate only, never on each other
//! in reverse.
//!
//! ## Time Model
//! - Every normalized record carries a UTC instant (`chrono::DateTime<Utc>`)
//! - Host timestamps are either structured (EventTime) or whole epoch seconds

mod config;
mod delivery;
mod error;
mod instance;
mod outcome;
mod record;
mod report;

pub use config::*;
pub use delivery::*;
pub use error::*;
pub use instance::*;
pub use outcome::*;
pub use record::*;
pub use report::*;
