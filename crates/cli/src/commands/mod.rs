//! Command implementations.

mod replay;
mod validate;

pub use replay::run_replay;
pub use validate::run_validate;
