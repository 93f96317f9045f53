//! Delivery adapter implementations
//!
//! Contains StreamAdapter and LogStreamClient.

mod log;
mod stream;

pub use self::log::LogStreamClient;
pub use self::stream::{
    StreamAdapter, MAX_PARTITION_KEY_LENGTH, NESTED_KEY_SEPARATOR, RANDOM_PARTITION_KEY_LENGTH,
};
