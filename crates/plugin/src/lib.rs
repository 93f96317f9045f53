//! # Plugin
//!
//! Lifecycle glue between a host log runtime and the stream output.
//!
//! The host drives four entry points, each answered with a `FlushOutcome`
//! (host code via `FlushOutcome::code()`):
//! - `register`: announce the plugin once per process
//! - `init`: validate options and create an instance
//! - `flush`: normalize a raw batch and spawn its delivery
//! - `exit`: shut down (no flush-on-shutdown)

mod host;
mod output;

pub use host::{HostContext, PluginContext, PluginRegistrar};
pub use output::{OutputPlugin, PLUGIN_DESCRIPTION, PLUGIN_NAME};
