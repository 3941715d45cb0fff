//! mkr-plugin-core — shared library for the metric-agent plugins.
//!
//! Provides:
//! - `collector` — metric sources (`/proc/stat` CPU counters, memcached stats)
//! - `graph` — graph/metric definitions consumed by the agent
//! - `metrics` — flat metric name → value sample
//! - `rates` — counter delta computation against the previous sample
//! - `storage` — previous-sample state file
//! - `plugin` — the `Plugin` trait and the `PluginRunner` driver
//! - `output` — agent line protocol and definition manifest

pub mod collector;
pub mod graph;
pub mod metrics;
pub mod output;
pub mod plugin;
pub mod rates;
pub mod storage;

/// Crate version with the git revision it was built from.
pub const VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (",
    env!("MKR_PLUGIN_GIT_SHA"),
    ")"
);
