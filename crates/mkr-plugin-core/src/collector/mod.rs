//! Metric sources for the plugins.
//!
//! Each source turns raw text into a flat [`MetricSet`](crate::metrics::MetricSet)
//! of cumulative values and builds the graph definitions describing it.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────┐   ┌──────────────────────────────────┐
//! │      LinuxCpusPlugin         │   │        MemcachedPlugin           │
//! │  - /proc/stat                │   │  - stats / stats slabs / items   │
//! │  - dynamic graphs per cpuN   │   │  - slab key classifier           │
//! └──────────────┬───────────────┘   │  - static graph table            │
//!                │                   └───────────────┬──────────────────┘
//!         ┌──────▼──────┐                    ┌───────▼───────┐
//!         │  FileSystem │ (trait)            │  StatsClient  │ (Read + Write)
//!         └──────┬──────┘                    └───────┬───────┘
//!         ┌──────┴──────┐                    ┌───────┴────────┐
//!         │ RealFs      │                    │ TCP / Unix     │
//!         │ MockFs      │                    │ in-memory test │
//!         └─────────────┘                    └────────────────┘
//! ```
//!
//! # Usage
//!
//! ```
//! use mkr_plugin_core::collector::{LinuxCpusPlugin, MockFs};
//! use mkr_plugin_core::plugin::Plugin;
//!
//! let mut plugin = LinuxCpusPlugin::new(MockFs::quad_core(), "/proc");
//! let metrics = plugin.fetch_metrics().unwrap();
//! assert!(metrics.contains_key("cpu3.idle"));
//! ```

mod error;
pub mod memcached;
pub mod mock;
pub mod procfs;
pub mod traits;

pub use error::CollectError;
pub use memcached::{MemcachedOptions, MemcachedPlugin, Target};
pub use mock::MockFs;
pub use procfs::{CpuSample, LinuxCpusPlugin};
pub use traits::{FileSystem, RealFs};
