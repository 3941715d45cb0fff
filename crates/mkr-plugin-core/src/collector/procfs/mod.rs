//! Collector for CPU counters from the Linux `/proc` filesystem.

pub mod cpus;
pub mod parser;

pub use cpus::{CpuSample, LinuxCpusPlugin};
pub use parser::{CPU_COUNTER_NAMES, CpuCounters, ParseError};
