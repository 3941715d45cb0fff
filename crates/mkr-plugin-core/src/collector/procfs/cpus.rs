//! Per-cpu counter collector backed by `/proc/stat`.

use std::collections::BTreeMap;
use std::path::PathBuf;

use tracing::debug;

use crate::collector::CollectError;
use crate::collector::procfs::parser::{CPU_COUNTER_NAMES, CpuCounters, parse_cpu_counters};
use crate::collector::traits::FileSystem;
use crate::graph::{GraphDef, GraphSet, MetricDef, Unit};
use crate::metrics::{MetricSet, MetricValue};
use crate::plugin::Plugin;

/// Counters of every cpu found in one read of `/proc/stat`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CpuSample {
    pub cpus: Vec<CpuCounters>,
}

impl CpuSample {
    /// Flattens the sample into `cpuN.counter → value`.
    pub fn metrics(&self) -> MetricSet {
        let mut metrics = MetricSet::new();
        for cpu in &self.cpus {
            for (counter, value) in cpu.named() {
                metrics.insert(
                    format!("{}.{}", cpu.name, counter),
                    MetricValue::Float(value),
                );
            }
        }
        metrics
    }

    /// One `linux.cpuN` graph per discovered cpu, with one counter per
    /// column present on its line.
    pub fn graphs(&self) -> GraphSet {
        graphs_for_metrics(&self.metrics())
    }
}

/// Builds the `linux.cpuN` graphs from a flattened `cpuN.counter` sample.
///
/// Counters keep kernel column order; keys that are not cpu counters are
/// ignored.
pub fn graphs_for_metrics(metrics: &MetricSet) -> GraphSet {
    let mut per_cpu: BTreeMap<&str, Vec<&'static str>> = BTreeMap::new();
    for key in metrics.keys() {
        let Some((cpu, counter)) = key.split_once('.') else {
            continue;
        };
        if let Some(name) = CPU_COUNTER_NAMES.iter().copied().find(|n| *n == counter) {
            per_cpu.entry(cpu).or_default().push(name);
        }
    }

    per_cpu
        .into_iter()
        .map(|(cpu, mut counters)| {
            counters.sort_by_key(|c| CPU_COUNTER_NAMES.iter().position(|n| n == c));
            let metrics = counters
                .into_iter()
                .map(|counter| MetricDef::counter(format!("{}.{}", cpu, counter), counter))
                .collect();
            (
                format!("linux.{}", cpu),
                GraphDef::new(format!("Linux {}", cpu), Unit::Float, metrics),
            )
        })
        .collect()
}

/// Collects per-cpu counters from `<proc_path>/stat`.
pub struct LinuxCpusPlugin<F: FileSystem> {
    fs: F,
    proc_path: String,
}

impl<F: FileSystem> LinuxCpusPlugin<F> {
    /// Creates a new cpu collector.
    ///
    /// # Arguments
    /// * `fs` - Filesystem implementation (real or mock)
    /// * `proc_path` - Base path to proc filesystem (usually "/proc")
    pub fn new(fs: F, proc_path: impl Into<String>) -> Self {
        Self {
            fs,
            proc_path: proc_path.into(),
        }
    }

    fn stat_path(&self) -> PathBuf {
        PathBuf::from(format!("{}/stat", self.proc_path))
    }

    /// Reads and parses `/proc/stat`.
    pub fn collect_sample(&self) -> Result<CpuSample, CollectError> {
        let path = self.stat_path();
        let content = self
            .fs
            .read_to_string(&path)
            .map_err(|source| CollectError::SourceUnavailable { path, source })?;
        let cpus = parse_cpu_counters(&content)?;
        debug!("read {} cpu lines from /proc/stat", cpus.len());
        Ok(CpuSample { cpus })
    }
}

impl<F: FileSystem> Plugin for LinuxCpusPlugin<F> {
    fn name(&self) -> &str {
        "linux-cpus"
    }

    fn fetch_metrics(&mut self) -> Result<MetricSet, CollectError> {
        Ok(self.collect_sample()?.metrics())
    }

    fn graph_definition(&mut self) -> Result<GraphSet, CollectError> {
        Ok(self.collect_sample()?.graphs())
    }

    fn graph_definition_for(&mut self, current: &MetricSet) -> Result<GraphSet, CollectError> {
        Ok(graphs_for_metrics(current))
    }
}
