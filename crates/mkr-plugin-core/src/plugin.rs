//! Plugin contract and the per-invocation driver.
//!
//! A [`Plugin`] only reports raw values and graph definitions. The
//! [`PluginRunner`] owns everything across invocations: it loads the
//! previous sample, turns counters into rates, prints agent output and
//! saves the current sample for next time.

use std::collections::HashSet;
use std::fmt;
use std::io::{self, Write};
use std::path::PathBuf;

use tracing::{debug, info, warn};

use crate::collector::CollectError;
use crate::graph::{GraphSet, MetricDef, MetricType, has_wildcard, matches_template};
use crate::metrics::{MetricSet, MetricValue};
use crate::output::{self, LineValue, MetricLine};
use crate::rates;
use crate::storage::{PreviousSample, StateStore, StoreError};

/// Definition mode is selected when this variable is set and non-empty.
pub const PLUGIN_META_ENV: &str = "MACKEREL_AGENT_PLUGIN_META";

/// Returns true when the agent asks for graph definitions.
pub fn meta_requested() -> bool {
    std::env::var_os(PLUGIN_META_ENV).is_some_and(|v| !v.is_empty())
}

/// A metric source.
pub trait Plugin {
    /// Short name, used for the default state file.
    fn name(&self) -> &str;

    /// Prefix prepended to every graph key and metric name.
    fn metric_key_prefix(&self) -> Option<&str> {
        None
    }

    /// Collects one raw sample.
    fn fetch_metrics(&mut self) -> Result<MetricSet, CollectError>;

    /// Graph definitions for this invocation.
    fn graph_definition(&mut self) -> Result<GraphSet, CollectError>;

    /// Graph definitions matching an already fetched sample.
    ///
    /// Plugins whose graphs depend on the sample override this so values
    /// mode does not hit the source a second time.
    fn graph_definition_for(&mut self, _current: &MetricSet) -> Result<GraphSet, CollectError> {
        self.graph_definition()
    }
}

/// Error type for a driver run.
#[derive(Debug)]
pub enum RunError {
    Collect(CollectError),
    Store(StoreError),
    Io(io::Error),
}

impl fmt::Display for RunError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunError::Collect(e) => write!(f, "collection failed: {}", e),
            RunError::Store(e) => write!(f, "cannot save state: {}", e),
            RunError::Io(e) => write!(f, "cannot write output: {}", e),
        }
    }
}

impl std::error::Error for RunError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RunError::Collect(e) => Some(e),
            RunError::Store(e) => Some(e),
            RunError::Io(e) => Some(e),
        }
    }
}

impl From<CollectError> for RunError {
    fn from(e: CollectError) -> Self {
        RunError::Collect(e)
    }
}

impl From<StoreError> for RunError {
    fn from(e: StoreError) -> Self {
        RunError::Store(e)
    }
}

impl From<io::Error> for RunError {
    fn from(e: io::Error) -> Self {
        RunError::Io(e)
    }
}

/// Drives one plugin invocation.
pub struct PluginRunner<P: Plugin> {
    plugin: P,
    store: StateStore,
}

impl<P: Plugin> PluginRunner<P> {
    /// Creates a runner; without an explicit path the default state file
    /// for the plugin name is used.
    pub fn new(plugin: P, state_path: Option<PathBuf>) -> Self {
        let path = state_path.unwrap_or_else(|| StateStore::default_path(plugin.name()));
        Self {
            plugin,
            store: StateStore::new(path),
        }
    }

    pub fn store(&self) -> &StateStore {
        &self.store
    }

    /// Prints the definition manifest.
    pub fn output_definitions<W: Write>(&mut self, w: &mut W) -> Result<(), RunError> {
        let graphs = self.plugin.graph_definition()?;
        debug!("{} graph definitions", graphs.len());
        output::write_definitions(w, &graphs, self.plugin.metric_key_prefix())?;
        Ok(())
    }

    /// Prints values for the sample taken at `now` and stores it.
    pub fn output_values<W: Write>(&mut self, w: &mut W, now: i64) -> Result<(), RunError> {
        let current = self.plugin.fetch_metrics()?;
        let graphs = self.plugin.graph_definition_for(&current)?;

        let previous = match self.store.load() {
            Ok(prev) => prev,
            Err(e) => {
                warn!(
                    "ignoring state file {}: {}",
                    self.store.path().display(),
                    e
                );
                None
            }
        };

        let lines = render_values(
            &graphs,
            self.plugin.metric_key_prefix(),
            &current,
            previous.as_ref(),
            now,
        );
        info!("{}: {} values", self.plugin.name(), lines.len());
        output::write_values(w, &lines)?;

        self.store.save(&PreviousSample {
            timestamp: now,
            values: current,
        })?;
        Ok(())
    }

    /// Selects the output mode from the environment and runs it.
    pub fn run<W: Write>(&mut self, w: &mut W) -> Result<(), RunError> {
        if meta_requested() {
            self.output_definitions(w)
        } else {
            self.output_values(w, chrono::Utc::now().timestamp())
        }
    }
}

/// Renders the current sample through the graph set.
///
/// Plain metrics read the stat named like the metric and print as
/// `[prefix.]graph.metric`. Wildcard metrics expand to every stat key
/// matching `graph.metric` and print under that key. Metrics absent from
/// the sample, non-numeric values and counters without a usable baseline
/// are skipped.
pub fn render_values(
    graphs: &GraphSet,
    prefix: Option<&str>,
    current: &MetricSet,
    previous: Option<&PreviousSample>,
    now: i64,
) -> Vec<MetricLine> {
    let baseline = previous.and_then(|prev| match rates::elapsed_secs(now, prev.timestamp) {
        Some(dt) => Some((prev, dt)),
        None => {
            debug!(
                "previous sample at {} unusable for rates at {}",
                prev.timestamp, now
            );
            None
        }
    });

    let mut seen = HashSet::new();
    let mut lines = Vec::new();
    let mut emit = |stat_key: &str, out_name: String, metric: &MetricDef| {
        let Some(curr) = current.get(stat_key) else {
            return;
        };
        if seen.contains(&out_name) {
            return;
        }
        let value = if metric.diff {
            baseline.and_then(|(prev, dt)| {
                let before = prev.values.get(stat_key)?;
                let rate = rates::counter_rate(metric.metric_type, curr, before, dt);
                if rate.is_none() {
                    debug!("{}: no rate against previous sample", stat_key);
                }
                rate.map(LineValue::Float)
            })
        } else {
            gauge_value(metric.metric_type, curr)
        };
        if let Some(value) = value {
            seen.insert(out_name.clone());
            lines.push(MetricLine {
                name: out_name,
                value,
                timestamp: now,
            });
        }
    };

    for (key, graph) in graphs {
        for metric in &graph.metrics {
            if has_wildcard(key) || has_wildcard(&metric.name) {
                let pattern = format!("{}.{}", key, metric.name);
                for stat_key in current.keys().filter(|k| matches_template(&pattern, k)) {
                    emit(stat_key, output::prefixed(prefix, stat_key), metric);
                }
            } else {
                let name = format!("{}.{}", key, metric.name);
                emit(&metric.name, output::prefixed(prefix, &name), metric);
            }
        }
    }
    lines
}

fn gauge_value(metric_type: MetricType, value: &MetricValue) -> Option<LineValue> {
    match metric_type {
        MetricType::Uint64 => value.as_u64().map(LineValue::Uint),
        MetricType::Float => value.as_f64().map(LineValue::Float),
    }
}
