//! Static graph table for memcached.
//!
//! Reference: <https://github.com/memcached/memcached/blob/master/doc/protocol.txt>

use crate::graph::{GraphDef, GraphSet, MetricDef, MetricType, Unit, title_case};

struct MetricSpec {
    name: &'static str,
    label: &'static str,
    diff: bool,
    stacked: bool,
    metric_type: MetricType,
}

impl MetricSpec {
    const fn gauge(name: &'static str, label: &'static str) -> Self {
        Self {
            name,
            label,
            diff: false,
            stacked: false,
            metric_type: MetricType::Float,
        }
    }

    const fn counter(name: &'static str, label: &'static str) -> Self {
        Self {
            diff: true,
            ..Self::gauge(name, label)
        }
    }

    const fn stacked(mut self) -> Self {
        self.stacked = true;
        self
    }

    const fn uint64(mut self) -> Self {
        self.metric_type = MetricType::Uint64;
        self
    }

    fn build(&self) -> MetricDef {
        MetricDef {
            name: self.name.to_string(),
            label: self.label.to_string(),
            diff: self.diff,
            stacked: self.stacked,
            metric_type: self.metric_type,
        }
    }
}

struct GraphSpec {
    key: &'static str,
    label: &'static str,
    unit: Unit,
    metrics: &'static [MetricSpec],
}

/// Per-slab counters use the counter name as label.
const fn slab(name: &'static str) -> MetricSpec {
    MetricSpec::counter(name, name).uint64()
}

static GRAPHS: &[GraphSpec] = &[
    GraphSpec {
        key: "connections",
        label: "Connections",
        unit: Unit::Integer,
        metrics: &[MetricSpec::gauge("curr_connections", "Connections")],
    },
    GraphSpec {
        key: "cmd",
        label: "Command",
        unit: Unit::Integer,
        metrics: &[
            MetricSpec::counter("cmd_get", "Get").uint64(),
            MetricSpec::counter("cmd_set", "Set").uint64(),
            MetricSpec::counter("cmd_flush", "Flush").uint64(),
            MetricSpec::counter("cmd_touch", "Touch").uint64(),
        ],
    },
    GraphSpec {
        key: "hitmiss",
        label: "Hits/Misses",
        unit: Unit::Integer,
        metrics: &[
            MetricSpec::counter("get_hits", "Get Hits").uint64(),
            MetricSpec::counter("get_misses", "Get Misses").uint64(),
            MetricSpec::counter("delete_hits", "Delete Hits").uint64(),
            MetricSpec::counter("delete_misses", "Delete Misses").uint64(),
            MetricSpec::counter("incr_hits", "Incr Hits").uint64(),
            MetricSpec::counter("incr_misses", "Incr Misses").uint64(),
            MetricSpec::counter("cas_hits", "Cas Hits").uint64(),
            MetricSpec::counter("cas_misses", "Cas Misses").uint64(),
            MetricSpec::counter("touch_hits", "Touch Hits").uint64(),
            MetricSpec::counter("touch_misses", "Touch Misses").uint64(),
        ],
    },
    GraphSpec {
        key: "evictions",
        label: "Evictions",
        unit: Unit::Integer,
        metrics: &[MetricSpec::counter("evictions", "Evictions").uint64()],
    },
    GraphSpec {
        key: "unfetched",
        label: "Unfetched",
        unit: Unit::Integer,
        metrics: &[
            MetricSpec::counter("expired_unfetched", "Expired unfetched").uint64(),
            MetricSpec::counter("evicted_unfetched", "Evicted unfetched").uint64(),
        ],
    },
    GraphSpec {
        key: "rusage",
        label: "Resource Usage",
        unit: Unit::Float,
        metrics: &[
            MetricSpec::counter("rusage_user", "User"),
            MetricSpec::counter("rusage_system", "System"),
        ],
    },
    GraphSpec {
        key: "bytes",
        label: "Traffics",
        unit: Unit::Bytes,
        metrics: &[
            MetricSpec::counter("bytes_read", "Read").uint64(),
            MetricSpec::counter("bytes_written", "Write").uint64(),
        ],
    },
    GraphSpec {
        key: "cachesize",
        label: "Cache Size",
        unit: Unit::Bytes,
        metrics: &[
            MetricSpec::gauge("limit_maxbytes", "Total"),
            MetricSpec::gauge("bytes", "Used").uint64(),
        ],
    },
    GraphSpec {
        key: "items",
        label: "Items",
        unit: Unit::Integer,
        metrics: &[MetricSpec::gauge("curr_items", "Current Items")],
    },
    GraphSpec {
        key: "hits.slab.#",
        label: "Slabs Hits",
        unit: Unit::Integer,
        metrics: &[
            slab("get_hits"),
            slab("cmd_set"),
            slab("delete_hits"),
            slab("incr_hits"),
            slab("decr_hits"),
            slab("cas_hits"),
            slab("cas_badval"),
            slab("touch_hits"),
        ],
    },
    GraphSpec {
        key: "mem_requested.slab.#",
        label: "Mem Requested",
        unit: Unit::Bytes,
        metrics: &[MetricSpec::gauge("mem_requested", "mem_requested")
            .stacked()
            .uint64()],
    },
    GraphSpec {
        key: "evicted_time.slab.#",
        label: "Time of the last evicted entry",
        unit: Unit::Integer,
        metrics: &[MetricSpec::gauge("evicted_time", "evicted_time").uint64()],
    },
    GraphSpec {
        key: "number_of_items.slab.#",
        label: "Number of items",
        unit: Unit::Integer,
        metrics: &[
            slab("expired_unfetched"),
            slab("evicted_unfetched"),
            slab("crawler_reclaimed"),
            slab("crawler_items_checked"),
            slab("lrutail_reflocked"),
        ],
    },
];

/// Builds the memcached graph set, labels prefixed with the title-cased
/// metric key prefix (`"memcached"` → `"Memcached Connections"`).
pub fn memcached_graphs(prefix: &str) -> GraphSet {
    let label_prefix = title_case(prefix);
    GRAPHS
        .iter()
        .map(|spec| {
            let label = if label_prefix.is_empty() {
                spec.label.to_string()
            } else {
                format!("{} {}", label_prefix, spec.label)
            };
            (
                spec.key.to_string(),
                GraphDef::new(label, spec.unit, spec.metrics.iter().map(MetricSpec::build).collect()),
            )
        })
        .collect()
}
