//! Agent-facing output formats.
//!
//! Values mode prints one tab-separated line per metric; definition mode
//! prints a header line followed by a JSON graph manifest.

use std::collections::BTreeMap;
use std::fmt;
use std::io::{self, Write};

use serde::Serialize;

use crate::graph::{GraphSet, Unit};

/// First line of definition-mode output.
pub const DEFINITION_HEADER: &str = "# mackerel-agent-plugin";

/// A rendered value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LineValue {
    Float(f64),
    Uint(u64),
}

impl fmt::Display for LineValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LineValue::Float(v) => write!(f, "{:.6}", v),
            LineValue::Uint(v) => write!(f, "{}", v),
        }
    }
}

/// One values-mode output line.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricLine {
    pub name: String,
    pub value: LineValue,
    pub timestamp: i64,
}

impl fmt::Display for MetricLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}\t{}\t{}", self.name, self.value, self.timestamp)
    }
}

pub fn write_values<W: Write>(w: &mut W, lines: &[MetricLine]) -> io::Result<()> {
    for line in lines {
        writeln!(w, "{}", line)?;
    }
    w.flush()
}

#[derive(Serialize)]
struct Manifest<'a> {
    graphs: BTreeMap<String, GraphManifest<'a>>,
}

#[derive(Serialize)]
struct GraphManifest<'a> {
    label: &'a str,
    unit: Unit,
    metrics: Vec<MetricManifest<'a>>,
}

#[derive(Serialize)]
struct MetricManifest<'a> {
    name: &'a str,
    label: &'a str,
    stacked: bool,
}

/// Prepends `prefix.` to `key` when a prefix is set.
pub fn prefixed(prefix: Option<&str>, key: &str) -> String {
    match prefix {
        Some(p) if !p.is_empty() => format!("{}.{}", p, key),
        _ => key.to_string(),
    }
}

/// Writes the definition header and graph manifest.
pub fn write_definitions<W: Write>(
    w: &mut W,
    graphs: &GraphSet,
    prefix: Option<&str>,
) -> io::Result<()> {
    let manifest = Manifest {
        graphs: graphs
            .iter()
            .map(|(key, graph)| {
                let metrics = graph
                    .metrics
                    .iter()
                    .map(|m| MetricManifest {
                        name: &m.name,
                        label: &m.label,
                        stacked: m.stacked,
                    })
                    .collect();
                (
                    prefixed(prefix, key),
                    GraphManifest {
                        label: &graph.label,
                        unit: graph.unit,
                        metrics,
                    },
                )
            })
            .collect(),
    };

    writeln!(w, "{}", DEFINITION_HEADER)?;
    serde_json::to_writer(&mut *w, &manifest)?;
    writeln!(w)?;
    w.flush()
}
