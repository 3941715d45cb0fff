//! Graph and metric definitions consumed by the agent.
//!
//! A [`GraphSet`] is built fresh per invocation, either from a static table
//! (memcached) or from the units discovered in the current sample (cpus).
//! Graph keys and metric names may contain a wildcard segment (`#` or `*`)
//! standing for a dynamic sub-key such as a slab class.

use serde::Serialize;
use std::collections::BTreeMap;

/// Graph definitions keyed by graph key.
pub type GraphSet = BTreeMap<String, GraphDef>;

/// Display unit of a graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Unit {
    Integer,
    Float,
    Bytes,
}

/// Numeric interpretation of a metric value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MetricType {
    #[default]
    Float,
    Uint64,
}

/// A single metric within a graph.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricDef {
    pub name: String,
    pub label: String,
    /// Counter: reported as a per-minute rate against the previous sample.
    pub diff: bool,
    pub stacked: bool,
    pub metric_type: MetricType,
}

impl MetricDef {
    /// An instantaneous value, reported as-is.
    pub fn gauge(name: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            label: label.into(),
            diff: false,
            stacked: false,
            metric_type: MetricType::Float,
        }
    }

    /// A monotonic counter, reported as a rate.
    pub fn counter(name: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            diff: true,
            ..Self::gauge(name, label)
        }
    }

    pub fn stacked(mut self) -> Self {
        self.stacked = true;
        self
    }

    pub fn uint64(mut self) -> Self {
        self.metric_type = MetricType::Uint64;
        self
    }
}

/// A graph group: related metrics sharing label and unit.
#[derive(Debug, Clone, PartialEq)]
pub struct GraphDef {
    pub label: String,
    pub unit: Unit,
    pub metrics: Vec<MetricDef>,
}

impl GraphDef {
    pub fn new(label: impl Into<String>, unit: Unit, metrics: Vec<MetricDef>) -> Self {
        Self {
            label: label.into(),
            unit,
            metrics,
        }
    }
}

/// Returns true if `s` contains a wildcard segment.
pub fn has_wildcard(s: &str) -> bool {
    s.contains(['#', '*'])
}

/// Checks whether `key` instantiates `pattern`.
///
/// Both are split on `.`; a `#` or `*` segment matches any non-empty run of
/// `[-a-zA-Z0-9_]`, other segments must be equal. The whole key must match.
pub fn matches_template(pattern: &str, key: &str) -> bool {
    let mut pattern_parts = pattern.split('.');
    let mut key_parts = key.split('.');

    loop {
        match (pattern_parts.next(), key_parts.next()) {
            (None, None) => return true,
            (Some(p), Some(k)) => {
                let ok = if p == "#" || p == "*" {
                    !k.is_empty()
                        && k
                            .chars()
                            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
                } else {
                    p == k
                };
                if !ok {
                    return false;
                }
            }
            _ => return false,
        }
    }
}

/// Upper-cases the first letter of each word: `"memcached"` → `"Memcached"`.
///
/// ASCII letters, digits and `_` continue a word; any other ASCII character
/// (space, `-`, `.`) starts a new one. Outside ASCII only whitespace
/// separates words. So `"my_cache"` stays one word (`"My_cache"`).
pub fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut at_word_start = true;
    for c in s.chars() {
        if at_word_start {
            out.extend(c.to_uppercase());
        } else {
            out.push(c);
        }
        at_word_start = is_word_separator(c);
    }
    out
}

fn is_word_separator(c: char) -> bool {
    if c.is_ascii() {
        !(c.is_ascii_alphanumeric() || c == '_')
    } else {
        c.is_whitespace()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metric_def_builders() {
        let m = MetricDef::counter("cmd_get", "Get").uint64();
        assert!(m.diff);
        assert!(!m.stacked);
        assert_eq!(m.metric_type, MetricType::Uint64);

        let m = MetricDef::gauge("mem_requested", "mem_requested").stacked();
        assert!(!m.diff);
        assert!(m.stacked);
        assert_eq!(m.metric_type, MetricType::Float);
    }

    #[test]
    fn test_has_wildcard() {
        assert!(has_wildcard("hits.slab.#"));
        assert!(has_wildcard("disk.*.read"));
        assert!(!has_wildcard("linux.cpu0"));
    }

    #[test]
    fn test_matches_template() {
        assert!(matches_template(
            "hits.slab.#.get_hits",
            "hits.slab.class03.get_hits"
        ));
        assert!(matches_template(
            "hits.slab.#.get_hits",
            "hits.slab.class10.get_hits"
        ));
        assert!(!matches_template("hits.slab.#.get_hits", "hits.slab.class03.cmd_set"));
        assert!(!matches_template(
            "hits.slab.#.get_hits",
            "hits.slab.class03.get_hits.extra"
        ));
        assert!(!matches_template("hits.slab.#.get_hits", "hits.slab..get_hits"));
        assert!(!matches_template("hits.slab.#.get_hits", "get_hits"));
    }

    #[test]
    fn test_matches_template_rejects_bad_chars() {
        assert!(!matches_template("a.#.b", "a.x y.b"));
        assert!(matches_template("a.#.b", "a.x-y_1.b"));
    }

    #[test]
    fn test_title_case() {
        assert_eq!(title_case("memcached"), "Memcached");
        assert_eq!(title_case("my cache"), "My Cache");
        assert_eq!(title_case(""), "");
    }

    #[test]
    fn test_title_case_word_boundaries() {
        assert_eq!(title_case("my_cache"), "My_cache");
        assert_eq!(title_case("my-cache"), "My-Cache");
        assert_eq!(title_case("cache.main"), "Cache.Main");
        assert_eq!(title_case("cache01 sessions"), "Cache01 Sessions");
        assert_eq!(title_case("élan vital"), "Élan Vital");
    }

    #[test]
    fn test_unit_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Unit::Bytes).unwrap(), "\"bytes\"");
        assert_eq!(serde_json::to_string(&Unit::Integer).unwrap(), "\"integer\"");
    }
}
