//! Flat metric samples: fully-qualified name → current raw value.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A metric sample keyed by dot-delimited metric name.
///
/// Ordered so output and persisted state are deterministic.
pub type MetricSet = BTreeMap<String, MetricValue>;

/// A raw value as read from a source.
///
/// Host counters are parsed eagerly into floats; stats-protocol values stay
/// strings until the driver interprets them according to the declared
/// [`MetricType`](crate::graph::MetricType).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetricValue {
    Float(f64),
    Text(String),
}

impl MetricValue {
    /// Value as a float, `None` for non-numeric text.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            MetricValue::Float(v) => Some(*v),
            MetricValue::Text(s) => s.trim().parse().ok(),
        }
    }

    /// Value as an unsigned integer, `None` for negative, fractional text or
    /// non-numeric values.
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            MetricValue::Float(v) => {
                (v.is_finite() && *v >= 0.0 && *v <= u64::MAX as f64).then_some(*v as u64)
            }
            MetricValue::Text(s) => s.trim().parse().ok(),
        }
    }
}

impl From<f64> for MetricValue {
    fn from(v: f64) -> Self {
        MetricValue::Float(v)
    }
}

impl From<String> for MetricValue {
    fn from(s: String) -> Self {
        MetricValue::Text(s)
    }
}

impl From<&str> for MetricValue {
    fn from(s: &str) -> Self {
        MetricValue::Text(s.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_values_parse_on_demand() {
        let v = MetricValue::from("12345");
        assert_eq!(v.as_f64(), Some(12345.0));
        assert_eq!(v.as_u64(), Some(12345));

        let v = MetricValue::from("0.250000");
        assert_eq!(v.as_f64(), Some(0.25));
        assert_eq!(v.as_u64(), None);

        let v = MetricValue::from("1.6.21");
        assert_eq!(v.as_f64(), None);
    }

    #[test]
    fn test_large_counters_keep_integer_precision() {
        let v = MetricValue::from("18446744073709551615");
        assert_eq!(v.as_u64(), Some(u64::MAX));
    }

    #[test]
    fn test_float_to_u64() {
        assert_eq!(MetricValue::Float(42.9).as_u64(), Some(42));
        assert_eq!(MetricValue::Float(-1.0).as_u64(), None);
        assert_eq!(MetricValue::Float(f64::NAN).as_u64(), None);
    }

    #[test]
    fn test_serde_untagged() {
        let mut set = MetricSet::new();
        set.insert("cpu0.user".to_string(), MetricValue::Float(50.0));
        set.insert("curr_connections".to_string(), MetricValue::from("5"));

        let json = serde_json::to_string(&set).unwrap();
        assert_eq!(json, r#"{"cpu0.user":50.0,"curr_connections":"5"}"#);

        let back: MetricSet = serde_json::from_str(&json).unwrap();
        assert_eq!(back, set);
    }
}
