//! Counter rate computation against the previous invocation's sample.
//!
//! Extractors always emit raw cumulative values; this module is the single
//! place deciding whether a counter gets a rate or is suppressed.

use crate::graph::MetricType;
use crate::metrics::MetricValue;

/// Maximum gap (seconds) between two samples for a rate to be reported.
/// Anything older is treated as no baseline.
pub const MAX_RATE_DT_SECS: f64 = 600.0;

/// Rates are reported per this many seconds (per minute).
pub const RATE_PERIOD_SECS: f64 = 60.0;

// ---------------------------------------------------------------------------
// Delta helpers
// ---------------------------------------------------------------------------

/// Compute f64 delta, returning `None` on counter regression (reset).
pub fn df64(curr: f64, prev: f64) -> Option<f64> {
    (curr >= prev).then_some(curr - prev)
}

/// Compute u64 delta, returning `None` on counter regression (reset).
pub fn du64(curr: u64, prev: u64) -> Option<u64> {
    curr.checked_sub(prev)
}

/// Seconds elapsed between two unix timestamps, `None` if not in `(0, MAX_RATE_DT_SECS]`.
pub fn elapsed_secs(now_ts: i64, prev_ts: i64) -> Option<f64> {
    let dt = now_ts.checked_sub(prev_ts)? as f64;
    (dt > 0.0 && dt <= MAX_RATE_DT_SECS).then_some(dt)
}

/// Per-minute rate of a counter: `(curr - prev) * 60 / dt_secs`.
///
/// `None` when either value is non-numeric or the counter went backwards.
/// `Uint64` counters are diffed as integers so large values keep precision.
pub fn counter_rate(
    metric_type: MetricType,
    curr: &MetricValue,
    prev: &MetricValue,
    dt_secs: f64,
) -> Option<f64> {
    let delta = match metric_type {
        MetricType::Uint64 => du64(curr.as_u64()?, prev.as_u64()?)? as f64,
        MetricType::Float => df64(curr.as_f64()?, prev.as_f64()?)?,
    };
    Some(delta * RATE_PERIOD_SECS / dt_secs)
}
