//! Parser for the per-cpu lines of `/proc/stat`.
//!
//! Pure functions over the file content, testable with string inputs.

/// Error type for parsing failures.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseError {
    pub message: String,
}

impl ParseError {
    pub fn new(msg: impl Into<String>) -> Self {
        Self {
            message: msg.into(),
        }
    }
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Parse error: {}", self.message)
    }
}

impl std::error::Error for ParseError {}

/// Label prefix of the lines we collect.
pub const CPU_LINE_PREFIX: &str = "cpu";

/// Positional names of the counters on a cpu line, in kernel order.
pub const CPU_COUNTER_NAMES: [&str; 9] = [
    "user", "nice", "system", "idle", "iowait", "irq", "softirq", "steal", "guest",
];

/// One cpu line: its label and every numeric column that followed it.
#[derive(Debug, Clone, PartialEq)]
pub struct CpuCounters {
    pub name: String,
    pub values: Vec<f64>,
}

impl CpuCounters {
    /// Pairs counter names with values. Columns beyond the known names are
    /// dropped, missing trailing columns are simply absent.
    pub fn named(&self) -> impl Iterator<Item = (&'static str, f64)> + '_ {
        CPU_COUNTER_NAMES.iter().copied().zip(self.values.iter().copied())
    }
}

/// Parses `/proc/stat` content into per-cpu counter rows.
///
/// The first line is skipped unconditionally: on Linux it is the aggregate
/// `cpu` row, which is the sum of the per-cpu rows below it. Lines whose
/// label does not start with `cpu` (`intr`, `ctxt`, ...) are ignored.
///
/// Any non-numeric column fails the whole parse.
pub fn parse_cpu_counters(content: &str) -> Result<Vec<CpuCounters>, ParseError> {
    let mut cpus = Vec::new();

    for line in content.lines().skip(1) {
        let mut parts = line.split_whitespace();
        let Some(name) = parts.next() else {
            continue;
        };
        if !name.starts_with(CPU_LINE_PREFIX) {
            continue;
        }

        let values = parts
            .map(|field| {
                field.parse::<f64>().map_err(|_| {
                    ParseError::new(format!("invalid value '{}' for {}", field, name))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        cpus.push(CpuCounters {
            name: name.to_string(),
            values,
        });
    }

    Ok(cpus)
}
