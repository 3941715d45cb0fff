use std::io;
use std::path::PathBuf;

use crate::collector::procfs::parser::ParseError;

/// Error type for collection failures.
///
/// Every variant aborts the whole collection for the invocation; no partial
/// sample is ever returned alongside an error.
#[derive(Debug)]
pub enum CollectError {
    /// Host counter source could not be read.
    SourceUnavailable { path: PathBuf, source: io::Error },
    /// A numeric field of the host counter source failed to parse.
    MalformedSample(String),
    /// Connecting to the stats server failed.
    ConnectionError { target: String, source: io::Error },
    /// Reading or writing failed mid-protocol, or the peer closed early.
    StreamError(io::Error),
    /// A protocol line did not carry the expected number of fields.
    MalformedLine(String),
}

impl std::fmt::Display for CollectError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CollectError::SourceUnavailable { path, source } => {
                write!(f, "cannot read {}: {}", path.display(), source)
            }
            CollectError::MalformedSample(msg) => write!(f, "malformed sample: {}", msg),
            CollectError::ConnectionError { target, source } => {
                write!(f, "cannot connect to {}: {}", target, source)
            }
            CollectError::StreamError(e) => write!(f, "stream error: {}", e),
            CollectError::MalformedLine(line) => write!(f, "malformed line: {:?}", line),
        }
    }
}

impl std::error::Error for CollectError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CollectError::SourceUnavailable { source, .. }
            | CollectError::ConnectionError { source, .. } => Some(source),
            CollectError::StreamError(e) => Some(e),
            CollectError::MalformedSample(_) | CollectError::MalformedLine(_) => None,
        }
    }
}

impl From<ParseError> for CollectError {
    fn from(e: ParseError) -> Self {
        CollectError::MalformedSample(e.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn test_display_includes_context() {
        let err = CollectError::SourceUnavailable {
            path: PathBuf::from("/proc/stat"),
            source: io::Error::new(io::ErrorKind::NotFound, "gone"),
        };
        assert_eq!(err.to_string(), "cannot read /proc/stat: gone");
        assert!(err.source().is_some());

        let err = CollectError::MalformedLine("STAT".to_string());
        assert_eq!(err.to_string(), "malformed line: \"STAT\"");
        assert!(err.source().is_none());
    }

    #[test]
    fn test_parse_error_becomes_malformed_sample() {
        let err: CollectError = ParseError::new("invalid value 'x'").into();
        assert!(matches!(err, CollectError::MalformedSample(ref m) if m == "invalid value 'x'"));
    }
}
