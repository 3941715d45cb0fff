//! memcached statistics collector.
//!
//! Issues `stats` (and optionally `stats slabs` / `stats items`) over a single
//! TCP or Unix socket connection. Base stats are kept under their server
//! names; per-slab counters are renamed by the [`classifier`].

pub mod classifier;
pub mod graphs;
pub mod protocol;

use std::fmt;
use std::io::{Read, Write};
use std::net::TcpStream;
use std::path::PathBuf;

use tracing::{debug, info};

use crate::collector::CollectError;
use crate::graph::GraphSet;
use crate::metrics::{MetricSet, MetricValue};
use crate::plugin::Plugin;
use protocol::StatsClient;

pub use classifier::classify;
pub use graphs::memcached_graphs;

/// Default metric key prefix.
pub const DEFAULT_PREFIX: &str = "memcached";

/// Where the server listens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    /// `host:port`
    Tcp(String),
    /// Local stream socket path.
    Unix(PathBuf),
}

impl Target {
    /// Resolves the target from CLI-style options; a socket path wins over
    /// host and port.
    pub fn from_options(host: &str, port: u16, socket: Option<PathBuf>) -> Self {
        match socket {
            Some(path) if !path.as_os_str().is_empty() => Target::Unix(path),
            _ => Target::Tcp(format!("{}:{}", host, port)),
        }
    }

    /// Opens a connection; exactly one attempt is made.
    pub fn connect(&self) -> Result<Box<dyn Connection>, CollectError> {
        let conn: std::io::Result<Box<dyn Connection>> = match self {
            Target::Tcp(addr) => TcpStream::connect(addr.as_str())
                .map(|s| Box::new(s) as Box<dyn Connection>),
            #[cfg(unix)]
            Target::Unix(path) => std::os::unix::net::UnixStream::connect(path)
                .map(|s| Box::new(s) as Box<dyn Connection>),
            #[cfg(not(unix))]
            Target::Unix(_) => Err(std::io::Error::new(
                std::io::ErrorKind::Unsupported,
                "unix sockets are not supported on this platform",
            )),
        };
        conn.map_err(|source| CollectError::ConnectionError {
            target: self.to_string(),
            source,
        })
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::Tcp(addr) => write!(f, "tcp://{}", addr),
            Target::Unix(path) => write!(f, "unix://{}", path.display()),
        }
    }
}

/// A bidirectional byte stream to the server.
pub trait Connection: Read + Write {}

impl<T: Read + Write> Connection for T {}

/// Collection options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemcachedOptions {
    pub target: Target,
    /// Metric key prefix, also used (title-cased) for graph labels.
    pub prefix: String,
    pub stats_slabs: bool,
    pub stats_items: bool,
}

impl MemcachedOptions {
    pub fn new(target: Target) -> Self {
        Self {
            target,
            prefix: DEFAULT_PREFIX.to_string(),
            stats_slabs: false,
            stats_items: false,
        }
    }
}

/// Runs every enabled stats round over `stream` and merges the results.
///
/// Any failure discards everything read so far.
pub fn fetch_stats<S: Read + Write>(
    stream: S,
    options: &MemcachedOptions,
) -> Result<MetricSet, CollectError> {
    let mut client = StatsClient::new(stream);
    let mut stats = MetricSet::new();

    for (key, value) in client.request("stats")? {
        stats.insert(key, MetricValue::Text(value));
    }

    if options.stats_slabs {
        let before = stats.len();
        for (key, value) in client.request("stats slabs")? {
            if let Some(key) = classifier::slabs_key(&key) {
                stats.insert(key, MetricValue::Text(value));
            }
        }
        debug!("stats slabs added {} metrics", stats.len() - before);
    }

    if options.stats_items {
        let before = stats.len();
        for (key, value) in client.request("stats items")? {
            if let Some(key) = classifier::items_key(&key) {
                stats.insert(key, MetricValue::Text(value));
            }
        }
        debug!("stats items added {} metrics", stats.len() - before);
    }

    Ok(stats)
}

/// Plugin collecting memcached statistics.
pub struct MemcachedPlugin {
    options: MemcachedOptions,
}

impl MemcachedPlugin {
    pub fn new(options: MemcachedOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &MemcachedOptions {
        &self.options
    }
}

impl Plugin for MemcachedPlugin {
    fn name(&self) -> &str {
        "memcached"
    }

    fn metric_key_prefix(&self) -> Option<&str> {
        Some(&self.options.prefix)
    }

    fn fetch_metrics(&mut self) -> Result<MetricSet, CollectError> {
        let conn = self.options.target.connect()?;
        info!("connected to {}", self.options.target);
        fetch_stats(conn, &self.options)
    }

    fn graph_definition(&mut self) -> Result<GraphSet, CollectError> {
        Ok(memcached_graphs(&self.options.prefix))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{self, Cursor};

    struct FakeConn {
        input: Cursor<Vec<u8>>,
        output: Vec<u8>,
    }

    impl Read for FakeConn {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            self.input.read(buf)
        }
    }

    impl Write for FakeConn {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.output.write(buf)
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn conn(responses: &str) -> FakeConn {
        FakeConn {
            input: Cursor::new(responses.as_bytes().to_vec()),
            output: Vec::new(),
        }
    }

    const STATS: &str = "\
STAT pid 1162\r
STAT curr_connections 5\r
STAT cmd_get 100\r
STAT get_hits 80\r
END\r
";

    const SLABS: &str = "\
STAT 1:chunk_size 96\r
STAT 1:get_hits 40\r
STAT 1:mem_requested 1024\r
STAT 12:cmd_set 7\r
STAT active_slabs 2\r
STAT total_malloced 2097152\r
END\r
";

    const ITEMS: &str = "\
STAT items:1:number 3\r
STAT items:1:evicted_time 0\r
STAT items:1:expired_unfetched 2\r
STAT items:12:crawler_reclaimed 9\r
END\r
";

    fn text(v: &str) -> Option<MetricValue> {
        Some(MetricValue::from(v))
    }

    #[test]
    fn test_target_socket_wins() {
        let t = Target::from_options("localhost", 11211, Some(PathBuf::from("/tmp/mc.sock")));
        assert_eq!(t, Target::Unix(PathBuf::from("/tmp/mc.sock")));

        let t = Target::from_options("localhost", 11211, None);
        assert_eq!(t, Target::Tcp("localhost:11211".to_string()));
        assert_eq!(t.to_string(), "tcp://localhost:11211");

        let t = Target::from_options("10.0.0.1", 11212, Some(PathBuf::new()));
        assert_eq!(t, Target::Tcp("10.0.0.1:11212".to_string()));
    }

    #[test]
    fn test_fetch_base_stats_only() {
        let options = MemcachedOptions::new(Target::Tcp("unused:0".into()));
        let stats = fetch_stats(conn(STATS), &options).unwrap();

        assert_eq!(stats.len(), 4);
        assert_eq!(stats.get("curr_connections").cloned(), text("5"));
        assert_eq!(stats.get("get_hits").cloned(), text("80"));
    }

    #[test]
    fn test_fetch_with_slabs_and_items() {
        let mut options = MemcachedOptions::new(Target::Tcp("unused:0".into()));
        options.stats_slabs = true;
        options.stats_items = true;

        let responses = format!("{STATS}{SLABS}{ITEMS}");
        let stats = fetch_stats(conn(&responses), &options).unwrap();

        assert_eq!(stats.get("hits.slab.class01.get_hits").cloned(), text("40"));
        assert_eq!(stats.get("hits.slab.class12.cmd_set").cloned(), text("7"));
        assert_eq!(
            stats.get("mem_requested.slab.class01.mem_requested").cloned(),
            text("1024")
        );
        assert_eq!(
            stats.get("evicted_time.slab.class01.evicted_time").cloned(),
            text("0")
        );
        assert_eq!(
            stats
                .get("number_of_items.slab.class01.expired_unfetched")
                .cloned(),
            text("2")
        );
        assert_eq!(
            stats
                .get("number_of_items.slab.class12.crawler_reclaimed")
                .cloned(),
            text("9")
        );
        assert!(!stats.keys().any(|k| k.contains("chunk_size")));
        assert!(!stats.contains_key("active_slabs"));
        assert_eq!(stats.len(), 4 + 3 + 3);
    }

    #[test]
    fn test_fetch_items_without_slabs() {
        let mut options = MemcachedOptions::new(Target::Tcp("unused:0".into()));
        options.stats_items = true;

        let responses = format!("{STATS}{ITEMS}");
        let mut c = conn(&responses);
        let stats = fetch_stats(&mut c, &options).unwrap();
        assert!(stats.contains_key("number_of_items.slab.class01.expired_unfetched"));
        assert_eq!(String::from_utf8(c.output).unwrap(), "stats\nstats items\n");
    }

    #[test]
    fn test_truncated_second_round_fails_whole_fetch() {
        let mut options = MemcachedOptions::new(Target::Tcp("unused:0".into()));
        options.stats_slabs = true;

        let responses = format!("{STATS}STAT 1:get_hits 40\r\n");
        let err = fetch_stats(conn(&responses), &options).unwrap_err();
        assert!(matches!(err, CollectError::StreamError(_)));
    }

    #[test]
    fn test_malformed_line_fails_fetch() {
        let options = MemcachedOptions::new(Target::Tcp("unused:0".into()));
        let err = fetch_stats(conn("STAT pid 1\r\nSTAT\r\nEND\r\n"), &options).unwrap_err();
        assert!(matches!(err, CollectError::MalformedLine(_)));
    }

    #[test]
    fn test_connection_refused() {
        // Bind then drop to get a port nobody listens on.
        let port = std::net::TcpListener::bind("127.0.0.1:0")
            .unwrap()
            .local_addr()
            .unwrap()
            .port();
        let mut plugin = MemcachedPlugin::new(MemcachedOptions::new(Target::from_options(
            "127.0.0.1",
            port,
            None,
        )));
        let err = plugin.fetch_metrics().unwrap_err();
        assert!(matches!(err, CollectError::ConnectionError { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn test_missing_unix_socket() {
        let dir = tempfile::tempdir().unwrap();
        let target = Target::Unix(dir.path().join("missing.sock"));
        assert!(matches!(
            target.connect(),
            Err(CollectError::ConnectionError { .. })
        ));
    }

    #[test]
    fn test_plugin_definitions_need_no_connection() {
        let mut options = MemcachedOptions::new(Target::Tcp("192.0.2.1:1".into()));
        options.prefix = "cache".to_string();
        let mut plugin = MemcachedPlugin::new(options);

        assert_eq!(plugin.metric_key_prefix(), Some("cache"));
        let graphs = plugin.graph_definition().unwrap();
        assert_eq!(graphs["items"].label, "Cache Items");
    }
}
