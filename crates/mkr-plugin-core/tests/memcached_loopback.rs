//! memcached collection against real TCP and Unix socket listeners.

use std::io::{BufRead, BufReader, Read, Write};
use std::net::TcpListener;
use std::thread;

use mkr_plugin_core::collector::{CollectError, MemcachedOptions, MemcachedPlugin, Target};
use mkr_plugin_core::plugin::{Plugin, PluginRunner};

/// Canned responses for one connection.
struct Session {
    stats: String,
    slabs: String,
    items: String,
}

impl Session {
    fn new(cmd_get: u64, slab_hits: u64) -> Self {
        Self {
            stats: format!(
                "STAT pid 42\r\n\
                 STAT version 1.6.21\r\n\
                 STAT curr_connections 3\r\n\
                 STAT cmd_get {cmd_get}\r\n\
                 STAT limit_maxbytes 67108864\r\n\
                 STAT bytes 2048\r\n\
                 END\r\n"
            ),
            slabs: format!(
                "STAT 1:get_hits {slab_hits}\r\n\
                 STAT 1:mem_requested 512\r\n\
                 STAT active_slabs 1\r\n\
                 END\r\n"
            ),
            items: "STAT items:1:number 2\r\nSTAT items:1:evicted_time 30\r\nEND\r\n".to_string(),
        }
    }
}

/// Accepts one connection per session and answers each command until the
/// client hangs up. Returns the commands received.
fn serve(sessions: Vec<Session>) -> (u16, thread::JoinHandle<Vec<String>>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();

    let handle = thread::spawn(move || {
        let mut commands = Vec::new();
        for session in sessions {
            let (stream, _) = listener.accept().unwrap();
            let writer = stream.try_clone().unwrap();
            answer(&session, stream, writer, &mut commands);
        }
        commands
    });
    (port, handle)
}

/// Answers each command line of one connection until the client hangs up.
fn answer(session: &Session, reader: impl Read, mut writer: impl Write, commands: &mut Vec<String>) {
    for line in BufReader::new(reader).lines() {
        let line = line.unwrap();
        let response = match line.as_str() {
            "stats" => session.stats.as_str(),
            "stats slabs" => session.slabs.as_str(),
            "stats items" => session.items.as_str(),
            _ => "ERROR\r\n",
        };
        writer.write_all(response.as_bytes()).unwrap();
        commands.push(line);
    }
}

fn options(port: u16) -> MemcachedOptions {
    let mut options = MemcachedOptions::new(Target::from_options("127.0.0.1", port, None));
    options.stats_slabs = true;
    options.stats_items = true;
    options
}

#[test]
fn fetch_over_loopback() {
    let (port, server) = serve(vec![Session::new(100, 10)]);

    let mut plugin = MemcachedPlugin::new(options(port));
    let metrics = plugin.fetch_metrics().unwrap();
    drop(plugin);

    assert_eq!(metrics["cmd_get"].as_u64(), Some(100));
    assert_eq!(metrics["hits.slab.class01.get_hits"].as_u64(), Some(10));
    assert_eq!(
        metrics["mem_requested.slab.class01.mem_requested"].as_u64(),
        Some(512)
    );
    assert_eq!(
        metrics["evicted_time.slab.class01.evicted_time"].as_u64(),
        Some(30)
    );
    assert!(!metrics.contains_key("active_slabs"));

    let commands = server.join().unwrap();
    assert_eq!(commands, vec!["stats", "stats slabs", "stats items"]);
}

#[cfg(unix)]
#[test]
fn fetch_over_unix_socket_wins_over_tcp() {
    use std::os::unix::net::UnixListener;

    let dir = tempfile::tempdir().unwrap();
    let sock = dir.path().join("memcached.sock");
    let listener = UnixListener::bind(&sock).unwrap();
    let server = thread::spawn(move || {
        let mut commands = Vec::new();
        let (stream, _) = listener.accept().unwrap();
        let writer = stream.try_clone().unwrap();
        answer(&Session::new(7, 3), stream, writer, &mut commands);
        commands
    });

    // Nothing listens on the TCP side; the socket must be used.
    let mut options = MemcachedOptions::new(Target::from_options("127.0.0.1", 1, Some(sock.clone())));
    options.stats_slabs = true;
    assert_eq!(options.target, Target::Unix(sock));

    let metrics = MemcachedPlugin::new(options).fetch_metrics().unwrap();
    assert_eq!(metrics["cmd_get"].as_u64(), Some(7));
    assert_eq!(metrics["curr_connections"].as_u64(), Some(3));
    assert_eq!(metrics["hits.slab.class01.get_hits"].as_u64(), Some(3));
    assert!(!metrics.contains_key("evicted_time.slab.class01.evicted_time"));

    assert_eq!(server.join().unwrap(), vec!["stats", "stats slabs"]);
}

#[test]
fn runner_reports_rates_on_second_invocation() {
    let (port, server) = serve(vec![Session::new(100, 10), Session::new(400, 70)]);

    let dir = tempfile::tempdir().unwrap();
    let state = dir.path().join("memcached.json");
    let mut runner = PluginRunner::new(MemcachedPlugin::new(options(port)), Some(state));

    let mut out = Vec::new();
    runner.output_values(&mut out, 1_000).unwrap();
    let first = String::from_utf8(out).unwrap();
    assert!(first.contains("memcached.connections.curr_connections\t3.000000\t1000\n"));
    assert!(first.contains("memcached.cachesize.bytes\t2048\t1000\n"));
    assert!(first.contains("memcached.cachesize.limit_maxbytes\t67108864.000000\t1000\n"));
    assert!(first.contains("memcached.mem_requested.slab.class01.mem_requested\t512\t1000\n"));
    assert!(!first.contains("cmd_get"));

    let mut out = Vec::new();
    runner.output_values(&mut out, 1_060).unwrap();
    let second = String::from_utf8(out).unwrap();
    assert!(second.contains("memcached.cmd.cmd_get\t300.000000\t1060\n"));
    assert!(second.contains("memcached.hits.slab.class01.get_hits\t60.000000\t1060\n"));

    server.join().unwrap();
}

#[test]
fn server_hanging_up_mid_response_is_stream_error() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    let server = thread::spawn(move || {
        let (mut stream, _) = listener.accept().unwrap();
        let mut line = String::new();
        BufReader::new(stream.try_clone().unwrap())
            .read_line(&mut line)
            .unwrap();
        stream.write_all(b"STAT pid 1\r\n").unwrap();
    });

    let mut plugin = MemcachedPlugin::new(MemcachedOptions::new(Target::from_options(
        "127.0.0.1",
        port,
        None,
    )));
    let err = plugin.fetch_metrics().unwrap_err();
    assert!(matches!(err, CollectError::StreamError(_)));

    server.join().unwrap();
}
