//! mkr-plugin-memcached - memcached `stats` metrics.
//!
//! Prints values (or graph definitions when the agent sets
//! `MACKEREL_AGENT_PLUGIN_META`) to stdout; diagnostics go to stderr.

use std::path::PathBuf;

use clap::Parser;
use tracing::{debug, error};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::LevelFilter;

use mkr_plugin_core::collector::memcached::DEFAULT_PREFIX;
use mkr_plugin_core::collector::{MemcachedOptions, MemcachedPlugin, Target};
use mkr_plugin_core::plugin::PluginRunner;

/// memcached plugin.
#[derive(Parser)]
#[command(
    name = "mkr-plugin-memcached",
    about = "memcached statistics plugin",
    version = mkr_plugin_core::VERSION
)]
struct Args {
    /// Server hostname.
    #[arg(long, default_value = "localhost")]
    host: String,

    /// Server port.
    #[arg(long, default_value_t = 11211)]
    port: u16,

    /// Unix socket path. Takes precedence over --host/--port.
    #[arg(long, value_name = "PATH")]
    socket: Option<PathBuf>,

    /// Prefix for metric keys and graph labels.
    #[arg(long, default_value = DEFAULT_PREFIX)]
    metric_key_prefix: String,

    /// State file holding the previous sample.
    #[arg(long, value_name = "PATH")]
    tempfile: Option<PathBuf>,

    /// Also collect per-slab counters (`stats slabs`).
    #[arg(long)]
    stats_slabs: bool,

    /// Also collect per-slab item counters (`stats items`).
    #[arg(long)]
    stats_items: bool,

    /// Increase logging verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Quiet mode - only show errors.
    #[arg(short, long)]
    quiet: bool,
}

fn init_logging(verbose: u8, quiet: bool) {
    let level = if quiet {
        LevelFilter::ERROR
    } else {
        match verbose {
            0 => LevelFilter::WARN,
            1 => LevelFilter::INFO,
            2 => LevelFilter::DEBUG,
            _ => LevelFilter::TRACE,
        }
    };

    let filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let args = Args::parse();
    init_logging(args.verbose, args.quiet);

    let target = Target::from_options(&args.host, args.port, args.socket);
    let mut options = MemcachedOptions::new(target);
    options.prefix = args.metric_key_prefix;
    options.stats_slabs = args.stats_slabs;
    options.stats_items = args.stats_items;
    debug!(
        "target={}, slabs={}, items={}",
        options.target, options.stats_slabs, options.stats_items
    );

    // Non-default prefixes get their own state file.
    let tempfile = args.tempfile.or_else(|| {
        (options.prefix != DEFAULT_PREFIX).then(|| {
            mkr_plugin_core::storage::StateStore::default_path(&format!(
                "memcached-{}",
                options.prefix
            ))
        })
    });

    let mut runner = PluginRunner::new(MemcachedPlugin::new(options), tempfile);

    let stdout = std::io::stdout();
    if let Err(e) = runner.run(&mut stdout.lock()) {
        error!("{}", e);
        std::process::exit(1);
    }
}
