//! mkr-plugin-linux-cpus - per-cpu time counters from /proc/stat.
//!
//! Prints values (or graph definitions when the agent sets
//! `MACKEREL_AGENT_PLUGIN_META`) to stdout; diagnostics go to stderr.

use std::path::PathBuf;

use clap::Parser;
use tracing::{debug, error};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::LevelFilter;

use mkr_plugin_core::collector::{LinuxCpusPlugin, RealFs};
use mkr_plugin_core::plugin::PluginRunner;

/// Per-cpu counter plugin.
#[derive(Parser)]
#[command(
    name = "mkr-plugin-linux-cpus",
    about = "Per-cpu time counters from /proc/stat",
    version = mkr_plugin_core::VERSION
)]
struct Args {
    /// State file holding the previous sample.
    #[arg(short, long, env = "MKR_PLUGIN_LINUX_CPUS_TEMPFILE", value_name = "PATH")]
    tempfile: Option<PathBuf>,

    /// Path to /proc filesystem (for testing/mocking).
    #[arg(long, default_value = "/proc")]
    proc_path: String,

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
    debug!("proc={}", args.proc_path);

    let plugin = LinuxCpusPlugin::new(RealFs::new(), &args.proc_path);
    let mut runner = PluginRunner::new(plugin, args.tempfile);

    let stdout = std::io::stdout();
    if let Err(e) = runner.run(&mut stdout.lock()) {
        error!("{}", e);
        std::process::exit(1);
    }
}
