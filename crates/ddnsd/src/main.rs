// # ddnsd - DDNS Daemon
//
// Thin integration layer: all reconciliation logic lives in ddns-core.
//
// The ddnsd daemon is responsible for:
// 1. Parsing the command line
// 2. Setting up logging (stderr, plus a log file when running as a service)
// 3. Loading and validating the JSON configuration
// 4. Building the address sources and the Cloudflare provider
// 5. Resolving the watched records and running the scheduler
//
// ## Example
//
// ```bash
// # Check once and exit
// ddnsd -c /etc/ddns/config.json --onetime
//
// # Run forever, checking every engine.interval_secs seconds
// ddnsd -c /etc/ddns/config.json
// ```

use anyhow::{Context, Result};
use clap::Parser;
use ddns_core::{DdnsConfig, EngineEvent, ReconcileEngine, RecordLookup, Schedule, Scheduler};
use ddns_ip_http::{FamilyClients, default_pool};
use ddns_provider_cloudflare::CloudflareProvider;
use std::fs::{File, OpenOptions};
use std::future::Future;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{Level, debug, error, info};
use tracing_subscriber::FmtSubscriber;
use tracing_subscriber::fmt::writer::{BoxMakeWriter, MakeWriterExt};

#[cfg(unix)]
use tokio::signal::unix::{SignalKind, signal};

/// Log file name used when `--log` is not given
const DEFAULT_LOG_FILE: &str = "cfddns.log";

/// Exit codes for different termination scenarios
///
/// These codes follow systemd conventions:
/// - 0: Clean shutdown
/// - 1: Configuration or startup error
/// - 2: Runtime error (unexpected)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DdnsExitCode {
    /// Clean shutdown (normal exit)
    CleanShutdown = 0,
    /// Configuration error or startup failure
    ConfigError = 1,
    /// Runtime error (unexpected failure)
    RuntimeError = 2,
}

impl From<DdnsExitCode> for ExitCode {
    fn from(code: DdnsExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

/// Keep DNS records pointed at this machine's public addresses.
#[derive(Debug, Parser)]
#[command(name = "ddnsd")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Configuration file
    #[arg(short = 'c', long = "conf", default_value = "./config.json")]
    conf: PathBuf,

    /// Log file (always written when given, even with --onetime)
    #[arg(short = 'l', long = "log")]
    log: Option<PathBuf>,

    /// Run a single check and exit
    #[arg(short = 'o', long = "onetime")]
    onetime: bool,

    /// Read current record values from system DNS instead of the provider API
    #[arg(short = 'u', long = "usedns")]
    usedns: bool,

    /// Never write a log file
    #[arg(short = 'n', long = "nolog")]
    nolog: bool,

    /// Look up records but only log the updates that would be made
    #[arg(long = "dry-run")]
    dry_run: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long = "log-level", env = "DDNS_LOG_LEVEL", default_value = "info")]
    log_level: Level,
}

impl Cli {
    /// Where to write the log file, if anywhere
    ///
    /// A file is written unless `--nolog`, and then only when running
    /// forever or when `--log` names one explicitly.
    fn log_file(&self) -> Option<PathBuf> {
        if self.nolog {
            return None;
        }

        match &self.log {
            Some(path) => Some(path.clone()),
            None if self.onetime => None,
            None => Some(default_log_path(Path::new("/tmp"), &current_dir())),
        }
    }
}

fn current_dir() -> PathBuf {
    std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
}

/// `<tmp>/cfddns.log` if `tmp` exists, else `<cwd>/cfddns.log`
fn default_log_path(tmp: &Path, cwd: &Path) -> PathBuf {
    if tmp.is_dir() {
        tmp.join(DEFAULT_LOG_FILE)
    } else {
        cwd.join(DEFAULT_LOG_FILE)
    }
}

fn open_log_file(path: &Path) -> Result<File> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Failed to open log file {}", path.display()))
}

/// Install the global subscriber: stderr, plus `file` when given
fn init_tracing(level: Level, file: Option<File>) -> Result<()> {
    let with_file = file.is_some();
    let writer = match file {
        Some(file) => BoxMakeWriter::new(std::io::stderr.and(Arc::new(file))),
        None => BoxMakeWriter::new(std::io::stderr),
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(writer)
        .with_ansi(!with_file)
        .finish();

    tracing::subscriber::set_global_default(subscriber).context("Failed to set tracing subscriber")
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let log_file = match cli.log_file().map(|path| open_log_file(&path)).transpose() {
        Ok(file) => file,
        Err(e) => {
            eprintln!("{:#}", e);
            return DdnsExitCode::ConfigError.into();
        }
    };

    if let Err(e) = init_tracing(cli.log_level, log_file) {
        eprintln!("{:#}", e);
        return DdnsExitCode::ConfigError.into();
    }

    info!("Starting ddnsd daemon");

    // Everything runs on one thread; the engine awaits each request in turn
    let rt = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return DdnsExitCode::RuntimeError.into();
        }
    };

    rt.block_on(run(cli)).into()
}

/// Run the daemon and map its outcome to an exit code
async fn run(cli: Cli) -> DdnsExitCode {
    match run_daemon(cli).await {
        Ok(()) => DdnsExitCode::CleanShutdown,
        Err(e) => {
            error!("{:#}", e);
            DdnsExitCode::ConfigError
        }
    }
}

/// Load the configuration, apply command-line overrides and validate it
fn load_config(cli: &Cli) -> Result<DdnsConfig> {
    let mut config = DdnsConfig::load(&cli.conf)
        .with_context(|| format!("Failed to load configuration from {}", cli.conf.display()))?;
    if cli.usedns {
        config.engine.lookup = RecordLookup::Dns;
    }
    config.validate().context("Configuration validation error")?;

    Ok(config)
}

/// Start up and run the scheduler
///
/// Every error returned from here happens before the first cycle.
async fn run_daemon(cli: Cli) -> Result<()> {
    let config = load_config(&cli)?;

    info!(
        "Configuration loaded: {} A, {} AAAA, {} subnet target(s)",
        config.a.len(),
        config.aaaa.len(),
        config.subnet_targets().len()
    );

    let clients = FamilyClients::new()?;
    let sources = default_pool(&clients);
    let provider = CloudflareProvider::from_config(&config, cli.dry_run)?;

    let (engine, events) = ReconcileEngine::bootstrap(Box::new(provider), sources, &config)
        .await
        .context("Failed to resolve watched records")?;
    tokio::spawn(log_events(events));

    let schedule = if cli.onetime {
        Schedule::Once
    } else {
        Schedule::Every(config.engine.interval())
    };

    let shutdown = shutdown_signal()?;
    let cycles = Scheduler::new(&engine, schedule).run_until(shutdown).await;

    info!("Shutting down daemon after {} cycle(s)", cycles);
    Ok(())
}

async fn log_events(mut events: mpsc::Receiver<EngineEvent>) {
    while let Some(event) = events.recv().await {
        debug!("Engine event: {:?}", event);
    }
}

/// Resolves on SIGTERM or SIGINT
#[cfg(unix)]
fn shutdown_signal() -> Result<impl Future<Output = ()>> {
    let mut sigterm = signal(SignalKind::terminate()).context("Failed to setup SIGTERM handler")?;
    let mut sigint = signal(SignalKind::interrupt()).context("Failed to setup SIGINT handler")?;

    Ok(async move {
        let name = tokio::select! {
            _ = sigterm.recv() => "SIGTERM",
            _ = sigint.recv() => "SIGINT",
        };
        info!("Received shutdown signal: {}", name);
    })
}

/// Resolves on CTRL-C
///
/// Fallback implementation for non-Unix platforms.
#[cfg(not(unix))]
fn shutdown_signal() -> Result<impl Future<Output = ()>> {
    Ok(async {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Received shutdown signal: CTRL-C");
        }
    })
}
