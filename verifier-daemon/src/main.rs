//! Version Verifier Daemon (`verifierd`)
//!
//! Headless daemon that watches the registry ledger for proposed package
//! versions, checks each against its lineage and votes.

mod app;
mod config;

use anyhow::Context;
use clap::{Parser, Subcommand};
use config::{Overrides, VerifierConfig};
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "verifierd", version, about = "Registry Version Verifier Daemon")]
struct Args {
    /// TOML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Verbose logging (-v for debug, -vv for trace)
    #[arg(long, short, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Directory holding the checkpoint database
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[arg(long, global = true)]
    ledger_url: Option<String>,

    #[arg(long, global = true)]
    content_store_url: Option<String>,

    #[arg(long, global = true)]
    poll_interval_ms: Option<u64>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Poll and vote until interrupted (default)
    Run,
    /// Run a single poll iteration and exit
    Once,
    /// Inspect or override the persisted checkpoint
    #[command(subcommand)]
    Checkpoint(CheckpointCommand),
}

#[derive(Subcommand, Debug)]
enum CheckpointCommand {
    Show,
    Set {
        /// Block height the next poll starts from
        block: u64,
        /// Allow moving the checkpoint backwards
        #[arg(long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose)?;

    let overrides = Overrides {
        data_dir: args.data_dir.clone(),
        ledger_url: args.ledger_url.clone(),
        content_store_url: args.content_store_url.clone(),
        poll_interval_ms: args.poll_interval_ms,
    };
    let config = VerifierConfig::load(args.config.as_deref(), &overrides).context("loading configuration")?;
    tracing::debug!(?config, "Configuration loaded");

    match args.command.unwrap_or(Command::Run) {
        Command::Run => {
            tracing::info!("verifierd v{} starting...", env!("CARGO_PKG_VERSION"));
            let mut verification_loop = app::build_loop(&config)?;

            let signals = ShutdownSignals::install().context("installing signal handlers")?;
            let shutdown = CancellationToken::new();
            tokio::spawn(cancel_on_signal(signals, shutdown.clone()));
            tracing::info!("Daemon ready. Press Ctrl+C to stop.");

            verification_loop.run(shutdown).await.context("verification halted")?;
            tracing::info!("Daemon stopped");
        }
        Command::Once => {
            let mut verification_loop = app::build_loop(&config)?;
            let report = verification_loop.run_once().await.context("verification halted")?;
            tracing::info!(
                approved = report.approved,
                rejected = report.rejected,
                ignored = report.ignored,
                next_block = verification_loop.checkpoint().next_block,
                "{} proposed version events processed",
                report.processed
            );
        }
        Command::Checkpoint(CheckpointCommand::Show) => {
            let store = app::open_checkpoints(&config)?;
            println!("{}", app::describe(store.load()?));
        }
        Command::Checkpoint(CheckpointCommand::Set { block, force }) => {
            let store = app::open_checkpoints(&config)?;
            let checkpoint = app::set_checkpoint(&store, block, force)?;
            println!("{}", app::describe(Some(checkpoint)));
        }
    }

    Ok(())
}

fn init_tracing(verbosity: u8) -> anyhow::Result<()> {
    let mut filter = EnvFilter::from_default_env();

    // Only apply defaults if RUST_LOG is not set
    if std::env::var("RUST_LOG").is_err() {
        let level = match verbosity {
            0 => LevelFilter::INFO,
            1 => LevelFilter::DEBUG,
            _ => LevelFilter::TRACE,
        };
        filter = filter.add_directive(level.into());
    }

    // Always silence noisy crates
    const SILENCE: &[&str] = &["hyper_util=warn", "reqwest=info", "redb=warn"];
    for d in SILENCE {
        filter = filter.add_directive(d.parse()?);
    }

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
    Ok(())
}

/// SIGINT/SIGTERM listeners, installed up front so a failure stops startup.
#[cfg(unix)]
struct ShutdownSignals {
    sigint: tokio::signal::unix::Signal,
    sigterm: tokio::signal::unix::Signal,
}

#[cfg(unix)]
impl ShutdownSignals {
    fn install() -> std::io::Result<Self> {
        use tokio::signal::unix::{signal, SignalKind};
        Ok(Self {
            sigint: signal(SignalKind::interrupt())?,
            sigterm: signal(SignalKind::terminate())?,
        })
    }

    async fn recv(mut self) {
        tokio::select! {
            _ = self.sigint.recv() => {}
            _ = self.sigterm.recv() => {}
        }
    }
}

#[cfg(not(unix))]
struct ShutdownSignals;

#[cfg(not(unix))]
impl ShutdownSignals {
    fn install() -> std::io::Result<Self> {
        Ok(Self)
    }

    async fn recv(self) {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    }
}

async fn cancel_on_signal(signals: ShutdownSignals, token: CancellationToken) {
    signals.recv().await;
    tracing::info!("Shutdown signal received, stopping after the current iteration...");
    token.cancel();
}
