pub mod config;
pub mod controller;
pub mod mapping;
pub mod session;
pub mod transport;

use crate::config::AppConfig;
use crate::mapping::Dispatcher;
use crate::session::{
    connection_hints, spawn_stdin_reader, Connecting, Session, SessionError, SessionSettings,
};
use crate::transport::{HttpTransport, Transport};
use clap::{Parser, Subcommand};
use color_eyre::{eyre::eyre, Result};
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn, Level};
use tracing_subscriber::FmtSubscriber;

/// Drive a networked controller emulator from the terminal
#[derive(Parser, Debug)]
#[command(name = "switch-remote", version, about)]
struct Cli {
    /// Config file (default: ~/.config/switch-remote/config.toml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Device host, overrides the config file
    #[arg(long)]
    host: Option<String>,

    /// Device port, overrides the config file
    #[arg(long)]
    port: Option<u16>,

    /// Momentary button hold in milliseconds
    #[arg(long)]
    hold_ms: Option<u64>,

    /// Skip the startup connection check
    #[arg(long)]
    no_check: bool,

    /// Debug logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone)]
enum Command {
    /// Read commands from stdin until `quit` (default)
    Interactive,
    /// Dispatch the given commands in order, then exit
    Send {
        #[arg(required = true)]
        commands: Vec<String>,
    },
    /// Only check that the device is reachable
    Ping,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    setup(cli.verbose)?;

    let config = load_config(&cli).await?;
    let endpoint = config.endpoint();
    println!("Target: {}", endpoint);

    let transport: Arc<dyn Transport> = Arc::new(
        HttpTransport::new(endpoint).map_err(|e| eyre!("Failed to create transport: {}", e))?,
    );

    let cancel = CancellationToken::new();
    spawn_interrupt_watcher(cancel.clone());

    let dispatcher = Dispatcher::new(config.dispatch_settings()).with_cancellation(cancel.clone());
    let command = cli.command.clone().unwrap_or(Command::Interactive);
    let settings = SessionSettings {
        check_connection: match command {
            Command::Ping => true,
            _ => config.session.check_connection && !cli.no_check,
        },
        release_on_exit: config.session.release_on_exit,
    };

    let session = Session::<Connecting>::create(transport, dispatcher, settings, cancel);
    let ready = match session.check_connection().await {
        Ok(ready) => ready,
        Err(e) => {
            report_connection_failure(&e);
            return Err(eyre!("{}", e));
        }
    };

    match command {
        Command::Ping => {
            println!("Connection OK");
        }
        Command::Send { commands } => {
            let closed = ready.run_script(&commands).await;
            if closed.stats().send_failures > 0 {
                warn!("{} snapshots were not delivered", closed.stats().send_failures);
            }
        }
        Command::Interactive => {
            ready.run(spawn_stdin_reader()).await?;
            println!("Bye");
        }
    }

    Ok(())
}

fn setup(verbose: bool) -> Result<()> {
    if std::env::var("RUST_LIB_BACKTRACE").is_err() {
        std::env::set_var("RUST_LIB_BACKTRACE", "0")
    }
    color_eyre::install()?;
    setup_logging_env(verbose);
    Ok(())
}

/// `RUST_LOG` picks the level, `--verbose` raises it to at least debug
fn log_level(verbose: bool, rust_log: Option<&str>) -> Level {
    let level = rust_log
        .and_then(|v| v.trim().parse::<Level>().ok())
        .unwrap_or(Level::INFO);
    if verbose {
        level.max(Level::DEBUG)
    } else {
        level
    }
}

fn setup_logging_env(verbose: bool) {
    let rust_log = std::env::var("RUST_LOG").ok();
    let level = log_level(verbose, rust_log.as_deref());
    FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_file(true)
        .with_line_number(true)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

async fn load_config(cli: &Cli) -> Result<AppConfig> {
    let path = cli.config.clone().unwrap_or_else(AppConfig::default_path);
    let mut config = AppConfig::load_or_create(&path)
        .await
        .map_err(|e| eyre!("Failed to load config: {}", e))?;

    if let Some(host) = &cli.host {
        config.device.host = host.clone();
    }
    if let Some(port) = cli.port {
        config.device.port = port;
    }
    if let Some(hold_ms) = cli.hold_ms {
        config.dispatch.hold_duration_ms = hold_ms;
    }
    config
        .validate()
        .map_err(|e| eyre!("Invalid configuration: {}", e))?;

    info!("Using config from {}", path.display());
    Ok(config)
}

// Ctrl-C cancels a pending hold and ends the session
fn spawn_interrupt_watcher(cancel: CancellationToken) {
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Interrupt received, shutting down");
                cancel.cancel();
            }
            Err(e) => error!("Unable to listen for Ctrl-C: {}", e),
        }
    });
}

fn report_connection_failure(e: &SessionError) {
    error!("{}", e);
    if let SessionError::ConnectionCheck { endpoint, .. } = e {
        eprintln!("Could not reach the device.");
        for hint in connection_hints(endpoint) {
            eprintln!("{}", hint);
        }
    }
}
