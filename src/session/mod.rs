//! Interactive command session with a statum state machine
//!
//! Reads one command at a time, fully plays its snapshot sequence through
//! the transport (including any hold), then accepts the next one.
//!
//! # State Machine
//!
//! ```text
//! Connecting ──► Ready ──► Closed
//!   (rest state    (command loop)   (rest state sent
//!    sent once)                      if still deflected)
//! ```
//!
//! Transport failures never end the session. They are logged by the
//! transport, counted here, and the loop continues.

use crate::controller::ControllerSnapshot;
use crate::mapping::{help_text, CommandSymbol, DispatchSequence, Dispatcher};
use crate::transport::{Transport, TransportError};
use statum::{machine, state};
use std::io::Write;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

const PROMPT: &str = "command > ";

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Connection check against {endpoint} failed: {source}")]
    ConnectionCheck {
        endpoint: String,
        #[source]
        source: TransportError,
    },

    #[error("Failed to read command input: {0}")]
    Input(#[from] std::io::Error),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionSettings {
    pub check_connection: bool,
    pub release_on_exit: bool,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            check_connection: true,
            release_on_exit: true,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SessionStats {
    pub commands: usize,
    pub invalid_commands: usize,
    pub snapshots_sent: usize,
    pub send_failures: usize,
    /// Last snapshot handed to the transport, delivered or not
    pub last_snapshot: Option<ControllerSnapshot>,
}

impl SessionStats {
    fn record(&mut self, snapshot: ControllerSnapshot, delivered: bool) {
        if delivered {
            self.snapshots_sent += 1;
        } else {
            self.send_failures += 1;
        }
        self.last_snapshot = Some(snapshot);
    }
}

/// Whether the loop should keep reading commands
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

#[state]
#[derive(Debug, Clone)]
pub enum SessionState {
    Connecting,
    Ready,
    Closed,
}

#[machine]
pub struct Session<S: SessionState> {
    transport: Arc<dyn Transport>,
    dispatcher: Dispatcher,
    settings: SessionSettings,
    cancel: CancellationToken,
    stats: SessionStats,
}

impl<S: SessionState> Session<S> {
    pub fn stats(&self) -> &SessionStats {
        &self.stats
    }

    async fn transmit(&mut self, snapshot: ControllerSnapshot) -> bool {
        let delivered = self.transport.send(&snapshot).await.is_ok();
        self.stats.record(snapshot, delivered);
        delivered
    }
}

impl Session<Connecting> {
    pub fn create(
        transport: Arc<dyn Transport>,
        dispatcher: Dispatcher,
        settings: SessionSettings,
        cancel: CancellationToken,
    ) -> Self {
        info!("Creating session for {}", transport.describe());
        Self::new(
            transport,
            dispatcher,
            settings,
            cancel,
            SessionStats::default(),
        )
    }

    /// Sends the rest state once to prove the device is reachable
    pub async fn check_connection(mut self) -> Result<Session<Ready>, SessionError> {
        if !self.settings.check_connection {
            debug!("Connection check disabled");
            return Ok(self.transition());
        }

        info!("Testing connection to {}", self.transport.describe());
        let rest = ControllerSnapshot::rest();
        match self.transport.send(&rest).await {
            Ok(delivery) => {
                self.stats.record(rest, true);
                info!(
                    "Connection OK at {} ({}ms round trip)",
                    delivery.sent_at.format("%H:%M:%S"),
                    delivery.round_trip.as_millis()
                );
                Ok(self.transition())
            }
            Err(source) => {
                self.stats.record(rest, false);
                Err(SessionError::ConnectionCheck {
                    endpoint: self.transport.describe(),
                    source,
                })
            }
        }
    }
}

impl Session<Ready> {
    /// Resolves and plays one line of input
    pub async fn execute(&mut self, input: &str) -> Flow {
        let sequence = match self.dispatcher.dispatch_str(input) {
            Ok(sequence) => sequence,
            Err(e) => {
                self.stats.invalid_commands += 1;
                println!("{}", e);
                return Flow::Continue;
            }
        };

        if sequence.symbol() == CommandSymbol::Help {
            println!("{}", help_text());
            return Flow::Continue;
        }
        self.stats.commands += 1;

        let ends_session = sequence.ends_session();
        self.play(sequence).await;

        if ends_session {
            Flow::Quit
        } else {
            Flow::Continue
        }
    }

    async fn play(&mut self, mut sequence: DispatchSequence) {
        let symbol = sequence.symbol();
        while let Some(snapshot) = sequence.next().await {
            if !self.transmit(snapshot).await {
                warn!("Snapshot for {} was not delivered", symbol);
            }
        }
    }

    /// Runs the read-dispatch loop until `quit`, end of input or cancellation
    ///
    /// A closed `input` channel counts as end of input.
    pub async fn run(
        mut self,
        mut input: mpsc::Receiver<String>,
    ) -> Result<Session<Closed>, SessionError> {
        info!("Entering interactive mode");
        println!("{}", help_text());

        loop {
            if self.cancel.is_cancelled() {
                info!("Session interrupted");
                break;
            }
            print!("{}", PROMPT);
            std::io::stdout().flush()?;

            let line = tokio::select! {
                line = input.recv() => line,
                _ = self.cancel.cancelled() => {
                    info!("Session interrupted while waiting for input");
                    break;
                }
            };

            let Some(line) = line else {
                info!("Command input closed");
                break;
            };

            if self.execute(&line).await == Flow::Quit {
                info!("Quit requested");
                break;
            }
        }

        Ok(self.close().await)
    }

    /// Plays a fixed list of commands in order
    pub async fn run_script(mut self, commands: &[String]) -> Session<Closed> {
        info!("Running {} scripted commands", commands.len());
        for command in commands {
            if self.cancel.is_cancelled() {
                info!("Script interrupted");
                break;
            }
            if self.execute(command).await == Flow::Quit {
                break;
            }
        }
        self.close().await
    }

    async fn close(mut self) -> Session<Closed> {
        let needs_release = self
            .stats
            .last_snapshot
            .map(|last| !last.is_rest())
            .unwrap_or(false);
        if self.settings.release_on_exit && needs_release {
            info!("Returning controller to rest before closing");
            self.transmit(ControllerSnapshot::rest()).await;
        }

        info!(
            "Session closed: {} commands, {} invalid, {} sent, {} failed",
            self.stats.commands,
            self.stats.invalid_commands,
            self.stats.snapshots_sent,
            self.stats.send_failures
        );
        self.transition()
    }
}

/// Reads stdin line by line on a dedicated OS thread
///
/// The thread is detached. A read still pending at exit does not delay
/// runtime shutdown.
pub fn spawn_stdin_reader() -> mpsc::Receiver<String> {
    let (tx, rx) = mpsc::channel(16);
    std::thread::spawn(move || {
        for line in std::io::stdin().lines() {
            match line {
                Ok(line) => {
                    if tx.blocking_send(line).is_err() {
                        debug!("Session stopped listening to stdin");
                        break;
                    }
                }
                Err(e) => {
                    error!("Failed to read stdin: {}", e);
                    break;
                }
            }
        }
    });
    rx
}

/// Troubleshooting lines shown when the device cannot be reached
pub fn connection_hints(endpoint: &str) -> Vec<String> {
    vec![
        "1. Check that the device is powered on".to_string(),
        "2. Check that the device and this machine share a network".to_string(),
        format!("3. Check that {} is the device's address", endpoint),
    ]
}
