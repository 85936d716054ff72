//! Command dispatcher
//!
//! Turns one [`CommandSymbol`] into the snapshots the device must receive.
//!
//! ```text
//! Momentary    ──► press ──(hold)──► release     (2 snapshots)
//! Directional  ──► stick deflected                (1 snapshot)
//! Reset / Quit ──► rest state                     (1 snapshot)
//! Help         ──► nothing                        (0 snapshots)
//! ```
//!
//! The dispatcher keeps no state between symbols. The only pending state is
//! the release step of a momentary command, which lives inside the
//! [`DispatchSequence`] until the hold has elapsed.

use crate::controller::{build, Button, ControllerSnapshot, PartialCommand};
use crate::mapping::command::CommandSymbol;
use crate::mapping::CommandError;
use std::time::Duration;
use tokio::time::{sleep_until, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Dispatcher settings
///
/// # Examples
///
/// ```text
/// // Shorter taps for menu navigation
/// let settings = DispatchSettings { hold_duration: Duration::from_millis(250) };
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DispatchSettings {
    /// Time between a momentary command's press and release snapshot
    pub hold_duration: Duration,
}

impl Default for DispatchSettings {
    fn default() -> Self {
        Self {
            hold_duration: Duration::from_millis(1000),
        }
    }
}

#[derive(Clone, Debug)]
pub struct Dispatcher {
    settings: DispatchSettings,
    cancel: CancellationToken,
}

impl Dispatcher {
    pub fn new(settings: DispatchSettings) -> Self {
        info!(
            "Creating dispatcher with {}ms hold duration",
            settings.hold_duration.as_millis()
        );
        Self {
            settings,
            cancel: CancellationToken::new(),
        }
    }

    /// Lets `token` cut a pending hold short
    ///
    /// A cancelled hold still emits its release snapshot, only earlier.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn dispatch(&self, symbol: CommandSymbol) -> DispatchSequence {
        debug!("Dispatching {}", symbol);
        let step = match symbol {
            CommandSymbol::Momentary(button) => Step::Press(button),
            CommandSymbol::Directional(stick, direction) => {
                let (x, y) = direction.vector();
                Step::Single(PartialCommand::new().with_stick(stick, x, y))
            }
            CommandSymbol::Reset | CommandSymbol::Quit => Step::Single(PartialCommand::new()),
            CommandSymbol::Help => Step::Done,
        };

        DispatchSequence {
            symbol,
            step,
            hold: self.settings.hold_duration,
            cancel: self.cancel.clone(),
        }
    }

    /// Parses `input` and dispatches it
    ///
    /// An unknown symbol produces no sequence at all.
    pub fn dispatch_str(&self, input: &str) -> Result<DispatchSequence, CommandError> {
        match input.parse::<CommandSymbol>() {
            Ok(symbol) => Ok(self.dispatch(symbol)),
            Err(e) => {
                warn!("Rejected command input {:?}: {}", input.trim(), e);
                Err(e)
            }
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
enum Step {
    Press(Button),
    Release { button: Button, due: Instant },
    Single(PartialCommand),
    Done,
}

/// One-shot, lazily produced snapshot sequence for a single command
///
/// Yields at most two snapshots. The hold delay is spent inside [`next`]
/// when the release is requested, measured from the moment the press was
/// yielded.
///
/// [`next`]: DispatchSequence::next
#[derive(Debug)]
pub struct DispatchSequence {
    symbol: CommandSymbol,
    step: Step,
    hold: Duration,
    cancel: CancellationToken,
}

impl DispatchSequence {
    pub fn symbol(&self) -> CommandSymbol {
        self.symbol
    }

    pub fn ends_session(&self) -> bool {
        self.symbol.ends_session()
    }

    /// True while a release step is still owed to the device
    #[cfg(test)]
    pub fn release_pending(&self) -> bool {
        matches!(self.step, Step::Release { .. })
    }

    #[cfg(test)]
    pub fn is_finished(&self) -> bool {
        self.step == Step::Done
    }

    pub async fn next(&mut self) -> Option<ControllerSnapshot> {
        match std::mem::replace(&mut self.step, Step::Done) {
            Step::Press(button) => {
                let due = Instant::now() + self.hold;
                debug!("Pressing {} for {}ms", button, self.hold.as_millis());
                self.step = Step::Release { button, due };
                Some(build(&PartialCommand::new().with_button(button, true)))
            }
            Step::Release { button, due } => {
                tokio::select! {
                    _ = sleep_until(due) => {
                        debug!("Hold elapsed, releasing {}", button);
                    }
                    _ = self.cancel.cancelled() => {
                        warn!("Hold cancelled, releasing {} early", button);
                    }
                }
                Some(build(&PartialCommand::new().with_button(button, false)))
            }
            Step::Single(partial) => Some(build(&partial)),
            Step::Done => None,
        }
    }

    /// Drains the sequence, waiting through any hold
    #[cfg(test)]
    pub async fn collect(mut self) -> Vec<ControllerSnapshot> {
        let mut snapshots = Vec::with_capacity(2);
        while let Some(snapshot) = self.next().await {
            snapshots.push(snapshot);
        }
        snapshots
    }
}
