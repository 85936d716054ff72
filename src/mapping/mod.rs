//! Mapping from symbolic user commands to controller snapshots
//!
//! [`command`] resolves typed input into a [`CommandSymbol`], [`dispatcher`]
//! expands a symbol into the snapshot sequence the device must receive,
//! including the timed press/release pair of momentary buttons.

pub mod command;
pub mod dispatcher;
pub mod error;

pub use command::{help_text, CommandSymbol, Direction};
pub use dispatcher::{DispatchSequence, DispatchSettings, Dispatcher};
pub use error::CommandError;
