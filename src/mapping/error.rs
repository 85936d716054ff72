//! Error definitions for command resolution

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CommandError {
    /// The input does not name any known command
    #[error("Invalid command: {0:?}")]
    UnknownSymbol(String),

    /// Blank or whitespace-only input
    #[error("Invalid command: empty input")]
    Empty,
}
