//! Symbolic command vocabulary
//!
//! Resolves what a user types into a [`CommandSymbol`]. Face buttons match
//! case-sensitively (`A` is a button, `a` pushes the left stick left); every
//! other symbol is matched after lowercasing.

use crate::controller::{Button, MainButton, ShoulderButton, Stick, SystemButton, AXIS_MAX, AXIS_MIN};
use crate::mapping::CommandError;
use std::fmt;
use std::str::FromStr;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    /// Canonical full-deflection vector, up is positive y
    pub const fn vector(self) -> (i32, i32) {
        match self {
            Direction::Up => (0, AXIS_MAX),
            Direction::Down => (0, AXIS_MIN),
            Direction::Left => (AXIS_MIN, 0),
            Direction::Right => (AXIS_MAX, 0),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CommandSymbol {
    /// Press, hold, release
    Momentary(Button),
    /// Deflect a stick fully and leave it there
    Directional(Stick, Direction),
    /// Center both sticks
    Reset,
    /// Rest state, then end the session
    Quit,
    /// Show the command table, nothing is sent
    Help,
}

impl CommandSymbol {
    pub fn ends_session(&self) -> bool {
        matches!(self, CommandSymbol::Quit)
    }
}

impl FromStr for CommandSymbol {
    type Err = CommandError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(CommandError::Empty);
        }

        // Face buttons are uppercase only
        let main = match trimmed {
            "A" => Some(MainButton::A),
            "B" => Some(MainButton::B),
            "X" => Some(MainButton::X),
            "Y" => Some(MainButton::Y),
            _ => None,
        };
        if let Some(button) = main {
            return Ok(CommandSymbol::Momentary(Button::Main(button)));
        }

        let symbol = match trimmed.to_lowercase().as_str() {
            "l" => CommandSymbol::Momentary(Button::Shoulder(ShoulderButton::L)),
            "r" => CommandSymbol::Momentary(Button::Shoulder(ShoulderButton::R)),
            "zl" => CommandSymbol::Momentary(Button::Shoulder(ShoulderButton::ZL)),
            "zr" => CommandSymbol::Momentary(Button::Shoulder(ShoulderButton::ZR)),
            "+" => CommandSymbol::Momentary(Button::System(SystemButton::Plus)),
            "-" => CommandSymbol::Momentary(Button::System(SystemButton::Minus)),
            "h" => CommandSymbol::Momentary(Button::System(SystemButton::Home)),
            "w" => CommandSymbol::Directional(Stick::Left, Direction::Up),
            "a" => CommandSymbol::Directional(Stick::Left, Direction::Left),
            "s" => CommandSymbol::Directional(Stick::Left, Direction::Down),
            "d" => CommandSymbol::Directional(Stick::Left, Direction::Right),
            "i" => CommandSymbol::Directional(Stick::Right, Direction::Up),
            "j" => CommandSymbol::Directional(Stick::Right, Direction::Left),
            "k" => CommandSymbol::Directional(Stick::Right, Direction::Down),
            ";" => CommandSymbol::Directional(Stick::Right, Direction::Right),
            "reset" => CommandSymbol::Reset,
            "quit" => CommandSymbol::Quit,
            "help" | "?" => CommandSymbol::Help,
            _ => return Err(CommandError::UnknownSymbol(trimmed.to_string())),
        };
        Ok(symbol)
    }
}

impl fmt::Display for CommandSymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandSymbol::Momentary(button) => write!(f, "press {}", button),
            CommandSymbol::Directional(stick, dir) => {
                write!(f, "{:?} stick {:?}", stick, dir)
            }
            CommandSymbol::Reset => write!(f, "reset"),
            CommandSymbol::Quit => write!(f, "quit"),
            CommandSymbol::Help => write!(f, "help"),
        }
    }
}

/// Symbol column and description for the interactive help table
pub const COMMAND_TABLE: [(&str, &str); 8] = [
    ("A, B, X, Y", "main button press (uppercase only)"),
    ("l, r, zl, zr", "shoulder button press"),
    ("+, -, h", "system button press (plus, minus, home)"),
    ("w, a, s, d", "left stick (up, left, down, right)"),
    ("i, j, k, ;", "right stick (up, left, down, right)"),
    ("reset", "center both sticks"),
    ("quit", "release everything and exit"),
    ("help, ?", "show this table"),
];

pub fn help_text() -> String {
    let mut text = String::from("Commands:\n");
    for (symbols, description) in COMMAND_TABLE {
        text.push_str(&format!("  {:<14} - {}\n", symbols, description));
    }
    text
}
