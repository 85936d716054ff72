//! Controller snapshot data model and the snapshot builder
//!
//! A [`ControllerSnapshot`] is the complete state the device should reproduce.
//! Callers describe only what deviates from rest through a [`PartialCommand`];
//! [`build`] fills every unspecified leaf with its default (`false` / `0`).
//! The merge is stateless: nothing from a previous call leaks into the next one.
//!
//! # Wire layout
//!
//! ```text
//! {"buttons":{"A":..,"B":..,"X":..,"Y":..},
//!  "lstick":{"x":..,"y":..},"rstick":{"x":..,"y":..},
//!  "shoulder":{"L":..,"R":..,"ZL":..,"ZR":..},
//!  "system":{"plus":..,"minus":..,"home":..}}
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

/// Full deflection of a stick axis in device units
pub const AXIS_MAX: i32 = 100;

/// Full negative deflection of a stick axis in device units
pub const AXIS_MIN: i32 = -100;

// Face buttons
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MainButton {
    A,
    B,
    X,
    Y,
}

// Shoulder and trigger buttons
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ShoulderButton {
    L,
    R,
    ZL,
    ZR,
}

// Plus, minus and home
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SystemButton {
    Plus,
    Minus,
    Home,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Stick {
    Left,
    Right,
}

/// Any button the device models as a plain on/off flag
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Button {
    Main(MainButton),
    Shoulder(ShoulderButton),
    System(SystemButton),
}

impl fmt::Display for Button {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Button::Main(b) => write!(f, "{:?}", b),
            Button::Shoulder(b) => write!(f, "{:?}", b),
            Button::System(SystemButton::Plus) => write!(f, "+"),
            Button::System(SystemButton::Minus) => write!(f, "-"),
            Button::System(SystemButton::Home) => write!(f, "HOME"),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MainButtons {
    #[serde(rename = "A")]
    pub a: bool,
    #[serde(rename = "B")]
    pub b: bool,
    #[serde(rename = "X")]
    pub x: bool,
    #[serde(rename = "Y")]
    pub y: bool,
}

/// Stick position in device units, (0, 0) is centered
///
/// Positive `y` is "up" on the device. This is the opposite of screen
/// coordinates and must not be flipped.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StickPosition {
    pub x: i32,
    pub y: i32,
}

impl StickPosition {
    pub const CENTER: StickPosition = StickPosition { x: 0, y: 0 };

    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn is_in_range(&self) -> bool {
        (AXIS_MIN..=AXIS_MAX).contains(&self.x) && (AXIS_MIN..=AXIS_MAX).contains(&self.y)
    }

    /// Returns the position with both axes limited to the device range
    pub fn clamped(&self) -> Self {
        Self {
            x: self.x.clamp(AXIS_MIN, AXIS_MAX),
            y: self.y.clamp(AXIS_MIN, AXIS_MAX),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShoulderButtons {
    #[serde(rename = "L")]
    pub l: bool,
    #[serde(rename = "R")]
    pub r: bool,
    #[serde(rename = "ZL")]
    pub zl: bool,
    #[serde(rename = "ZR")]
    pub zr: bool,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemButtons {
    pub plus: bool,
    pub minus: bool,
    pub home: bool,
}

/// Complete controller state, the unit of transmission
///
/// Every field is always present. The device has no notion of "unchanged",
/// so each snapshot carries the full desired state. `Default` is the rest
/// state: nothing pressed, both sticks centered.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControllerSnapshot {
    pub buttons: MainButtons,
    #[serde(rename = "lstick")]
    pub left_stick: StickPosition,
    #[serde(rename = "rstick")]
    pub right_stick: StickPosition,
    pub shoulder: ShoulderButtons,
    pub system: SystemButtons,
}

impl ControllerSnapshot {
    /// The fully neutral state
    pub fn rest() -> Self {
        Self::default()
    }

    pub fn is_rest(&self) -> bool {
        *self == Self::rest()
    }

    pub fn is_pressed(&self, button: Button) -> bool {
        match button {
            Button::Main(MainButton::A) => self.buttons.a,
            Button::Main(MainButton::B) => self.buttons.b,
            Button::Main(MainButton::X) => self.buttons.x,
            Button::Main(MainButton::Y) => self.buttons.y,
            Button::Shoulder(ShoulderButton::L) => self.shoulder.l,
            Button::Shoulder(ShoulderButton::R) => self.shoulder.r,
            Button::Shoulder(ShoulderButton::ZL) => self.shoulder.zl,
            Button::Shoulder(ShoulderButton::ZR) => self.shoulder.zr,
            Button::System(SystemButton::Plus) => self.system.plus,
            Button::System(SystemButton::Minus) => self.system.minus,
            Button::System(SystemButton::Home) => self.system.home,
        }
    }

    pub fn stick(&self, stick: Stick) -> StickPosition {
        match stick {
            Stick::Left => self.left_stick,
            Stick::Right => self.right_stick,
        }
    }

    /// Buttons currently held, in wire order
    pub fn pressed_buttons(&self) -> Vec<Button> {
        ALL_BUTTONS
            .iter()
            .copied()
            .filter(|b| self.is_pressed(*b))
            .collect()
    }

    /// Sticks whose position lies outside [`AXIS_MIN`]..=[`AXIS_MAX`]
    pub fn out_of_range_sticks(&self) -> Vec<Stick> {
        [Stick::Left, Stick::Right]
            .into_iter()
            .filter(|s| !self.stick(*s).is_in_range())
            .collect()
    }

    pub fn clamped(&self) -> Self {
        Self {
            left_stick: self.left_stick.clamped(),
            right_stick: self.right_stick.clamped(),
            ..*self
        }
    }
}

impl fmt::Display for ControllerSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let pressed: Vec<String> = self.pressed_buttons().iter().map(|b| b.to_string()).collect();
        write!(
            f,
            "L:({},{}) R:({},{}) Buttons:[{}]",
            self.left_stick.x,
            self.left_stick.y,
            self.right_stick.x,
            self.right_stick.y,
            pressed.join(",")
        )
    }
}

pub const ALL_BUTTONS: [Button; 11] = [
    Button::Main(MainButton::A),
    Button::Main(MainButton::B),
    Button::Main(MainButton::X),
    Button::Main(MainButton::Y),
    Button::Shoulder(ShoulderButton::L),
    Button::Shoulder(ShoulderButton::R),
    Button::Shoulder(ShoulderButton::ZL),
    Button::Shoulder(ShoulderButton::ZR),
    Button::System(SystemButton::Plus),
    Button::System(SystemButton::Minus),
    Button::System(SystemButton::Home),
];

// Partial command: None means "use the default", never "keep the previous value"

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PartialButtons {
    pub a: Option<bool>,
    pub b: Option<bool>,
    pub x: Option<bool>,
    pub y: Option<bool>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PartialStick {
    pub x: Option<i32>,
    pub y: Option<i32>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PartialShoulder {
    pub l: Option<bool>,
    pub r: Option<bool>,
    pub zl: Option<bool>,
    pub zr: Option<bool>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PartialSystem {
    pub plus: Option<bool>,
    pub minus: Option<bool>,
    pub home: Option<bool>,
}

/// Caller-facing input: any subset of the snapshot's leaf fields
///
/// The empty command (`PartialCommand::default()`) builds the rest state.
///
/// ```text
/// let press = PartialCommand::new().with_button(Button::Main(MainButton::A), true);
/// let up = PartialCommand::new().with_stick(Stick::Left, 0, 100);
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PartialCommand {
    pub buttons: PartialButtons,
    pub left_stick: PartialStick,
    pub right_stick: PartialStick,
    pub shoulder: PartialShoulder,
    pub system: PartialSystem,
}

impl PartialCommand {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_button(mut self, button: Button, pressed: bool) -> Self {
        let slot = match button {
            Button::Main(MainButton::A) => &mut self.buttons.a,
            Button::Main(MainButton::B) => &mut self.buttons.b,
            Button::Main(MainButton::X) => &mut self.buttons.x,
            Button::Main(MainButton::Y) => &mut self.buttons.y,
            Button::Shoulder(ShoulderButton::L) => &mut self.shoulder.l,
            Button::Shoulder(ShoulderButton::R) => &mut self.shoulder.r,
            Button::Shoulder(ShoulderButton::ZL) => &mut self.shoulder.zl,
            Button::Shoulder(ShoulderButton::ZR) => &mut self.shoulder.zr,
            Button::System(SystemButton::Plus) => &mut self.system.plus,
            Button::System(SystemButton::Minus) => &mut self.system.minus,
            Button::System(SystemButton::Home) => &mut self.system.home,
        };
        *slot = Some(pressed);
        self
    }

    pub fn with_stick(mut self, stick: Stick, x: i32, y: i32) -> Self {
        let slot = match stick {
            Stick::Left => &mut self.left_stick,
            Stick::Right => &mut self.right_stick,
        };
        slot.x = Some(x);
        slot.y = Some(y);
        self
    }

    /// Number of leaf fields the caller supplied
    pub fn len(&self) -> usize {
        let flags = [
            self.buttons.a,
            self.buttons.b,
            self.buttons.x,
            self.buttons.y,
            self.shoulder.l,
            self.shoulder.r,
            self.shoulder.zl,
            self.shoulder.zr,
            self.system.plus,
            self.system.minus,
            self.system.home,
        ];
        let axes = [
            self.left_stick.x,
            self.left_stick.y,
            self.right_stick.x,
            self.right_stick.y,
        ];
        flags.iter().filter(|f| f.is_some()).count() + axes.iter().filter(|a| a.is_some()).count()
    }
}

/// Merges a partial command against the fixed defaults
///
/// Pure and infallible. Stick values are passed through unchecked; range
/// handling happens at the transport boundary.
pub fn build(partial: &PartialCommand) -> ControllerSnapshot {
    let snapshot = ControllerSnapshot {
        buttons: MainButtons {
            a: partial.buttons.a.unwrap_or_default(),
            b: partial.buttons.b.unwrap_or_default(),
            x: partial.buttons.x.unwrap_or_default(),
            y: partial.buttons.y.unwrap_or_default(),
        },
        left_stick: StickPosition {
            x: partial.left_stick.x.unwrap_or_default(),
            y: partial.left_stick.y.unwrap_or_default(),
        },
        right_stick: StickPosition {
            x: partial.right_stick.x.unwrap_or_default(),
            y: partial.right_stick.y.unwrap_or_default(),
        },
        shoulder: ShoulderButtons {
            l: partial.shoulder.l.unwrap_or_default(),
            r: partial.shoulder.r.unwrap_or_default(),
            zl: partial.shoulder.zl.unwrap_or_default(),
            zr: partial.shoulder.zr.unwrap_or_default(),
        },
        system: SystemButtons {
            plus: partial.system.plus.unwrap_or_default(),
            minus: partial.system.minus.unwrap_or_default(),
            home: partial.system.home.unwrap_or_default(),
        },
    };
    debug!(
        "Built snapshot from {} supplied fields: {}",
        partial.len(),
        snapshot
    );
    snapshot
}

impl From<PartialCommand> for ControllerSnapshot {
    fn from(partial: PartialCommand) -> Self {
        build(&partial)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn empty_command_builds_rest_state() {
        let snapshot = build(&PartialCommand::new());

        assert_eq!(snapshot.buttons, MainButtons::default());
        assert_eq!(snapshot.left_stick, StickPosition::CENTER);
        assert_eq!(snapshot.right_stick, StickPosition::CENTER);
        assert_eq!(snapshot.shoulder, ShoulderButtons::default());
        assert_eq!(snapshot.system, SystemButtons::default());
        assert!(snapshot.is_rest());
    }

    #[test]
    fn each_button_is_merged_field_locally() {
        for button in ALL_BUTTONS {
            let snapshot = build(&PartialCommand::new().with_button(button, true));

            assert_eq!(snapshot.pressed_buttons(), vec![button], "{button}");
            assert_eq!(snapshot.left_stick, StickPosition::CENTER);
            assert_eq!(snapshot.right_stick, StickPosition::CENTER);
        }
    }

    #[test]
    fn each_stick_axis_is_merged_field_locally() {
        let setters: [(fn(&mut PartialCommand), StickPosition, StickPosition); 4] = [
            (
                |p| p.left_stick.x = Some(42),
                StickPosition::new(42, 0),
                StickPosition::CENTER,
            ),
            (
                |p| p.left_stick.y = Some(-63),
                StickPosition::new(0, -63),
                StickPosition::CENTER,
            ),
            (
                |p| p.right_stick.x = Some(-8),
                StickPosition::CENTER,
                StickPosition::new(-8, 0),
            ),
            (
                |p| p.right_stick.y = Some(-17),
                StickPosition::CENTER,
                StickPosition::new(0, -17),
            ),
        ];
        for (i, (set, left, right)) in setters.into_iter().enumerate() {
            let mut partial = PartialCommand::new();
            set(&mut partial);
            assert_eq!(partial.len(), 1, "axis {i}");

            let snapshot = build(&partial);
            assert_eq!(snapshot.left_stick, left, "axis {i}");
            assert_eq!(snapshot.right_stick, right, "axis {i}");
            assert!(snapshot.pressed_buttons().is_empty(), "axis {i}");
        }
    }

    #[test]
    fn merge_does_not_accumulate_between_calls() {
        let first = build(&PartialCommand::new().with_button(Button::Main(MainButton::B), true));
        let second = build(&PartialCommand::new().with_stick(Stick::Right, 100, 0));

        assert!(first.buttons.b);
        assert!(!second.buttons.b);
        assert_eq!(second.right_stick, StickPosition::new(100, 0));
    }

    #[test]
    fn building_twice_from_empty_input_is_identical() {
        let once = build(&PartialCommand::default());
        let twice = build(&PartialCommand::default());
        assert_eq!(once, twice);
        assert_eq!(once, ControllerSnapshot::rest());
    }

    #[test]
    fn explicit_false_equals_absent() {
        let partial = PartialCommand::new().with_button(Button::System(SystemButton::Home), false);
        assert_eq!(partial.len(), 1);
        assert!(build(&partial).is_rest());
    }

    #[test]
    fn builder_leaves_out_of_range_values_untouched() {
        let snapshot = build(&PartialCommand::new().with_stick(Stick::Left, 250, -300));

        assert_eq!(snapshot.left_stick, StickPosition::new(250, -300));
        assert_eq!(snapshot.out_of_range_sticks(), vec![Stick::Left]);
        assert_eq!(snapshot.clamped().left_stick, StickPosition::new(100, -100));
    }

    #[test]
    fn serializes_every_field_with_device_keys() {
        let snapshot = build(
            &PartialCommand::new()
                .with_button(Button::Shoulder(ShoulderButton::ZL), true)
                .with_stick(Stick::Left, 0, 100),
        );

        let value = serde_json::to_value(snapshot).unwrap();
        assert_eq!(
            value,
            json!({
                "buttons": {"A": false, "B": false, "X": false, "Y": false},
                "lstick": {"x": 0, "y": 100},
                "rstick": {"x": 0, "y": 0},
                "shoulder": {"L": false, "R": false, "ZL": true, "ZR": false},
                "system": {"plus": false, "minus": false, "home": false}
            })
        );
    }

    #[test]
    fn display_lists_sticks_and_pressed_buttons() {
        let snapshot = build(
            &PartialCommand::new()
                .with_button(Button::System(SystemButton::Plus), true)
                .with_stick(Stick::Right, -100, 0),
        );
        assert_eq!(snapshot.to_string(), "L:(0,0) R:(-100,0) Buttons:[+]");
    }
}
