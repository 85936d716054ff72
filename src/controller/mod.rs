//! Controller state model
//!
//! Holds the snapshot types the device understands and the builder that turns
//! a partial, caller-supplied command into a complete snapshot:
//!
//! ```text
//! PartialCommand ──► build() ──► ControllerSnapshot ──► Transport
//!  (changed fields)   (defaults)   (complete state)
//! ```

pub mod snapshot;

pub use snapshot::{
    build, Button, ControllerSnapshot, MainButton, PartialCommand, ShoulderButton, Stick,
    StickPosition, SystemButton, AXIS_MAX, AXIS_MIN,
};
