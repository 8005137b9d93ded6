//! Output sink trait and error types.

use crate::projector::ButtonState;

/// Error type for output operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum OutputError {
    /// Write to the virtual device failed.
    Io,
    /// Device not created yet or already destroyed.
    NotReady,
}

/// Destination for gamepad button snapshots (e.g., a uinput device).
pub trait OutputSink {
    /// Send a complete button snapshot followed by a sync marker.
    ///
    /// Called once per joypad packet, including repeated identical states.
    fn send(&mut self, state: &ButtonState) -> Result<(), OutputError>;

    /// Check if the output is ready to accept data.
    fn is_ready(&self) -> bool;
}
