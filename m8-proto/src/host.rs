//! Commands sent from the host to the M8.
//!
//! These are short raw byte sequences, not SLIP framed.

use heapless::Vec;

/// Longest host command in bytes (`K`, note, velocity).
pub const MAX_HOST_COMMAND_LEN: usize = 3;

/// Maximum key jazz velocity.
pub const MAX_VELOCITY: u8 = 0x7F;

/// Encoded host command.
pub type HostBytes = Vec<u8, MAX_HOST_COMMAND_LEN>;

/// Host-to-device command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum HostCommand {
    /// Start streaming display and joypad data (`E`).
    Enable,
    /// Ask the device to redraw the whole screen (`R`).
    ResetDisplay,
    /// Stop streaming (`D`).
    Disconnect,
    /// Inject key state, same bit layout as [`Keys`](crate::Keys) (`C`).
    Controller(u8),
    /// Play a note (`K`). Velocity above [`MAX_VELOCITY`] is clamped.
    KeyJazz { note: u8, velocity: u8 },
}

impl HostCommand {
    /// Encode to wire bytes.
    ///
    /// ```
    /// use m8_proto::HostCommand;
    ///
    /// assert_eq!(HostCommand::Enable.encode().as_slice(), b"E");
    /// assert_eq!(HostCommand::Controller(0x81).encode().as_slice(), &[b'C', 0x81]);
    /// ```
    #[must_use]
    pub fn encode(self) -> HostBytes {
        let (raw, len): ([u8; MAX_HOST_COMMAND_LEN], usize) = match self {
            Self::Enable => ([b'E', 0, 0], 1),
            Self::ResetDisplay => ([b'R', 0, 0], 1),
            Self::Disconnect => ([b'D', 0, 0], 1),
            Self::Controller(keys) => ([b'C', keys, 0], 2),
            Self::KeyJazz { note, velocity } => ([b'K', note, velocity.min(MAX_VELOCITY)], 3),
        };
        // len never exceeds the capacity
        HostBytes::from_slice(&raw[..len]).unwrap_or_default()
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Enable => "enable",
            Self::ResetDisplay => "reset display",
            Self::Disconnect => "disconnect",
            Self::Controller(_) => "controller",
            Self::KeyJazz { .. } => "keyjazz",
        }
    }
}
