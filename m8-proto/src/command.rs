//! Typed commands decoded from M8 packets.
//!
//! The first byte of every packet selects the command. Each known command
//! has a fixed or bounded length; packets that violate it are rejected with
//! a [`ValidationError`] and never partially interpreted.
//!
//! | Byte   | Command        | Length  |
//! |--------|----------------|---------|
//! | `0xFB` | joypad state   | 3       |
//! | `0xFF` | system info    | 6       |
//! | `0xFD` | draw character | 12      |
//! | `0xFE` | draw rectangle | 5..=12  |
//! | `0xFC` | draw waveform  | 4..=484 |

use crate::types::{FirmwareVersion, HardwareType, SystemInfo};

pub const JOYPAD_STATE: u8 = 0xFB;
pub const SYSTEM_INFO: u8 = 0xFF;
pub const DRAW_CHARACTER: u8 = 0xFD;
pub const DRAW_RECTANGLE: u8 = 0xFE;
pub const DRAW_WAVEFORM: u8 = 0xFC;

pub const JOYPAD_STATE_LEN: usize = 3;
pub const SYSTEM_INFO_LEN: usize = 6;
pub const DRAW_CHARACTER_LEN: usize = 12;
pub const DRAW_RECTANGLE_MIN_LEN: usize = 5;
pub const DRAW_RECTANGLE_MAX_LEN: usize = 12;
/// Command byte plus colour (3 bytes).
pub const DRAW_WAVEFORM_MIN_LEN: usize = 1 + 3;
/// Minimum plus one byte per horizontal pixel (480).
pub const DRAW_WAVEFORM_MAX_LEN: usize = 1 + 3 + 480;

/// Recognized command types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CommandKind {
    JoypadState,
    SystemInfo,
    DrawCharacter,
    DrawRectangle,
    DrawWaveform,
}

impl CommandKind {
    /// Look up the command type for a leading byte.
    #[must_use]
    pub const fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            JOYPAD_STATE => Some(Self::JoypadState),
            SYSTEM_INFO => Some(Self::SystemInfo),
            DRAW_CHARACTER => Some(Self::DrawCharacter),
            DRAW_RECTANGLE => Some(Self::DrawRectangle),
            DRAW_WAVEFORM => Some(Self::DrawWaveform),
            _ => None,
        }
    }

    /// Leading byte on the wire.
    #[must_use]
    pub const fn byte(self) -> u8 {
        match self {
            Self::JoypadState => JOYPAD_STATE,
            Self::SystemInfo => SYSTEM_INFO,
            Self::DrawCharacter => DRAW_CHARACTER,
            Self::DrawRectangle => DRAW_RECTANGLE,
            Self::DrawWaveform => DRAW_WAVEFORM,
        }
    }

    /// Total packet length (command byte included) this type accepts.
    #[must_use]
    pub const fn length(self) -> LengthContract {
        match self {
            Self::JoypadState => LengthContract::Exact(JOYPAD_STATE_LEN),
            Self::SystemInfo => LengthContract::Exact(SYSTEM_INFO_LEN),
            Self::DrawCharacter => LengthContract::Exact(DRAW_CHARACTER_LEN),
            Self::DrawRectangle => LengthContract::Range {
                min: DRAW_RECTANGLE_MIN_LEN,
                max: DRAW_RECTANGLE_MAX_LEN,
            },
            Self::DrawWaveform => LengthContract::Range {
                min: DRAW_WAVEFORM_MIN_LEN,
                max: DRAW_WAVEFORM_MAX_LEN,
            },
        }
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::JoypadState => "joypad keypressed state",
            Self::SystemInfo => "system info",
            Self::DrawCharacter => "draw character",
            Self::DrawRectangle => "draw rectangle",
            Self::DrawWaveform => "draw oscilloscope waveform",
        }
    }
}

/// Packet length contract of a command type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LengthContract {
    Exact(usize),
    Range { min: usize, max: usize },
}

impl LengthContract {
    #[inline]
    #[must_use]
    pub const fn accepts(self, len: usize) -> bool {
        match self {
            Self::Exact(n) => len == n,
            Self::Range { min, max } => len >= min && len <= max,
        }
    }

    fn check(self, command: CommandKind, actual: usize) -> Result<(), ValidationError> {
        if self.accepts(actual) {
            return Ok(());
        }
        Err(match self {
            Self::Exact(expected) => ValidationError::LengthMismatch {
                command,
                expected,
                actual,
            },
            Self::Range { min, max } => ValidationError::LengthOutOfRange {
                command,
                min,
                max,
                actual,
            },
        })
    }
}

/// A validated command. Drawing payloads borrow from the packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use]
pub enum Command<'a> {
    /// Joypad state: one bit per key, see [`Keys`](crate::Keys).
    ControlSurfaceState { keycode: u8 },
    SystemInfo(SystemInfo),
    DrawRectangle(&'a [u8]),
    DrawCharacter(&'a [u8]),
    DrawWaveform(&'a [u8]),
    /// Leading byte outside the known set. Not an error, but never acted on.
    Unrecognized(&'a [u8]),
}

impl Command<'_> {
    /// Command type, or `None` for [`Command::Unrecognized`].
    #[must_use]
    pub const fn kind(&self) -> Option<CommandKind> {
        match self {
            Self::ControlSurfaceState { .. } => Some(CommandKind::JoypadState),
            Self::SystemInfo(_) => Some(CommandKind::SystemInfo),
            Self::DrawRectangle(_) => Some(CommandKind::DrawRectangle),
            Self::DrawCharacter(_) => Some(CommandKind::DrawCharacter),
            Self::DrawWaveform(_) => Some(CommandKind::DrawWaveform),
            Self::Unrecognized(_) => None,
        }
    }

    /// True for the display commands the bridge does not render.
    #[must_use]
    pub const fn is_drawing(&self) -> bool {
        matches!(
            self,
            Self::DrawRectangle(_) | Self::DrawCharacter(_) | Self::DrawWaveform(_)
        )
    }
}

/// Reason a packet was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ValidationError {
    /// Zero-length packet.
    Empty,
    /// Fixed-length command with the wrong length.
    LengthMismatch {
        command: CommandKind,
        expected: usize,
        actual: usize,
    },
    /// Variable-length command outside its bounds.
    LengthOutOfRange {
        command: CommandKind,
        min: usize,
        max: usize,
        actual: usize,
    },
    /// System info with a hardware byte outside 0-3.
    UnknownHardware(u8),
}

impl core::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match *self {
            Self::Empty => f.write_str("empty packet"),
            Self::LengthMismatch {
                command,
                expected,
                actual,
            } => write!(
                f,
                "invalid {} packet: expected length {}, got {}",
                command.name(),
                expected,
                actual
            ),
            Self::LengthOutOfRange {
                command,
                min,
                max,
                actual,
            } => write!(
                f,
                "invalid {} packet: expected length {}..={}, got {}",
                command.name(),
                min,
                max,
                actual
            ),
            Self::UnknownHardware(byte) => write!(f, "unknown hardware type {}", byte),
        }
    }
}

/// Parse one decoded packet into a [`Command`].
///
/// # Example
///
/// ```
/// use m8_proto::{parse, Command};
///
/// let command = parse(&[0xFB, 0b1000_0001, 0x00]).unwrap();
/// assert_eq!(command, Command::ControlSurfaceState { keycode: 0b1000_0001 });
/// ```
pub fn parse(packet: &[u8]) -> Result<Command<'_>, ValidationError> {
    let Some(&first) = packet.first() else {
        return Err(ValidationError::Empty);
    };

    let Some(kind) = CommandKind::from_byte(first) else {
        return Ok(Command::Unrecognized(packet));
    };

    kind.length().check(kind, packet.len())?;

    Ok(match kind {
        CommandKind::JoypadState => Command::ControlSurfaceState { keycode: packet[1] },
        CommandKind::SystemInfo => Command::SystemInfo(parse_system_info(packet)?),
        CommandKind::DrawCharacter => Command::DrawCharacter(packet),
        CommandKind::DrawRectangle => Command::DrawRectangle(packet),
        CommandKind::DrawWaveform => Command::DrawWaveform(packet),
    })
}

/// Expects a packet already checked against [`SYSTEM_INFO_LEN`].
fn parse_system_info(packet: &[u8]) -> Result<SystemInfo, ValidationError> {
    let hardware =
        HardwareType::from_byte(packet[1]).ok_or(ValidationError::UnknownHardware(packet[1]))?;
    Ok(SystemInfo {
        hardware,
        firmware: FirmwareVersion {
            major: packet[2],
            minor: packet[3],
            patch: packet[4],
        },
    })
}
