//! Packet dispatch: validation, diagnostics and joypad projection.

use crate::projector::{project, ButtonState};
use log::{info, trace, warn};
use m8_proto::{parse, Command, HexDump, SystemInfo, ValidationError};

/// What the bridge should do with one packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[must_use]
pub enum Dispatch {
    /// Joypad packet: forward the snapshot to the output sink.
    Joypad(ButtonState),
    /// System info. `first` is set only on the first sighting.
    SystemInfo { info: SystemInfo, first: bool },
    /// Valid drawing command, intentionally ignored.
    Display,
    /// Leading byte outside the known command set.
    Unrecognized,
    /// Known command that failed validation.
    Rejected(ValidationError),
}

impl Dispatch {
    /// True if the packet was dropped as invalid or unknown.
    #[must_use]
    pub const fn is_rejected(&self) -> bool {
        matches!(self, Dispatch::Unrecognized | Dispatch::Rejected(_))
    }
}

/// Validates packets and reports system info once.
///
/// The first-sighting flag lives in the dispatcher instance. Keep the same
/// dispatcher across reconnects to report system info once per process.
#[derive(Debug, Default)]
pub struct Dispatcher {
    system_info: Option<SystemInfo>,
}

impl Dispatcher {
    #[must_use]
    pub const fn new() -> Self {
        Self { system_info: None }
    }

    /// System info seen so far, if any.
    #[must_use]
    pub fn system_info(&self) -> Option<SystemInfo> {
        self.system_info
    }

    /// Parse and handle one complete packet.
    ///
    /// Never fails: invalid packets are logged with a hex dump and reported
    /// as [`Dispatch::Rejected`] or [`Dispatch::Unrecognized`].
    pub fn dispatch(&mut self, packet: &[u8]) -> Dispatch {
        match parse(packet) {
            Ok(Command::ControlSurfaceState { keycode }) => {
                trace!("joypad keycode {:#010b}", keycode);
                Dispatch::Joypad(project(keycode))
            }
            Ok(Command::SystemInfo(info)) => {
                let first = self.system_info.is_none();
                if first {
                    info!("** Hardware info ** {}", info);
                    self.system_info = Some(info);
                }
                Dispatch::SystemInfo { info, first }
            }
            Ok(command @ (Command::DrawRectangle(_)
            | Command::DrawCharacter(_)
            | Command::DrawWaveform(_))) => {
                if let Some(kind) = command.kind() {
                    trace!("{} ({} bytes)", kind.name(), packet.len());
                }
                Dispatch::Display
            }
            Ok(Command::Unrecognized(raw)) => {
                warn!("Invalid packet: {}", HexDump(raw));
                Dispatch::Unrecognized
            }
            Err(err) => {
                warn!("{}: {}", err, HexDump(packet));
                Dispatch::Rejected(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use m8_proto::{CommandKind, FirmwareVersion, HardwareType};

    const SYSTEM_INFO: [u8; 6] = [0xFF, 0x03, 3, 2, 1, 0];

    #[test]
    fn test_joypad_projected() {
        let mut dispatcher = Dispatcher::new();
        assert_eq!(
            dispatcher.dispatch(&[0xFB, 0b1000_0001, 0x00]),
            Dispatch::Joypad(ButtonState {
                dpad_left: true,
                a: true,
                ..ButtonState::released()
            })
        );
    }

    #[test]
    fn test_repeated_joypad_not_suppressed() {
        let mut dispatcher = Dispatcher::new();
        let first = dispatcher.dispatch(&[0xFB, 0x04, 0x00]);
        let second = dispatcher.dispatch(&[0xFB, 0x04, 0x00]);
        assert_eq!(first, second);
        assert!(matches!(second, Dispatch::Joypad(_)));
    }

    #[test]
    fn test_system_info_first_sighting_only() {
        let mut dispatcher = Dispatcher::new();
        let expected = SystemInfo {
            hardware: HardwareType::ProductionModel02,
            firmware: FirmwareVersion {
                major: 3,
                minor: 2,
                patch: 1,
            },
        };

        assert_eq!(
            dispatcher.dispatch(&SYSTEM_INFO),
            Dispatch::SystemInfo {
                info: expected,
                first: true
            }
        );
        for _ in 0..5 {
            assert_eq!(
                dispatcher.dispatch(&SYSTEM_INFO),
                Dispatch::SystemInfo {
                    info: expected,
                    first: false
                }
            );
        }
        assert_eq!(dispatcher.system_info(), Some(expected));
    }

    #[test]
    fn test_short_system_info_rejected_and_not_surfaced() {
        let mut dispatcher = Dispatcher::new();
        let result = dispatcher.dispatch(&[0xFF, 0x02, 1, 2, 3]);
        assert_eq!(
            result,
            Dispatch::Rejected(ValidationError::LengthMismatch {
                command: CommandKind::SystemInfo,
                expected: 6,
                actual: 5
            })
        );
        assert!(result.is_rejected());
        assert_eq!(dispatcher.system_info(), None);

        // A later valid packet is still the first sighting.
        assert!(matches!(
            dispatcher.dispatch(&SYSTEM_INFO),
            Dispatch::SystemInfo { first: true, .. }
        ));
    }

    #[test]
    fn test_drawing_commands_accepted() {
        let mut dispatcher = Dispatcher::new();
        assert_eq!(dispatcher.dispatch(&[0xFE, 0, 0, 0, 0]), Dispatch::Display);
        assert_eq!(dispatcher.dispatch(&[0xFD; 12]), Dispatch::Display);
        assert_eq!(dispatcher.dispatch(&[0xFC, 0, 0, 0]), Dispatch::Display);
        assert!(!Dispatch::Display.is_rejected());
    }

    #[test]
    fn test_invalid_drawing_rejected() {
        let mut dispatcher = Dispatcher::new();
        assert!(dispatcher.dispatch(&[0xFE, 0, 0]).is_rejected());
        assert!(dispatcher.dispatch(&[0xFD; 13]).is_rejected());
    }

    #[test]
    fn test_unrecognized() {
        let mut dispatcher = Dispatcher::new();
        let result = dispatcher.dispatch(&[0x10, 0x20]);
        assert_eq!(result, Dispatch::Unrecognized);
        assert!(result.is_rejected());
    }
}
