//! M8 serial protocol: framing, command parsing and host commands.
//!
//! This crate provides everything needed to talk to a Dirtywave M8 over its
//! USB serial port, without any platform dependencies:
//!
//! - **Framing**: [`SlipDecoder`] reassembles SLIP frames from a byte stream
//!   split at arbitrary points; [`slip::encode`] builds frames.
//! - **Parsing**: [`parse()`] turns one packet into a typed [`Command`] or a
//!   [`ValidationError`].
//! - **Types**: [`Keys`], [`SystemInfo`], [`HardwareType`], [`FirmwareVersion`].
//! - **Host commands**: [`HostCommand`] encodes the enable / reset /
//!   disconnect handshakes and input injection.
//! - **Diagnostics**: [`HexDump`] for logging rejected bytes.
//!
//! # Protocol Format
//!
//! Device-to-host packets are SLIP framed (`0xC0` terminator, `0xDB` escape).
//! The first byte of each packet is the command:
//!
//! ```text
//! 0xFB <keys> <?>                     joypad state        (3 bytes)
//! 0xFF <hw> <major> <minor> <patch> <?> system info        (6 bytes)
//! 0xFD ...                            draw character      (12 bytes)
//! 0xFE ...                            draw rectangle      (5-12 bytes)
//! 0xFC ...                            draw waveform       (4-484 bytes)
//! ```
//!
//! # Example
//!
//! ```
//! use m8_proto::{parse, slip::FRAME_CAPACITY, Command, Keys, SlipDecoder};
//!
//! let mut decoder = SlipDecoder::<FRAME_CAPACITY>::new();
//! let mut keys = None;
//! decoder.feed_bytes(&[0xFB, 0x81, 0x00, 0xC0], |frame| {
//!     if let Ok(Command::ControlSurfaceState { keycode }) = parse(frame.unwrap()) {
//!         keys = Some(Keys(keycode));
//!     }
//! });
//! assert_eq!(keys, Some(Keys::LEFT | Keys::EDIT));
//! ```
//!
//! # Features
//!
//! - **`std`**: Enable standard library support (for host testing)
//! - **`defmt`**: Enable defmt formatting (for embedded logging)
//!
//! # No-std Support
//!
//! This crate is `#![no_std]` by default and uses no heap allocations.

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(any(test, feature = "std"))]
extern crate std;

pub mod command;
pub mod dump;
pub mod host;
pub mod slip;
pub mod types;

// Re-export types at crate root for convenience
pub use command::{parse, Command, CommandKind, LengthContract, ValidationError};
pub use dump::HexDump;
pub use host::{HostBytes, HostCommand, MAX_HOST_COMMAND_LEN};
pub use slip::{Discarded, FrameResult, FramingError, SlipDecoder, FRAME_CAPACITY};
pub use types::{FirmwareVersion, HardwareType, Keys, SystemInfo};
