//! Platform-agnostic M8 joypad bridge.
//!
//! This crate turns the M8's SLIP framed serial stream into gamepad button
//! snapshots without any platform-specific dependencies. The host binary
//! supplies a [`Transport`] (the serial port) and an [`OutputSink`] (the
//! virtual joystick); everything in between lives here and is tested on the
//! host with mocks.
//!
//! # Overview
//!
//! - [`projector`]: keycode to [`ButtonState`] ([`project`])
//! - [`dispatch`]: packet validation and routing ([`Dispatcher`])
//! - [`monitor`]: link state machine and liveness probing ([`LinkMonitor`])
//! - [`handshake`]: enable / reset / disconnect commands
//! - [`input`]: transport trait ([`Transport`])
//! - [`output`]: output sink trait ([`OutputSink`])
//! - [`bridge`]: orchestrates one session ([`JoypadBridge`])
//!
//! # Example
//!
//! ```rust
//! use m8_core::{Dispatch, Dispatcher, Button};
//!
//! let mut dispatcher = Dispatcher::new();
//! if let Dispatch::Joypad(state) = dispatcher.dispatch(&[0xFB, 0x81, 0x00]) {
//!     assert!(state.is_pressed(Button::DpadLeft));
//!     assert!(state.is_pressed(Button::A));
//! }
//! ```
//!
//! # Features
//!
//! - **`std`**: Enable standard library support
//! - **`defmt`**: Enable defmt formatting (for embedded logging)

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(any(test, feature = "std"))]
extern crate std;

pub mod bridge;
pub mod dispatch;
pub mod handshake;
pub mod input;
pub mod monitor;
pub mod output;
pub mod projector;

#[cfg(test)]
mod mock;

// Re-export main types at crate root
pub use bridge::{BridgeStats, JoypadBridge, READ_CHUNK};
pub use dispatch::{Dispatch, Dispatcher};
pub use input::{Transport, TransportError};
pub use monitor::{DisconnectReason, Health, LinkMonitor, LinkState, DEFAULT_EMPTY_READ_THRESHOLD};
pub use output::{OutputError, OutputSink};
pub use projector::{project, Button, ButtonState};
