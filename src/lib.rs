//! Linux host for the M8 joypad bridge.
//!
//! Wires the platform-agnostic [`m8_core`] bridge to real devices: the M8's
//! USB serial port ([`input::SerialTransport`]) and a uinput virtual joystick
//! ([`output::UinputJoystick`]). [`app::Supervisor`] runs sessions and
//! decides whether to reconnect when the link is lost.

pub mod app;
pub mod config;
pub mod error;
pub mod input;
pub mod output;

pub use app::{Connector, DeviceConnector, Supervisor};
pub use config::Config;
pub use error::AppError;
