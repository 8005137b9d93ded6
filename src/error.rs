//! Host-side error type.

use m8_core::{DisconnectReason, OutputError, TransportError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serial port error: {0}")]
    Serial(#[from] serialport::Error),

    #[error("invalid configuration: {0}")]
    Config(#[from] toml::de::Error),

    #[error("cannot render configuration: {0}")]
    ConfigRender(#[from] toml::ser::Error),

    #[error("no M8 found (USB {vid:04x}:{pid:04x})")]
    DeviceNotFound { vid: u16, pid: u16 },

    #[error("M8 handshake failed: {0:?}")]
    Handshake(TransportError),

    #[error("virtual joystick error: {0:?}")]
    Output(OutputError),

    #[error("link to M8 lost: {0:?}")]
    LinkLost(DisconnectReason),
}
