//! Configuration loaded from a TOML file.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Default configuration file name, looked up in the working directory.
pub const DEFAULT_CONFIG_PATH: &str = "m8-joypad.toml";

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Serial device selection.
    pub serial: SerialConfig,
    /// Link supervision.
    pub link: LinkConfig,
    /// Virtual joystick identity.
    pub joystick: JoystickConfig,
    /// Logging settings.
    pub logging: LoggingConfig,
}

/// Serial device selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SerialConfig {
    /// Preferred port name, e.g. "/dev/ttyACM0". Any matching port otherwise.
    pub device: Option<String>,
    /// USB vendor id of the M8.
    pub vid: u16,
    /// USB product id of the M8.
    pub pid: u16,
    pub baud: u32,
}

/// Link supervision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LinkConfig {
    /// Consecutive empty reads before probing the device.
    pub empty_read_threshold: u32,
    /// Sleep between reads while the link is quiet, in milliseconds.
    pub idle_sleep_ms: u64,
    /// Reconnect after a running link is lost instead of exiting.
    /// Failing to connect at startup always exits.
    pub reconnect: bool,
    /// Delay between reconnect attempts, in milliseconds.
    pub reconnect_interval_ms: u64,
}

/// Virtual joystick identity as reported to the input subsystem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct JoystickConfig {
    pub name: String,
    pub vendor: u16,
    pub product: u16,
    pub version: u16,
}

/// Logging settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: "trace", "debug", "info", "warn", "error".
    /// `RUST_LOG` takes precedence.
    pub level: String,
}

// ── Defaults ─────────────────────────────────────────────────────

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            device: None,
            vid: 0x16C0,
            pid: 0x048A,
            baud: 115_200,
        }
    }
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            empty_read_threshold: m8_core::DEFAULT_EMPTY_READ_THRESHOLD,
            idle_sleep_ms: 1,
            reconnect: true,
            reconnect_interval_ms: 1000,
        }
    }
}

impl Default for JoystickConfig {
    fn default() -> Self {
        Self {
            name: "M8 Virtual Joystick".into(),
            vendor: 0x3,
            product: 0x3,
            version: 2,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
        }
    }
}

// ── Loading ──────────────────────────────────────────────────────

impl Config {
    /// Load configuration from a TOML file.
    ///
    /// A missing file yields the defaults. A file that exists but does not
    /// parse is an error.
    pub fn load(path: &Path) -> Result<Self, AppError> {
        match std::fs::read_to_string(path) {
            Ok(contents) => Self::from_toml(&contents),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(AppError::Io(e)),
        }
    }

    pub fn from_toml(text: &str) -> Result<Self, AppError> {
        Ok(toml::from_str(text)?)
    }

    /// Render as pretty TOML, e.g. for `--gen-config`.
    pub fn to_toml(&self) -> Result<String, AppError> {
        Ok(toml::to_string_pretty(self)?)
    }
}

impl LinkConfig {
    pub fn idle_sleep(&self) -> Duration {
        Duration::from_millis(self.idle_sleep_ms)
    }

    pub fn reconnect_interval(&self) -> Duration {
        Duration::from_millis(self.reconnect_interval_ms)
    }
}

// ── Tests ────────────────────────────────────────────────────────
