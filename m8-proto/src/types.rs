//! Wire-level types: key bitfield and system identification.

use core::fmt;
use core::ops::{BitOr, BitOrAssign};

/// Key state bitfield as sent by the M8 in a joypad packet.
///
/// Each bit is one physical key. Several keys may be held at once.
///
/// # Example
///
/// ```
/// use m8_proto::Keys;
///
/// let keys = Keys(0b1000_0001);
/// assert!(keys.contains(Keys::LEFT));
/// assert!(keys.contains(Keys::EDIT));
/// assert!(!keys.contains(Keys::UP));
/// ```
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Keys(pub u8);

impl Keys {
    pub const LEFT: Self = Self(1 << 7);
    pub const UP: Self = Self(1 << 6);
    pub const DOWN: Self = Self(1 << 5);
    pub const SELECT: Self = Self(1 << 4); // Shift
    pub const START: Self = Self(1 << 3); // Play
    pub const RIGHT: Self = Self(1 << 2);
    pub const OPT: Self = Self(1 << 1);
    pub const EDIT: Self = Self(1);

    /// No keys held.
    pub const NONE: Self = Self(0);

    /// Check if the given key(s) are held.
    #[inline]
    #[must_use]
    pub const fn contains(self, keys: Keys) -> bool {
        (self.0 & keys.0) == keys.0
    }

    /// Get the raw u8 value.
    #[inline]
    #[must_use]
    pub const fn raw(self) -> u8 {
        self.0
    }

    /// Check if no keys are held.
    #[inline]
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl BitOr for Keys {
    type Output = Self;

    #[inline]
    fn bitor(self, rhs: Self) -> Self::Output {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for Keys {
    #[inline]
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

/// M8 hardware model reported in a system info packet.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum HardwareType {
    Headless,
    Beta,
    Production,
    ProductionModel02,
}

impl HardwareType {
    /// Decode the hardware byte (0-3).
    #[must_use]
    pub const fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0 => Some(Self::Headless),
            1 => Some(Self::Beta),
            2 => Some(Self::Production),
            3 => Some(Self::ProductionModel02),
            _ => None,
        }
    }

    /// Human-readable model name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Headless => "Headless",
            Self::Beta => "Beta M8",
            Self::Production => "Production M8",
            Self::ProductionModel02 => "Production M8 Model:02",
        }
    }
}

impl fmt::Display for HardwareType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Firmware version triple.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FirmwareVersion {
    pub major: u8,
    pub minor: u8,
    pub patch: u8,
}

impl fmt::Display for FirmwareVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// Device identification carried by a system info packet.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SystemInfo {
    pub hardware: HardwareType,
    pub firmware: FirmwareVersion,
}

impl fmt::Display for SystemInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Device type: {}, Firmware ver {}",
            self.hardware, self.firmware
        )
    }
}
