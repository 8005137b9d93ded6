//! Transport trait and error types.

/// Error type for transport operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TransportError {
    /// Serial/communication I/O error.
    Io,
    /// Device vanished (e.g., USB unplugged).
    Disconnected,
    /// Write did not complete in time.
    Timeout,
}

/// Byte transport to the M8, typically a USB serial port.
///
/// The core never configures or opens the transport itself; it only
/// reads, probes and sends the short host handshakes.
pub trait Transport {
    /// Read newly available bytes without blocking.
    ///
    /// Returns `Ok(0)` when nothing has arrived. Any error ends the
    /// current session.
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, TransportError>;

    /// Active liveness probe, e.g. re-enumerating the device.
    ///
    /// Used to tell a quiet link from a dead one.
    fn is_present(&mut self) -> bool;

    /// Write all of `bytes`.
    fn write(&mut self, bytes: &[u8]) -> Result<(), TransportError>;
}
