//! Host handshakes sent to the M8 over the transport.

use crate::input::{Transport, TransportError};
use log::{debug, info, warn};
use m8_proto::HostCommand;

/// Encode and write one host command.
pub fn send<T: Transport + ?Sized>(
    transport: &mut T,
    command: HostCommand,
) -> Result<(), TransportError> {
    transport.write(&command.encode()).map_err(|e| {
        warn!("Error sending {} to M8: {:?}", command.name(), e);
        e
    })
}

/// Start streaming and request a full redraw. Sent once per connection.
pub fn enable_and_reset<T: Transport + ?Sized>(transport: &mut T) -> Result<(), TransportError> {
    info!("Enabling and resetting M8 display");
    send(transport, HostCommand::Enable)?;
    reset_display(transport)
}

/// Request a full redraw, which also resynchronises the device's stream.
pub fn reset_display<T: Transport + ?Sized>(transport: &mut T) -> Result<(), TransportError> {
    debug!("Reset display");
    send(transport, HostCommand::ResetDisplay)
}

/// Tell the device to stop streaming.
pub fn disconnect<T: Transport + ?Sized>(transport: &mut T) -> Result<(), TransportError> {
    info!("Disconnecting M8");
    send(transport, HostCommand::Disconnect)
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;
    use crate::mock::MockTransport;
    use std::vec;

    #[test]
    fn test_enable_and_reset_sequence() {
        let mut transport = MockTransport::new();
        enable_and_reset(&mut transport).unwrap();
        assert_eq!(transport.writes, vec![b"E".to_vec(), b"R".to_vec()]);
    }

    #[test]
    fn test_enable_failure_skips_reset() {
        let mut transport = MockTransport::new();
        transport.fail_writes = true;
        assert_eq!(enable_and_reset(&mut transport), Err(TransportError::Io));
        assert!(transport.writes.is_empty());
    }

    #[test]
    fn test_disconnect() {
        let mut transport = MockTransport::new();
        disconnect(&mut transport).unwrap();
        assert_eq!(transport.writes, vec![b"D".to_vec()]);
    }
}
