use std::io::{self, Read, Write};
use std::time::Duration;

use log::{debug, info};
use m8_core::{Transport, TransportError};
use serialport::{
    DataBits, FlowControl, Parity, SerialPort, SerialPortInfo, SerialPortType, StopBits,
};

use crate::config::SerialConfig;
use crate::error::AppError;

/// Write timeout for the short host commands.
const WRITE_TIMEOUT: Duration = Duration::from_millis(5);

/// M8 USB serial port used as the bridge transport.
///
/// Reads never block: only the bytes already queued by the driver are
/// taken. The liveness probe re-enumerates USB serial ports and looks for
/// this port's name among the matching devices.
pub struct SerialTransport {
    port: Box<dyn SerialPort>,
    name: String,
    vid: u16,
    pid: u16,
}

impl SerialTransport {
    /// Find the M8 and open it 8N1 without flow control.
    pub fn open(config: &SerialConfig) -> Result<Self, AppError> {
        let name = find_m8(config)?;
        info!("Opening port {}", name);

        let port = serialport::new(&name, config.baud)
            .data_bits(DataBits::Eight)
            .parity(Parity::None)
            .stop_bits(StopBits::One)
            .flow_control(FlowControl::None)
            .timeout(WRITE_TIMEOUT)
            .open()?;

        Ok(Self {
            port,
            name,
            vid: config.vid,
            pid: config.pid,
        })
    }

    /// Name of the opened port, e.g. "/dev/ttyACM0".
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Transport for SerialTransport {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, TransportError> {
        let available = self.port.bytes_to_read().map_err(serial_error)? as usize;
        if available == 0 {
            return Ok(0);
        }
        let len = available.min(buf.len());
        match self.port.read(&mut buf[..len]) {
            Ok(n) => Ok(n),
            Err(e) if e.kind() == io::ErrorKind::TimedOut => Ok(0),
            Err(e) => Err(io_error(e)),
        }
    }

    fn is_present(&mut self) -> bool {
        match serialport::available_ports() {
            Ok(ports) => ports
                .iter()
                .any(|p| p.port_name == self.name && is_m8(p, self.vid, self.pid)),
            Err(e) => {
                debug!("Port enumeration failed: {}", e);
                false
            }
        }
    }

    fn write(&mut self, bytes: &[u8]) -> Result<(), TransportError> {
        self.port.write_all(bytes).map_err(io_error)?;
        self.port.flush().map_err(io_error)
    }
}

fn serial_error(e: serialport::Error) -> TransportError {
    match e.kind() {
        serialport::ErrorKind::NoDevice => TransportError::Disconnected,
        _ => TransportError::Io,
    }
}

fn io_error(e: io::Error) -> TransportError {
    match e.kind() {
        io::ErrorKind::TimedOut => TransportError::Timeout,
        io::ErrorKind::BrokenPipe | io::ErrorKind::NotFound => TransportError::Disconnected,
        _ => TransportError::Io,
    }
}

fn is_m8(port: &SerialPortInfo, vid: u16, pid: u16) -> bool {
    matches!(&port.port_type, SerialPortType::UsbPort(usb) if usb.vid == vid && usb.pid == pid)
}

/// Pick the M8 port: the preferred one if it matches, else the first match.
pub fn select_port<'a>(
    ports: &'a [SerialPortInfo],
    vid: u16,
    pid: u16,
    preferred: Option<&str>,
) -> Option<&'a SerialPortInfo> {
    let mut matching = ports.iter().filter(|p| is_m8(p, vid, pid));
    match preferred {
        Some(name) => {
            let candidates: Vec<_> = matching.collect();
            candidates
                .iter()
                .find(|p| p.port_name == name)
                .or_else(|| candidates.first())
                .copied()
        }
        None => matching.next(),
    }
}

/// Name of the port to open for `config`.
pub fn find_m8(config: &SerialConfig) -> Result<String, AppError> {
    debug!("Looking for USB serial devices");
    let ports = serialport::available_ports()?;
    for port in ports.iter().filter(|p| is_m8(p, config.vid, config.pid)) {
        info!("Found M8 in {}", port.port_name);
    }
    select_port(&ports, config.vid, config.pid, config.device.as_deref())
        .map(|p| p.port_name.clone())
        .ok_or(AppError::DeviceNotFound {
            vid: config.vid,
            pid: config.pid,
        })
}

/// Names of every connected M8.
pub fn list_m8(config: &SerialConfig) -> Result<Vec<String>, AppError> {
    Ok(serialport::available_ports()?
        .into_iter()
        .filter(|p| is_m8(p, config.vid, config.pid))
        .map(|p| p.port_name)
        .collect())
}
