//! Session supervision: connect, bridge, tear down, maybe reconnect.

use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use log::{info, warn};
use m8_core::{
    handshake, DisconnectReason, Dispatcher, Health, JoypadBridge, LinkMonitor, OutputSink,
    Transport,
};

use crate::config::{Config, JoystickConfig, LinkConfig, SerialConfig};
use crate::error::AppError;
use crate::input::SerialTransport;
use crate::output::UinputJoystick;

/// Opens the two ends of a session.
pub trait Connector {
    type Transport: Transport;
    type Output: OutputSink;

    fn open_transport(&mut self) -> Result<Self::Transport, AppError>;

    fn open_output(&mut self) -> Result<Self::Output, AppError>;
}

/// Real devices: the M8's serial port and a uinput joystick.
pub struct DeviceConnector {
    serial: SerialConfig,
    joystick: JoystickConfig,
}

impl DeviceConnector {
    pub fn new(config: &Config) -> Self {
        Self {
            serial: config.serial.clone(),
            joystick: config.joystick.clone(),
        }
    }
}

impl Connector for DeviceConnector {
    type Transport = SerialTransport;
    type Output = UinputJoystick;

    fn open_transport(&mut self) -> Result<SerialTransport, AppError> {
        SerialTransport::open(&self.serial)
    }

    fn open_output(&mut self) -> Result<UinputJoystick, AppError> {
        UinputJoystick::create(&self.joystick)
    }
}

/// Runs sessions until stopped or until the link is lost for good.
///
/// The dispatcher outlives individual sessions, so system info is reported
/// once per process. Transport and output sink belong to one session: both
/// are torn down when it ends and opened again on reconnect.
pub struct Supervisor<C: Connector> {
    connector: C,
    link: LinkConfig,
    dispatcher: Dispatcher,
    monitor: LinkMonitor,
    sessions: u32,
}

impl<C: Connector> Supervisor<C> {
    pub fn new(connector: C, link: LinkConfig) -> Self {
        let monitor = LinkMonitor::new(link.empty_read_threshold);
        Self {
            connector,
            link,
            dispatcher: Dispatcher::new(),
            monitor,
            sessions: 0,
        }
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    pub fn monitor(&self) -> &LinkMonitor {
        &self.monitor
    }

    /// Sessions that reached the running state.
    pub fn sessions(&self) -> u32 {
        self.sessions
    }

    /// Run until `stop` is set (`Ok`) or a session fails for good (`Err`).
    ///
    /// Failing to bring up the first session always ends the run. After
    /// that, a lost link is retried when reconnecting is enabled.
    pub fn run(&mut self, stop: &AtomicBool) -> Result<(), AppError> {
        loop {
            if stop.load(Ordering::Relaxed) {
                self.monitor.shutdown();
                return Ok(());
            }

            match self.session(stop) {
                Ok(()) => return Ok(()),
                Err(e) if self.link.reconnect && self.sessions > 0 => {
                    warn!("{}; retrying in {} ms", e, self.link.reconnect_interval_ms);
                    sleep_unless_stopped(self.link.reconnect_interval(), stop);
                }
                Err(e) => return Err(e),
            }
        }
    }

    fn session(&mut self, stop: &AtomicBool) -> Result<(), AppError> {
        self.monitor.begin_connect();

        let mut transport = match self.connector.open_transport() {
            Ok(transport) => transport,
            Err(e) => {
                self.monitor.connect_failed();
                return Err(e);
            }
        };
        if let Err(e) = handshake::enable_and_reset(&mut transport) {
            self.monitor.connect_failed();
            return Err(AppError::Handshake(e));
        }
        let output = match self.connector.open_output() {
            Ok(output) => output,
            Err(e) => {
                let _ = handshake::disconnect(&mut transport);
                self.monitor.connect_failed();
                return Err(e);
            }
        };

        self.sessions += 1;
        let monitor = std::mem::replace(
            &mut self.monitor,
            LinkMonitor::new(self.link.empty_read_threshold),
        );
        let mut bridge = JoypadBridge::new(
            transport,
            output,
            std::mem::take(&mut self.dispatcher),
            monitor,
        );

        loop {
            if stop.load(Ordering::Relaxed) {
                info!("Stop requested");
                bridge.shutdown();
                break;
            }
            match bridge.poll_once() {
                Health::Active | Health::Recovered => {}
                Health::Idle => thread::sleep(self.link.idle_sleep()),
                Health::Lost(reason) => {
                    if reason == DisconnectReason::ProbeFailed {
                        let _ = handshake::disconnect(bridge.transport_mut());
                    }
                    break;
                }
            }
        }

        let stats = bridge.stats();
        info!(
            "Session ended: {} bytes, {} packets, {} joypad events, {} rejected, \
             {} framing errors, {} output errors, {} display resets",
            stats.bytes,
            stats.packets,
            stats.joypad_events,
            stats.rejected,
            stats.framing_errors,
            stats.output_errors,
            stats.display_resets
        );

        // Transport and sink are dropped here.
        let (_, _, dispatcher, monitor) = bridge.into_parts();
        self.dispatcher = dispatcher;
        self.monitor = monitor;

        match self.monitor.last_disconnect() {
            Some(reason) if reason.is_failure() => Err(AppError::LinkLost(reason)),
            _ => Ok(()),
        }
    }
}

/// Sleep for `duration`, waking early if `stop` is set.
fn sleep_unless_stopped(duration: Duration, stop: &AtomicBool) {
    const STEP: Duration = Duration::from_millis(50);
    let deadline = Instant::now() + duration;
    while !stop.load(Ordering::Relaxed) {
        let now = Instant::now();
        if now >= deadline {
            break;
        }
        thread::sleep(STEP.min(deadline - now));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use m8_core::{ButtonState, OutputError, TransportError};
    use std::cell::{Cell, RefCell};
    use std::collections::VecDeque;
    use std::rc::Rc;
    use std::sync::Arc;

    type Script = VecDeque<Result<Vec<u8>, TransportError>>;

    /// Replays a script; sets `stop` once it runs dry.
    struct ScriptedTransport {
        reads: Script,
        stop: Option<Arc<AtomicBool>>,
        writes: Rc<RefCell<Vec<Vec<u8>>>>,
        present: bool,
    }

    impl Transport for ScriptedTransport {
        fn read(&mut self, buf: &mut [u8]) -> Result<usize, TransportError> {
            match self.reads.pop_front() {
                Some(Ok(bytes)) => {
                    buf[..bytes.len()].copy_from_slice(&bytes);
                    Ok(bytes.len())
                }
                Some(Err(e)) => Err(e),
                None => {
                    if let Some(stop) = &self.stop {
                        stop.store(true, Ordering::Relaxed);
                    }
                    Ok(0)
                }
            }
        }

        fn is_present(&mut self) -> bool {
            self.present
        }

        fn write(&mut self, bytes: &[u8]) -> Result<(), TransportError> {
            self.writes.borrow_mut().push(bytes.to_vec());
            Ok(())
        }
    }

    struct RecordingOutput {
        sent: Rc<RefCell<Vec<ButtonState>>>,
        closed: Rc<Cell<u32>>,
    }

    impl Drop for RecordingOutput {
        fn drop(&mut self) {
            self.closed.set(self.closed.get() + 1);
        }
    }

    impl OutputSink for RecordingOutput {
        fn send(&mut self, state: &ButtonState) -> Result<(), OutputError> {
            self.sent.borrow_mut().push(*state);
            Ok(())
        }

        fn is_ready(&self) -> bool {
            true
        }
    }

    /// Hands out one transport per scripted session, then reports no device.
    #[derive(Default)]
    struct MockConnector {
        sessions: VecDeque<(Script, Option<Arc<AtomicBool>>)>,
        writes: Rc<RefCell<Vec<Vec<u8>>>>,
        sent: Rc<RefCell<Vec<ButtonState>>>,
        closed: Rc<Cell<u32>>,
        outputs_opened: u32,
        fail_output: bool,
        attempts: u32,
        absent_after_first: u32,
    }

    impl MockConnector {
        fn session(mut self, reads: Vec<Result<Vec<u8>, TransportError>>) -> Self {
            self.sessions.push_back((reads.into(), None));
            self
        }

        fn final_session(
            mut self,
            reads: Vec<Result<Vec<u8>, TransportError>>,
            stop: &Arc<AtomicBool>,
        ) -> Self {
            self.sessions.push_back((reads.into(), Some(Arc::clone(stop))));
            self
        }
    }

    impl Connector for MockConnector {
        type Transport = ScriptedTransport;
        type Output = RecordingOutput;

        fn open_transport(&mut self) -> Result<ScriptedTransport, AppError> {
            self.attempts += 1;
            let not_found = AppError::DeviceNotFound {
                vid: 0x16C0,
                pid: 0x048A,
            };
            if self.attempts > 1 && self.absent_after_first > 0 {
                self.absent_after_first -= 1;
                return Err(not_found);
            }
            let (reads, stop) = self.sessions.pop_front().ok_or(not_found)?;
            Ok(ScriptedTransport {
                reads,
                stop,
                writes: Rc::clone(&self.writes),
                present: false,
            })
        }

        fn open_output(&mut self) -> Result<RecordingOutput, AppError> {
            if self.fail_output {
                return Err(AppError::Output(OutputError::NotReady));
            }
            self.outputs_opened += 1;
            Ok(RecordingOutput {
                sent: Rc::clone(&self.sent),
                closed: Rc::clone(&self.closed),
            })
        }
    }

    fn link(reconnect: bool) -> LinkConfig {
        LinkConfig {
            empty_read_threshold: 4,
            idle_sleep_ms: 0,
            reconnect,
            reconnect_interval_ms: 0,
        }
    }

    const JOYPAD_A: [u8; 4] = [0xFB, 0x01, 0x00, 0xC0];
    const SYSTEM_INFO: [u8; 7] = [0xFF, 0x02, 1, 4, 0, 0, 0xC0];

    #[test]
    fn test_no_device_fails_without_reconnect() {
        let mut supervisor = Supervisor::new(MockConnector::default(), link(false));
        let stop = AtomicBool::new(false);
        assert!(matches!(
            supervisor.run(&stop),
            Err(AppError::DeviceNotFound { .. })
        ));
        assert_eq!(supervisor.monitor().last_disconnect(), Some(DisconnectReason::InitFailed));
        assert_eq!(supervisor.sessions(), 0);
    }

    #[test]
    fn test_first_connect_failure_exits_even_with_reconnect() {
        let mut supervisor = Supervisor::new(MockConnector::default(), link(true));
        assert!(matches!(
            supervisor.run(&AtomicBool::new(false)),
            Err(AppError::DeviceNotFound { .. })
        ));
    }

    #[test]
    fn test_reconnect_retries_until_device_returns() {
        let stop = Arc::new(AtomicBool::new(false));
        let mut connector = MockConnector::default()
            .session(vec![Err(TransportError::Io)])
            .final_session(vec![Ok(JOYPAD_A.to_vec())], &stop);
        // Device absent for the first two attempts after the loss.
        connector.absent_after_first = 2;
        let mut supervisor = Supervisor::new(connector, link(true));

        assert!(supervisor.run(&stop).is_ok());
        assert_eq!(supervisor.sessions(), 2);
        assert_eq!(supervisor.connector.attempts, 4);
    }

    #[test]
    fn test_stop_before_connect() {
        let mut supervisor = Supervisor::new(MockConnector::default(), link(false));
        let stop = AtomicBool::new(true);
        assert!(supervisor.run(&stop).is_ok());
        assert_eq!(supervisor.sessions(), 0);
    }

    #[test]
    fn test_read_error_ends_run_with_failure() {
        let connector = MockConnector::default().session(vec![
            Ok(JOYPAD_A.to_vec()),
            Err(TransportError::Io),
        ]);
        let writes = Rc::clone(&connector.writes);
        let sent = Rc::clone(&connector.sent);
        let mut supervisor = Supervisor::new(connector, link(false));

        let result = supervisor.run(&AtomicBool::new(false));
        assert!(matches!(
            result,
            Err(AppError::LinkLost(DisconnectReason::TransportError))
        ));
        assert_eq!(*writes.borrow(), vec![b"E".to_vec(), b"R".to_vec()]);

        let sent = sent.borrow();
        assert_eq!(sent.len(), 2);
        assert!(sent[0].a);
        assert_eq!(sent[1], ButtonState::released());
    }

    #[test]
    fn test_silent_device_gone_ends_run() {
        let connector = MockConnector::default().session(vec![]);
        let writes = Rc::clone(&connector.writes);
        let mut supervisor = Supervisor::new(connector, link(false));

        let result = supervisor.run(&AtomicBool::new(false));
        assert!(matches!(
            result,
            Err(AppError::LinkLost(DisconnectReason::ProbeFailed))
        ));
        assert_eq!(writes.borrow().last(), Some(&b"D".to_vec()));
        assert_eq!(supervisor.monitor().probes(), 1);
    }

    #[test]
    fn test_reconnect_keeps_dispatcher() {
        let stop = Arc::new(AtomicBool::new(false));
        let connector = MockConnector::default()
            .session(vec![Ok(SYSTEM_INFO.to_vec()), Err(TransportError::Disconnected)])
            .final_session(vec![Ok(SYSTEM_INFO.to_vec()), Ok(JOYPAD_A.to_vec())], &stop);
        let writes = Rc::clone(&connector.writes);
        let sent = Rc::clone(&connector.sent);
        let mut supervisor = Supervisor::new(connector, link(true));

        assert!(supervisor.run(&stop).is_ok());
        assert_eq!(supervisor.sessions(), 2);
        assert!(supervisor.dispatcher().system_info().is_some());
        assert_eq!(supervisor.monitor().last_disconnect(), Some(DisconnectReason::Shutdown));

        let writes = writes.borrow();
        assert_eq!(writes.iter().filter(|w| w.as_slice() == b"E").count(), 2);
        assert_eq!(writes.last(), Some(&b"D".to_vec()));

        // Released on loss, A pressed, released on shutdown.
        let sent = sent.borrow();
        assert_eq!(sent.len(), 3);
        assert!(sent[1].a);
    }

    #[test]
    fn test_output_torn_down_and_recreated_on_reconnect() {
        let stop = Arc::new(AtomicBool::new(false));
        let connector = MockConnector::default()
            .session(vec![Err(TransportError::Io)])
            .final_session(vec![], &stop);
        let closed = Rc::clone(&connector.closed);
        let mut supervisor = Supervisor::new(connector, link(true));
        assert!(supervisor.run(&stop).is_ok());
        assert_eq!(supervisor.connector.outputs_opened, 2);
        assert_eq!(closed.get(), 2);
    }

    #[test]
    fn test_output_closed_when_link_lost() {
        let connector = MockConnector::default().session(vec![Err(TransportError::Io)]);
        let closed = Rc::clone(&connector.closed);
        let mut supervisor = Supervisor::new(connector, link(false));
        assert!(supervisor.run(&AtomicBool::new(false)).is_err());
        assert_eq!(closed.get(), 1);
    }

    #[test]
    fn test_output_failure_is_init_failure() {
        let mut connector = MockConnector::default().session(vec![]);
        connector.fail_output = true;
        let writes = Rc::clone(&connector.writes);
        let mut supervisor = Supervisor::new(connector, link(false));

        assert!(matches!(
            supervisor.run(&AtomicBool::new(false)),
            Err(AppError::Output(OutputError::NotReady))
        ));
        assert_eq!(supervisor.monitor().last_disconnect(), Some(DisconnectReason::InitFailed));
        assert_eq!(writes.borrow().last(), Some(&b"D".to_vec()));
    }

    #[test]
    fn test_sleep_returns_when_stopped() {
        let start = Instant::now();
        sleep_unless_stopped(Duration::from_secs(10), &AtomicBool::new(true));
        assert!(start.elapsed() < Duration::from_secs(1));
    }
}
