//! JoypadBridge: reads the M8 byte stream and drives the output sink.

use crate::dispatch::{Dispatch, Dispatcher};
use crate::handshake;
use crate::input::Transport;
use crate::monitor::{Health, LinkMonitor};
use crate::output::OutputSink;
use crate::projector::ButtonState;
use log::warn;
use m8_proto::{HexDump, SlipDecoder, FRAME_CAPACITY};

/// Bytes requested from the transport per poll.
pub const READ_CHUNK: usize = 1024;

/// Counters kept for the lifetime of one bridge.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BridgeStats {
    pub bytes: u64,
    pub packets: u32,
    pub joypad_events: u32,
    pub rejected: u32,
    pub framing_errors: u32,
    pub output_errors: u32,
    pub display_resets: u32,
}

/// Connects one M8 session to an output sink.
///
/// The bridge is polled, never blocks on its own and owns no timers. Each
/// call to [`poll_once`](Self::poll_once) performs exactly one read and
/// reports what the link monitor made of it; the caller decides how long
/// to wait when the link is idle.
///
/// # Error Handling
///
/// Malformed frames and invalid packets are logged and dropped. A rejected
/// packet additionally asks the device to redraw so its stream starts over
/// on a frame boundary. When the link is lost, a released snapshot is sent
/// so no button stays held.
pub struct JoypadBridge<T, O> {
    transport: T,
    output: O,
    decoder: SlipDecoder<FRAME_CAPACITY>,
    dispatcher: Dispatcher,
    monitor: LinkMonitor,
    read_buf: [u8; READ_CHUNK],
    stats: BridgeStats,
}

impl<T: Transport, O: OutputSink> JoypadBridge<T, O> {
    /// Create a bridge for an already initialised transport and sink.
    ///
    /// `dispatcher` and `monitor` are taken by value so the caller can carry
    /// them across sessions via [`into_parts`](Self::into_parts). The
    /// monitor is moved to `Running`.
    pub fn new(transport: T, output: O, dispatcher: Dispatcher, mut monitor: LinkMonitor) -> Self {
        monitor.connected();
        Self {
            transport,
            output,
            decoder: SlipDecoder::new(),
            dispatcher,
            monitor,
            read_buf: [0; READ_CHUNK],
            stats: BridgeStats::default(),
        }
    }

    /// Perform one read and process every packet it completes.
    pub fn poll_once(&mut self) -> Health {
        let health = match self.transport.read(&mut self.read_buf) {
            Err(e) => {
                warn!("Error reading from M8: {:?}", e);
                self.monitor.record_error()
            }
            Ok(0) => {
                let transport = &mut self.transport;
                self.monitor.record_empty(|| transport.is_present())
            }
            Ok(n) => {
                self.stats.bytes += n as u64;
                self.process(n);
                self.monitor.record_data()
            }
        };

        if let Health::Lost(_) = health {
            self.release();
        }
        health
    }

    fn process(&mut self, n: usize) {
        let dispatcher = &mut self.dispatcher;
        let output = &mut self.output;
        let transport = &mut self.transport;
        let stats = &mut self.stats;

        self.decoder.feed_bytes(&self.read_buf[..n], |frame| {
            let packet = match frame {
                Ok(packet) => packet,
                Err(discarded) => {
                    warn!(
                        "SLIP framing error {:?}: {}",
                        discarded.error,
                        HexDump(discarded.bytes)
                    );
                    stats.framing_errors += 1;
                    return;
                }
            };

            stats.packets += 1;
            let result = dispatcher.dispatch(packet);
            if let Dispatch::Joypad(state) = result {
                stats.joypad_events += 1;
                if let Err(e) = output.send(&state) {
                    warn!("Error sending joypad state: {:?}", e);
                    stats.output_errors += 1;
                }
            } else if result.is_rejected() {
                stats.rejected += 1;
                if handshake::reset_display(&mut *transport).is_ok() {
                    stats.display_resets += 1;
                }
            }
        });
    }

    /// Send an all-released snapshot, ignoring failures.
    fn release(&mut self) {
        if self.output.is_ready() {
            let _ = self.output.send(&ButtonState::released());
        }
    }

    /// End the session on request: release every button, tell the device
    /// to stop streaming and mark the link as shut down.
    pub fn shutdown(&mut self) {
        self.release();
        let _ = handshake::disconnect(&mut self.transport);
        self.monitor.shutdown();
    }

    pub fn monitor(&self) -> &LinkMonitor {
        &self.monitor
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    pub fn stats(&self) -> BridgeStats {
        self.stats
    }

    /// Get a reference to the transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Get a mutable reference to the transport.
    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Get a reference to the output sink.
    pub fn output(&self) -> &O {
        &self.output
    }

    /// Decompose the bridge into its components.
    pub fn into_parts(self) -> (T, O, Dispatcher, LinkMonitor) {
        (self.transport, self.output, self.dispatcher, self.monitor)
    }
}
