//! Link health monitoring.
//!
//! A USB serial device may legitimately go quiet for a long time, so
//! silence alone never ends the link. Empty reads are counted; once the
//! count exceeds the threshold a single liveness probe decides between
//! "idle" (counter reset, keep running) and "gone" (disconnect).
//!
//! ```text
//!               begin_connect           connected
//! Disconnected ───────────────> Connecting ─────────> Running <──┐
//!      ^                            │                   │        │ probe ok
//!      │        connect_failed      │        threshold  v        │
//!      ├────────────────────────────┘                Degraded ───┘
//!      │           read error / probe failed /          │
//!      └──────────────── shutdown ──────────────────────┘
//! ```

use log::{debug, error, info, warn};

/// Empty reads tolerated before a liveness probe.
pub const DEFAULT_EMPTY_READ_THRESHOLD: u32 = 512;

/// Link lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LinkState {
    Disconnected,
    Connecting,
    Running,
    /// Threshold exceeded; a liveness probe is in progress.
    Degraded,
}

/// Why the link entered [`LinkState::Disconnected`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DisconnectReason {
    /// Transport, handshake or output could not be set up.
    InitFailed,
    /// A read returned an error.
    TransportError,
    /// The device was no longer present after a long silence.
    ProbeFailed,
    /// Stop was requested.
    Shutdown,
}

impl DisconnectReason {
    /// True for reasons that should end the process with failure.
    #[must_use]
    pub const fn is_failure(self) -> bool {
        !matches!(self, DisconnectReason::Shutdown)
    }
}

/// Outcome of observing one read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[must_use]
pub enum Health {
    /// Bytes arrived.
    Active,
    /// Nothing arrived, still below the threshold.
    Idle,
    /// Threshold exceeded and the probe found the device.
    Recovered,
    /// Link is down.
    Lost(DisconnectReason),
}

/// Tracks link state and consecutive empty reads.
#[derive(Debug, Clone)]
pub struct LinkMonitor {
    state: LinkState,
    empty_reads: u32,
    threshold: u32,
    probes: u32,
    last_disconnect: Option<DisconnectReason>,
}

impl LinkMonitor {
    /// Create a disconnected monitor probing after `threshold` empty reads.
    #[must_use]
    pub const fn new(threshold: u32) -> Self {
        Self {
            state: LinkState::Disconnected,
            empty_reads: 0,
            threshold,
            probes: 0,
            last_disconnect: None,
        }
    }

    #[inline]
    #[must_use]
    pub const fn state(&self) -> LinkState {
        self.state
    }

    /// Consecutive empty reads since the last data or probe.
    #[inline]
    #[must_use]
    pub const fn empty_reads(&self) -> u32 {
        self.empty_reads
    }

    #[inline]
    #[must_use]
    pub const fn threshold(&self) -> u32 {
        self.threshold
    }

    /// Liveness probes performed over the monitor's lifetime.
    #[inline]
    #[must_use]
    pub const fn probes(&self) -> u32 {
        self.probes
    }

    #[inline]
    #[must_use]
    pub const fn last_disconnect(&self) -> Option<DisconnectReason> {
        self.last_disconnect
    }

    #[inline]
    #[must_use]
    pub const fn is_running(&self) -> bool {
        matches!(self.state, LinkState::Running | LinkState::Degraded)
    }

    /// `Disconnected -> Connecting`.
    pub fn begin_connect(&mut self) {
        debug!("link: {:?} -> Connecting", self.state);
        self.state = LinkState::Connecting;
        self.empty_reads = 0;
    }

    /// `Connecting -> Running`.
    pub fn connected(&mut self) {
        info!("link: running");
        self.state = LinkState::Running;
        self.empty_reads = 0;
        self.last_disconnect = None;
    }

    /// `Connecting -> Disconnected(InitFailed)`.
    pub fn connect_failed(&mut self) {
        let _ = self.disconnect(DisconnectReason::InitFailed);
    }

    /// Record a read that delivered bytes.
    pub fn record_data(&mut self) -> Health {
        if let Some(lost) = self.lost() {
            return lost;
        }
        self.empty_reads = 0;
        Health::Active
    }

    /// Record a failed read. Fatal to the session; no retry.
    pub fn record_error(&mut self) -> Health {
        if let Some(lost) = self.lost() {
            return lost;
        }
        error!("link: transport read failed");
        self.disconnect(DisconnectReason::TransportError)
    }

    /// Record an empty read, running `probe` once if the count exceeds
    /// the threshold.
    ///
    /// `probe` must return `true` if the device is still present.
    pub fn record_empty<P>(&mut self, probe: P) -> Health
    where
        P: FnOnce() -> bool,
    {
        if let Some(lost) = self.lost() {
            return lost;
        }

        self.empty_reads = self.empty_reads.saturating_add(1);
        if self.empty_reads <= self.threshold {
            return Health::Idle;
        }

        self.state = LinkState::Degraded;
        self.probes = self.probes.saturating_add(1);
        debug!("link: {} empty reads, probing device", self.empty_reads);

        if probe() {
            debug!("link: device still present");
            self.empty_reads = 0;
            self.state = LinkState::Running;
            Health::Recovered
        } else {
            warn!("link: device not found after {} empty reads", self.empty_reads);
            self.disconnect(DisconnectReason::ProbeFailed)
        }
    }

    /// Any state `-> Disconnected(Shutdown)`.
    pub fn shutdown(&mut self) {
        if self.state != LinkState::Disconnected {
            let _ = self.disconnect(DisconnectReason::Shutdown);
        }
    }

    fn disconnect(&mut self, reason: DisconnectReason) -> Health {
        info!("link: {:?} -> Disconnected ({:?})", self.state, reason);
        self.state = LinkState::Disconnected;
        self.empty_reads = 0;
        self.last_disconnect = Some(reason);
        Health::Lost(reason)
    }

    /// Reads are only meaningful while running.
    fn lost(&self) -> Option<Health> {
        match self.state {
            LinkState::Running | LinkState::Degraded => None,
            LinkState::Disconnected | LinkState::Connecting => Some(Health::Lost(
                self.last_disconnect.unwrap_or(DisconnectReason::InitFailed),
            )),
        }
    }
}

impl Default for LinkMonitor {
    fn default() -> Self {
        Self::new(DEFAULT_EMPTY_READ_THRESHOLD)
    }
}
