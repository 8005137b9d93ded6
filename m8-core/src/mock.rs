//! Scripted transport and recording sink shared by unit tests.

extern crate std;

use crate::input::{Transport, TransportError};
use crate::output::{OutputError, OutputSink};
use crate::projector::ButtonState;
use std::collections::VecDeque;
use std::vec::Vec;

/// Transport replaying scripted reads. Reads past the script are empty.
#[derive(Default)]
pub struct MockTransport {
    pub reads: VecDeque<Result<Vec<u8>, TransportError>>,
    /// Probe answers; `true` once exhausted.
    pub presence: VecDeque<bool>,
    pub probes: usize,
    pub writes: Vec<Vec<u8>>,
    pub fail_writes: bool,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_reads<I>(reads: I) -> Self
    where
        I: IntoIterator<Item = Result<Vec<u8>, TransportError>>,
    {
        Self {
            reads: reads.into_iter().collect(),
            ..Self::default()
        }
    }
}

impl Transport for MockTransport {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, TransportError> {
        match self.reads.pop_front() {
            Some(Ok(bytes)) => {
                let n = bytes.len().min(buf.len());
                buf[..n].copy_from_slice(&bytes[..n]);
                if n < bytes.len() {
                    self.reads.push_front(Ok(bytes[n..].to_vec()));
                }
                Ok(n)
            }
            Some(Err(e)) => Err(e),
            None => Ok(0),
        }
    }

    fn is_present(&mut self) -> bool {
        self.probes += 1;
        self.presence.pop_front().unwrap_or(true)
    }

    fn write(&mut self, bytes: &[u8]) -> Result<(), TransportError> {
        if self.fail_writes {
            return Err(TransportError::Io);
        }
        self.writes.push(bytes.to_vec());
        Ok(())
    }
}

/// Sink recording every snapshot it receives.
#[derive(Default)]
pub struct MockOutput {
    pub sent: Vec<ButtonState>,
    pub fail: bool,
}

impl OutputSink for MockOutput {
    fn send(&mut self, state: &ButtonState) -> Result<(), OutputError> {
        if self.fail {
            return Err(OutputError::Io);
        }
        self.sent.push(*state);
        Ok(())
    }

    fn is_ready(&self) -> bool {
        !self.fail
    }
}
