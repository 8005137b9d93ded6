//! SLIP framing (RFC 1055) for the M8 serial stream.
//!
//! Every packet the M8 sends is terminated by [`END`]. Occurrences of
//! [`END`] and [`ESC`] inside a packet are replaced by two-byte escape
//! sequences. The decoder is fed one byte at a time and keeps its state
//! between calls, so a frame may be split across any number of reads.

use heapless::Vec;

/// Frame delimiter.
pub const END: u8 = 0xC0;
/// Escape introducer.
pub const ESC: u8 = 0xDB;
/// Escaped [`END`].
pub const ESC_END: u8 = 0xDC;
/// Escaped [`ESC`].
pub const ESC_ESC: u8 = 0xDD;

/// Decoder capacity used by the bridge.
///
/// The largest valid packet (a full waveform) is 484 bytes.
pub const FRAME_CAPACITY: usize = 1024;

/// Framing error reported for a single frame.
///
/// The offending frame is discarded and the decoder skips to the next
/// [`END`] before accepting data again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FramingError {
    /// Frame does not fit in the decoder buffer.
    Overflow,
    /// [`ESC`] followed by something other than [`ESC_END`] / [`ESC_ESC`].
    InvalidEscape(u8),
}

/// Result of feeding one byte to the decoder.
#[derive(Debug, PartialEq, Eq)]
#[must_use]
pub enum FrameResult<'a> {
    /// More bytes are needed.
    Incomplete,
    /// A complete packet. Valid until the next call to [`SlipDecoder::feed`].
    Complete(&'a [u8]),
    /// The frame in progress was malformed and has been dropped.
    Error(Discarded<'a>),
}

/// A dropped frame: the error and the bytes decoded before it was detected.
///
/// Bytes skipped afterwards while resynchronising are not included.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Discarded<'a> {
    pub error: FramingError,
    pub bytes: &'a [u8],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Normal,
    Escaped,
    /// Dropping bytes until the next frame boundary.
    Discarding,
}

/// Incremental SLIP decoder with a fixed-capacity buffer.
///
/// Only one frame is held at a time: the buffer of a delivered packet is
/// reused for the next frame.
///
/// # Example
///
/// ```
/// use m8_proto::slip::{FrameResult, SlipDecoder, END};
///
/// let mut decoder = SlipDecoder::<16>::new();
/// assert_eq!(decoder.feed(0xFB), FrameResult::Incomplete);
/// assert_eq!(decoder.feed(0x01), FrameResult::Incomplete);
/// assert_eq!(decoder.feed(END), FrameResult::Complete(&[0xFB, 0x01]));
/// ```
#[derive(Debug)]
pub struct SlipDecoder<const N: usize> {
    buffer: Vec<u8, N>,
    state: State,
    /// Buffer holds a delivered or discarded frame; cleared on the next byte.
    delivered: bool,
}

impl<const N: usize> SlipDecoder<N> {
    /// Create an empty decoder.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            buffer: Vec::new(),
            state: State::Normal,
            delivered: false,
        }
    }

    /// Maximum decoded frame length.
    #[inline]
    #[must_use]
    pub const fn capacity(&self) -> usize {
        N
    }

    /// Number of decoded bytes buffered for the frame in progress.
    #[inline]
    #[must_use]
    pub fn pending(&self) -> usize {
        if self.delivered {
            0
        } else {
            self.buffer.len()
        }
    }

    /// Drop any partial frame and return to the initial state.
    pub fn reset(&mut self) {
        self.buffer.clear();
        self.state = State::Normal;
        self.delivered = false;
    }

    /// Feed a single byte from the transport.
    pub fn feed(&mut self, byte: u8) -> FrameResult<'_> {
        if self.delivered {
            self.buffer.clear();
            self.delivered = false;
        }

        match self.state {
            State::Discarding => {
                if byte == END {
                    self.state = State::Normal;
                }
                FrameResult::Incomplete
            }
            State::Escaped => {
                let decoded = match byte {
                    ESC_END => END,
                    ESC_ESC => ESC,
                    other => {
                        // An END here still closes the broken frame.
                        let state = if other == END {
                            State::Normal
                        } else {
                            State::Discarding
                        };
                        return self.discard(FramingError::InvalidEscape(other), state);
                    }
                };
                self.state = State::Normal;
                self.push(decoded)
            }
            State::Normal => match byte {
                END if self.buffer.is_empty() => FrameResult::Incomplete,
                END => {
                    self.delivered = true;
                    FrameResult::Complete(self.buffer.as_slice())
                }
                ESC => {
                    self.state = State::Escaped;
                    FrameResult::Incomplete
                }
                _ => self.push(byte),
            },
        }
    }

    /// Feed a chunk of bytes, calling `on_frame` for every complete packet
    /// or framing error.
    ///
    /// Produces exactly the same sequence of results as calling
    /// [`feed`](Self::feed) for each byte, regardless of how the stream is
    /// chunked.
    pub fn feed_bytes<F>(&mut self, bytes: &[u8], mut on_frame: F)
    where
        F: FnMut(Result<&[u8], Discarded<'_>>),
    {
        for &byte in bytes {
            match self.feed(byte) {
                FrameResult::Incomplete => {}
                FrameResult::Complete(packet) => on_frame(Ok(packet)),
                FrameResult::Error(discarded) => on_frame(Err(discarded)),
            }
        }
    }

    fn push(&mut self, byte: u8) -> FrameResult<'_> {
        if self.buffer.push(byte).is_err() {
            return self.discard(FramingError::Overflow, State::Discarding);
        }
        FrameResult::Incomplete
    }

    fn discard(&mut self, error: FramingError, next: State) -> FrameResult<'_> {
        self.state = next;
        self.delivered = true;
        FrameResult::Error(Discarded {
            error,
            bytes: self.buffer.as_slice(),
        })
    }
}

impl<const N: usize> Default for SlipDecoder<N> {
    fn default() -> Self {
        Self::new()
    }
}

/// Error returned by [`encode`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum EncodeError {
    /// Output buffer cannot hold the encoded frame.
    BufferTooSmall,
}

/// Length of `payload` once escaped and terminated.
#[must_use]
pub fn encoded_len(payload: &[u8]) -> usize {
    payload
        .iter()
        .map(|&b| if b == END || b == ESC { 2 } else { 1 })
        .sum::<usize>()
        + 1
}

/// Encode `payload` as a SLIP frame terminated by [`END`].
///
/// Returns the number of bytes written.
pub fn encode(payload: &[u8], buf: &mut [u8]) -> Result<usize, EncodeError> {
    if buf.len() < encoded_len(payload) {
        return Err(EncodeError::BufferTooSmall);
    }

    let mut pos = 0;
    for &b in payload {
        match b {
            END => {
                buf[pos] = ESC;
                buf[pos + 1] = ESC_END;
                pos += 2;
            }
            ESC => {
                buf[pos] = ESC;
                buf[pos + 1] = ESC_ESC;
                pos += 2;
            }
            _ => {
                buf[pos] = b;
                pos += 1;
            }
        }
    }
    buf[pos] = END;
    Ok(pos + 1)
}
