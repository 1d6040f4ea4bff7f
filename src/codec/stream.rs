//! Streaming frame decoder with marker resynchronization.
//!
//! A byte-stream transport may hand over part of a frame, several frames
//! concatenated, or garbage between frames.  The decoder accumulates bytes
//! and scans for the receiver's own destination marker:
//!
//! ```text
//!   ... junk ... │ "ppaM" │ code │ payload │ "ppaM" │ co...
//!   discarded    └──────── 24 bytes ───────┘ kept for next read
//! ```
//!
//! * no marker in the buffer → keep only the last 3 bytes (a marker may
//!   be split across reads);
//! * marker found → drop everything before it;
//! * marker plus at least 24 bytes → decode and consume exactly 24 bytes.
//!
//! A frame whose header is garbled is dropped by skipping its marker, so
//! the scan resumes right after it.

use heapless::Vec;
use log::{debug, warn};

use super::{Destination, FRAME_LEN, Frame};

/// Receive buffer size.  Large enough for several back-to-back frames.
pub const STREAM_BUFFER: usize = 256;

const MARKER_LEN: usize = 4;

/// Streaming decoder for one receiving end.
pub struct StreamDecoder {
    marker: [u8; MARKER_LEN],
    buf: Vec<u8, STREAM_BUFFER>,
    dropped: u32,
}

impl StreamDecoder {
    /// Decoder that accepts frames addressed to `local`.
    pub fn new(local: Destination) -> Self {
        Self {
            marker: local.marker_bytes(),
            buf: Vec::new(),
            dropped: 0,
        }
    }

    /// Feed bytes into the decoder; `on_frame` is called for every complete
    /// frame, in arrival order.
    pub fn feed(&mut self, mut data: &[u8], mut on_frame: impl FnMut(Frame)) {
        while !data.is_empty() {
            let room = STREAM_BUFFER - self.buf.len();
            if room == 0 {
                warn!("stream decoder: buffer full without a frame, discarding");
                self.keep_tail();
                continue;
            }

            let n = room.min(data.len());
            // Fits: `n` is bounded by the free room.
            let _ = self.buf.extend_from_slice(&data[..n]);
            data = &data[n..];

            while let Some(frame) = self.next_frame() {
                on_frame(frame);
            }
        }
    }

    /// Pop the next complete frame from the buffered bytes, if any.
    pub fn next_frame(&mut self) -> Option<Frame> {
        loop {
            let Some(start) = self.find_marker() else {
                self.keep_tail();
                return None;
            };
            self.discard_front(start);

            if self.buf.len() < FRAME_LEN {
                return None;
            }

            match Frame::decode(&self.buf[..FRAME_LEN]) {
                Ok(frame) => {
                    self.discard_front(FRAME_LEN);
                    return Some(frame);
                }
                Err(e) => {
                    debug!("stream decoder: dropping frame ({})", e);
                    self.dropped = self.dropped.wrapping_add(1);
                    self.discard_front(MARKER_LEN);
                }
            }
        }
    }

    /// Forget all buffered bytes (e.g. after a transport reconnect).
    pub fn reset(&mut self) {
        self.buf.clear();
    }

    /// Bytes currently held waiting for the rest of a frame.
    pub fn buffered(&self) -> usize {
        self.buf.len()
    }

    /// Frames that carried our marker but failed to decode.
    pub fn dropped_count(&self) -> u32 {
        self.dropped
    }

    // -----------------------------------------------------------------------
    // Internal
    // -----------------------------------------------------------------------

    fn find_marker(&self) -> Option<usize> {
        self.buf
            .windows(MARKER_LEN)
            .position(|w| w == self.marker)
    }

    fn keep_tail(&mut self) {
        let keep = MARKER_LEN - 1;
        if self.buf.len() > keep {
            self.discard_front(self.buf.len() - keep);
        }
    }

    fn discard_front(&mut self, n: usize) {
        let n = n.min(self.buf.len());
        if n == 0 {
            return;
        }
        let len = self.buf.len();
        self.buf.copy_within(n..len, 0);
        self.buf.truncate(len - n);
    }
}
