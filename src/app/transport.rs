//! Transport abstraction over any byte-oriented channel.
//!
//! Concrete implementations live with the embedding process:
//! - TCP socket between the panel and the oven processes
//! - UART to a board running the oven
//! - in-memory loopback in tests
//!
//! [`TransportLink`] turns a transport into a [`FrameSink`] and pumps
//! received bytes through a [`StreamDecoder`].

use log::warn;

use super::ports::FrameSink;
use crate::codec::stream::StreamDecoder;
use crate::codec::{Destination, Frame};

/// Byte-oriented transport channel.
pub trait Transport {
    /// Error type for this transport.
    type Error: core::fmt::Debug;

    /// Read up to `buf.len()` bytes into `buf`.
    /// Returns the number of bytes actually read.
    /// Returns 0 if no data is available (non-blocking).
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error>;

    /// Write `data` to the transport.
    /// Returns the number of bytes actually written.
    fn write(&mut self, data: &[u8]) -> Result<usize, Self::Error>;

    /// Flush any buffered output.
    fn flush(&mut self) -> Result<(), Self::Error>;

    /// Check if data is available for reading.
    fn available(&self) -> bool;
}

/// Read chunk size for [`TransportLink::poll`].
const READ_CHUNK: usize = 64;

/// A transport plus the stream decoder for its receive side.
pub struct TransportLink<T: Transport> {
    transport: T,
    decoder: StreamDecoder,
    write_errors: u32,
}

impl<T: Transport> TransportLink<T> {
    /// `local` is the destination this end answers to.
    pub fn new(transport: T, local: Destination) -> Self {
        Self {
            transport,
            decoder: StreamDecoder::new(local),
            write_errors: 0,
        }
    }

    /// Read everything currently available and decode it.
    pub fn poll(&mut self, mut on_frame: impl FnMut(Frame)) {
        let mut chunk = [0u8; READ_CHUNK];
        while self.transport.available() {
            match self.transport.read(&mut chunk) {
                Ok(0) => break,
                Ok(n) => self.decoder.feed(&chunk[..n], &mut on_frame),
                Err(e) => {
                    warn!("transport read failed: {:?}", e);
                    break;
                }
            }
        }
    }

    /// Drop partially received data, e.g. after the peer reconnects.
    pub fn reset(&mut self) {
        self.decoder.reset();
    }

    /// Frames that could not be written in full.
    pub fn write_errors(&self) -> u32 {
        self.write_errors
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    pub fn into_inner(self) -> T {
        self.transport
    }
}

impl<T: Transport> TransportLink<T> {
    /// Write all of `bytes`, retrying short writes.  A write that makes no
    /// progress counts as a failure.
    fn write_all(&mut self, bytes: &[u8]) -> bool {
        let mut rest = bytes;
        while !rest.is_empty() {
            match self.transport.write(rest) {
                Ok(0) => {
                    warn!(
                        "transport stalled with {} of {} bytes unsent",
                        rest.len(),
                        bytes.len()
                    );
                    return false;
                }
                Ok(n) => rest = &rest[n.min(rest.len())..],
                Err(e) => {
                    warn!("transport write failed: {:?}", e);
                    return false;
                }
            }
        }
        match self.transport.flush() {
            Ok(()) => true,
            Err(e) => {
                warn!("transport flush failed: {:?}", e);
                false
            }
        }
    }
}

impl<T: Transport> FrameSink for TransportLink<T> {
    fn send(&mut self, frame: &Frame) {
        let bytes = frame.encode();
        if !self.write_all(&bytes) {
            self.write_errors = self.write_errors.wrapping_add(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::SignalCode;
    use std::collections::VecDeque;

    /// Loopback: everything written can be read back.
    #[derive(Default)]
    struct Loopback {
        bytes: VecDeque<u8>,
    }

    impl Transport for Loopback {
        type Error = ();

        fn read(&mut self, buf: &mut [u8]) -> Result<usize, ()> {
            let n = buf.len().min(self.bytes.len());
            for b in buf.iter_mut().take(n) {
                *b = self.bytes.pop_front().unwrap_or(0);
            }
            Ok(n)
        }

        fn write(&mut self, data: &[u8]) -> Result<usize, ()> {
            self.bytes.extend(data);
            Ok(data.len())
        }

        fn flush(&mut self) -> Result<(), ()> {
            Ok(())
        }

        fn available(&self) -> bool {
            !self.bytes.is_empty()
        }
    }

    struct Broken;

    impl Transport for Broken {
        type Error = &'static str;

        fn read(&mut self, _buf: &mut [u8]) -> Result<usize, &'static str> {
            Err("down")
        }

        fn write(&mut self, _data: &[u8]) -> Result<usize, &'static str> {
            Err("down")
        }

        fn flush(&mut self) -> Result<(), &'static str> {
            Ok(())
        }

        fn available(&self) -> bool {
            true
        }
    }

    /// Accepts at most `limit` bytes per write.
    struct Trickle {
        limit: usize,
        wire: std::vec::Vec<u8>,
    }

    impl Transport for Trickle {
        type Error = ();

        fn read(&mut self, _buf: &mut [u8]) -> Result<usize, ()> {
            Ok(0)
        }

        fn write(&mut self, data: &[u8]) -> Result<usize, ()> {
            let n = data.len().min(self.limit);
            self.wire.extend_from_slice(&data[..n]);
            Ok(n)
        }

        fn flush(&mut self) -> Result<(), ()> {
            Ok(())
        }

        fn available(&self) -> bool {
            false
        }
    }

    #[test]
    fn short_writes_are_retried_until_the_frame_is_out() {
        let trickle = Trickle {
            limit: 10,
            wire: std::vec::Vec::new(),
        };
        let mut link = TransportLink::new(trickle, Destination::App);
        let frame = Frame::signal(Destination::Dev, SignalCode::Start);
        link.send(&frame);
        assert_eq!(link.write_errors(), 0);
        assert_eq!(link.transport().wire.as_slice(), &frame.encode()[..]);
    }

    #[test]
    fn stalled_write_is_counted() {
        let stalled = Trickle {
            limit: 0,
            wire: std::vec::Vec::new(),
        };
        let mut link = TransportLink::new(stalled, Destination::App);
        link.send(&Frame::signal(Destination::Dev, SignalCode::Start));
        assert_eq!(link.write_errors(), 1);
        assert!(link.transport().wire.is_empty());
    }

    #[test]
    fn sent_frames_come_back_through_poll() {
        let mut link = TransportLink::new(Loopback::default(), Destination::Dev);
        let frames: std::vec::Vec<Frame> = (0..5u8)
            .filter_map(SignalCode::digit)
            .map(|s| Frame::signal(Destination::Dev, s))
            .collect();
        for f in &frames {
            link.send(f);
        }
        let mut got = std::vec::Vec::new();
        link.poll(|f| got.push(f));
        assert_eq!(got, frames);
    }

    #[test]
    fn write_failure_is_counted_not_fatal() {
        let mut link = TransportLink::new(Broken, Destination::App);
        link.send(&Frame::signal(Destination::Dev, SignalCode::Start));
        assert_eq!(link.write_errors(), 1);
        let mut got = 0;
        link.poll(|_| got += 1);
        assert_eq!(got, 0);
    }
}
