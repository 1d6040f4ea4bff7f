//! Fuzz target: `StreamDecoder::feed`
//!
//! Drives arbitrary byte sequences into the stream decoder and asserts that
//! it never panics, never buffers past its capacity, and only yields frames
//! addressed to the local side that re-encode to the bytes they came from.
//!
//! cargo fuzz run fuzz_stream_decoder

#![no_main]

use libfuzzer_sys::fuzz_target;
use ovenpanel::codec::stream::{STREAM_BUFFER, StreamDecoder};
use ovenpanel::codec::{Destination, Frame};

fuzz_target!(|data: &[u8]| {
    let mut decoder = StreamDecoder::new(Destination::Dev);

    // Split at an arbitrary point so partial frames are exercised.
    let split = data.first().map_or(0, |b| *b as usize % (data.len() + 1));
    let (a, b) = data.split_at(split);
    for chunk in [a, b] {
        decoder.feed(chunk, |frame| {
            assert_eq!(frame.destination, Destination::Dev);
            let bytes = frame.encode();
            assert_eq!(Frame::decode(&bytes), Ok(frame));
        });
        assert!(decoder.buffered() <= STREAM_BUFFER);
    }

    // After a reset the decoder must accept bytes cleanly again.
    decoder.reset();
    assert_eq!(decoder.buffered(), 0);
    decoder.feed(data, |_| {});
});
