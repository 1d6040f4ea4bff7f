//! Fuzz target: `Frame::decode` and `legacy::decode`
//!
//! Any accepted input must survive a re-encode unchanged.
//!
//! cargo fuzz run fuzz_frame_decode

#![no_main]

use libfuzzer_sys::fuzz_target;
use ovenpanel::codec::{Destination, Frame, legacy};

fuzz_target!(|data: &[u8]| {
    if let Ok(frame) = Frame::decode(data) {
        assert_eq!(&frame.encode()[..], data);
    }

    if let Ok(frame) = legacy::decode(data, Destination::App) {
        if let Some(bytes) = legacy::encode(&frame) {
            assert_eq!(legacy::decode(&bytes, Destination::App), Ok(frame));
        }
    }
});
